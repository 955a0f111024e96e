use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, RgbaImage};
use rfd::FileDialog;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use crate::error::{PaintError, Result};

/// Raster formats the decoder is built with (lowercase extensions).
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp"];

/// Decode any supported image file to RGBA8.
pub fn decode_path(path: &Path) -> Result<RgbaImage> {
    image::open(path)
        .map(|img| img.to_rgba8())
        .map_err(|e| PaintError::ImageLoad(format!("{}: {e}", path.display())))
}

/// Decode an in-memory encoded image (format sniffed from the header).
pub fn decode_bytes(bytes: &[u8]) -> Result<RgbaImage> {
    image::load_from_memory(bytes)
        .map(|img| img.to_rgba8())
        .map_err(|e| PaintError::ImageLoad(e.to_string()))
}

/// PNG-encode an RGBA image into a byte buffer.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf)
        .write_image(image.as_raw(), image.width(), image.height(), ColorType::Rgba8)
        .map_err(|e| PaintError::ImageEncode(e.to_string()))?;
    Ok(buf)
}

pub fn save_png(image: &RgbaImage, path: &Path) -> Result<()> {
    let bytes = encode_png(image)?;
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(&bytes)?;
    writer.flush()?;
    log::info!("exported {}x{} PNG to {}", image.width(), image.height(), path.display());
    Ok(())
}

/// Native open dialog filtered to decodable images.
pub fn pick_open_path() -> Option<PathBuf> {
    FileDialog::new()
        .add_filter("Images", IMAGE_EXTENSIONS)
        .add_filter("All Files", &["*"])
        .pick_file()
}

/// Native save dialog for PNG export.  Adds the extension when missing.
pub fn pick_save_path() -> Option<PathBuf> {
    FileDialog::new()
        .add_filter("PNG", &["png"])
        .set_file_name("untitled.png")
        .save_file()
        .map(|p| if p.extension().is_none() { p.with_extension("png") } else { p })
}

/// Result delivered from a background decode.
#[derive(Debug)]
pub enum IoResult {
    ImageLoaded {
        request: u64,
        image: RgbaImage,
        source: String,
    },
    LoadFailed {
        request: u64,
        source: String,
        error: String,
    },
}

/// Decodes images on the rayon pool and hands results back through a
/// channel polled once per frame.  Loads are never cancelled: each result is
/// applied when it arrives, so with overlapping requests the last one to
/// finish wins.
pub struct ImageLoader {
    sender: mpsc::Sender<IoResult>,
    receiver: mpsc::Receiver<IoResult>,
    next_request: u64,
    pending: usize,
}

impl Default for ImageLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageLoader {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver,
            next_request: 1,
            pending: 0,
        }
    }

    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn load_path(&mut self, path: PathBuf) -> u64 {
        let source = path.display().to_string();
        self.spawn(source, move || decode_path(&path))
    }

    pub fn load_bytes(&mut self, bytes: Vec<u8>, label: &str) -> u64 {
        self.spawn(label.to_string(), move || decode_bytes(&bytes))
    }

    fn spawn(&mut self, source: String, decode: impl FnOnce() -> Result<RgbaImage> + Send + 'static) -> u64 {
        let request = self.next_request;
        self.next_request += 1;
        self.pending += 1;
        let sender = self.sender.clone();
        log::debug!("load #{request} queued: {source}");
        rayon::spawn(move || {
            let result = match decode() {
                Ok(image) => IoResult::ImageLoaded { request, image, source },
                Err(e) => IoResult::LoadFailed {
                    request,
                    source,
                    error: e.to_string(),
                },
            };
            let _ = sender.send(result);
        });
        request
    }

    /// Everything that finished since the last poll, in completion order.
    pub fn poll(&mut self) -> Vec<IoResult> {
        let done: Vec<IoResult> = self.receiver.try_iter().collect();
        self.pending = self.pending.saturating_sub(done.len());
        done
    }

    /// Block until one result arrives or `timeout` passes.
    pub fn wait(&mut self, timeout: Duration) -> Option<IoResult> {
        let result = self.receiver.recv_timeout(timeout).ok()?;
        self.pending = self.pending.saturating_sub(1);
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn png_bytes_decode_back_to_the_same_pixels() {
        let mut img = RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 255]));
        img.put_pixel(2, 1, Rgba([200, 100, 50, 10]));
        let bytes = match encode_png(&img) {
            Ok(b) => b,
            Err(e) => panic!("{e}"),
        };
        assert_eq!(&bytes[1..4], b"PNG");
        assert_eq!(decode_bytes(&bytes).ok(), Some(img));
    }

    #[test]
    fn async_failure_is_reported_not_raised() {
        let mut loader = ImageLoader::new();
        let id = loader.load_bytes(b"not an image".to_vec(), "garbage");
        assert_eq!(loader.pending(), 1);
        match loader.wait(Duration::from_secs(10)) {
            Some(IoResult::LoadFailed { request, source, .. }) => {
                assert_eq!(request, id);
                assert_eq!(source, "garbage");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(loader.pending(), 0);
    }
}
