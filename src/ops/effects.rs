// ============================================================================
// EFFECTS - whole-image colour transforms and 3x3 convolutions (rayon)
// ============================================================================
//
// Every effect reads a flat RGBA image and returns a new one of the same
// size.  Rows are processed in parallel; alpha is always preserved.
// ============================================================================

use std::fmt;
use std::str::FromStr;

use image::RgbaImage;
use rayon::prelude::*;

use crate::error::PaintError;

/// A named 3x3 convolution kernel, row-major.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kernel {
    GaussianBlur,
    BoxBlur,
    Sharpen,
    EdgeDetect,
}

impl Kernel {
    pub fn weights(&self) -> [f32; 9] {
        match self {
            Kernel::GaussianBlur => [
                0.045, 0.122, 0.045, //
                0.122, 0.332, 0.122, //
                0.045, 0.122, 0.045,
            ],
            Kernel::BoxBlur => [1.0; 9],
            Kernel::Sharpen => [
                -1.0, -1.0, -1.0, //
                -1.0, 16.0, -1.0, //
                -1.0, -1.0, -1.0,
            ],
            Kernel::EdgeDetect => [
                -1.0, -1.0, -1.0, //
                -1.0, 8.0, -1.0, //
                -1.0, -1.0, -1.0,
            ],
        }
    }

    /// Sum of the weights, or 1 when that sum is not positive.
    pub fn normaliser(&self) -> f32 {
        let sum: f32 = self.weights().iter().sum();
        if sum <= 0.0 { 1.0 } else { sum }
    }
}

/// Effects addressable by name from the UI and the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Effect {
    Grayscale,
    Invert,
    Convolve(Kernel),
}

impl Effect {
    pub const ALL: [Effect; 6] = [
        Effect::Grayscale,
        Effect::Invert,
        Effect::Convolve(Kernel::GaussianBlur),
        Effect::Convolve(Kernel::BoxBlur),
        Effect::Convolve(Kernel::Sharpen),
        Effect::Convolve(Kernel::EdgeDetect),
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Effect::Grayscale => "grayscale",
            Effect::Invert => "invert",
            Effect::Convolve(Kernel::GaussianBlur) => "gaussianBlur",
            Effect::Convolve(Kernel::BoxBlur) => "boxBlur",
            Effect::Convolve(Kernel::Sharpen) => "sharpen",
            Effect::Convolve(Kernel::EdgeDetect) => "edgeDetect",
        }
    }

    pub fn apply(&self, src: &RgbaImage) -> RgbaImage {
        match self {
            Effect::Grayscale => grayscale(src),
            Effect::Invert => invert(src),
            Effect::Convolve(kernel) => convolve(src, *kernel),
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Effect {
    type Err = PaintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Effect::ALL
            .into_iter()
            .find(|e| e.name() == s)
            .ok_or_else(|| PaintError::UnknownEffect(s.to_string()))
    }
}

/// Apply the effect called `name`.  Unknown names are an error; nothing is
/// substituted.
pub fn apply_named(name: &str, src: &RgbaImage) -> Result<RgbaImage, PaintError> {
    Ok(name.parse::<Effect>()?.apply(src))
}

fn map_pixels<F>(src: &RgbaImage, f: F) -> RgbaImage
where
    F: Fn([u8; 4]) -> [u8; 4] + Sync,
{
    let (w, h) = src.dimensions();
    let mut out = src.clone();
    if w == 0 || h == 0 {
        return out;
    }
    let stride = w as usize * 4;
    let dst: &mut [u8] = &mut out;
    dst.par_chunks_mut(stride).for_each(|row| {
        for px in row.chunks_exact_mut(4) {
            let mapped = f([px[0], px[1], px[2], px[3]]);
            px.copy_from_slice(&mapped);
        }
    });
    out
}

/// Luma (Rec. 601) into all three channels.
pub fn grayscale(src: &RgbaImage) -> RgbaImage {
    map_pixels(src, |[r, g, b, a]| {
        let l = (0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32)
            .round()
            .clamp(0.0, 255.0) as u8;
        [l, l, l, a]
    })
}

pub fn invert(src: &RgbaImage) -> RgbaImage {
    map_pixels(src, |[r, g, b, a]| [255 - r, 255 - g, 255 - b, a])
}

/// 3x3 convolution of the colour channels with clamp-to-edge sampling.
pub fn convolve(src: &RgbaImage, kernel: Kernel) -> RgbaImage {
    let (w, h) = src.dimensions();
    let mut out = src.clone();
    if w == 0 || h == 0 {
        return out;
    }
    let weights = kernel.weights();
    let norm = kernel.normaliser();
    let (wi, hi) = (w as i64, h as i64);
    let stride = w as usize * 4;
    let src_raw = src.as_raw();

    let dst: &mut [u8] = &mut out;
    dst.par_chunks_mut(stride).enumerate().for_each(|(y, row_out)| {
        for x in 0..w as usize {
            let mut acc = [0.0f32; 3];
            for ky in 0..3i64 {
                let sy = (y as i64 + ky - 1).clamp(0, hi - 1) as usize;
                for kx in 0..3i64 {
                    let sx = (x as i64 + kx - 1).clamp(0, wi - 1) as usize;
                    let weight = weights[(ky * 3 + kx) as usize];
                    let si = sy * stride + sx * 4;
                    for (c, a) in acc.iter_mut().enumerate() {
                        *a += src_raw[si + c] as f32 * weight;
                    }
                }
            }
            let pi = x * 4;
            for (c, a) in acc.iter().enumerate() {
                row_out[pi + c] = (a / norm).round().clamp(0.0, 255.0) as u8;
            }
        }
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn names_round_trip_and_unknown_fails() {
        for e in Effect::ALL {
            assert_eq!(e.name().parse::<Effect>().ok(), Some(e));
        }
        assert!(matches!(
            "emboss".parse::<Effect>(),
            Err(PaintError::UnknownEffect(n)) if n == "emboss"
        ));
    }

    #[test]
    fn invert_keeps_alpha() {
        let img = RgbaImage::from_pixel(2, 1, Rgba([10, 20, 30, 40]));
        assert_eq!(invert(&img).get_pixel(1, 0).0, [245, 235, 225, 40]);
    }

    #[test]
    fn grayscale_of_white_is_white() {
        let img = RgbaImage::from_pixel(1, 1, Rgba([255, 255, 255, 255]));
        assert_eq!(grayscale(&img).get_pixel(0, 0).0, [255; 4]);
    }

    #[test]
    fn blurs_leave_flat_images_unchanged() {
        let img = RgbaImage::from_pixel(3, 3, Rgba([90, 120, 200, 255]));
        assert_eq!(convolve(&img, Kernel::BoxBlur), img);
        assert_eq!(convolve(&img, Kernel::Sharpen), img);
        assert_eq!(convolve(&img, Kernel::GaussianBlur), img);
    }

    #[test]
    fn edge_detect_zeroes_flat_regions() {
        let mut img = RgbaImage::from_pixel(5, 5, Rgba([100, 100, 100, 255]));
        img.put_pixel(4, 4, Rgba([200, 200, 200, 255]));
        let out = convolve(&img, Kernel::EdgeDetect);
        assert_eq!(out.get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(out.get_pixel(4, 4).0[0], 255);
    }
}
