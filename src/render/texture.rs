// ============================================================================
// TEXTURE - shared RGBA8 image with identity + generation for GPU caching
// ============================================================================

use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use image::RgbaImage;

use crate::colour::Colour;

static NEXT_TEXTURE_ID: AtomicU64 = AtomicU64::new(1);

/// A cheaply clonable texture.
///
/// Pixels live behind an `Rc`, so handing a texture to the scene does not
/// copy it; the owner gets copy-on-write semantics through [`Texture::image_mut`].
/// `(id, generation)` identifies the exact content and lets the GPU backend
/// skip uploads of unchanged textures.
#[derive(Clone, Debug)]
pub struct Texture {
    id: u64,
    generation: u64,
    image: Rc<RgbaImage>,
}

impl Texture {
    pub fn from_image(image: RgbaImage) -> Self {
        Self {
            id: NEXT_TEXTURE_ID.fetch_add(1, Ordering::Relaxed),
            generation: 0,
            image: Rc::new(image),
        }
    }

    pub fn filled(width: u32, height: u32, colour: Colour) -> Self {
        Self::from_image(RgbaImage::from_pixel(width, height, colour.into()))
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Mutable access to the pixels.  Clones them first if another holder
    /// (e.g. a scene quad) still shares this generation.
    pub fn image_mut(&mut self) -> &mut RgbaImage {
        self.generation += 1;
        Rc::make_mut(&mut self.image)
    }

    /// Take over `other`'s pixels while keeping this texture's identity.
    pub fn assign(&mut self, other: &Texture) {
        self.image = Rc::clone(&other.image);
        self.generation += 1;
    }

    pub fn replace_image(&mut self, image: RgbaImage) {
        self.image = Rc::new(image);
        self.generation += 1;
    }

    /// Nearest-neighbour sample with clamp-to-edge addressing.
    pub fn sample_nearest(&self, u: f32, v: f32) -> [u8; 4] {
        let w = self.image.width();
        let h = self.image.height();
        if w == 0 || h == 0 {
            return [0; 4];
        }
        let x = ((u * w as f32).floor() as i64).clamp(0, w as i64 - 1) as u32;
        let y = ((v * h as f32).floor() as i64).clamp(0, h as i64 - 1) as u32;
        self.image.get_pixel(x, y).0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_until_written() {
        let mut a = Texture::filled(2, 2, Colour::WHITE);
        let b = a.clone();
        a.image_mut().put_pixel(0, 0, Colour::BLACK.into());
        assert_eq!(b.image().get_pixel(0, 0).0, [255; 4]);
        assert_eq!(a.image().get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(a.id(), b.id());
        assert!(a.generation() > b.generation());
    }

    #[test]
    fn sampling_clamps_to_edges() {
        let mut t = Texture::filled(2, 1, Colour::WHITE);
        t.image_mut().put_pixel(1, 0, Colour::BLACK.into());
        assert_eq!(t.sample_nearest(-0.5, 0.5), [255; 4]);
        assert_eq!(t.sample_nearest(1.5, 0.5), [0, 0, 0, 255]);
    }
}
