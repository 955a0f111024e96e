// ============================================================================
// CANVAS SURFACE - committed + preview framebuffers behind one editable image
// ============================================================================
//
// Tools never touch pixels directly.  They render primitives into the preview
// framebuffer through a camera scoped to the canvas's own bounds, then either
// merge (preview → committed) or cancel (committed → preview).  Whole-image
// results (fill, effects, loads) go straight to committed state.
//
// Every operation leaves both framebuffers in `BlendMode::Replace`.
// ============================================================================

use std::fmt;
use std::str::FromStr;

use glam::{UVec2, Vec2};
use image::{imageops, RgbaImage};

use crate::colour::Colour;
use crate::error::{PaintError, Result};
use crate::render::primitives::Quad;
use crate::render::{
    BlendMode, Camera2D, Framebuffer, PrimitiveResources, RenderTarget, Renderable, Texture,
};

/// Where existing pixels sit inside the new bounds when the canvas is resized.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Anchor {
    #[default]
    TopLeft,
    Top,
    TopRight,
    Left,
    Center,
    Right,
    BottomLeft,
    Bottom,
    BottomRight,
}

impl Anchor {
    pub const ALL: [Anchor; 9] = [
        Anchor::TopLeft,
        Anchor::Top,
        Anchor::TopRight,
        Anchor::Left,
        Anchor::Center,
        Anchor::Right,
        Anchor::BottomLeft,
        Anchor::Bottom,
        Anchor::BottomRight,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Anchor::TopLeft => "top_left",
            Anchor::Top => "top",
            Anchor::TopRight => "top_right",
            Anchor::Left => "left",
            Anchor::Center => "center",
            Anchor::Right => "right",
            Anchor::BottomLeft => "bottom_left",
            Anchor::Bottom => "bottom",
            Anchor::BottomRight => "bottom_right",
        }
    }

    /// (column, row), each 0 = start, 1 = middle, 2 = end.
    fn grid(&self) -> (i64, i64) {
        let index = Anchor::ALL.iter().position(|a| a == self).unwrap_or(0) as i64;
        (index % 3, index / 3)
    }

    /// Offset of the old image's origin inside the new bounds.
    pub fn offset(&self, old: UVec2, new: UVec2) -> (i64, i64) {
        let (col, row) = self.grid();
        let along = |slot: i64, old: u32, new: u32| {
            let diff = new as i64 - old as i64;
            match slot {
                0 => 0,
                1 => diff / 2,
                _ => diff,
            }
        };
        (along(col, old.x, new.x), along(row, old.y, new.y))
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Anchor {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Anchor::ALL
            .into_iter()
            .find(|a| a.name() == key || (key == "centre" && *a == Anchor::Center))
            .ok_or_else(|| format!("unknown anchor '{s}'"))
    }
}

pub struct CanvasSurface {
    /// World-space position of the canvas origin (its top-left pixel corner).
    position: Vec2,
    committed: Framebuffer,
    preview: Framebuffer,
    background: Colour,
    camera: Camera2D,
    quad: Quad,
    pending_preview: bool,
}

impl CanvasSurface {
    pub fn new(
        resources: &mut PrimitiveResources,
        width: u32,
        height: u32,
        background: Colour,
    ) -> Result<Self> {
        check_size(width, height)?;
        let committed = Framebuffer::new(width, height, background);
        let mut preview = Framebuffer::new(width, height, background);
        preview.copy_from(&committed);
        let size = Vec2::new(width as f32, height as f32);
        Ok(Self {
            position: Vec2::ZERO,
            committed,
            preview,
            background,
            camera: Camera2D::new(size.x, size.y),
            quad: Quad::new(resources, Vec2::ZERO, size),
            pending_preview: false,
        })
    }

    pub fn width(&self) -> u32 {
        self.committed.width()
    }

    pub fn height(&self) -> u32 {
        self.committed.height()
    }

    pub fn size(&self) -> UVec2 {
        UVec2::new(self.width(), self.height())
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    pub fn background(&self) -> Colour {
        self.background
    }

    /// Camera mapping canvas-local pixels onto the framebuffers: origin at
    /// (0, 0), extent = size, unaffected by the main view's pan and zoom.
    pub fn local_camera(&self) -> &Camera2D {
        &self.camera
    }

    pub fn has_pending_preview(&self) -> bool {
        self.pending_preview
    }

    pub fn preview_texture(&self) -> &Texture {
        self.preview.texture()
    }

    /// Texture shown on screen: the live preview while one is pending.
    pub fn display_texture(&self) -> &Texture {
        if self.pending_preview {
            self.preview.texture()
        } else {
            self.committed.texture()
        }
    }

    /// World-space quad sampling [`CanvasSurface::display_texture`].
    pub fn screen_quad(&self) -> Quad {
        let mut quad = self.quad.clone();
        quad.transform.position = self.position;
        quad.set_texture(Some(self.display_texture().clone()));
        quad
    }

    /// Reallocate both framebuffers.  Old pixels are placed according to
    /// `anchor`; new area takes the background colour and shrinking clips.
    /// A pending preview is discarded.
    pub fn resize(&mut self, width: u32, height: u32, anchor: Anchor) -> Result<()> {
        check_size(width, height)?;
        let old = self.size();
        let new = UVec2::new(width, height);
        let (dx, dy) = anchor.offset(old, new);

        let mut image = RgbaImage::from_pixel(width, height, self.background.into());
        imageops::replace(&mut image, self.committed.image(), dx, dy);

        self.committed.replace_image(image);
        self.preview.copy_from(&self.committed);
        self.pending_preview = false;
        self.camera.project(width as f32, height as f32);
        self.quad.transform.size = Vec2::new(width as f32, height as f32);
        log::info!("canvas resized {}x{} -> {}x{} ({anchor})", old.x, old.y, width, height);
        Ok(())
    }

    /// Render `renderable` into the preview framebuffer through the local camera.
    pub fn draw_on_canvas(&mut self, renderable: &dyn Renderable) {
        self.preview.set_blend_mode(BlendMode::Replace);
        renderable.render(&mut self.preview, &self.camera);
        self.pending_preview = true;
    }

    /// Restore the preview to the last committed state.
    pub fn cancel_preview_canvas(&mut self) {
        self.preview.copy_from(&self.committed);
        self.pending_preview = false;
    }

    /// Commit the preview.  Afterwards both framebuffers hold the same pixels.
    pub fn merge_preview_canvas(&mut self) {
        self.committed.copy_from(&self.preview);
        self.pending_preview = false;
    }

    /// Replace the whole committed image with `texture`, stretched to fit.
    /// Any pending preview is discarded.
    pub fn draw_fullscreen_texture_on_canvas(&mut self, texture: &Texture) {
        if texture.width() == self.width() && texture.height() == self.height() {
            self.committed.replace_image(texture.image().clone());
        } else {
            let mut quad = self.quad.clone();
            quad.transform.position = Vec2::ZERO;
            quad.set_texture(Some(texture.clone()));
            self.committed.set_blend_mode(BlendMode::Replace);
            quad.render(&mut self.committed, &self.camera);
        }
        self.preview.copy_from(&self.committed);
        self.pending_preview = false;
    }

    /// Committed pixels, no copy.
    pub fn committed_image(&self) -> &RgbaImage {
        self.committed.image()
    }

    /// Owned copy of the committed RGBA pixels, `width * height * 4` bytes.
    pub fn get_canvas_image(&self) -> RgbaImage {
        self.committed.image().clone()
    }

    /// Committed colour at a canvas-local position.
    pub fn get_colour_at(&self, x: f32, y: f32) -> Result<Colour> {
        let (px, py) = (x.floor() as i64, y.floor() as i64);
        let out_of_bounds = || PaintError::OutOfBounds {
            x: px,
            y: py,
            width: self.width(),
            height: self.height(),
        };
        if px < 0 || py < 0 {
            return Err(out_of_bounds());
        }
        self.committed
            .pixel(px as u32, py as u32)
            .ok_or_else(out_of_bounds)
    }

    /// World → canvas-local.  Not clamped.
    pub fn mouse_to_canvas_coordinates(&self, world: Vec2) -> Vec2 {
        world - self.position
    }

    pub fn is_mouse_in_canvas(&self, world: Vec2) -> bool {
        let local = self.mouse_to_canvas_coordinates(world);
        local.x >= 0.0
            && local.y >= 0.0
            && local.x < self.width() as f32
            && local.y < self.height() as f32
    }
}

/// Largest canvas edge in pixels.
pub const MAX_CANVAS_DIM: u32 = 16384;

/// Canvas sizes must be non-zero and at most [`MAX_CANVAS_DIM`] on each edge.
pub fn check_size(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 || width > MAX_CANVAS_DIM || height > MAX_CANVAS_DIM {
        return Err(PaintError::InvalidSize { width, height });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::primitives::{Line, Rectangle};

    fn canvas(w: u32, h: u32) -> CanvasSurface {
        let mut res = PrimitiveResources::new();
        match CanvasSurface::new(&mut res, w, h, Colour::WHITE) {
            Ok(c) => c,
            Err(e) => panic!("{e}"),
        }
    }

    #[test]
    fn zero_size_is_rejected() {
        let mut res = PrimitiveResources::new();
        assert!(CanvasSurface::new(&mut res, 0, 4, Colour::WHITE).is_err());
        let mut c = canvas(2, 2);
        assert!(c.resize(3, 0, Anchor::Center).is_err());
        assert_eq!(c.size(), UVec2::new(2, 2));
    }

    #[test]
    fn oversized_canvas_is_rejected() {
        let mut res = PrimitiveResources::new();
        assert!(matches!(
            CanvasSurface::new(&mut res, MAX_CANVAS_DIM + 1, 4, Colour::WHITE),
            Err(PaintError::InvalidSize { .. })
        ));
        let mut c = canvas(2, 2);
        assert!(matches!(
            c.resize(u32::MAX, u32::MAX, Anchor::TopLeft),
            Err(PaintError::InvalidSize { width: u32::MAX, height: u32::MAX })
        ));
        assert_eq!(c.size(), UVec2::new(2, 2));
        assert!(check_size(MAX_CANVAS_DIM, 1).is_ok());
    }

    #[test]
    fn preview_is_invisible_to_committed_until_merge() {
        let mut c = canvas(8, 8);
        c.draw_on_canvas(&Line::new(vec![Vec2::new(1.0, 4.0), Vec2::new(7.0, 4.0)], 2.0, Colour::BLACK));
        assert!(c.has_pending_preview());
        assert!(c.committed_image().pixels().all(|p| p.0 == [255; 4]));
        assert_ne!(c.preview_texture().image(), c.committed_image());
        c.merge_preview_canvas();
        assert_eq!(c.get_colour_at(3.0, 4.0).ok(), Some(Colour::BLACK));
        assert_eq!(c.preview_texture().image(), c.committed_image());
    }

    #[test]
    fn local_drawing_ignores_canvas_position() {
        let mut res = PrimitiveResources::new();
        let mut c = canvas(4, 4);
        c.set_position(Vec2::new(100.0, 50.0));
        let rect = Rectangle::new(&mut res, Vec2::ZERO, Vec2::splat(2.0), Colour::BLACK);
        c.draw_on_canvas(&rect);
        c.merge_preview_canvas();
        assert_eq!(c.get_colour_at(0.0, 0.0).ok(), Some(Colour::BLACK));
        assert_eq!(c.get_colour_at(3.0, 3.0).ok(), Some(Colour::WHITE));
    }

    #[test]
    fn resize_anchors_content_and_pads() {
        let mut c = canvas(2, 2);
        let mut img = c.get_canvas_image();
        img.put_pixel(0, 0, Colour::BLACK.into());
        c.draw_fullscreen_texture_on_canvas(&Texture::from_image(img));

        c.resize(4, 4, Anchor::BottomRight).ok();
        assert_eq!(c.get_colour_at(2.0, 2.0).ok(), Some(Colour::BLACK));
        assert_eq!(c.get_colour_at(0.0, 0.0).ok(), Some(Colour::WHITE));

        c.resize(1, 1, Anchor::BottomRight).ok();
        assert_eq!(c.get_colour_at(0.0, 0.0).ok(), Some(Colour::WHITE));
        assert_eq!(c.local_camera().screen_size(), Vec2::ONE);
    }

    #[test]
    fn centre_anchor_splits_padding() {
        assert_eq!(Anchor::Center.offset(UVec2::new(2, 2), UVec2::new(6, 4)), (2, 1));
        assert_eq!(Anchor::Right.offset(UVec2::new(4, 4), UVec2::new(2, 2)), (-2, -1));
        assert_eq!("Bottom-Left".parse::<Anchor>(), Ok(Anchor::BottomLeft));
    }

    #[test]
    fn colour_sampling_outside_is_an_error() {
        let c = canvas(3, 3);
        assert!(matches!(
            c.get_colour_at(3.0, 0.0),
            Err(PaintError::OutOfBounds { x: 3, y: 0, width: 3, height: 3 })
        ));
        assert!(c.get_colour_at(-0.5, 1.0).is_err());
    }

    #[test]
    fn bounds_test_is_half_open() {
        let mut c = canvas(10, 5);
        c.set_position(Vec2::new(-5.0, 2.0));
        assert!(c.is_mouse_in_canvas(Vec2::new(-5.0, 2.0)));
        assert!(c.is_mouse_in_canvas(Vec2::new(4.9, 6.9)));
        assert!(!c.is_mouse_in_canvas(Vec2::new(5.0, 3.0)));
        assert_eq!(c.mouse_to_canvas_coordinates(Vec2::new(0.0, 0.0)), Vec2::new(5.0, -2.0));
    }

    #[test]
    fn stretched_fullscreen_texture_fills_canvas() {
        let mut c = canvas(4, 4);
        c.draw_fullscreen_texture_on_canvas(&Texture::filled(1, 1, Colour::BLACK));
        assert!(c.committed_image().pixels().all(|p| p.0 == [0, 0, 0, 255]));
        assert!(!c.has_pending_preview());
    }
}
