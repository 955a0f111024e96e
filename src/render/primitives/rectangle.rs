use glam::Vec2;

use super::{Line, Quad};
use crate::colour::Colour;
use crate::render::{Camera2D, PrimitiveResources, RenderTarget, Renderable};

/// Rectangle drawn either as a closed 4-point outline or as a filled quad.
#[derive(Clone, Debug)]
pub struct Rectangle {
    position: Vec2,
    rotation: f32,
    size: Vec2,
    outlined: bool,
    outline: Line,
    fill: Quad,
}

impl Rectangle {
    pub fn new(resources: &mut PrimitiveResources, position: Vec2, size: Vec2, colour: Colour) -> Self {
        let mut rect = Self {
            position,
            rotation: 0.0,
            size,
            outlined: false,
            outline: Line::new(Vec::new(), 1.0, colour).closed(true),
            fill: Quad::new(resources, position, size).with_colour(colour),
        };
        rect.rebuild();
        rect.sync_transform();
        rect
    }

    pub fn outlined(mut self, thickness: f32) -> Self {
        self.outlined = true;
        self.outline.set_thickness(thickness);
        self
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
        self.sync_transform();
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn set_rotation(&mut self, radians: f32) {
        self.rotation = radians;
        self.sync_transform();
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn set_size(&mut self, size: Vec2) {
        self.size = size;
        self.rebuild();
        self.sync_transform();
    }

    /// Place the rectangle in the box spanned by two opposite corners.
    pub fn set_bounds(&mut self, a: Vec2, b: Vec2) {
        self.position = a.min(b);
        self.size = (a - b).abs();
        self.rebuild();
        self.sync_transform();
    }

    pub fn is_outlined(&self) -> bool {
        self.outlined
    }

    pub fn set_outlined(&mut self, outlined: bool) {
        self.outlined = outlined;
    }

    pub fn thickness(&self) -> f32 {
        self.outline.thickness()
    }

    pub fn set_thickness(&mut self, thickness: f32) {
        self.outline.set_thickness(thickness);
    }

    pub fn set_colour(&mut self, colour: Colour) {
        self.outline.set_colour(colour);
        self.fill.set_colour(colour);
    }

    pub fn outline(&self) -> &Line {
        &self.outline
    }

    pub fn fill(&self) -> &Quad {
        &self.fill
    }

    fn rebuild(&mut self) {
        let Vec2 { x: w, y: h } = self.size;
        self.outline.set_points(vec![
            Vec2::ZERO,
            Vec2::new(w, 0.0),
            Vec2::new(w, h),
            Vec2::new(0.0, h),
        ]);
    }

    fn sync_transform(&mut self) {
        self.outline.transform.position = self.position;
        self.outline.transform.rotation = self.rotation;
        self.fill.transform.position = self.position;
        self.fill.transform.rotation = self.rotation;
        self.fill.transform.size = self.size;
    }
}

impl Renderable for Rectangle {
    fn render(&self, target: &mut dyn RenderTarget, camera: &Camera2D) {
        if self.outlined {
            self.outline.render(target, camera);
        } else {
            self.fill.render(target, camera);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Framebuffer;

    #[test]
    fn filled_rectangle_covers_its_box() {
        let mut res = PrimitiveResources::new();
        let rect = Rectangle::new(&mut res, Vec2::new(1.0, 1.0), Vec2::new(2.0, 1.0), Colour::BLACK);
        let mut fb = Framebuffer::new(4, 3, Colour::WHITE);
        rect.render(&mut fb, &Camera2D::new(4.0, 3.0));
        let black: Vec<(u32, u32)> = (0..3)
            .flat_map(|y| (0..4).map(move |x| (x, y)))
            .filter(|&(x, y)| fb.pixel(x, y) == Some(Colour::BLACK))
            .collect();
        assert_eq!(black, vec![(1, 1), (2, 1)]);
    }

    #[test]
    fn bounds_normalise_corners() {
        let mut res = PrimitiveResources::new();
        let mut rect = Rectangle::new(&mut res, Vec2::ZERO, Vec2::ONE, Colour::BLACK);
        rect.set_bounds(Vec2::new(5.0, 1.0), Vec2::new(2.0, 4.0));
        assert_eq!(rect.position(), Vec2::new(2.0, 1.0));
        assert_eq!(rect.size(), Vec2::new(3.0, 3.0));
        assert_eq!(rect.fill().transform.size, Vec2::new(3.0, 3.0));
    }
}
