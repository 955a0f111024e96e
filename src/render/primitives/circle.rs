use std::f32::consts::TAU;

use glam::Vec2;

use super::{Line, TriangleFan};
use crate::colour::Colour;
use crate::render::{Camera2D, RenderTarget, Renderable};

pub const DEFAULT_SEGMENTS: usize = 64;

/// Extent (pixels) beyond which the outline thickness grows with the ellipse.
pub const AUTO_THICKNESS_EXTENT: f32 = 200.0;

/// Ellipse inscribed in `[position, position + size]`, outlined or filled.
///
/// Owns both an outline and a fill sub-primitive and fans every transform
/// write out to them; points are generated in pixel space so the outline
/// thickness is never stretched by a non-uniform size.
#[derive(Clone, Debug)]
pub struct Circle {
    position: Vec2,
    rotation: f32,
    size: Vec2,
    outlined: bool,
    thickness: f32,
    outline: Line,
    fill: TriangleFan,
}

impl Circle {
    pub fn new(position: Vec2, size: Vec2, colour: Colour) -> Self {
        let mut circle = Self {
            position,
            rotation: 0.0,
            size,
            outlined: false,
            thickness: 1.0,
            outline: Line::new(Vec::new(), 1.0, colour).closed(true),
            fill: TriangleFan::new(Vec::new(), colour),
        };
        circle.rebuild();
        circle.sync_transform();
        circle
    }

    pub fn outlined(mut self, thickness: f32) -> Self {
        self.outlined = true;
        self.set_thickness(thickness);
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
    }

    /// Place the ellipse in the box spanned by two opposite corners.
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
        self.thickness
    }

    pub fn set_thickness(&mut self, thickness: f32) {
        self.thickness = thickness;
        self.outline.set_thickness(self.effective_thickness());
    }

    pub fn set_colour(&mut self, colour: Colour) {
        self.outline.set_colour(colour);
        self.fill.set_colour(colour);
    }

    /// Outline thickness after the size-based boost for large ellipses.
    pub fn effective_thickness(&self) -> f32 {
        let extent = self.size.x.max(self.size.y);
        if extent > AUTO_THICKNESS_EXTENT {
            self.thickness.max(extent / AUTO_THICKNESS_EXTENT)
        } else {
            self.thickness
        }
    }

    pub fn outline(&self) -> &Line {
        &self.outline
    }

    pub fn fill(&self) -> &TriangleFan {
        &self.fill
    }

    fn rebuild(&mut self) {
        let radius = self.size * 0.5;
        let points: Vec<Vec2> = (0..DEFAULT_SEGMENTS)
            .map(|i| {
                let angle = TAU * i as f32 / DEFAULT_SEGMENTS as f32;
                radius + Vec2::new(angle.cos(), angle.sin()) * radius
            })
            .collect();
        self.outline.set_points(points.clone());
        self.outline.set_thickness(self.effective_thickness());
        self.fill.set_points(points);
    }

    fn sync_transform(&mut self) {
        for t in [&mut self.outline.transform, &mut self.fill.transform] {
            t.position = self.position;
            t.rotation = self.rotation;
        }
    }
}

impl Renderable for Circle {
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

    #[test]
    fn points_lie_on_ellipse() {
        let c = Circle::new(Vec2::ZERO, Vec2::new(20.0, 10.0), Colour::BLACK);
        for p in c.fill().points() {
            let d = (*p - Vec2::new(10.0, 5.0)) / Vec2::new(10.0, 5.0);
            assert!((d.length() - 1.0).abs() < 1e-4);
        }
        assert_eq!(c.fill().points().len(), DEFAULT_SEGMENTS);
    }

    #[test]
    fn transform_fans_out() {
        let mut c = Circle::new(Vec2::ZERO, Vec2::splat(4.0), Colour::BLACK);
        c.set_position(Vec2::new(3.0, 7.0));
        c.set_rotation(1.0);
        assert_eq!(c.outline().transform.position, Vec2::new(3.0, 7.0));
        assert_eq!(c.fill().transform.rotation, 1.0);
    }

    #[test]
    fn large_outline_thickens() {
        let mut c = Circle::new(Vec2::ZERO, Vec2::splat(800.0), Colour::BLACK).outlined(1.0);
        assert_eq!(c.effective_thickness(), 4.0);
        c.set_size(Vec2::splat(50.0));
        assert_eq!(c.outline().thickness(), 1.0);
    }
}
