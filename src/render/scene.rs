use crate::colour::Colour;
use crate::render::{BlendMode, Camera2D, RenderTarget, Renderable};

/// Ordered draw list.  Objects render back to front in insertion order.
pub struct Scene {
    clear_colour: Colour,
    objects: Vec<Box<dyn Renderable>>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(Colour::rgba(64, 64, 64, 255))
    }
}

impl Scene {
    pub fn new(clear_colour: Colour) -> Self {
        Self {
            clear_colour,
            objects: Vec::new(),
        }
    }

    pub fn clear_colour(&self) -> Colour {
        self.clear_colour
    }

    pub fn push(&mut self, object: impl Renderable + 'static) {
        self.objects.push(Box::new(object));
    }

    pub fn push_boxed(&mut self, object: Box<dyn Renderable>) {
        self.objects.push(object);
    }

    pub fn clear(&mut self) {
        self.objects.clear();
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// One pass: clear, then alpha-blend every object through `camera`.  The
    /// target's previous blend mode is restored afterwards.
    pub fn render(&self, target: &mut dyn RenderTarget, camera: &Camera2D) {
        let previous = target.blend_mode();
        target.clear(self.clear_colour);
        target.set_blend_mode(BlendMode::AlphaOver);
        for object in &self.objects {
            object.render(target, camera);
        }
        target.set_blend_mode(previous);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::primitives::Quad;
    use crate::render::{Framebuffer, PrimitiveResources};
    use glam::Vec2;

    #[test]
    fn later_objects_draw_on_top() {
        let mut res = PrimitiveResources::new();
        let mut scene = Scene::new(Colour::WHITE);
        scene.push(Quad::new(&mut res, Vec2::ZERO, Vec2::splat(2.0)).with_colour(Colour::BLACK));
        scene.push(
            Quad::new(&mut res, Vec2::new(1.0, 0.0), Vec2::new(1.0, 2.0))
                .with_colour(Colour::rgba(255, 0, 0, 255)),
        );
        let mut fb = Framebuffer::new(3, 2, Colour::TRANSPARENT);
        scene.render(&mut fb, &Camera2D::new(3.0, 2.0));
        assert_eq!(fb.pixel(0, 0), Some(Colour::BLACK));
        assert_eq!(fb.pixel(1, 1), Some(Colour::rgba(255, 0, 0, 255)));
        assert_eq!(fb.pixel(2, 0), Some(Colour::WHITE));
        assert_eq!(fb.blend_mode(), BlendMode::Replace);
    }
}
