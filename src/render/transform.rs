use glam::{Mat4, Vec2, Vec3};

/// Position / rotation (radians) / size of a 2D object.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform2D {
    pub position: Vec2,
    pub rotation: f32,
    pub size: Vec2,
}

impl Default for Transform2D {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            rotation: 0.0,
            size: Vec2::ONE,
        }
    }
}

impl Transform2D {
    pub fn new(position: Vec2, size: Vec2) -> Self {
        Self {
            position,
            rotation: 0.0,
            size,
        }
    }

    /// Model matrix: translate to position, translate to the geometry centre,
    /// rotate, translate back, scale by size.  `center` is the geometry centre
    /// in unscaled local units, so rotation always pivots around the object's
    /// own middle rather than its origin corner.
    pub fn model_matrix(&self, center: Vec2) -> Mat4 {
        let pivot = (center * self.size).extend(0.0);
        Mat4::from_translation(self.position.extend(0.0))
            * Mat4::from_translation(pivot)
            * Mat4::from_rotation_z(self.rotation)
            * Mat4::from_translation(-pivot)
            * Mat4::from_scale(Vec3::new(self.size.x, self.size.y, 1.0))
    }
}
