use glam::Vec2;

use super::line::bounds_center;
use crate::colour::Colour;
use crate::render::{
    Camera2D, DrawCall, Material, Mesh, RenderTarget, Renderable, ShaderKind, Transform2D, Vertex,
};

/// Filled convex polygon drawn as a fan around its first point.
#[derive(Clone, Debug)]
pub struct TriangleFan {
    pub transform: Transform2D,
    points: Vec<Vec2>,
    colour: Colour,
    mesh: Mesh,
    pivot: Vec2,
}

impl TriangleFan {
    pub fn new(points: Vec<Vec2>, colour: Colour) -> Self {
        let mut fan = Self {
            transform: Transform2D::default(),
            points: Vec::new(),
            colour,
            mesh: Mesh::default(),
            pivot: Vec2::ZERO,
        };
        fan.set_points(points);
        fan
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn set_points(&mut self, points: Vec<Vec2>) {
        self.mesh = fan_mesh(&points);
        self.pivot = bounds_center(&points);
        self.points = points;
    }

    pub fn colour(&self) -> Colour {
        self.colour
    }

    pub fn set_colour(&mut self, colour: Colour) {
        self.colour = colour;
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }
}

impl Renderable for TriangleFan {
    fn render(&self, target: &mut dyn RenderTarget, camera: &Camera2D) {
        target.draw(&DrawCall {
            mesh: &self.mesh,
            shader: ShaderKind::Sprite,
            model: self.transform.model_matrix(self.pivot),
            view_proj: camera.view_projection(),
            material: Material::solid(self.colour),
            texture: None,
        });
    }
}

/// Fewer than three points yields an empty mesh.
pub fn fan_mesh(points: &[Vec2]) -> Mesh {
    if points.len() < 3 {
        return Mesh::default();
    }
    let vertices = points.iter().map(|p| Vertex::at(p.x, p.y)).collect();
    let indices = (1..points.len() as u32 - 1)
        .flat_map(|i| [0, i, i + 1])
        .collect();
    Mesh { vertices, indices }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fan_triangles_share_first_point() {
        let pts = vec![
            Vec2::ZERO,
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];
        let mesh = fan_mesh(&pts);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
        assert!(fan_mesh(&pts[..2]).is_empty());
    }
}
