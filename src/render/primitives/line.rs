// ============================================================================
// LINE - thick polyline ribbon with mitered joints
// ============================================================================
//
// Geometry is tessellated once per point/thickness change.  Every input point
// emits two vertices sharing the same position and normal with opposite miter
// signs; the Line shader pushes them apart by `normal * thickness/2 * miter`.
// Consecutive points are joined by two triangles (a, b, c) and (c, b, d), so
// adjacent segments share their joint vertices and cannot gap.
// ============================================================================

use glam::Vec2;

use crate::colour::Colour;
use crate::render::{
    Camera2D, DrawCall, Material, Mesh, RenderTarget, Renderable, ShaderKind, Transform2D, Vertex,
};

/// Upper bound on the miter scale.  Very sharp joints would otherwise shoot
/// spikes far outside the stroke.
pub const MAX_MITER: f32 = 4.0;

const DUPLICATE_EPSILON: f32 = 1e-4;

#[derive(Clone, Debug)]
pub struct Line {
    pub transform: Transform2D,
    points: Vec<Vec2>,
    thickness: f32,
    closed: bool,
    colour: Colour,
    mesh: Mesh,
    pivot: Vec2,
}

impl Line {
    pub fn new(points: Vec<Vec2>, thickness: f32, colour: Colour) -> Self {
        let mut line = Self {
            transform: Transform2D::default(),
            points,
            thickness,
            closed: false,
            colour,
            mesh: Mesh::default(),
            pivot: Vec2::ZERO,
        };
        line.rebuild();
        line
    }

    pub fn closed(mut self, closed: bool) -> Self {
        self.closed = closed;
        self.rebuild();
        self
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn set_points(&mut self, points: Vec<Vec2>) {
        self.points = points;
        self.rebuild();
    }

    pub fn thickness(&self) -> f32 {
        self.thickness
    }

    pub fn set_thickness(&mut self, thickness: f32) {
        self.thickness = thickness;
        // Only the single-point case bakes thickness into positions.
        self.rebuild();
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

    fn rebuild(&mut self) {
        self.mesh = tessellate(&self.points, self.thickness, self.closed);
        self.pivot = bounds_center(&self.points);
    }
}

impl Renderable for Line {
    fn render(&self, target: &mut dyn RenderTarget, camera: &Camera2D) {
        target.draw(&DrawCall {
            mesh: &self.mesh,
            shader: ShaderKind::Line,
            model: self.transform.model_matrix(self.pivot),
            view_proj: camera.view_projection(),
            material: Material::line(self.colour, self.thickness),
            texture: None,
        });
    }
}

/// Build the ribbon mesh for a polyline.
pub fn tessellate(points: &[Vec2], thickness: f32, closed: bool) -> Mesh {
    let mut path: Vec<Vec2> = Vec::with_capacity(points.len() + 1);
    for &p in points {
        if path.last().is_none_or(|last| last.distance(p) > DUPLICATE_EPSILON) {
            path.push(p);
        }
    }
    if closed && path.len() > 2 && path[0].distance(path[path.len() - 1]) <= DUPLICATE_EPSILON {
        path.pop();
    }

    match path.len() {
        0 => return Mesh::default(),
        1 => {
            let p = path[0];
            let half = Vec2::new(thickness * 0.5, 0.0);
            path = vec![p - half, p + half];
        }
        _ => {}
    }

    let closed = closed && path.len() > 2;
    let n = path.len();
    let mut joints: Vec<(Vec2, Vec2, f32)> = (0..n)
        .map(|i| {
            let prev = if i > 0 {
                Some(path[i - 1])
            } else if closed {
                Some(path[n - 1])
            } else {
                None
            };
            let next = if i + 1 < n {
                Some(path[i + 1])
            } else if closed {
                Some(path[0])
            } else {
                None
            };
            let (normal, miter) = joint(prev, path[i], next);
            (path[i], normal, miter)
        })
        .collect();

    if closed {
        joints.push(joints[0]);
    }

    let mut mesh = Mesh {
        vertices: Vec::with_capacity(joints.len() * 2),
        indices: Vec::with_capacity((joints.len() - 1) * 6),
    };
    for (p, normal, miter) in &joints {
        for sign in [1.0, -1.0] {
            mesh.vertices.push(Vertex {
                position: p.to_array(),
                normal: normal.to_array(),
                miter: miter * sign,
                uv: [0.0, 0.0],
            });
        }
    }
    for i in 0..(joints.len() - 1) as u32 {
        let (a, b, c, d) = (2 * i, 2 * i + 1, 2 * i + 2, 2 * i + 3);
        mesh.indices.extend_from_slice(&[a, b, c, c, b, d]);
    }
    mesh
}

/// Normal and miter scale at `point` given its neighbours.
fn joint(prev: Option<Vec2>, point: Vec2, next: Option<Vec2>) -> (Vec2, f32) {
    let dir_in = prev.map(|p| (point - p).normalize_or_zero());
    let dir_out = next.map(|n| (n - point).normalize_or_zero());
    match (dir_in, dir_out) {
        (Some(a), Some(b)) => {
            let tangent = (a + b).normalize_or_zero();
            if tangent == Vec2::ZERO {
                // Path folds back on itself.
                return (a.perp(), 1.0);
            }
            let miter_normal = tangent.perp();
            let dot = miter_normal.dot(a.perp());
            let miter = if dot.abs() < 1.0 / MAX_MITER {
                MAX_MITER.copysign(dot)
            } else {
                1.0 / dot
            };
            (miter_normal, miter)
        }
        (Some(d), None) | (None, Some(d)) => (d.perp(), 1.0),
        (None, None) => (Vec2::Y, 1.0),
    }
}

pub(crate) fn bounds_center(points: &[Vec2]) -> Vec2 {
    let Some(first) = points.first() else {
        return Vec2::ZERO;
    };
    let (min, max) = points
        .iter()
        .fold((*first, *first), |(lo, hi), p| (lo.min(*p), hi.max(*p)));
    (min + max) * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offset_positions(mesh: &Mesh, thickness: f32) -> Vec<Vec2> {
        mesh.vertices
            .iter()
            .map(|v| Vec2::from(v.position) + Vec2::from(v.normal) * thickness * 0.5 * v.miter)
            .collect()
    }

    fn close(a: Vec2, b: Vec2) -> bool {
        a.distance(b) < 1e-4
    }

    #[test]
    fn single_point_spans_thickness() {
        let t = 6.0;
        let mesh = tessellate(&[Vec2::new(10.0, 10.0)], t, false);
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.indices.len(), 6);
        let pts = offset_positions(&mesh, t);
        let min = pts.iter().fold(Vec2::splat(f32::MAX), |m, p| m.min(*p));
        let max = pts.iter().fold(Vec2::splat(f32::MIN), |m, p| m.max(*p));
        assert!((max.x - min.x - t).abs() < 1e-4);
        assert!((max.y - min.y - t).abs() < 1e-4);
        assert!(close((min + max) * 0.5, Vec2::new(10.0, 10.0)));
    }

    #[test]
    fn straight_path_joint_is_continuous() {
        let t = 2.0;
        let path = [Vec2::ZERO, Vec2::new(5.0, 0.0), Vec2::new(10.0, 0.0)];
        let mesh = tessellate(&path, t, false);
        let pts = offset_positions(&mesh, t);
        // The middle joint keeps full thickness and no miter stretch.
        assert!((mesh.vertices[2].miter - 1.0).abs() < 1e-5);
        assert!(close(pts[2], Vec2::new(5.0, 1.0)));
        assert!(close(pts[3], Vec2::new(5.0, -1.0)));
        // Both segments reference the same joint vertices.
        assert_eq!(&mesh.indices[0..6], &[0, 1, 2, 2, 1, 3]);
        assert_eq!(&mesh.indices[6..12], &[2, 3, 4, 4, 3, 5]);
    }

    #[test]
    fn right_angle_miter_meets_both_edges() {
        let t = 2.0;
        let path = [Vec2::ZERO, Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0)];
        let mesh = tessellate(&path, t, false);
        let pts = offset_positions(&mesh, t);
        assert!((mesh.vertices[2].miter - std::f32::consts::SQRT_2).abs() < 1e-4);
        assert!(close(pts[2], Vec2::new(9.0, 1.0)), "{:?}", pts[2]);
        assert!(close(pts[3], Vec2::new(11.0, -1.0)), "{:?}", pts[3]);
    }

    #[test]
    fn closed_loop_repeats_first_joint() {
        let square = [
            Vec2::ZERO,
            Vec2::new(4.0, 0.0),
            Vec2::new(4.0, 4.0),
            Vec2::new(0.0, 4.0),
        ];
        let mesh = tessellate(&square, 1.0, true);
        assert_eq!(mesh.vertices.len(), 10);
        assert_eq!(mesh.triangle_count(), 8);
        assert_eq!(mesh.vertices[0], mesh.vertices[8]);
        assert_eq!(mesh.vertices[1], mesh.vertices[9]);
    }

    #[test]
    fn duplicate_points_are_dropped() {
        let mesh = tessellate(&[Vec2::ONE, Vec2::ONE, Vec2::new(3.0, 1.0)], 1.0, false);
        assert_eq!(mesh.vertices.len(), 4);
    }
}
