use glam::Vec2;

use crate::colour::Colour;
use crate::render::primitives::Circle;
use crate::render::Renderable;

/// Default grab radius in canvas pixels.
pub const HIT_RADIUS: f32 = 6.0;

/// Shared state of the multi-click tools (Shape, Select, Spline).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EditState {
    #[default]
    WaitingForInitialPoint,
    WaitingForInitialRelease,
    WaitingForControlPointEditFinish,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControlPoint {
    pub position: Vec2,
    pub radius: f32,
}

impl ControlPoint {
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            radius: HIT_RADIUS,
        }
    }

    pub fn hit(&self, p: Vec2) -> bool {
        self.position.distance(p) <= self.radius
    }
}

/// An ordered set of draggable points with at most one grabbed at a time.
#[derive(Clone, Debug, Default)]
pub struct ControlPoints {
    points: Vec<ControlPoint>,
    grabbed: Option<usize>,
}

impl ControlPoints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn positions(&self) -> Vec<Vec2> {
        self.points.iter().map(|p| p.position).collect()
    }

    pub fn get(&self, index: usize) -> Option<Vec2> {
        self.points.get(index).map(|p| p.position)
    }

    pub fn push(&mut self, position: Vec2) -> usize {
        self.points.push(ControlPoint::new(position));
        self.points.len() - 1
    }

    pub fn set_all(&mut self, positions: &[Vec2]) {
        self.points = positions.iter().copied().map(ControlPoint::new).collect();
        self.grabbed = None;
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.grabbed = None;
    }

    /// Closest point whose hit radius contains `p`.
    pub fn hit_test(&self, p: Vec2) -> Option<usize> {
        self.points
            .iter()
            .enumerate()
            .filter(|(_, cp)| cp.hit(p))
            .min_by(|(_, a), (_, b)| a.position.distance(p).total_cmp(&b.position.distance(p)))
            .map(|(i, _)| i)
    }

    pub fn grab(&mut self, index: usize) {
        if index < self.points.len() {
            self.grabbed = Some(index);
        }
    }

    pub fn grabbed(&self) -> Option<usize> {
        self.grabbed
    }

    pub fn release(&mut self) {
        self.grabbed = None;
    }

    /// Move the grabbed point.  Returns `false` when nothing is grabbed.
    pub fn drag_to(&mut self, p: Vec2) -> bool {
        match self.grabbed.and_then(|i| self.points.get_mut(i)) {
            Some(cp) => {
                cp.position = p;
                true
            }
            None => false,
        }
    }

    pub fn translate(&mut self, delta: Vec2) {
        for cp in &mut self.points {
            cp.position += delta;
        }
    }

    /// Handle circles in world space.  `origin` is the canvas position and
    /// `zoom` keeps the handles a constant size on screen.
    pub fn overlays(&self, origin: Vec2, zoom: f32) -> Vec<Box<dyn Renderable>> {
        let zoom = zoom.max(f32::EPSILON);
        self.points
            .iter()
            .enumerate()
            .map(|(i, cp)| {
                let r = cp.radius / zoom;
                let colour = if Some(i) == self.grabbed {
                    Colour::rgba(255, 160, 0, 255)
                } else {
                    Colour::rgba(30, 144, 255, 255)
                };
                let circle = Circle::new(origin + cp.position - Vec2::splat(r), Vec2::splat(2.0 * r), colour)
                    .outlined(1.5 / zoom);
                Box::new(circle) as Box<dyn Renderable>
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_test_prefers_the_closest_point() {
        let mut cps = ControlPoints::new();
        cps.push(Vec2::new(0.0, 0.0));
        cps.push(Vec2::new(4.0, 0.0));
        assert_eq!(cps.hit_test(Vec2::new(3.0, 0.0)), Some(1));
        assert_eq!(cps.hit_test(Vec2::new(1.0, 0.0)), Some(0));
        assert_eq!(cps.hit_test(Vec2::new(20.0, 0.0)), None);
    }

    #[test]
    fn only_the_grabbed_point_moves() {
        let mut cps = ControlPoints::new();
        cps.push(Vec2::ZERO);
        cps.push(Vec2::ONE);
        assert!(!cps.drag_to(Vec2::splat(9.0)));
        cps.grab(1);
        assert!(cps.drag_to(Vec2::splat(9.0)));
        assert_eq!(cps.positions(), vec![Vec2::ZERO, Vec2::splat(9.0)]);
        cps.release();
        assert_eq!(cps.grabbed(), None);
    }
}
