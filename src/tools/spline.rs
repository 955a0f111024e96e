use glam::Vec2;

use super::control_point::{ControlPoints, EditState};
use super::options::{OptionSpec, ToolOptions};
use super::{Key, PointerButton, PointerEvent, ToolBehaviour};
use crate::colour::{Colour, ColourPair};
use crate::context::PaintContext;
use crate::render::primitives::Line;
use crate::render::Renderable;

/// Samples per visible cubic segment.
pub const SEGMENT_STEPS: usize = 32;

/// Catmull-Rom position on the segment between `p[1]` and `p[2]`.
pub fn catmull_rom(p: [Vec2; 4], t: f32) -> Vec2 {
    let t2 = t * t;
    let t3 = t2 * t;
    let q0 = -t3 + 2.0 * t2 - t;
    let q1 = 3.0 * t3 - 5.0 * t2 + 2.0;
    let q2 = -3.0 * t3 + 4.0 * t2 + t;
    let q3 = t3 - t2;
    0.5 * (p[0] * q0 + p[1] * q1 + p[2] * q2 + p[3] * q3)
}

/// Polyline through every window of four control points.  N points give
/// N - 3 segments; fewer than four give a straight path through the points.
pub fn spline_polyline(points: &[Vec2], steps: usize) -> Vec<Vec2> {
    if points.len() < 4 {
        return points.to_vec();
    }
    let steps = steps.max(1);
    let mut out = Vec::with_capacity((points.len() - 3) * steps + 1);
    for (i, w) in points.windows(4).enumerate() {
        let window = [w[0], w[1], w[2], w[3]];
        let first = if i == 0 { 0 } else { 1 };
        for s in first..=steps {
            out.push(catmull_rom(window, s as f32 / steps as f32));
        }
    }
    out
}

/// Turn the initial drag A→B into four control points by splitting at the
/// midpoint and then at each half's midpoint: [A, M1, M2, B].
pub fn initial_control_points(a: Vec2, b: Vec2) -> [Vec2; 4] {
    let mid = a.lerp(b, 0.5);
    [a, a.lerp(mid, 0.5), mid.lerp(b, 0.5), b]
}

pub struct SplineTool {
    id: String,
    options: ToolOptions,
    state: EditState,
    points: ControlPoints,
    colour: Colour,
}

impl SplineTool {
    pub fn new(thickness: f32) -> Self {
        Self {
            id: "spline".to_string(),
            options: ToolOptions::new("spline", vec![OptionSpec::number("thickness", thickness, 1.0, 256.0)]),
            state: EditState::default(),
            points: ControlPoints::new(),
            colour: Colour::BLACK,
        }
    }

    pub fn state(&self) -> EditState {
        self.state
    }

    pub fn control_points(&self) -> Vec<Vec2> {
        self.points.positions()
    }

    fn redraw(&self, ctx: &mut PaintContext) {
        ctx.canvas.cancel_preview_canvas();
        let path = spline_polyline(&self.points.positions(), SEGMENT_STEPS);
        if path.is_empty() {
            return;
        }
        let line = Line::new(path, self.options.number_or("thickness", 1.0), self.colour);
        ctx.canvas.draw_on_canvas(&line);
    }

    fn finish(&mut self, ctx: &mut PaintContext) {
        if self.state != EditState::WaitingForInitialPoint && ctx.canvas.has_pending_preview() {
            ctx.canvas.merge_preview_canvas();
        }
        self.reset();
    }

    fn cancel(&mut self, ctx: &mut PaintContext) {
        if self.state != EditState::WaitingForInitialPoint {
            ctx.canvas.cancel_preview_canvas();
        }
        self.reset();
    }

    fn reset(&mut self) {
        self.state = EditState::WaitingForInitialPoint;
        self.points.clear();
    }

    fn begin(&mut self, ctx: &mut PaintContext, at: Vec2) {
        self.colour = ctx.colours.primary();
        self.points.set_all(&[at, at]);
        self.points.grab(1);
        self.state = EditState::WaitingForInitialRelease;
        self.redraw(ctx);
    }
}

impl ToolBehaviour for SplineTool {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: &str) {
        self.id = id.to_string();
        self.options.set_owner(id);
    }

    fn options(&self) -> &ToolOptions {
        &self.options
    }

    fn options_mut(&mut self) -> &mut ToolOptions {
        &mut self.options
    }

    fn tracks_outside_canvas(&self) -> bool {
        true
    }

    fn brush_diameter(&self) -> Option<f32> {
        Some(self.options.number_or("thickness", 1.0))
    }

    fn on_exit(&mut self, ctx: &mut PaintContext) {
        self.finish(ctx);
    }

    fn on_mouse_down(&mut self, ctx: &mut PaintContext, event: &PointerEvent) {
        match (self.state, event.button) {
            (EditState::WaitingForInitialPoint, PointerButton::Primary) => self.begin(ctx, event.position),
            (EditState::WaitingForControlPointEditFinish, PointerButton::Primary) => {
                match self.points.hit_test(event.position) {
                    Some(i) => self.points.grab(i),
                    None => {
                        let i = self.points.push(event.position);
                        self.points.grab(i);
                        self.redraw(ctx);
                    }
                }
            }
            (EditState::WaitingForInitialPoint, _) => {}
            (_, PointerButton::Secondary) => self.finish(ctx),
            _ => {}
        }
    }

    fn on_mouse_move(&mut self, ctx: &mut PaintContext, event: &PointerEvent) {
        if self.points.drag_to(event.position) {
            self.redraw(ctx);
        }
    }

    fn on_mouse_up(&mut self, ctx: &mut PaintContext, _event: &PointerEvent) {
        match self.state {
            EditState::WaitingForInitialRelease => {
                let (Some(a), Some(b)) = (self.points.get(0), self.points.get(1)) else {
                    self.reset();
                    return;
                };
                self.points.set_all(&initial_control_points(a, b));
                self.state = EditState::WaitingForControlPointEditFinish;
                self.redraw(ctx);
            }
            EditState::WaitingForControlPointEditFinish => self.points.release(),
            EditState::WaitingForInitialPoint => {}
        }
    }

    fn on_key_press(&mut self, ctx: &mut PaintContext, key: Key) {
        match key {
            Key::Enter => self.finish(ctx),
            Key::Escape => self.cancel(ctx),
            _ => {}
        }
    }

    fn on_tool_option_change(&mut self, ctx: &mut PaintContext, _name: &str) {
        if self.state != EditState::WaitingForInitialPoint {
            self.redraw(ctx);
        }
    }

    fn on_colour_selection_change(&mut self, ctx: &mut PaintContext, colours: &ColourPair) {
        if self.state != EditState::WaitingForInitialPoint {
            self.colour = colours.primary;
            self.redraw(ctx);
        }
    }

    fn overlays(&self, origin: Vec2, zoom: f32) -> Vec<Box<dyn Renderable>> {
        self.points.overlays(origin, zoom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec2, b: Vec2) -> bool {
        a.distance(b) < 1e-4
    }

    #[test]
    fn catmull_rom_hits_inner_points_at_ends() {
        let p = [
            Vec2::new(-3.0, 7.0),
            Vec2::new(1.0, 2.0),
            Vec2::new(5.0, -4.0),
            Vec2::new(11.0, 0.5),
        ];
        assert!(close(catmull_rom(p, 0.0), p[1]));
        assert!(close(catmull_rom(p, 1.0), p[2]));
    }

    #[test]
    fn n_points_give_n_minus_three_segments() {
        let pts: Vec<Vec2> = (0..6).map(|i| Vec2::new(i as f32, 0.0)).collect();
        let path = spline_polyline(&pts, 8);
        assert_eq!(path.len(), 3 * 8 + 1);
        assert!(close(path[0], pts[1]));
        assert!(close(*path.last().unwrap_or(&Vec2::NAN), pts[4]));
    }

    #[test]
    fn initial_drag_derives_quarter_points() {
        let [a, m1, m2, b] = initial_control_points(Vec2::ZERO, Vec2::new(8.0, 0.0));
        assert_eq!((a, m1, m2, b), (Vec2::ZERO, Vec2::new(2.0, 0.0), Vec2::new(6.0, 0.0), Vec2::new(8.0, 0.0)));
    }

    #[test]
    fn second_exit_changes_nothing() {
        let mut ctx = match PaintContext::new(20, 20, Colour::WHITE) {
            Ok(c) => c,
            Err(e) => panic!("{e}"),
        };
        let mut tool = SplineTool::new(2.0);
        let at = |x: f32| PointerEvent::new(Vec2::new(x, 10.0), PointerButton::Primary);
        tool.on_mouse_down(&mut ctx, &at(2.0));
        tool.on_mouse_move(&mut ctx, &at(18.0));
        tool.on_mouse_up(&mut ctx, &at(18.0));
        assert_eq!(tool.state(), EditState::WaitingForControlPointEditFinish);

        tool.on_exit(&mut ctx);
        let once = ctx.canvas.get_canvas_image();
        assert_eq!(ctx.canvas.get_colour_at(10.0, 10.0).ok(), Some(Colour::BLACK));
        tool.on_exit(&mut ctx);
        assert_eq!(ctx.canvas.get_canvas_image(), once);
        assert!(!ctx.canvas.has_pending_preview());
        assert_eq!(tool.state(), EditState::WaitingForInitialPoint);
    }
}
