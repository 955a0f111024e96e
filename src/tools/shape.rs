use glam::Vec2;

use super::control_point::{ControlPoints, EditState};
use super::options::{OptionSpec, ToolOptions};
use super::{Key, PointerButton, PointerEvent, ToolBehaviour};
use crate::colour::{Colour, ColourPair};
use crate::context::PaintContext;
use crate::render::primitives::{Circle, Rectangle};
use crate::render::Renderable;

pub const SHAPES: &[&str] = &["rectangle", "ellipse"];

/// Two-corner rectangle/ellipse placement with editable corners.
pub struct ShapeTool {
    id: String,
    options: ToolOptions,
    state: EditState,
    corners: ControlPoints,
    colour: Colour,
}

impl ShapeTool {
    pub fn new(thickness: f32) -> Self {
        Self {
            id: "shape".to_string(),
            options: ToolOptions::new(
                "shape",
                vec![
                    OptionSpec::choice("shape", "rectangle", SHAPES),
                    OptionSpec::flag("outlined", true),
                    OptionSpec::number("thickness", thickness, 1.0, 256.0),
                ],
            ),
            state: EditState::default(),
            corners: ControlPoints::new(),
            colour: Colour::BLACK,
        }
    }

    pub fn state(&self) -> EditState {
        self.state
    }

    fn redraw(&self, ctx: &mut PaintContext) {
        ctx.canvas.cancel_preview_canvas();
        let (Some(a), Some(b)) = (self.corners.get(0), self.corners.get(1)) else {
            return;
        };
        let outlined = self.options.flag_or("outlined", true);
        let thickness = self.options.number_or("thickness", 1.0);
        match self.options.str_or("shape", "rectangle") {
            "ellipse" => {
                let mut ellipse = Circle::new(a.min(b), (a - b).abs(), self.colour);
                if outlined {
                    ellipse = ellipse.outlined(thickness);
                }
                ctx.canvas.draw_on_canvas(&ellipse);
            }
            _ => {
                let mut rect = Rectangle::new(&mut ctx.resources, a.min(b), (a - b).abs(), self.colour);
                if outlined {
                    rect = rect.outlined(thickness);
                }
                ctx.canvas.draw_on_canvas(&rect);
            }
        }
    }

    fn begin(&mut self, ctx: &mut PaintContext, at: Vec2) {
        self.colour = ctx.colours.primary();
        self.corners.set_all(&[at, at]);
        self.corners.grab(1);
        self.state = EditState::WaitingForInitialRelease;
        self.redraw(ctx);
    }

    fn finish(&mut self, ctx: &mut PaintContext) {
        if self.state != EditState::WaitingForInitialPoint {
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
        self.corners.clear();
    }
}

impl ToolBehaviour for ShapeTool {
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

    fn on_exit(&mut self, ctx: &mut PaintContext) {
        self.finish(ctx);
    }

    fn on_mouse_down(&mut self, ctx: &mut PaintContext, event: &PointerEvent) {
        match (self.state, event.button) {
            (EditState::WaitingForInitialPoint, PointerButton::Primary) => self.begin(ctx, event.position),
            (EditState::WaitingForControlPointEditFinish, PointerButton::Primary) => {
                match self.corners.hit_test(event.position) {
                    Some(i) => self.corners.grab(i),
                    None => {
                        self.finish(ctx);
                        self.begin(ctx, event.position);
                    }
                }
            }
            (EditState::WaitingForInitialPoint, _) => {}
            (_, PointerButton::Secondary) => self.finish(ctx),
            _ => {}
        }
    }

    fn on_mouse_move(&mut self, ctx: &mut PaintContext, event: &PointerEvent) {
        if self.corners.drag_to(event.position) {
            self.redraw(ctx);
        }
    }

    fn on_mouse_up(&mut self, _ctx: &mut PaintContext, _event: &PointerEvent) {
        if self.state == EditState::WaitingForInitialRelease {
            self.state = EditState::WaitingForControlPointEditFinish;
        }
        self.corners.release();
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
        self.corners.overlays(origin, zoom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::options::OptionValue;

    fn ctx() -> PaintContext {
        match PaintContext::new(20, 20, Colour::WHITE) {
            Ok(c) => c,
            Err(e) => panic!("{e}"),
        }
    }

    fn ev(x: f32, y: f32, button: PointerButton) -> PointerEvent {
        PointerEvent::new(Vec2::new(x, y), button)
    }

    fn filled_shape() -> ShapeTool {
        let mut tool = ShapeTool::new(2.0);
        assert!(tool.options_mut().set("outlined", OptionValue::Flag(false)).is_ok());
        tool
    }

    #[test]
    fn drag_previews_then_right_click_commits() {
        let mut ctx = ctx();
        let mut tool = filled_shape();
        tool.on_mouse_down(&mut ctx, &ev(2.0, 2.0, PointerButton::Primary));
        tool.on_mouse_move(&mut ctx, &ev(10.0, 10.0, PointerButton::Primary));
        tool.on_mouse_up(&mut ctx, &ev(10.0, 10.0, PointerButton::Primary));
        assert_eq!(tool.state(), EditState::WaitingForControlPointEditFinish);
        assert!(ctx.canvas.has_pending_preview());
        assert_eq!(ctx.canvas.get_colour_at(5.0, 5.0).ok(), Some(Colour::WHITE));

        // Grab the far corner and shrink the shape.
        tool.on_mouse_down(&mut ctx, &ev(10.0, 10.0, PointerButton::Primary));
        tool.on_mouse_move(&mut ctx, &ev(6.0, 6.0, PointerButton::Primary));
        tool.on_mouse_up(&mut ctx, &ev(6.0, 6.0, PointerButton::Primary));

        tool.on_mouse_down(&mut ctx, &ev(0.0, 0.0, PointerButton::Secondary));
        assert_eq!(tool.state(), EditState::WaitingForInitialPoint);
        assert_eq!(ctx.canvas.get_colour_at(5.0, 5.0).ok(), Some(Colour::BLACK));
        assert_eq!(ctx.canvas.get_colour_at(8.0, 8.0).ok(), Some(Colour::WHITE));
    }

    #[test]
    fn escape_discards_the_shape() {
        let mut ctx = ctx();
        let before = ctx.canvas.get_canvas_image();
        let mut tool = filled_shape();
        tool.on_mouse_down(&mut ctx, &ev(1.0, 1.0, PointerButton::Primary));
        tool.on_mouse_move(&mut ctx, &ev(9.0, 9.0, PointerButton::Primary));
        tool.on_key_press(&mut ctx, Key::Escape);
        assert!(!ctx.canvas.has_pending_preview());
        assert_eq!(ctx.canvas.get_canvas_image(), before);
        assert_eq!(ctx.canvas.preview_texture().image(), &before);
    }

    #[test]
    fn clicking_away_commits_and_starts_again() {
        let mut ctx = ctx();
        let mut tool = filled_shape();
        tool.on_mouse_down(&mut ctx, &ev(0.0, 0.0, PointerButton::Primary));
        tool.on_mouse_move(&mut ctx, &ev(4.0, 4.0, PointerButton::Primary));
        tool.on_mouse_up(&mut ctx, &ev(4.0, 4.0, PointerButton::Primary));
        tool.on_mouse_down(&mut ctx, &ev(15.0, 15.0, PointerButton::Primary));
        assert_eq!(tool.state(), EditState::WaitingForInitialRelease);
        assert_eq!(ctx.canvas.get_colour_at(2.0, 2.0).ok(), Some(Colour::BLACK));
    }

    #[test]
    fn second_exit_changes_nothing() {
        let mut ctx = ctx();
        let mut tool = filled_shape();
        tool.on_mouse_down(&mut ctx, &ev(3.0, 3.0, PointerButton::Primary));
        tool.on_mouse_move(&mut ctx, &ev(12.0, 12.0, PointerButton::Primary));
        tool.on_mouse_up(&mut ctx, &ev(12.0, 12.0, PointerButton::Primary));

        tool.on_exit(&mut ctx);
        let once = ctx.canvas.get_canvas_image();
        assert_eq!(ctx.canvas.get_colour_at(7.0, 7.0).ok(), Some(Colour::BLACK));
        tool.on_exit(&mut ctx);
        assert_eq!(ctx.canvas.get_canvas_image(), once);
        assert!(!ctx.canvas.has_pending_preview());
        assert_eq!(tool.state(), EditState::WaitingForInitialPoint);
    }
}
