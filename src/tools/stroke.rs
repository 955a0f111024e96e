use glam::Vec2;

use super::options::{OptionSpec, ToolOptions};
use super::{PointerButton, PointerEvent, ToolBehaviour};
use crate::colour::Colour;
use crate::context::PaintContext;
use crate::render::primitives::Line;

/// Points re-rendered on each move.  Overlapping the previous segment keeps
/// joints continuous without re-tessellating the whole stroke.
pub const RECENT_POINTS: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrokeMode {
    Paint,
    Erase,
}

/// Freehand stroke: the pen paints the primary colour, the eraser paints
/// full transparency (the canvas replaces rather than blends).
pub struct StrokeTool {
    id: String,
    mode: StrokeMode,
    options: ToolOptions,
    drawing: bool,
    points: Vec<Vec2>,
    colour: Colour,
}

impl StrokeTool {
    pub fn new(mode: StrokeMode, thickness: f32) -> Self {
        let id = match mode {
            StrokeMode::Paint => "pen",
            StrokeMode::Erase => "eraser",
        };
        Self {
            id: id.to_string(),
            mode,
            options: ToolOptions::new(id, vec![OptionSpec::number("thickness", thickness, 1.0, 256.0)]),
            drawing: false,
            points: Vec::with_capacity(RECENT_POINTS + 1),
            colour: Colour::BLACK,
        }
    }

    pub fn mode(&self) -> StrokeMode {
        self.mode
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    fn thickness(&self) -> f32 {
        self.options.number_or("thickness", 1.0)
    }

    fn render_recent(&self, ctx: &mut PaintContext) {
        let line = Line::new(self.points.clone(), self.thickness(), self.colour);
        ctx.canvas.draw_on_canvas(&line);
    }

    fn finish(&mut self, ctx: &mut PaintContext) {
        if self.drawing {
            ctx.canvas.merge_preview_canvas();
        }
        self.drawing = false;
        self.points.clear();
    }
}

impl ToolBehaviour for StrokeTool {
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

    fn brush_diameter(&self) -> Option<f32> {
        Some(self.thickness())
    }

    fn on_exit(&mut self, ctx: &mut PaintContext) {
        self.finish(ctx);
    }

    fn on_mouse_down(&mut self, ctx: &mut PaintContext, event: &PointerEvent) {
        if event.button != PointerButton::Primary {
            return;
        }
        self.colour = match self.mode {
            StrokeMode::Paint => ctx.colours.primary(),
            StrokeMode::Erase => Colour::TRANSPARENT,
        };
        self.drawing = true;
        self.points.clear();
        self.points.push(event.position);
        self.render_recent(ctx);
    }

    fn on_mouse_move(&mut self, ctx: &mut PaintContext, event: &PointerEvent) {
        if !self.drawing {
            return;
        }
        self.points.push(event.position);
        if self.points.len() > RECENT_POINTS {
            let excess = self.points.len() - RECENT_POINTS;
            self.points.drain(..excess);
        }
        self.render_recent(ctx);
    }

    fn on_mouse_up(&mut self, ctx: &mut PaintContext, event: &PointerEvent) {
        if event.button == PointerButton::Primary {
            self.finish(ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> PaintContext {
        match PaintContext::new(16, 16, Colour::WHITE) {
            Ok(c) => c,
            Err(e) => panic!("{e}"),
        }
    }

    fn press(x: f32, y: f32) -> PointerEvent {
        PointerEvent::new(Vec2::new(x, y), PointerButton::Primary)
    }

    #[test]
    fn stroke_commits_on_release() {
        let mut ctx = ctx();
        let mut pen = StrokeTool::new(StrokeMode::Paint, 2.0);
        pen.on_mouse_down(&mut ctx, &press(2.0, 8.0));
        for x in 3..14 {
            pen.on_mouse_move(&mut ctx, &press(x as f32, 8.0));
        }
        assert_eq!(ctx.canvas.get_colour_at(8.0, 8.0).ok(), Some(Colour::WHITE));
        pen.on_mouse_up(&mut ctx, &press(13.0, 8.0));
        assert!(!pen.is_drawing());
        assert!(!ctx.canvas.has_pending_preview());
        // No gaps between the re-rendered windows.
        for x in 2..13 {
            assert_eq!(ctx.canvas.get_colour_at(x as f32 + 0.5, 8.0).ok(), Some(Colour::BLACK), "x={x}");
        }
    }

    #[test]
    fn eraser_clears_to_transparent() {
        let mut ctx = ctx();
        let mut eraser = StrokeTool::new(StrokeMode::Erase, 4.0);
        eraser.on_mouse_down(&mut ctx, &press(8.0, 8.0));
        eraser.on_mouse_up(&mut ctx, &press(8.0, 8.0));
        assert_eq!(ctx.canvas.get_colour_at(8.0, 8.0).ok(), Some(Colour::TRANSPARENT));
        assert_eq!(ctx.canvas.get_colour_at(0.0, 0.0).ok(), Some(Colour::WHITE));
    }

    #[test]
    fn exit_mid_stroke_commits_once() {
        let mut ctx = ctx();
        let mut pen = StrokeTool::new(StrokeMode::Paint, 2.0);
        pen.on_mouse_down(&mut ctx, &press(4.0, 4.0));
        pen.on_exit(&mut ctx);
        let once = ctx.canvas.get_canvas_image();
        pen.on_exit(&mut ctx);
        assert_eq!(ctx.canvas.get_canvas_image(), once);
        assert_eq!(ctx.canvas.get_colour_at(4.0, 4.0).ok(), Some(Colour::BLACK));
    }
}
