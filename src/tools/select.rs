use glam::{UVec2, Vec2};
use image::imageops;

use super::control_point::{ControlPoints, EditState};
use super::options::ToolOptions;
use super::{Key, PointerButton, PointerEvent, ToolBehaviour};
use crate::colour::Colour;
use crate::context::PaintContext;
use crate::render::primitives::{Line, Quad, Rectangle};
use crate::render::{Renderable, Texture};

/// Pixels lifted out of the committed image by a move.
struct Floating {
    texture: Texture,
    source: Vec2,
    offset: Vec2,
}

/// Rectangular selection.  Dragging inside moves the selected pixels, the
/// vacated area becomes transparent; `Delete` clears the selection.
pub struct SelectTool {
    id: String,
    options: ToolOptions,
    state: EditState,
    corners: ControlPoints,
    floating: Option<Floating>,
    drag_from: Option<Vec2>,
}

impl Default for SelectTool {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectTool {
    pub fn new() -> Self {
        Self {
            id: "select".to_string(),
            options: ToolOptions::new("select", Vec::new()),
            state: EditState::default(),
            corners: ControlPoints::new(),
            floating: None,
            drag_from: None,
        }
    }

    pub fn state(&self) -> EditState {
        self.state
    }

    /// Current selection as whole-pixel (min, size), clipped to `bounds`.
    pub fn selection(&self, bounds: UVec2) -> Option<(UVec2, UVec2)> {
        let (a, b) = (self.corners.get(0)?, self.corners.get(1)?);
        let max_xy = bounds.as_vec2();
        let min = a.min(b).round().clamp(Vec2::ZERO, max_xy);
        let max = a.max(b).round().clamp(Vec2::ZERO, max_xy);
        let size = (max - min).as_uvec2();
        (size.x > 0 && size.y > 0).then(|| (min.as_uvec2(), size))
    }

    fn contains(&self, p: Vec2) -> bool {
        let (Some(a), Some(b)) = (self.corners.get(0), self.corners.get(1)) else {
            return false;
        };
        let (min, max) = (a.min(b), a.max(b));
        p.x >= min.x && p.y >= min.y && p.x < max.x && p.y < max.y
    }

    fn contains_area(&self) -> bool {
        match (self.corners.get(0), self.corners.get(1)) {
            (Some(a), Some(b)) => (a - b).abs().min_element() > 0.0,
            _ => false,
        }
    }

    fn lift(&mut self, ctx: &mut PaintContext) {
        if self.floating.is_some() {
            return;
        }
        let Some((min, size)) = self.selection(ctx.canvas.size()) else {
            return;
        };
        let pixels = imageops::crop_imm(ctx.canvas.committed_image(), min.x, min.y, size.x, size.y).to_image();
        self.floating = Some(Floating {
            texture: Texture::from_image(pixels),
            source: min.as_vec2(),
            offset: Vec2::ZERO,
        });
    }

    fn redraw_moved(&self, ctx: &mut PaintContext) {
        let Some(f) = &self.floating else {
            return;
        };
        let size = Vec2::new(f.texture.width() as f32, f.texture.height() as f32);
        ctx.canvas.cancel_preview_canvas();
        let hole = Rectangle::new(&mut ctx.resources, f.source, size, Colour::TRANSPARENT);
        ctx.canvas.draw_on_canvas(&hole);
        let moved = Quad::new(&mut ctx.resources, f.source + f.offset, size).with_texture(f.texture.clone());
        ctx.canvas.draw_on_canvas(&moved);
    }

    fn delete_selection(&mut self, ctx: &mut PaintContext) {
        let area = match &self.floating {
            Some(f) => Some((f.source, Vec2::new(f.texture.width() as f32, f.texture.height() as f32))),
            None => self.selection(ctx.canvas.size()).map(|(m, s)| (m.as_vec2(), s.as_vec2())),
        };
        ctx.canvas.cancel_preview_canvas();
        if let Some((min, size)) = area {
            let hole = Rectangle::new(&mut ctx.resources, min, size, Colour::TRANSPARENT);
            ctx.canvas.draw_on_canvas(&hole);
            ctx.canvas.merge_preview_canvas();
        }
        self.reset();
    }

    fn begin(&mut self, at: Vec2) {
        self.corners.set_all(&[at, at]);
        self.corners.grab(1);
        self.state = EditState::WaitingForInitialRelease;
    }

    fn finish(&mut self, ctx: &mut PaintContext) {
        if self.floating.is_some() {
            ctx.canvas.merge_preview_canvas();
        } else if ctx.canvas.has_pending_preview() {
            ctx.canvas.cancel_preview_canvas();
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
        self.floating = None;
        self.drag_from = None;
    }
}

impl ToolBehaviour for SelectTool {
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
        let p = event.position;
        match (self.state, event.button) {
            (EditState::WaitingForInitialPoint, PointerButton::Primary) => self.begin(p),
            (EditState::WaitingForControlPointEditFinish, PointerButton::Primary) => {
                let handle = if self.floating.is_none() {
                    self.corners.hit_test(p)
                } else {
                    None
                };
                if let Some(i) = handle {
                    self.corners.grab(i);
                } else if self.contains(p) {
                    self.lift(ctx);
                    self.drag_from = Some(p);
                } else {
                    self.finish(ctx);
                    self.begin(p);
                }
            }
            (EditState::WaitingForInitialPoint, _) => {}
            (_, PointerButton::Secondary) => self.finish(ctx),
            _ => {}
        }
    }

    fn on_mouse_move(&mut self, ctx: &mut PaintContext, event: &PointerEvent) {
        if self.corners.drag_to(event.position) {
            return;
        }
        let Some(from) = self.drag_from else {
            return;
        };
        let delta = event.position - from;
        self.drag_from = Some(event.position);
        self.corners.translate(delta);
        if let Some(f) = &mut self.floating {
            f.offset += delta;
        }
        self.redraw_moved(ctx);
    }

    fn on_mouse_up(&mut self, _ctx: &mut PaintContext, _event: &PointerEvent) {
        if self.state == EditState::WaitingForInitialRelease {
            self.state = if self.contains_area() {
                EditState::WaitingForControlPointEditFinish
            } else {
                self.corners.clear();
                EditState::WaitingForInitialPoint
            };
        }
        self.corners.release();
        self.drag_from = None;
    }

    fn on_key_press(&mut self, ctx: &mut PaintContext, key: Key) {
        match (self.state, key) {
            (EditState::WaitingForInitialPoint, _) => {}
            (_, Key::Delete) => self.delete_selection(ctx),
            (_, Key::Enter) => self.finish(ctx),
            (_, Key::Escape) => self.cancel(ctx),
            _ => {}
        }
    }

    fn overlays(&self, origin: Vec2, zoom: f32) -> Vec<Box<dyn Renderable>> {
        let (Some(a), Some(b)) = (self.corners.get(0), self.corners.get(1)) else {
            return Vec::new();
        };
        let zoom = zoom.max(f32::EPSILON);
        let (min, max) = (origin + a.min(b), origin + a.max(b));
        let outline = Line::new(
            vec![min, Vec2::new(max.x, min.y), max, Vec2::new(min.x, max.y)],
            1.0 / zoom,
            Colour::rgba(30, 144, 255, 255),
        )
        .closed(true);
        let mut out: Vec<Box<dyn Renderable>> = vec![Box::new(outline)];
        if self.floating.is_none() {
            out.extend(self.corners.overlays(origin, zoom));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx_with_block(canvas: u32, block: u32) -> PaintContext {
        let mut ctx = match PaintContext::new(canvas, canvas, Colour::WHITE) {
            Ok(c) => c,
            Err(e) => panic!("{e}"),
        };
        let mut img = ctx.canvas.get_canvas_image();
        for y in 0..block {
            for x in 0..block {
                img.put_pixel(x, y, Colour::BLACK.into());
            }
        }
        ctx.canvas.draw_fullscreen_texture_on_canvas(&Texture::from_image(img));
        ctx
    }

    fn ev(x: f32, y: f32) -> PointerEvent {
        PointerEvent::new(Vec2::new(x, y), PointerButton::Primary)
    }

    fn select(tool: &mut SelectTool, ctx: &mut PaintContext, to: f32) {
        tool.on_mouse_down(ctx, &ev(0.0, 0.0));
        tool.on_mouse_move(ctx, &ev(to, to));
        tool.on_mouse_up(ctx, &ev(to, to));
    }

    #[test]
    fn selecting_alone_leaves_canvas_untouched() {
        let mut ctx = ctx_with_block(10, 2);
        let before = ctx.canvas.get_canvas_image();
        let mut tool = SelectTool::new();
        select(&mut tool, &mut ctx, 2.0);
        assert_eq!(tool.state(), EditState::WaitingForControlPointEditFinish);
        assert_eq!(tool.selection(ctx.canvas.size()), Some((UVec2::ZERO, UVec2::splat(2))));
        tool.on_exit(&mut ctx);
        tool.on_exit(&mut ctx);
        assert_eq!(ctx.canvas.get_canvas_image(), before);
    }

    #[test]
    fn moving_selection_carries_pixels() {
        let mut ctx = ctx_with_block(32, 16);
        let mut tool = SelectTool::new();
        select(&mut tool, &mut ctx, 16.0);
        // Far enough from both corners to grab the body, not a handle.
        tool.on_mouse_down(&mut ctx, &ev(8.0, 8.0));
        tool.on_mouse_move(&mut ctx, &ev(18.0, 12.0));
        tool.on_mouse_up(&mut ctx, &ev(18.0, 12.0));
        tool.on_key_press(&mut ctx, Key::Enter);
        let c = &ctx.canvas;
        assert!(!c.has_pending_preview());
        assert_eq!(c.get_colour_at(12.0, 6.0).ok(), Some(Colour::BLACK));
        assert_eq!(c.get_colour_at(25.0, 19.0).ok(), Some(Colour::BLACK));
        assert_eq!(c.get_colour_at(5.0, 2.0).ok(), Some(Colour::TRANSPARENT));
        assert_eq!(c.get_colour_at(26.0, 20.0).ok(), Some(Colour::WHITE));
    }

    #[test]
    fn delete_clears_selected_pixels() {
        let mut ctx = ctx_with_block(10, 2);
        let mut tool = SelectTool::new();
        select(&mut tool, &mut ctx, 2.0);
        tool.on_key_press(&mut ctx, Key::Delete);
        assert_eq!(tool.state(), EditState::WaitingForInitialPoint);
        assert_eq!(ctx.canvas.get_colour_at(1.0, 1.0).ok(), Some(Colour::TRANSPARENT));
        assert_eq!(ctx.canvas.get_colour_at(2.0, 2.0).ok(), Some(Colour::WHITE));
    }
}
