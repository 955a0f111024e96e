use super::options::{OptionSpec, ToolOptions};
use super::{PointerButton, PointerEvent, ToolBehaviour};
use crate::colour::ColourSlot;
use crate::context::PaintContext;
use crate::ops::flood_fill;
use crate::render::Texture;

/// Single-shot bucket fill.  Primary button fills with the primary colour,
/// secondary with the secondary colour.
pub struct FillTool {
    id: String,
    options: ToolOptions,
}

impl Default for FillTool {
    fn default() -> Self {
        Self::new()
    }
}

impl FillTool {
    pub fn new() -> Self {
        Self {
            id: "fill".to_string(),
            options: ToolOptions::new("fill", vec![OptionSpec::number("tolerance", 0.0, 0.0, 255.0)]),
        }
    }
}

impl ToolBehaviour for FillTool {
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

    fn on_mouse_down(&mut self, ctx: &mut PaintContext, event: &PointerEvent) {
        let slot = match event.button {
            PointerButton::Primary => ColourSlot::Primary,
            PointerButton::Secondary => ColourSlot::Secondary,
            PointerButton::Middle => return,
        };
        let p = event.position.floor();
        if p.x < 0.0 || p.y < 0.0 {
            return;
        }
        let tolerance = self.options.number_or("tolerance", 0.0).round() as u8;
        let colour = ctx.colours.get(slot);
        let filled = flood_fill(
            ctx.canvas.committed_image(),
            p.x as u32,
            p.y as u32,
            colour.into(),
            tolerance,
        );
        if let Some(image) = filled {
            log::debug!("fill at ({}, {}) with {colour:?}", p.x, p.y);
            ctx.canvas.draw_fullscreen_texture_on_canvas(&Texture::from_image(image));
        }
    }
}
