use super::options::ToolOptions;
use super::{PointerButton, PointerEvent, ToolBehaviour};
use crate::colour::ColourSlot;
use crate::context::PaintContext;

/// Samples the committed canvas into the primary (or, with the secondary
/// button, the secondary) colour.
pub struct PickerTool {
    id: String,
    options: ToolOptions,
}

impl Default for PickerTool {
    fn default() -> Self {
        Self::new()
    }
}

impl PickerTool {
    pub fn new() -> Self {
        Self {
            id: "picker".to_string(),
            options: ToolOptions::new("picker", Vec::new()),
        }
    }
}

impl ToolBehaviour for PickerTool {
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
        match ctx.canvas.get_colour_at(event.position.x, event.position.y) {
            Ok(colour) => ctx.colours.set(slot, colour),
            Err(e) => log::warn!("colour pick ignored: {e}"),
        }
    }
}
