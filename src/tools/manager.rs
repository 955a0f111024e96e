use glam::Vec2;

use super::options::OptionValue;
use super::{Key, PointerEvent, Tool, ToolBehaviour};
use crate::context::PaintContext;
use crate::error::{PaintError, Result};
use crate::events::AppEvent;
use crate::render::Renderable;

/// Registry of tools keyed by id, with exactly one active tool once any
/// tool has been selected.
#[derive(Default)]
pub struct ToolManager {
    tools: Vec<Tool>,
    active: Option<usize>,
    /// Colour-selection generation last forwarded to the active tool.
    seen_colours: u64,
}

impl ToolManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails on a duplicate id; the registry is left unchanged.
    pub fn register(&mut self, tool: Tool) -> Result<()> {
        if self.index_of(tool.id()).is_some() {
            return Err(PaintError::DuplicateTool(tool.id().to_string()));
        }
        log::debug!("registered tool '{}'", tool.id());
        self.tools.push(tool);
        Ok(())
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.tools.iter().map(|t| t.id())
    }

    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    pub fn tool(&self, id: &str) -> Result<&Tool> {
        self.index_of(id)
            .map(|i| &self.tools[i])
            .ok_or_else(|| PaintError::UnknownTool(id.to_string()))
    }

    pub fn active(&self) -> Option<&Tool> {
        self.active.and_then(|i| self.tools.get(i))
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active().map(|t| t.id())
    }

    /// Exit the current tool, enter the new one, then publish the change.
    /// An unknown id is an error and leaves the active tool as it was.
    pub fn set_selected_tool(&mut self, id: &str, ctx: &mut PaintContext) -> Result<()> {
        let next = self
            .index_of(id)
            .ok_or_else(|| PaintError::UnknownTool(id.to_string()))?;
        if self.active == Some(next) {
            return Ok(());
        }
        if let Some(current) = self.active.and_then(|i| self.tools.get_mut(i)) {
            current.on_exit(ctx);
        }
        self.tools[next].on_enter(ctx);
        self.active = Some(next);
        self.seen_colours = ctx.colours.generation();
        log::info!("tool changed to '{id}'");
        ctx.events.publish(AppEvent::ToolChanged(id.to_string()));
        Ok(())
    }

    pub fn get_option(&self, tool_id: &str, name: &str) -> Result<OptionValue> {
        self.tool(tool_id)?.options().get(name).cloned()
    }

    /// Set an option on any registered tool; the active tool is told about
    /// the change so it can refresh a live preview.
    pub fn set_option(
        &mut self,
        tool_id: &str,
        name: &str,
        value: OptionValue,
        ctx: &mut PaintContext,
    ) -> Result<()> {
        let index = self
            .index_of(tool_id)
            .ok_or_else(|| PaintError::UnknownTool(tool_id.to_string()))?;
        let tool = &mut self.tools[index];
        tool.options_mut().set(name, value)?;
        if self.active == Some(index) {
            tool.on_tool_option_change(ctx, name);
        }
        Ok(())
    }

    /// Commit any pending work of the active tool and start it afresh.
    pub fn commit_active(&mut self, ctx: &mut PaintContext) {
        if let Some(tool) = self.active.and_then(|i| self.tools.get_mut(i)) {
            tool.on_exit(ctx);
            tool.on_enter(ctx);
        }
    }

    pub fn on_mouse_down(&mut self, ctx: &mut PaintContext, event: &PointerEvent) {
        self.dispatch(ctx, |tool, ctx| tool.on_mouse_down(ctx, event));
    }

    pub fn on_mouse_up(&mut self, ctx: &mut PaintContext, event: &PointerEvent) {
        self.dispatch(ctx, |tool, ctx| tool.on_mouse_up(ctx, event));
    }

    pub fn on_mouse_move(&mut self, ctx: &mut PaintContext, event: &PointerEvent) {
        self.dispatch(ctx, |tool, ctx| tool.on_mouse_move(ctx, event));
    }

    pub fn on_key_press(&mut self, ctx: &mut PaintContext, key: Key) {
        self.dispatch(ctx, |tool, ctx| tool.on_key_press(ctx, key));
    }

    /// Forward colour changes made since the last event to the active tool.
    pub fn sync_colours(&mut self, ctx: &mut PaintContext) {
        let generation = ctx.colours.generation();
        if generation == self.seen_colours {
            return;
        }
        self.seen_colours = generation;
        let pair = ctx.colours.pair();
        if let Some(tool) = self.active.and_then(|i| self.tools.get_mut(i)) {
            tool.on_colour_selection_change(ctx, &pair);
        }
        ctx.events.publish(AppEvent::ColourSelectionChanged(pair));
    }

    pub fn overlays(&self, origin: Vec2, zoom: f32) -> Vec<Box<dyn Renderable>> {
        self.active()
            .map(|t| t.overlays(origin, zoom))
            .unwrap_or_default()
    }

    fn dispatch(&mut self, ctx: &mut PaintContext, f: impl FnOnce(&mut Tool, &mut PaintContext)) {
        self.sync_colours(ctx);
        if let Some(tool) = self.active.and_then(|i| self.tools.get_mut(i)) {
            f(tool, ctx);
        }
        // Handlers such as the picker change colours themselves.
        self.sync_colours(ctx);
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.tools.iter().position(|t| t.id() == id)
    }
}
