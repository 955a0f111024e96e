// ============================================================================
// TOOLS - interactive state machines that mutate the canvas
// ============================================================================
//
// Architecture:
//   options.rs       - typed per-tool option sets
//   control_point.rs - draggable handles + the three-state edit machine
//   stroke.rs        - pen and eraser
//   spline.rs        - Catmull-Rom curve through editable points
//   shape.rs         - rectangle / ellipse
//   select.rs        - rectangular selection, move and delete
//   fill.rs          - flood fill
//   picker.rs        - colour sampling
//   manager.rs       - registry + active tool + event routing
//
// Pointer positions handed to tools are canvas-local pixels.
// ============================================================================

pub mod control_point;
pub mod fill;
pub mod manager;
pub mod options;
pub mod picker;
pub mod select;
pub mod shape;
pub mod spline;
pub mod stroke;

use glam::Vec2;

use crate::colour::ColourPair;
use crate::context::PaintContext;
use crate::render::Renderable;

pub use control_point::{ControlPoint, ControlPoints, EditState};
pub use fill::FillTool;
pub use manager::ToolManager;
pub use options::{OptionChange, OptionSpec, OptionValue, ToolOptions};
pub use picker::PickerTool;
pub use select::SelectTool;
pub use shape::ShapeTool;
pub use spline::SplineTool;
pub use stroke::{StrokeMode, StrokeTool};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
    /// Canvas-local position in pixels.
    pub position: Vec2,
    pub button: PointerButton,
}

impl PointerEvent {
    pub fn new(position: Vec2, button: PointerButton) -> Self {
        Self { position, button }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Enter,
    Escape,
    Delete,
    Backspace,
    Other,
}

/// Handlers every tool variant may react to.  All event handlers default to
/// doing nothing.
pub trait ToolBehaviour {
    fn id(&self) -> &str;

    fn set_id(&mut self, id: &str);

    fn options(&self) -> &ToolOptions;

    fn options_mut(&mut self) -> &mut ToolOptions;

    /// Whether pointer presses and moves outside the canvas still reach the
    /// tool.  Releases are always delivered.
    fn tracks_outside_canvas(&self) -> bool {
        false
    }

    /// Diameter of the brush cursor, if the tool has one.
    fn brush_diameter(&self) -> Option<f32> {
        None
    }

    fn on_enter(&mut self, _ctx: &mut PaintContext) {}

    /// Must leave the canvas without a pending preview.  Calling it again
    /// changes nothing.
    fn on_exit(&mut self, _ctx: &mut PaintContext) {}

    fn on_mouse_down(&mut self, _ctx: &mut PaintContext, _event: &PointerEvent) {}

    fn on_mouse_up(&mut self, _ctx: &mut PaintContext, _event: &PointerEvent) {}

    fn on_mouse_move(&mut self, _ctx: &mut PaintContext, _event: &PointerEvent) {}

    fn on_key_press(&mut self, _ctx: &mut PaintContext, _key: Key) {}

    fn on_tool_option_change(&mut self, _ctx: &mut PaintContext, _name: &str) {}

    fn on_colour_selection_change(&mut self, _ctx: &mut PaintContext, _colours: &ColourPair) {}

    /// World-space helpers drawn over the canvas (never into it).
    fn overlays(&self, _origin: Vec2, _zoom: f32) -> Vec<Box<dyn Renderable>> {
        Vec::new()
    }
}

/// The closed set of tools.
pub enum Tool {
    Pen(StrokeTool),
    Eraser(StrokeTool),
    Spline(SplineTool),
    Shape(ShapeTool),
    Select(SelectTool),
    Fill(FillTool),
    Picker(PickerTool),
}

impl Tool {
    pub fn pen(thickness: f32) -> Self {
        Tool::Pen(StrokeTool::new(StrokeMode::Paint, thickness))
    }

    pub fn eraser(thickness: f32) -> Self {
        Tool::Eraser(StrokeTool::new(StrokeMode::Erase, thickness))
    }

    pub fn spline(thickness: f32) -> Self {
        Tool::Spline(SplineTool::new(thickness))
    }

    pub fn shape(thickness: f32) -> Self {
        Tool::Shape(ShapeTool::new(thickness))
    }

    pub fn select() -> Self {
        Tool::Select(SelectTool::new())
    }

    pub fn fill() -> Self {
        Tool::Fill(FillTool::new())
    }

    pub fn picker() -> Self {
        Tool::Picker(PickerTool::new())
    }

    /// One of each tool under its default id.
    pub fn defaults(thickness: f32) -> Vec<Tool> {
        vec![
            Tool::pen(thickness),
            Tool::eraser(thickness),
            Tool::spline(thickness),
            Tool::shape(thickness),
            Tool::select(),
            Tool::fill(),
            Tool::picker(),
        ]
    }

    /// Register under a different id.
    pub fn with_id(mut self, id: &str) -> Self {
        self.behaviour_mut().set_id(id);
        self
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tool::Pen(_) => "Pen",
            Tool::Eraser(_) => "Eraser",
            Tool::Spline(_) => "Spline",
            Tool::Shape(_) => "Shape",
            Tool::Select(_) => "Select",
            Tool::Fill(_) => "Fill",
            Tool::Picker(_) => "Picker",
        }
    }

    fn behaviour(&self) -> &dyn ToolBehaviour {
        match self {
            Tool::Pen(t) | Tool::Eraser(t) => t,
            Tool::Spline(t) => t,
            Tool::Shape(t) => t,
            Tool::Select(t) => t,
            Tool::Fill(t) => t,
            Tool::Picker(t) => t,
        }
    }

    fn behaviour_mut(&mut self) -> &mut dyn ToolBehaviour {
        match self {
            Tool::Pen(t) | Tool::Eraser(t) => t,
            Tool::Spline(t) => t,
            Tool::Shape(t) => t,
            Tool::Select(t) => t,
            Tool::Fill(t) => t,
            Tool::Picker(t) => t,
        }
    }
}

impl ToolBehaviour for Tool {
    fn id(&self) -> &str {
        self.behaviour().id()
    }

    fn set_id(&mut self, id: &str) {
        self.behaviour_mut().set_id(id)
    }

    fn options(&self) -> &ToolOptions {
        self.behaviour().options()
    }

    fn options_mut(&mut self) -> &mut ToolOptions {
        self.behaviour_mut().options_mut()
    }

    fn tracks_outside_canvas(&self) -> bool {
        self.behaviour().tracks_outside_canvas()
    }

    fn brush_diameter(&self) -> Option<f32> {
        self.behaviour().brush_diameter()
    }

    fn on_enter(&mut self, ctx: &mut PaintContext) {
        self.behaviour_mut().on_enter(ctx)
    }

    fn on_exit(&mut self, ctx: &mut PaintContext) {
        self.behaviour_mut().on_exit(ctx)
    }

    fn on_mouse_down(&mut self, ctx: &mut PaintContext, event: &PointerEvent) {
        self.behaviour_mut().on_mouse_down(ctx, event)
    }

    fn on_mouse_up(&mut self, ctx: &mut PaintContext, event: &PointerEvent) {
        self.behaviour_mut().on_mouse_up(ctx, event)
    }

    fn on_mouse_move(&mut self, ctx: &mut PaintContext, event: &PointerEvent) {
        self.behaviour_mut().on_mouse_move(ctx, event)
    }

    fn on_key_press(&mut self, ctx: &mut PaintContext, key: Key) {
        self.behaviour_mut().on_key_press(ctx, key)
    }

    fn on_tool_option_change(&mut self, ctx: &mut PaintContext, name: &str) {
        self.behaviour_mut().on_tool_option_change(ctx, name)
    }

    fn on_colour_selection_change(&mut self, ctx: &mut PaintContext, colours: &ColourPair) {
        self.behaviour_mut().on_colour_selection_change(ctx, colours)
    }

    fn overlays(&self, origin: Vec2, zoom: f32) -> Vec<Box<dyn Renderable>> {
        self.behaviour().overlays(origin, zoom)
    }
}
