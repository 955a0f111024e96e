// ============================================================================
// PAINT CONTEXT - the state every tool operates on, built once per session
// ============================================================================

use glam::Vec2;

use crate::canvas::CanvasSurface;
use crate::colour::{Colour, ColourSelection};
use crate::error::Result;
use crate::events::EventBus;
use crate::render::primitives::Circle;
use crate::render::PrimitiveResources;

/// Outline circle that follows the pointer, sized to the active brush.
#[derive(Clone, Debug)]
pub struct BrushCursor {
    /// World-space centre, `None` while the pointer is off the canvas.
    position: Option<Vec2>,
    diameter: f32,
    colour: Colour,
}

impl Default for BrushCursor {
    fn default() -> Self {
        Self {
            position: None,
            diameter: 1.0,
            colour: Colour::rgba(128, 128, 128, 255),
        }
    }
}

impl BrushCursor {
    pub fn position(&self) -> Option<Vec2> {
        self.position
    }

    pub fn set_position(&mut self, position: Option<Vec2>) {
        self.position = position;
    }

    pub fn diameter(&self) -> f32 {
        self.diameter
    }

    pub fn set_diameter(&mut self, diameter: f32) {
        self.diameter = diameter.max(1.0);
    }

    /// Hairline circle at the pointer; `zoom` keeps the line one screen
    /// pixel wide.
    pub fn overlay(&self, zoom: f32) -> Option<Circle> {
        let centre = self.position?;
        let d = self.diameter;
        Some(
            Circle::new(centre - Vec2::splat(d * 0.5), Vec2::splat(d), self.colour)
                .outlined(1.0 / zoom.max(f32::EPSILON)),
        )
    }
}

/// Everything a tool may read or mutate, passed explicitly into each
/// handler instead of living in globals.
pub struct PaintContext {
    pub canvas: CanvasSurface,
    pub colours: ColourSelection,
    pub events: EventBus,
    pub resources: PrimitiveResources,
    pub cursor: BrushCursor,
}

impl PaintContext {
    pub fn new(width: u32, height: u32, background: Colour) -> Result<Self> {
        let mut resources = PrimitiveResources::new();
        let canvas = CanvasSurface::new(&mut resources, width, height, background)?;
        Ok(Self {
            canvas,
            colours: ColourSelection::default(),
            events: EventBus::new(),
            resources,
            cursor: BrushCursor::default(),
        })
    }
}
