//! PaintGL: a raster paint program built around a 2D camera, a canvas with
//! preview and committed framebuffers, and a set of primitive-drawing tools.
//!
//! The window shell lives in [`app`]; everything below it is usable headless
//! through [`session::PaintSession`] or directly through [`context::PaintContext`].

pub mod app;
pub mod canvas;
pub mod cli;
pub mod colour;
pub mod context;
pub mod error;
pub mod events;
pub mod gpu;
pub mod io;
pub mod logger;
pub mod observer;
pub mod ops;
pub mod render;
pub mod session;
pub mod settings;
pub mod tools;

pub use canvas::{Anchor, CanvasSurface};
pub use colour::Colour;
pub use context::PaintContext;
pub use error::{PaintError, Result};
pub use events::{AppEvent, EventBus};
pub use session::PaintSession;
pub use settings::AppSettings;
