//! Drawable primitives.  `Line`, `TriangleFan` and `Quad` own geometry;
//! `Circle` and `Rectangle` are compositions that pick one of them.

pub mod circle;
pub mod fan;
pub mod line;
pub mod quad;
pub mod rectangle;

pub use circle::Circle;
pub use fan::TriangleFan;
pub use line::Line;
pub use quad::Quad;
pub use rectangle::Rectangle;
