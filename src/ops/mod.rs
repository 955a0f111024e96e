pub mod effects;
pub mod fill;

pub use effects::{apply_named, Effect, Kernel};
pub use fill::flood_fill;
