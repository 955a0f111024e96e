// ============================================================================
// ERRORS - one error type for the whole paint core
// ============================================================================

use thiserror::Error;

/// Everything that can go wrong inside the paint core.
///
/// Initialization failures are fatal for the shell; the rest are reported to
/// the caller and leave canvas state untouched.
#[derive(Debug, Error)]
pub enum PaintError {
    #[error("initialization failed: {0}")]
    Initialization(String),

    #[error("unknown tool id `{0}`")]
    UnknownTool(String),

    #[error("a tool with id `{0}` is already registered")]
    DuplicateTool(String),

    #[error("tool `{tool}` has no option named `{option}`")]
    UnknownOption { tool: String, option: String },

    #[error("option `{option}` expects a {expected} value")]
    OptionType { option: String, expected: &'static str },

    #[error("pixel ({x}, {y}) is outside the {width}x{height} canvas")]
    OutOfBounds { x: i64, y: i64, width: u32, height: u32 },

    #[error("failed to load image: {0}")]
    ImageLoad(String),

    #[error("failed to encode image: {0}")]
    ImageEncode(String),

    #[error("unknown image effect `{0}`")]
    UnknownEffect(String),

    #[error("invalid canvas size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },

    #[error("GPU error: {0}")]
    Gpu(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PaintError>;
