//! Error types for palette loading, rasterization and PNG encoding.

use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

#[derive(Error, Debug)]
pub enum RenderError {
    /// No present value to draw.
    #[error("no data points with a value to render")]
    NoData,

    /// Bucket bounds not strictly ascending, bad colour, and so on.
    #[error("invalid palette: {0}")]
    InvalidPalette(String),

    #[error("invalid image size {width}x{height}")]
    InvalidSize { width: usize, height: usize },

    #[error("PNG encoding failed: {0}")]
    Encode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
