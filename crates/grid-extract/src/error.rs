//! Error types for grid extraction.

use netcdf_parser::NetCdfError;
use thiserror::Error;

use crate::resolver::AxisRole;

/// Result type for extraction operations.
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Per-file extraction failures.
///
/// None of these are transient; callers log and move on to the next file.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Latitude or longitude could not be identified.
    #[error("{axis} axis not found in {file}: {detail}")]
    AxisNotFound {
        axis: AxisRole,
        file: String,
        detail: String,
    },

    /// No non-axis variable of rank >= 2.
    #[error("no measurement variable in {file}")]
    NoMeasurementVariable { file: String },

    /// One axis is 1-D and the other 2-D, or 2-D axes disagree in shape.
    #[error("incompatible axis shapes: latitude {latitude:?}, longitude {longitude:?}")]
    IncompatibleAxisShapes {
        latitude: Vec<usize>,
        longitude: Vec<usize>,
    },

    /// The underlying file is unreadable or corrupt.
    #[error("failed to read source file: {0}")]
    FileOpenFailure(#[from] NetCdfError),

    /// Invalid extraction configuration.
    #[error("configuration error: {0}")]
    Config(String),
}
