//! Rendering of extracted grid points.
//!
//! - [`palette`]: colour-bucket tables and value classification
//! - [`raster`]: square-marker rasterization of data points
//! - [`png`]: indexed/RGBA PNG encoding

pub mod error;
pub mod palette;
pub mod png;
pub mod raster;

pub use error::{RenderError, RenderResult};
pub use palette::{Bucket, Color, HistogramBin, Palette, PaletteConfig, PaletteStop};
pub use raster::{render_points, render_result, GeoBounds, Raster, RenderOptions};
