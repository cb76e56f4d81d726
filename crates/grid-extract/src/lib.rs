//! Grid extraction engine.
//!
//! Turns one gridded measurement variable in a schema-less NetCDF file into an
//! ordered list of `(latitude, longitude, value)` points:
//!
//! 1. [`resolver`] finds the latitude, longitude and measurement variables
//! 2. [`normalize`] resolves `_FillValue` / `missing_value` into absent cells
//! 3. [`grid`] expands 1-D axes into a full coordinate grid
//! 4. [`points`] walks the grid and applies the inclusion policy
//! 5. [`result`] packages metadata and points for serialization
//!
//! # Example
//!
//! ```ignore
//! use grid_extract::{ExtractConfig, Extractor, InclusionPolicy};
//!
//! let extractor = Extractor::new(ExtractConfig::default());
//! let result = extractor.extract_file("radar.nc", InclusionPolicy::ExcludeAbsent)?;
//! println!("{} points", result.data_points.len());
//! ```

pub mod config;
pub mod error;
pub mod grid;
pub mod normalize;
pub mod points;
pub mod resolver;
pub mod result;

use std::path::Path;

use netcdf_parser::{NetCdfSource, SourceFile};
use tracing::{debug, info};

pub use config::{AxisNames, ExtractConfig, IndexMapping};
pub use error::{ExtractError, ExtractResult};
pub use grid::{materialize, AxisArray, CoordinateGrid};
pub use normalize::{normalize, plane_axes, MeasurementArray, Packing, Sentinel};
pub use points::{extract_points, DataPoint, InclusionPolicy, PointValue};
pub use resolver::{resolve, AxisRole, Resolution, ResolvedAxes};
pub use result::{assemble, CoordinateSystem, DataVariable, ExtractionResult, FileInfo};

/// The chosen measurement variable with its normalized values.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMeasurement {
    pub variable: DataVariable,
    pub values: MeasurementArray,
}

/// Everything read from a file before the inclusion policy is applied.
///
/// Lets both policies share one read of the file.
#[derive(Debug, Clone)]
pub struct PreparedGrid {
    pub file_info: FileInfo,
    pub axes: ResolvedAxes,
    pub latitude: AxisArray,
    pub longitude: AxisArray,
    pub grid: CoordinateGrid,
    pub measurement: ResolvedMeasurement,
}

/// Results for both inclusion policies of one file.
#[derive(Debug, Clone)]
pub struct ExtractionPair {
    pub all: ExtractionResult,
    pub filtered: ExtractionResult,
}

/// Runs the extraction pipeline with a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    config: ExtractConfig,
}

impl Extractor {
    pub fn new(config: ExtractConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    /// Resolve, read and normalize everything the point walk needs.
    pub fn prepare(&self, src: &dyn SourceFile) -> ExtractResult<PreparedGrid> {
        let resolution = resolve(src, &self.config)?;
        let axes = resolution.axes().clone();

        let latitude = read_axis(src, &axes.latitude, AxisRole::Latitude)?;
        let longitude = read_axis(src, &axes.longitude, AxisRole::Longitude)?;
        let grid = materialize(&latitude, &longitude)?;

        let name = resolution.measurement();
        let var = src
            .variable(name)
            .ok_or_else(|| ExtractError::NoMeasurementVariable {
                file: src.filename().to_string(),
            })?;
        let raw = src.read_values(name)?;
        let packing = if self.config.apply_scale_offset {
            Packing::declared_on(var)
        } else {
            None
        };
        let var_dims: Vec<String> = var.dimensions.iter().map(|d| d.name.clone()).collect();
        let plane = plane_axes(&var_dims, &axis_dimensions(src, &axes));
        let values = normalize(&raw, &var.shape(), Sentinel::declared_on(var), packing)
            .with_plane_axes(&plane);

        debug!(
            file = src.filename(),
            measurement = %name,
            shape = ?values.shape(),
            plane = ?values.plane_shape(),
            absent = values.absent_count(),
            grid_rows = grid.rows(),
            grid_cols = grid.cols(),
            "Prepared grid"
        );

        Ok(PreparedGrid {
            file_info: FileInfo::from_source(src),
            axes,
            latitude,
            longitude,
            grid,
            measurement: ResolvedMeasurement {
                variable: DataVariable::new(name, var.units(), var.long_name()),
                values,
            },
        })
    }

    /// Apply `policy` to a prepared grid.
    pub fn finish(&self, prepared: &PreparedGrid, policy: InclusionPolicy) -> ExtractionResult {
        let points = extract_points(
            &prepared.grid,
            &prepared.measurement.values,
            self.config.index_mapping,
            policy,
        );

        assemble(
            prepared.file_info.clone(),
            &prepared.axes,
            &prepared.latitude,
            &prepared.longitude,
            prepared.measurement.variable.clone(),
            points,
        )
    }

    /// Extract one file already opened as a [`SourceFile`].
    pub fn extract(
        &self,
        src: &dyn SourceFile,
        policy: InclusionPolicy,
    ) -> ExtractResult<ExtractionResult> {
        let prepared = self.prepare(src)?;
        Ok(self.finish(&prepared, policy))
    }

    /// Extract under both policies with a single read.
    pub fn extract_both(&self, src: &dyn SourceFile) -> ExtractResult<ExtractionPair> {
        let prepared = self.prepare(src)?;
        Ok(ExtractionPair {
            all: self.finish(&prepared, InclusionPolicy::IncludeAll),
            filtered: self.finish(&prepared, InclusionPolicy::ExcludeAbsent),
        })
    }

    /// Open `path`, extract under `policy`, close.
    pub fn extract_file<P: AsRef<Path>>(
        &self,
        path: P,
        policy: InclusionPolicy,
    ) -> ExtractResult<ExtractionResult> {
        let source = NetCdfSource::open(path)?;
        self.extract(&source, policy)
    }

    /// Open `path`, extract under both policies, close.
    pub fn extract_file_both<P: AsRef<Path>>(&self, path: P) -> ExtractResult<ExtractionPair> {
        let source = NetCdfSource::open(path)?;
        let pair = self.extract_both(&source)?;

        info!(
            file = source.filename(),
            variable = %pair.all.data_variable.name,
            all_points = pair.all.data_points.len(),
            filtered_points = pair.filtered.data_points.len(),
            "Extracted grid points"
        );

        Ok(pair)
    }
}

/// Dimension names the latitude and longitude variables run over.
fn axis_dimensions(src: &dyn SourceFile, axes: &ResolvedAxes) -> Vec<String> {
    [&axes.latitude, &axes.longitude]
        .into_iter()
        .filter_map(|name| src.variable(name))
        .flat_map(|v| v.dimensions.iter().map(|d| d.name.clone()))
        .collect()
}

/// Read a resolved axis variable with its shape.
fn read_axis(src: &dyn SourceFile, name: &str, role: AxisRole) -> ExtractResult<AxisArray> {
    let var = src.variable(name).ok_or_else(|| ExtractError::AxisNotFound {
        axis: role,
        file: src.filename().to_string(),
        detail: format!("dimension '{}' has no coordinate variable", name),
    })?;
    let values = src.read_values(name)?;
    Ok(AxisArray::new(values, var.shape()))
}
