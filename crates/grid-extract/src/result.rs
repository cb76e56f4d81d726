//! Extraction result schema and assembly.
//!
//! Field names follow the JSON exchange format consumed by the writer and the
//! renderer.

use std::collections::BTreeMap;

use netcdf_parser::SourceFile;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::grid::AxisArray;
use crate::points::DataPoint;
use crate::resolver::ResolvedAxes;

/// File-level metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    pub filename: String,
    pub variables: Vec<String>,
    pub dimensions: BTreeMap<String, usize>,
    pub global_attributes: BTreeMap<String, Value>,
}

impl FileInfo {
    pub fn from_source(src: &dyn SourceFile) -> Self {
        Self {
            filename: src.filename().to_string(),
            variables: src.variables().iter().map(|v| v.name.clone()).collect(),
            dimensions: src
                .dimensions()
                .iter()
                .map(|d| (d.name.clone(), d.len))
                .collect(),
            global_attributes: src
                .global_attributes()
                .iter()
                .map(|a| (a.name.clone(), a.value.to_json()))
                .collect(),
        }
    }
}

/// Resolved axes and their raw numeric extents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinateSystem {
    pub latitude_variable: String,
    pub longitude_variable: String,
    /// `[min, max]`; `null` when the axis has no numeric value.
    pub latitude_range: Option<[f64; 2]>,
    pub longitude_range: Option<[f64; 2]>,
}

/// Measurement variable metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataVariable {
    pub name: String,
    pub units: String,
    pub long_name: String,
}

impl DataVariable {
    /// Units default to `"unknown"`, long name to the variable name.
    pub fn new(name: &str, units: Option<&str>, long_name: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            units: units.unwrap_or("unknown").to_string(),
            long_name: long_name.unwrap_or(name).to_string(),
        }
    }
}

/// Everything produced for one file under one inclusion policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub file_info: FileInfo,
    pub coordinate_system: CoordinateSystem,
    pub data_variable: DataVariable,
    pub data_points: Vec<DataPoint>,
}

impl ExtractionResult {
    /// Number of points with a present value.
    pub fn present_count(&self) -> usize {
        self.data_points
            .iter()
            .filter(|p| !p.value.is_absent())
            .count()
    }
}

/// Combine resolved metadata and extracted points.
///
/// Ranges are computed from the raw coordinate arrays, before any masking.
pub fn assemble(
    file_info: FileInfo,
    axes: &ResolvedAxes,
    lat: &AxisArray,
    lon: &AxisArray,
    data_variable: DataVariable,
    data_points: Vec<DataPoint>,
) -> ExtractionResult {
    ExtractionResult {
        file_info,
        coordinate_system: CoordinateSystem {
            latitude_variable: axes.latitude.clone(),
            longitude_variable: axes.longitude.clone(),
            latitude_range: lat.range(),
            longitude_range: lon.range(),
        },
        data_variable,
        data_points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::points::PointValue;
    use netcdf_parser::MemorySource;

    #[test]
    fn test_data_variable_defaults() {
        let var = DataVariable::new("CR", None, None);
        assert_eq!(var.units, "unknown");
        assert_eq!(var.long_name, "CR");

        let var = DataVariable::new("CR", Some("dBZ"), Some("Composite reflectivity"));
        assert_eq!(var.units, "dBZ");
        assert_eq!(var.long_name, "Composite reflectivity");
    }

    #[test]
    fn test_file_info_from_source() {
        let src = MemorySource::new("radar.nc")
            .with_dimension("lon", 3)
            .with_dimension("lat", 2)
            .with_global_attribute("title", "mosaic")
            .with_global_attribute("station_count", 12.0)
            .with_variable("lat", &["lat"], vec![0.0; 2], vec![]);

        let info = FileInfo::from_source(&src);
        assert_eq!(info.filename, "radar.nc");
        assert_eq!(info.variables, vec!["lat"]);
        assert_eq!(info.dimensions.get("lon"), Some(&3));
        assert_eq!(info.global_attributes["title"], serde_json::json!("mosaic"));
        assert_eq!(info.global_attributes["station_count"], serde_json::json!(12));
    }

    #[test]
    fn test_schema_field_names() {
        let result = assemble(
            FileInfo {
                filename: "a.nc".into(),
                variables: vec!["lat".into(), "lon".into(), "CR".into()],
                dimensions: BTreeMap::new(),
                global_attributes: BTreeMap::new(),
            },
            &ResolvedAxes {
                latitude: "lat".into(),
                longitude: "lon".into(),
            },
            &AxisArray::from_1d(vec![2.0, 1.0]),
            &AxisArray::from_1d(vec![5.0, 6.0]),
            DataVariable::new("CR", Some("dBZ"), None),
            vec![DataPoint {
                latitude: 1.0,
                longitude: 5.0,
                value: PointValue::Absent,
            }],
        );

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["coordinate_system"]["latitude_range"], serde_json::json!([1.0, 2.0]));
        assert_eq!(json["coordinate_system"]["longitude_variable"], "lon");
        assert_eq!(json["data_variable"]["long_name"], "CR");
        assert_eq!(json["data_points"][0]["value"], Value::Null);
        assert_eq!(result.present_count(), 0);

        let back: ExtractionResult = serde_json::from_value(json).unwrap();
        assert_eq!(back, result);
    }
}
