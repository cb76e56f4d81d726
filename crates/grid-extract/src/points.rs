//! Point extraction: walk the coordinate grid and pair each cell with a
//! measurement value.

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

use crate::config::IndexMapping;
use crate::grid::CoordinateGrid;
use crate::normalize::MeasurementArray;

/// A measurement cell value.
///
/// Absence is a tag, not a numeric sentinel; it becomes `null` only when
/// serialized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "Option<f64>", into = "Option<f64>")]
pub enum PointValue {
    Present(f64),
    Absent,
}

impl PointValue {
    /// Finite numbers are present; NaN and infinities are absent.
    pub fn from_f64(v: f64) -> Self {
        if v.is_finite() {
            PointValue::Present(v)
        } else {
            PointValue::Absent
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, PointValue::Absent)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PointValue::Present(v) => Some(*v),
            PointValue::Absent => None,
        }
    }
}

impl From<Option<f64>> for PointValue {
    fn from(v: Option<f64>) -> Self {
        v.map_or(PointValue::Absent, PointValue::from_f64)
    }
}

impl From<PointValue> for Option<f64> {
    fn from(v: PointValue) -> Self {
        v.as_f64()
    }
}

/// One output point.
///
/// A non-finite coordinate serializes as `null` and reads back as NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    #[serde(deserialize_with = "coordinate")]
    pub latitude: f64,
    #[serde(deserialize_with = "coordinate")]
    pub longitude: f64,
    pub value: PointValue,
}

impl DataPoint {
    /// Both coordinates are finite numbers.
    pub fn is_located(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

fn coordinate<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

/// Which cells make it into the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InclusionPolicy {
    /// Every grid cell, absent values included.
    IncludeAll,
    /// Only cells with a present value.
    ExcludeAbsent,
}

impl InclusionPolicy {
    /// Suffix used for output artifacts (`all` / `filtered`).
    pub fn artifact_suffix(&self) -> &'static str {
        match self {
            InclusionPolicy::IncludeAll => "all",
            InclusionPolicy::ExcludeAbsent => "filtered",
        }
    }
}

/// Read the measurement value paired with grid cell `(i, j)`.
///
/// Returns `None` when no candidate position is in bounds.
fn paired_value(
    measurement: &MeasurementArray,
    mapping: IndexMapping,
    i: usize,
    j: usize,
) -> Option<PointValue> {
    match mapping {
        IndexMapping::Transposed => measurement.get(j, i).or_else(|| measurement.get(i, j)),
        IndexMapping::Direct => measurement.get(i, j),
    }
}

/// Walk the grid in row-major order and emit points under `policy`.
///
/// Latitude axis is outer, longitude inner. Under
/// [`InclusionPolicy::IncludeAll`] the output has exactly `rows * cols`
/// points. A cell whose paired measurement position is out of bounds, or
/// whose latitude or longitude is not finite, is treated as absent.
pub fn extract_points(
    grid: &CoordinateGrid,
    measurement: &MeasurementArray,
    mapping: IndexMapping,
    policy: InclusionPolicy,
) -> Vec<DataPoint> {
    let mut points = Vec::with_capacity(match policy {
        InclusionPolicy::IncludeAll => grid.len(),
        InclusionPolicy::ExcludeAbsent => grid.len() - measurement.absent_count().min(grid.len()),
    });
    let mut out_of_bounds = 0usize;
    let mut unlocated = 0usize;

    for i in 0..grid.rows() {
        for j in 0..grid.cols() {
            let mut point = DataPoint {
                latitude: grid.lat_at(i, j),
                longitude: grid.lon_at(i, j),
                value: paired_value(measurement, mapping, i, j).unwrap_or_else(|| {
                    out_of_bounds += 1;
                    PointValue::Absent
                }),
            };
            if !point.is_located() {
                unlocated += 1;
                point.value = PointValue::Absent;
            }

            if point.value.is_absent() && policy == InclusionPolicy::ExcludeAbsent {
                continue;
            }
            points.push(point);
        }
    }

    if unlocated > 0 {
        debug!(unlocated = unlocated, "Cells with non-finite coordinates are absent");
    }

    if out_of_bounds > 0 {
        let (rows, cols) = measurement.plane_shape();
        warn!(
            out_of_bounds = out_of_bounds,
            grid_rows = grid.rows(),
            grid_cols = grid.cols(),
            data_rows = rows,
            data_cols = cols,
            mapping = ?mapping,
            "Coordinate grid exceeds measurement shape; unmatched cells are absent"
        );
    }

    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{materialize, AxisArray};
    use crate::normalize::{normalize, Sentinel};

    const NA: f64 = -999.0;

    fn grid_2x2() -> CoordinateGrid {
        materialize(
            &AxisArray::from_1d(vec![1.0, 2.0]),
            &AxisArray::from_1d(vec![5.0, 6.0]),
        )
        .unwrap()
    }

    fn measurement_2x2() -> MeasurementArray {
        normalize(
            &[NA, 2.0, 3.0, 4.0],
            &[2, 2],
            Some(Sentinel::FillValue(NA)),
            None,
        )
    }

    #[test]
    fn test_include_all_emits_every_cell() {
        let points = extract_points(
            &grid_2x2(),
            &measurement_2x2(),
            IndexMapping::Transposed,
            InclusionPolicy::IncludeAll,
        );
        assert_eq!(points.len(), 4);

        assert_eq!((points[0].latitude, points[0].longitude), (1.0, 5.0));
        assert_eq!(points[0].value, PointValue::Absent);
        // Grid (0,1) reads measurement (1,0) under the transposed rule.
        assert_eq!((points[1].latitude, points[1].longitude), (1.0, 6.0));
        assert_eq!(points[1].value, PointValue::Present(3.0));
        assert_eq!(points[2].value, PointValue::Present(2.0));
        assert_eq!(points[3].value, PointValue::Present(4.0));
    }

    #[test]
    fn test_exclude_absent_drops_and_keeps_order() {
        let all = extract_points(
            &grid_2x2(),
            &measurement_2x2(),
            IndexMapping::Transposed,
            InclusionPolicy::IncludeAll,
        );
        let filtered = extract_points(
            &grid_2x2(),
            &measurement_2x2(),
            IndexMapping::Transposed,
            InclusionPolicy::ExcludeAbsent,
        );

        assert_eq!(filtered.len(), 3);
        assert!(filtered.iter().all(|p| !p.value.is_absent()));
        let expected: Vec<DataPoint> = all.into_iter().filter(|p| !p.value.is_absent()).collect();
        assert_eq!(filtered, expected);
    }

    #[test]
    fn test_direct_mapping() {
        let points = extract_points(
            &grid_2x2(),
            &measurement_2x2(),
            IndexMapping::Direct,
            InclusionPolicy::IncludeAll,
        );
        assert_eq!(points[1].value, PointValue::Present(2.0));
        assert_eq!(points[2].value, PointValue::Present(3.0));
    }

    #[test]
    fn test_transposed_falls_back_when_swap_out_of_bounds() {
        // Grid 1x3, measurement 1x3: (j, i) is out of bounds for j > 0.
        let grid = materialize(
            &AxisArray::from_1d(vec![10.0]),
            &AxisArray::from_1d(vec![1.0, 2.0, 3.0]),
        )
        .unwrap();
        let data = normalize(&[7.0, 8.0, 9.0], &[1, 3], None, None);

        let points = extract_points(
            &grid,
            &data,
            IndexMapping::Transposed,
            InclusionPolicy::IncludeAll,
        );
        let values: Vec<Option<f64>> = points.iter().map(|p| p.value.as_f64()).collect();
        assert_eq!(values, vec![Some(7.0), Some(8.0), Some(9.0)]);
    }

    #[test]
    fn test_grid_larger_than_data_yields_absent() {
        let grid = materialize(
            &AxisArray::from_1d(vec![1.0, 2.0, 3.0]),
            &AxisArray::from_1d(vec![1.0, 2.0, 3.0]),
        )
        .unwrap();
        let data = normalize(&[1.0, 2.0, 3.0, 4.0], &[2, 2], None, None);

        let all = extract_points(&grid, &data, IndexMapping::Direct, InclusionPolicy::IncludeAll);
        assert_eq!(all.len(), 9);
        assert_eq!(all.iter().filter(|p| p.value.is_absent()).count(), 5);

        let filtered =
            extract_points(&grid, &data, IndexMapping::Direct, InclusionPolicy::ExcludeAbsent);
        assert_eq!(filtered.len(), 4);
    }

    #[test]
    fn test_non_finite_coordinate_is_absent() {
        let lat = AxisArray::new(vec![1.0, f64::NAN, 2.0, 2.0], vec![2, 2]);
        let lon = AxisArray::new(vec![5.0, 6.0, 5.0, 6.0], vec![2, 2]);
        let grid = materialize(&lat, &lon).unwrap();
        let data = normalize(&[1.0, 2.0, 3.0, 4.0], &[2, 2], None, None);

        let all = extract_points(&grid, &data, IndexMapping::Direct, InclusionPolicy::IncludeAll);
        assert_eq!(all.len(), 4);
        assert_eq!(all[1].value, PointValue::Absent);
        assert!(!all[1].is_located());

        let filtered =
            extract_points(&grid, &data, IndexMapping::Direct, InclusionPolicy::ExcludeAbsent);
        assert_eq!(filtered.len(), 3);
        assert!(filtered.iter().all(DataPoint::is_located));
    }

    #[test]
    fn test_nan_coordinate_reads_back() {
        let p = DataPoint {
            latitude: f64::NAN,
            longitude: 5.0,
            value: PointValue::Absent,
        };
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, r#"{"latitude":null,"longitude":5.0,"value":null}"#);

        let back: DataPoint = serde_json::from_str(&json).unwrap();
        assert!(back.latitude.is_nan());
        assert_eq!(back.longitude, 5.0);
        assert_eq!(back.value, PointValue::Absent);
    }

    #[test]
    fn test_value_serializes_as_null() {
        let p = DataPoint {
            latitude: 1.0,
            longitude: 5.0,
            value: PointValue::Absent,
        };
        let json = serde_json::to_value(p).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"latitude": 1.0, "longitude": 5.0, "value": null})
        );

        let back: DataPoint =
            serde_json::from_str(r#"{"latitude":1.0,"longitude":5.0,"value":2.5}"#).unwrap();
        assert_eq!(back.value, PointValue::Present(2.5));
    }
}
