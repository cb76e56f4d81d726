//! Coordinate grid materialization.

use crate::error::{ExtractError, ExtractResult};

/// A coordinate variable as read from the file.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisArray {
    pub values: Vec<f64>,
    pub shape: Vec<usize>,
}

impl AxisArray {
    pub fn new(values: Vec<f64>, shape: Vec<usize>) -> Self {
        Self { values, shape }
    }

    /// A 1-D axis.
    pub fn from_1d(values: Vec<f64>) -> Self {
        let shape = vec![values.len()];
        Self { values, shape }
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// `[min, max]` over the raw values, ignoring NaN.
    ///
    /// Returns `None` when the axis holds no comparable value.
    pub fn range(&self) -> Option<[f64; 2]> {
        let mut iter = self.values.iter().copied().filter(|v| !v.is_nan());
        let first = iter.next()?;
        Some(iter.fold([first, first], |[lo, hi], v| [lo.min(v), hi.max(v)]))
    }
}

/// Latitude and longitude for every cell of an `rows × cols` grid.
///
/// Both buffers are row-major; `lat_at(i, j)` and `lon_at(i, j)` locate the
/// cell the extractor pairs with grid position `(i, j)`.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateGrid {
    rows: usize,
    cols: usize,
    lat: Vec<f64>,
    lon: Vec<f64>,
}

impl CoordinateGrid {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn lat_at(&self, i: usize, j: usize) -> f64 {
        self.lat[i * self.cols + j]
    }

    #[inline]
    pub fn lon_at(&self, i: usize, j: usize) -> f64 {
        self.lon[i * self.cols + j]
    }

    /// Row `i` of the latitude grid.
    pub fn lat_row(&self, i: usize) -> &[f64] {
        &self.lat[i * self.cols..(i + 1) * self.cols]
    }

    /// Row `i` of the longitude grid.
    pub fn lon_row(&self, i: usize) -> &[f64] {
        &self.lon[i * self.cols..(i + 1) * self.cols]
    }
}

/// Build the coordinate grid from latitude and longitude axes.
///
/// - 1-D + 1-D: outer product, latitude along rows, longitude along columns.
/// - 2-D + 2-D: used unchanged; both must share one shape.
/// - Anything else: [`ExtractError::IncompatibleAxisShapes`].
pub fn materialize(lat: &AxisArray, lon: &AxisArray) -> ExtractResult<CoordinateGrid> {
    match (lat.rank(), lon.rank()) {
        (1, 1) => {
            let rows = lat.values.len();
            let cols = lon.values.len();

            let mut lat_grid = Vec::with_capacity(rows * cols);
            let mut lon_grid = Vec::with_capacity(rows * cols);
            for &la in &lat.values {
                lat_grid.extend(std::iter::repeat(la).take(cols));
                lon_grid.extend_from_slice(&lon.values);
            }

            Ok(CoordinateGrid {
                rows,
                cols,
                lat: lat_grid,
                lon: lon_grid,
            })
        }
        (2, 2) if lat.shape == lon.shape && lat.values.len() == lat.shape[0] * lat.shape[1] => {
            Ok(CoordinateGrid {
                rows: lat.shape[0],
                cols: lat.shape[1],
                lat: lat.values.clone(),
                lon: lon.values.clone(),
            })
        }
        _ => Err(ExtractError::IncompatibleAxisShapes {
            latitude: lat.shape.clone(),
            longitude: lon.shape.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outer_product_expansion() {
        let lat = AxisArray::from_1d(vec![10.0, 20.0]);
        let lon = AxisArray::from_1d(vec![100.0, 101.0, 102.0]);

        let grid = materialize(&lat, &lon).unwrap();
        assert_eq!((grid.rows(), grid.cols()), (2, 3));
        assert_eq!(grid.lat_row(0), &[10.0, 10.0, 10.0]);
        assert_eq!(grid.lat_row(1), &[20.0, 20.0, 20.0]);
        assert_eq!(grid.lon_row(0), &[100.0, 101.0, 102.0]);
        assert_eq!(grid.lon_row(1), &[100.0, 101.0, 102.0]);
    }

    #[test]
    fn test_2d_axes_used_unchanged() {
        let lat = AxisArray::new(vec![1.0, 1.1, 2.0, 2.1], vec![2, 2]);
        let lon = AxisArray::new(vec![5.0, 6.0, 5.1, 6.1], vec![2, 2]);

        let grid = materialize(&lat, &lon).unwrap();
        assert_eq!(grid.lat_at(0, 1), 1.1);
        assert_eq!(grid.lon_at(1, 0), 5.1);
    }

    #[test]
    fn test_mixed_rank_is_incompatible() {
        let lat = AxisArray::from_1d(vec![1.0, 2.0]);
        let lon = AxisArray::new(vec![0.0; 4], vec![2, 2]);
        assert!(matches!(
            materialize(&lat, &lon),
            Err(ExtractError::IncompatibleAxisShapes { .. })
        ));
    }

    #[test]
    fn test_mismatched_2d_shapes_are_incompatible() {
        let lat = AxisArray::new(vec![0.0; 6], vec![2, 3]);
        let lon = AxisArray::new(vec![0.0; 6], vec![3, 2]);
        assert!(matches!(
            materialize(&lat, &lon),
            Err(ExtractError::IncompatibleAxisShapes { .. })
        ));
    }

    #[test]
    fn test_range_ignores_nan() {
        let axis = AxisArray::from_1d(vec![3.0, f64::NAN, -1.0, 7.5]);
        assert_eq!(axis.range(), Some([-1.0, 7.5]));
        assert_eq!(AxisArray::from_1d(vec![]).range(), None);
    }
}
