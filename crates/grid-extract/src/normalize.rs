//! Missing-value normalization.
//!
//! Turns a raw measurement buffer plus its declared sentinel into a working
//! copy where every missing cell is [`PointValue::Absent`]. The raw buffer is
//! only borrowed.

use netcdf_parser::{AttrValue, VariableInfo};

use crate::points::PointValue;

/// The sentinel declared on a variable, in priority order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sentinel {
    FillValue(f64),
    MissingValue(f64),
}

impl Sentinel {
    /// `_FillValue` first, then `missing_value`, else none.
    pub fn declared_on(var: &VariableInfo) -> Option<Self> {
        if let Some(v) = var.attribute("_FillValue").and_then(AttrValue::as_f64) {
            return Some(Sentinel::FillValue(v));
        }
        var.attribute("missing_value")
            .and_then(AttrValue::as_f64)
            .map(Sentinel::MissingValue)
    }

    pub fn value(&self) -> f64 {
        match self {
            Sentinel::FillValue(v) | Sentinel::MissingValue(v) => *v,
        }
    }

    fn matches(&self, raw: f64) -> bool {
        let s = self.value();
        raw == s || (s.is_nan() && raw.is_nan())
    }
}

/// CF packing parameters (`scale_factor`, `add_offset`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Packing {
    pub scale_factor: f64,
    pub add_offset: f64,
}

impl Packing {
    /// Packing declared on `var`, or `None` when neither attribute is present.
    pub fn declared_on(var: &VariableInfo) -> Option<Self> {
        let scale = var.attribute("scale_factor").and_then(AttrValue::as_f64);
        let offset = var.attribute("add_offset").and_then(AttrValue::as_f64);
        if scale.is_none() && offset.is_none() {
            return None;
        }
        Some(Self {
            scale_factor: scale.unwrap_or(1.0),
            add_offset: offset.unwrap_or(0.0),
        })
    }

    fn unpack(&self, raw: f64) -> f64 {
        raw * self.scale_factor + self.add_offset
    }
}

/// A measurement array after sentinel resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementArray {
    shape: Vec<usize>,
    mask: Vec<bool>,
    cells: Vec<PointValue>,
    plane: Plane,
}

/// 2-D view onto an N-D row-major buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Plane {
    rows: usize,
    cols: usize,
    row_stride: usize,
    col_stride: usize,
}

impl Plane {
    /// Use the `preferred` dimensions as plane axes, then fill up with the
    /// first non-singleton dimensions, then leading ones. Every other
    /// dimension is pinned at index 0. Axes keep their storage order.
    fn of(shape: &[usize], preferred: &[usize]) -> Self {
        let strides: Vec<usize> = (0..shape.len())
            .map(|d| shape[d + 1..].iter().product())
            .collect();

        let mut axes: Vec<usize> = Vec::with_capacity(2);
        let fill = preferred
            .iter()
            .copied()
            .filter(|&d| d < shape.len())
            .chain((0..shape.len()).filter(|&d| shape[d] > 1))
            .chain(0..shape.len());
        for d in fill {
            if axes.len() >= 2 {
                break;
            }
            if !axes.contains(&d) {
                axes.push(d);
            }
        }
        axes.sort_unstable();

        match axes.as_slice() {
            [r, c] => Plane {
                rows: shape[*r],
                cols: shape[*c],
                row_stride: strides[*r],
                col_stride: strides[*c],
            },
            [r] => Plane {
                rows: shape[*r],
                cols: 1,
                row_stride: strides[*r],
                col_stride: 0,
            },
            _ => Plane {
                rows: 1,
                cols: 1,
                row_stride: 0,
                col_stride: 0,
            },
        }
    }
}

/// Positions in `dims` of the dimensions the coordinate axes run over.
///
/// `axis_dims` lists the dimension names of the latitude and longitude
/// variables. Matching is exact and the result is in `dims` order.
pub fn plane_axes<S: AsRef<str>>(dims: &[S], axis_dims: &[S]) -> Vec<usize> {
    dims.iter()
        .enumerate()
        .filter(|(_, d)| axis_dims.iter().any(|a| a.as_ref() == d.as_ref()))
        .map(|(i, _)| i)
        .collect()
}

impl MeasurementArray {
    /// Full N-D shape of the source variable.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// `(rows, cols)` of the 2-D plane the extractor reads.
    pub fn plane_shape(&self) -> (usize, usize) {
        (self.plane.rows, self.plane.cols)
    }

    /// Absent-mask over the full buffer; same length as the raw data.
    pub fn mask(&self) -> &[bool] {
        &self.mask
    }

    pub fn cells(&self) -> &[PointValue] {
        &self.cells
    }

    /// Read the plane over the given dimension positions instead of the
    /// positional default. See [`plane_axes`].
    pub fn with_plane_axes(mut self, preferred: &[usize]) -> Self {
        self.plane = Plane::of(&self.shape, preferred);
        self
    }

    pub fn absent_count(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }

    pub fn in_bounds(&self, row: usize, col: usize) -> bool {
        row < self.plane.rows && col < self.plane.cols
    }

    /// Value at plane position `(row, col)`, or `None` when out of bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<PointValue> {
        if !self.in_bounds(row, col) {
            return None;
        }
        let idx = row * self.plane.row_stride + col * self.plane.col_stride;
        self.cells.get(idx).copied()
    }
}

/// Build the absent-mask and the normalized working copy.
///
/// A cell is absent when it equals the sentinel or is not a finite number.
/// Present cells are unpacked with `packing` when given.
pub fn normalize(
    raw: &[f64],
    shape: &[usize],
    sentinel: Option<Sentinel>,
    packing: Option<Packing>,
) -> MeasurementArray {
    let mask: Vec<bool> = raw
        .iter()
        .map(|&v| !v.is_finite() || sentinel.is_some_and(|s| s.matches(v)))
        .collect();

    let cells: Vec<PointValue> = raw
        .iter()
        .zip(&mask)
        .map(|(&v, &absent)| {
            if absent {
                return PointValue::Absent;
            }
            let v = packing.map_or(v, |p| p.unpack(v));
            PointValue::from_f64(v)
        })
        .collect();

    MeasurementArray {
        shape: shape.to_vec(),
        mask,
        cells,
        plane: Plane::of(shape, &[]),
    }
}
