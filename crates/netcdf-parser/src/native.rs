//! Native NetCDF access using the netcdf library.
//!
//! [`NetCdfSource`] opens a file once, snapshots its catalog (variables,
//! dimensions, attributes) and keeps the handle for numeric reads. The handle
//! is closed when the source is dropped, so every exit path of an extraction
//! releases the file.

use std::path::Path;
use std::sync::Once;

use netcdf::AttributeValue;
use tracing::debug;

use crate::catalog::{AttrValue, Attribute, Dimension, SourceFile, VariableInfo};
use crate::error::{NetCdfError, NetCdfResult};

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints diagnostics even when the Rust side handles the
/// condition (for example probing an optional attribute). Call this early in
/// `main()`; repeated calls are no-ops.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and null handlers are a
        // documented way to disable automatic error printing.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// An opened NetCDF file with its catalog loaded.
pub struct NetCdfSource {
    file: netcdf::File,
    filename: String,
    variables: Vec<VariableInfo>,
    dimensions: Vec<Dimension>,
    global_attributes: Vec<Attribute>,
}

impl NetCdfSource {
    /// Open `path` read-only and load its catalog.
    pub fn open<P: AsRef<Path>>(path: P) -> NetCdfResult<Self> {
        let path = path.as_ref();
        silence_hdf5_errors();

        if !path.exists() {
            return Err(NetCdfError::OpenFailed {
                path: path.to_path_buf(),
                reason: "file does not exist".to_string(),
            });
        }

        let file = netcdf::open(path).map_err(|e| NetCdfError::OpenFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let filename = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown.nc")
            .to_string();

        let dimensions: Vec<Dimension> = file
            .dimensions()
            .map(|d| Dimension::new(d.name(), d.len()))
            .collect();

        let global_attributes: Vec<Attribute> = file
            .attributes()
            .filter_map(|attr| read_attribute(attr.name(), attr.value()))
            .collect();

        let variables: Vec<VariableInfo> = file
            .variables()
            .map(|var| VariableInfo {
                name: var.name(),
                dimensions: var
                    .dimensions()
                    .iter()
                    .map(|d| Dimension::new(d.name(), d.len()))
                    .collect(),
                attributes: var
                    .attributes()
                    .filter_map(|attr| read_attribute(attr.name(), attr.value()))
                    .collect(),
            })
            .collect();

        debug!(
            file = %filename,
            variables = variables.len(),
            dimensions = dimensions.len(),
            global_attributes = global_attributes.len(),
            "Loaded NetCDF catalog"
        );

        Ok(Self {
            file,
            filename,
            variables,
            dimensions,
            global_attributes,
        })
    }
}

impl SourceFile for NetCdfSource {
    fn filename(&self) -> &str {
        &self.filename
    }

    fn variables(&self) -> &[VariableInfo] {
        &self.variables
    }

    fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    fn global_attributes(&self) -> &[Attribute] {
        &self.global_attributes
    }

    fn read_values(&self, name: &str) -> NetCdfResult<Vec<f64>> {
        let var = self
            .file
            .variable(name)
            .ok_or_else(|| NetCdfError::MissingData(format!("{} variable", name)))?;

        var.get_values::<f64, _>(..)
            .map_err(|e| NetCdfError::InvalidFormat(format!("Failed to read {}: {}", name, e)))
    }
}

/// Convert a raw attribute into the catalog model.
///
/// Unreadable attributes are dropped with a debug log rather than failing the
/// whole catalog.
fn read_attribute(
    name: &str,
    value: Result<AttributeValue, netcdf::Error>,
) -> Option<Attribute> {
    match value {
        Ok(value) => Some(Attribute::new(name, convert_attribute(value))),
        Err(e) => {
            debug!(attribute = name, error = %e, "Skipping unreadable attribute");
            None
        }
    }
}

#[allow(unreachable_patterns)]
fn convert_attribute(value: AttributeValue) -> AttrValue {
    fn many<T: Into<f64> + Copy>(v: &[T]) -> AttrValue {
        AttrValue::Numbers(v.iter().map(|&x| x.into()).collect())
    }

    match value {
        AttributeValue::Str(s) => AttrValue::Text(s),
        AttributeValue::Strs(v) => AttrValue::Texts(v),
        AttributeValue::Uchar(v) => AttrValue::Number(v.into()),
        AttributeValue::Schar(v) => AttrValue::Number(v.into()),
        AttributeValue::Ushort(v) => AttrValue::Number(v.into()),
        AttributeValue::Short(v) => AttrValue::Number(v.into()),
        AttributeValue::Uint(v) => AttrValue::Number(v.into()),
        AttributeValue::Int(v) => AttrValue::Number(v.into()),
        AttributeValue::Ulonglong(v) => AttrValue::Number(v as f64),
        AttributeValue::Longlong(v) => AttrValue::Number(v as f64),
        AttributeValue::Float(v) => AttrValue::Number(v.into()),
        AttributeValue::Double(v) => AttrValue::Number(v),
        AttributeValue::Uchars(v) => many(&v),
        AttributeValue::Schars(v) => many(&v),
        AttributeValue::Ushorts(v) => many(&v),
        AttributeValue::Shorts(v) => many(&v),
        AttributeValue::Uints(v) => many(&v),
        AttributeValue::Ints(v) => many(&v),
        AttributeValue::Ulonglongs(v) => {
            AttrValue::Numbers(v.into_iter().map(|x| x as f64).collect())
        }
        AttributeValue::Longlongs(v) => {
            AttrValue::Numbers(v.into_iter().map(|x| x as f64).collect())
        }
        AttributeValue::Floats(v) => many(&v),
        AttributeValue::Doubles(v) => AttrValue::Numbers(v),
        other => AttrValue::Text(format!("{:?}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_numeric_attributes() {
        assert_eq!(
            convert_attribute(AttributeValue::Short(-32768)),
            AttrValue::Number(-32768.0)
        );
        assert_eq!(
            convert_attribute(AttributeValue::Float(0.5)),
            AttrValue::Number(0.5)
        );
        assert_eq!(
            convert_attribute(AttributeValue::Ints(vec![1, 2])),
            AttrValue::Numbers(vec![1.0, 2.0])
        );
    }

    #[test]
    fn test_convert_text_attribute() {
        assert_eq!(
            convert_attribute(AttributeValue::Str("dBZ".to_string())),
            AttrValue::Text("dBZ".to_string())
        );
    }

    #[test]
    fn test_open_missing_file() {
        let err = NetCdfSource::open("/nonexistent/radar.nc").err().unwrap();
        assert!(matches!(err, NetCdfError::OpenFailed { .. }));
    }
}
