//! Schema-less view of a self-describing array file.
//!
//! A [`SourceFile`] exposes the variable catalog (names, dimensions and
//! attributes) plus numeric reads, without assuming any particular naming
//! convention. Extraction logic works against this trait so that it can be
//! driven by the native NetCDF reader or by an in-memory fixture.

use serde_json::Value;

use crate::error::NetCdfResult;

/// A named dimension and its length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dimension {
    pub name: String,
    pub len: usize,
}

impl Dimension {
    pub fn new(name: impl Into<String>, len: usize) -> Self {
        Self {
            name: name.into(),
            len,
        }
    }
}

/// Attribute payload, collapsed to the shapes extraction cares about.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Text(String),
    Texts(Vec<String>),
    Number(f64),
    Numbers(Vec<f64>),
}

impl AttrValue {
    /// Numeric scalar view. Single-element vectors count as scalars.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Number(v) => Some(*v),
            AttrValue::Numbers(v) if v.len() == 1 => Some(v[0]),
            AttrValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// String view. Numbers are not stringified.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            AttrValue::Texts(v) if v.len() == 1 => Some(&v[0]),
            _ => None,
        }
    }

    /// JSON form used for `global_attributes`.
    ///
    /// Non-finite numbers become `null`, matching how `serde_json` writes them.
    pub fn to_json(&self) -> Value {
        match self {
            AttrValue::Text(s) => Value::String(s.clone()),
            AttrValue::Texts(v) => Value::Array(v.iter().cloned().map(Value::String).collect()),
            AttrValue::Number(v) => number_to_json(*v),
            AttrValue::Numbers(v) => Value::Array(v.iter().copied().map(number_to_json).collect()),
        }
    }
}

fn number_to_json(v: f64) -> Value {
    // Integral values keep an integer representation in the output.
    if v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
        Value::from(v as i64)
    } else {
        serde_json::Number::from_f64(v)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Text(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Text(s)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Number(v)
    }
}

impl From<Vec<f64>> for AttrValue {
    fn from(v: Vec<f64>) -> Self {
        AttrValue::Numbers(v)
    }
}

/// A named attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: AttrValue,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Catalog entry for one variable.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableInfo {
    pub name: String,
    pub dimensions: Vec<Dimension>,
    pub attributes: Vec<Attribute>,
}

impl VariableInfo {
    /// Number of dimensions the variable varies over.
    pub fn rank(&self) -> usize {
        self.dimensions.len()
    }

    /// Row-major shape.
    pub fn shape(&self) -> Vec<usize> {
        self.dimensions.iter().map(|d| d.len).collect()
    }

    pub fn attribute(&self, name: &str) -> Option<&AttrValue> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| &a.value)
    }

    /// The `long_name` display attribute, if it is textual.
    pub fn long_name(&self) -> Option<&str> {
        self.attribute("long_name").and_then(AttrValue::as_str)
    }

    pub fn units(&self) -> Option<&str> {
        self.attribute("units").and_then(AttrValue::as_str)
    }
}

/// Read-only handle to one input array file.
///
/// Implementations release any underlying resource when dropped.
pub trait SourceFile {
    /// Base file name used in output metadata.
    fn filename(&self) -> &str;

    /// Variables in catalog (definition) order.
    fn variables(&self) -> &[VariableInfo];

    /// File-level dimensions in definition order.
    fn dimensions(&self) -> &[Dimension];

    /// File-level (global) attributes.
    fn global_attributes(&self) -> &[Attribute];

    /// Read a whole variable as `f64`, flattened in row-major order.
    fn read_values(&self, name: &str) -> NetCdfResult<Vec<f64>>;

    fn variable(&self, name: &str) -> Option<&VariableInfo> {
        self.variables().iter().find(|v| v.name == name)
    }

    fn dimension(&self, name: &str) -> Option<&Dimension> {
        self.dimensions().iter().find(|d| d.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attr_numeric_views() {
        assert_eq!(AttrValue::Number(-9999.0).as_f64(), Some(-9999.0));
        assert_eq!(AttrValue::Numbers(vec![1.5]).as_f64(), Some(1.5));
        assert_eq!(AttrValue::Numbers(vec![1.0, 2.0]).as_f64(), None);
        assert_eq!(AttrValue::from(" -32768 ").as_f64(), Some(-32768.0));
        assert_eq!(AttrValue::from("dBZ").as_f64(), None);
    }

    #[test]
    fn test_attr_json() {
        assert_eq!(AttrValue::Number(3.0).to_json(), serde_json::json!(3));
        assert_eq!(AttrValue::Number(0.5).to_json(), serde_json::json!(0.5));
        assert_eq!(AttrValue::Number(f64::NAN).to_json(), Value::Null);
        assert_eq!(
            AttrValue::Texts(vec!["a".into(), "b".into()]).to_json(),
            serde_json::json!(["a", "b"])
        );
    }

    #[test]
    fn test_variable_info_accessors() {
        let var = VariableInfo {
            name: "CR".to_string(),
            dimensions: vec![Dimension::new("lat", 3), Dimension::new("lon", 4)],
            attributes: vec![
                Attribute::new("long_name", "Composite reflectivity"),
                Attribute::new("units", "dBZ"),
            ],
        };
        assert_eq!(var.rank(), 2);
        assert_eq!(var.shape(), vec![3, 4]);
        assert_eq!(var.long_name(), Some("Composite reflectivity"));
        assert_eq!(var.units(), Some("dBZ"));
        assert!(var.attribute("_FillValue").is_none());
    }
}
