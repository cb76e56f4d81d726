//! In-memory [`SourceFile`] implementation.
//!
//! Used by tests and fixtures, and by callers that already hold decoded
//! arrays. Variables keep insertion order, which stands in for the catalog
//! order of a real file.

use std::collections::HashMap;

use crate::catalog::{Attribute, AttrValue, Dimension, SourceFile, VariableInfo};
use crate::error::{NetCdfError, NetCdfResult};

/// A fully materialized source file.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    filename: String,
    variables: Vec<VariableInfo>,
    dimensions: Vec<Dimension>,
    global_attributes: Vec<Attribute>,
    data: HashMap<String, Vec<f64>>,
}

impl MemorySource {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            ..Default::default()
        }
    }

    /// Declare a file-level dimension. Redeclaring a name updates its length.
    pub fn with_dimension(mut self, name: &str, len: usize) -> Self {
        match self.dimensions.iter_mut().find(|d| d.name == name) {
            Some(dim) => dim.len = len,
            None => self.dimensions.push(Dimension::new(name, len)),
        }
        self
    }

    pub fn with_global_attribute(mut self, name: &str, value: impl Into<AttrValue>) -> Self {
        self.global_attributes.push(Attribute::new(name, value));
        self
    }

    /// Add a variable over previously declared dimensions.
    ///
    /// # Panics
    ///
    /// Panics if a dimension is undeclared or `values` does not match the
    /// product of the dimension lengths. This type is a fixture builder, so a
    /// malformed fixture is a programming error.
    pub fn with_variable(
        mut self,
        name: &str,
        dims: &[&str],
        values: Vec<f64>,
        attributes: Vec<Attribute>,
    ) -> Self {
        let dimensions: Vec<Dimension> = dims
            .iter()
            .map(|d| {
                self.dimension(d)
                    .cloned()
                    .unwrap_or_else(|| panic!("dimension '{}' not declared", d))
            })
            .collect();
        let expected: usize = dimensions.iter().map(|d| d.len).product();
        assert_eq!(
            values.len(),
            expected,
            "variable '{}' has {} values, shape needs {}",
            name,
            values.len(),
            expected
        );

        self.variables.push(VariableInfo {
            name: name.to_string(),
            dimensions,
            attributes,
        });
        self.data.insert(name.to_string(), values);
        self
    }
}

impl SourceFile for MemorySource {
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
        self.data
            .get(name)
            .cloned()
            .ok_or_else(|| NetCdfError::MissingData(format!("{} variable", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_keeps_catalog_order() {
        let src = MemorySource::new("a.nc")
            .with_dimension("y", 2)
            .with_dimension("x", 3)
            .with_variable("b", &["y"], vec![0.0, 1.0], vec![])
            .with_variable("a", &["y", "x"], vec![0.0; 6], vec![]);

        let names: Vec<&str> = src.variables().iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(src.variable("a").unwrap().shape(), vec![2, 3]);
        assert_eq!(src.read_values("b").unwrap(), vec![0.0, 1.0]);
    }

    #[test]
    fn test_missing_variable_read() {
        let src = MemorySource::new("a.nc");
        assert!(matches!(
            src.read_values("nope"),
            Err(NetCdfError::MissingData(_))
        ));
    }

    #[test]
    #[should_panic(expected = "shape needs")]
    fn test_shape_mismatch_panics() {
        let _ = MemorySource::new("a.nc")
            .with_dimension("x", 3)
            .with_variable("v", &["x"], vec![1.0], vec![]);
    }
}
