//! Source-file fixtures.
//!
//! [`GridFixture`] describes a small gridded file (coordinate axes plus one
//! or more data variables) and materializes it either as an in-memory
//! [`MemorySource`] or as a real NetCDF file on disk.

use std::path::{Path, PathBuf};

use netcdf_parser::{AttrValue, Attribute, MemorySource};

use crate::generators::{axis, create_reflectivity_grid};

/// A coordinate or data variable in a fixture.
#[derive(Debug, Clone)]
pub struct FixtureVariable {
    pub name: String,
    pub dims: Vec<String>,
    pub values: Vec<f64>,
    pub attributes: Vec<Attribute>,
}

impl FixtureVariable {
    pub fn new(name: &str, dims: &[&str], values: Vec<f64>) -> Self {
        Self {
            name: name.to_string(),
            dims: dims.iter().map(|d| d.to_string()).collect(),
            values,
            attributes: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: &str, value: impl Into<AttrValue>) -> Self {
        self.attributes.push(Attribute::new(name, value));
        self
    }
}

/// Builder for a gridded test file.
#[derive(Debug, Clone)]
pub struct GridFixture {
    pub filename: String,
    pub dimensions: Vec<(String, usize)>,
    pub variables: Vec<FixtureVariable>,
    pub global_attributes: Vec<Attribute>,
}

impl GridFixture {
    /// An empty fixture.
    pub fn new(filename: &str) -> Self {
        Self {
            filename: filename.to_string(),
            dimensions: Vec::new(),
            variables: Vec::new(),
            global_attributes: Vec::new(),
        }
    }

    /// A conventional file: `lat(lat)`, `lon(lon)` and `CR(lat, lon)` with
    /// `_FillValue = -999`, `units = dBZ`.
    pub fn lat_lon(filename: &str, lats: Vec<f64>, lons: Vec<f64>, data: Vec<f64>) -> Self {
        let (ny, nx) = (lats.len(), lons.len());
        Self::new(filename)
            .with_dimension("lat", ny)
            .with_dimension("lon", nx)
            .with_global_attribute("title", "synthetic composite reflectivity")
            .with_variable(
                FixtureVariable::new("lat", &["lat"], lats).with_attr("long_name", "latitude"),
            )
            .with_variable(
                FixtureVariable::new("lon", &["lon"], lons).with_attr("long_name", "longitude"),
            )
            .with_variable(
                FixtureVariable::new("CR", &["lat", "lon"], data)
                    .with_attr("_FillValue", -999.0)
                    .with_attr("units", "dBZ")
                    .with_attr("long_name", "Composite reflectivity"),
            )
    }

    /// A `rows × cols` radar mosaic over 30°N/110°E with 0.01° spacing.
    pub fn radar_mosaic(rows: usize, cols: usize) -> Self {
        Self::lat_lon(
            "SA000000001M_20250902225000_CR.nc",
            axis(30.0, 0.01, rows),
            axis(110.0, 0.01, cols),
            create_reflectivity_grid(cols, rows),
        )
    }

    pub fn with_dimension(mut self, name: &str, len: usize) -> Self {
        self.dimensions.push((name.to_string(), len));
        self
    }

    pub fn with_variable(mut self, var: FixtureVariable) -> Self {
        self.variables.push(var);
        self
    }

    pub fn with_global_attribute(mut self, name: &str, value: impl Into<AttrValue>) -> Self {
        self.global_attributes.push(Attribute::new(name, value));
        self
    }

    /// Mutable access to a variable's values by name.
    ///
    /// # Panics
    ///
    /// Panics if the variable does not exist.
    pub fn values_mut(&mut self, name: &str) -> &mut Vec<f64> {
        &mut self
            .variables
            .iter_mut()
            .find(|v| v.name == name)
            .unwrap_or_else(|| panic!("fixture has no variable '{}'", name))
            .values
    }

    /// Build an in-memory source.
    pub fn to_memory(&self) -> MemorySource {
        let mut src = MemorySource::new(self.filename.clone());
        for (name, len) in &self.dimensions {
            src = src.with_dimension(name, *len);
        }
        for attr in &self.global_attributes {
            src = src.with_global_attribute(&attr.name, attr.value.clone());
        }
        for var in &self.variables {
            let dims: Vec<&str> = var.dims.iter().map(String::as_str).collect();
            src = src.with_variable(&var.name, &dims, var.values.clone(), var.attributes.clone());
        }
        src
    }

    /// Write the fixture as a NetCDF file in `dir` and return its path.
    ///
    /// Data variables are stored as `f64`.
    pub fn write_netcdf(&self, dir: &Path) -> PathBuf {
        let path = dir.join(&self.filename);
        let mut file = netcdf::create(&path).expect("failed to create NetCDF file");

        for (name, len) in &self.dimensions {
            file.add_dimension(name, *len).expect("add dimension");
        }

        for attr in &self.global_attributes {
            match &attr.value {
                AttrValue::Text(s) => file.add_attribute(&attr.name, s.as_str()),
                AttrValue::Number(v) => file.add_attribute(&attr.name, *v),
                AttrValue::Numbers(v) => file.add_attribute(&attr.name, v.clone()),
                AttrValue::Texts(v) => file.add_attribute(&attr.name, v.join(" ").as_str()),
            }
            .expect("add global attribute");
        }

        for var in &self.variables {
            let dims: Vec<&str> = var.dims.iter().map(String::as_str).collect();
            let mut nc_var = file
                .add_variable::<f64>(&var.name, &dims)
                .expect("add variable");
            for attr in &var.attributes {
                match &attr.value {
                    AttrValue::Text(s) => nc_var.put_attribute(&attr.name, s.as_str()),
                    AttrValue::Number(v) => nc_var.put_attribute(&attr.name, *v),
                    AttrValue::Numbers(v) => nc_var.put_attribute(&attr.name, v.clone()),
                    AttrValue::Texts(v) => nc_var.put_attribute(&attr.name, v.join(" ").as_str()),
                }
                .expect("put variable attribute");
            }
            nc_var.put_values(&var.values, ..).expect("put values");
        }

        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netcdf_parser::SourceFile;

    #[test]
    fn test_lat_lon_fixture_to_memory() {
        let src = GridFixture::lat_lon(
            "t.nc",
            vec![1.0, 2.0],
            vec![5.0, 6.0, 7.0],
            vec![0.0; 6],
        )
        .to_memory();

        assert_eq!(src.filename(), "t.nc");
        assert_eq!(src.variable("CR").unwrap().shape(), vec![2, 3]);
        assert_eq!(src.read_values("lon").unwrap(), vec![5.0, 6.0, 7.0]);
        assert_eq!(src.global_attributes().len(), 1);
    }

    #[test]
    fn test_radar_mosaic_dimensions() {
        let fixture = GridFixture::radar_mosaic(4, 6);
        let src = fixture.to_memory();
        assert_eq!(src.dimension("lat").unwrap().len, 4);
        assert_eq!(src.dimension("lon").unwrap().len, 6);
        assert_eq!(src.read_values("CR").unwrap().len(), 24);
    }

    #[test]
    fn test_values_mut() {
        let mut fixture = GridFixture::lat_lon("t.nc", vec![1.0], vec![2.0], vec![3.0]);
        fixture.values_mut("CR")[0] = -999.0;
        assert_eq!(fixture.to_memory().read_values("CR").unwrap(), vec![-999.0]);
    }
}
