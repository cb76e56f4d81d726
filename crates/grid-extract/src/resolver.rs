//! Variable resolution: which variables play latitude, longitude and
//! measurement.
//!
//! Each axis is resolved by an ordered table of matcher strategies; the first
//! strategy that returns a name wins:
//!
//! 1. `long_name` contains a role keyword (case-insensitive)
//! 2. the variable name equals a role alias (case-insensitive)
//! 3. a dimension name equals a role alias (case-insensitive)
//!
//! Within a strategy, catalog order decides. Longitude never resolves to the
//! variable already chosen for latitude.

use std::fmt;

use netcdf_parser::SourceFile;
use tracing::debug;

use crate::config::{AxisNames, ExtractConfig};
use crate::error::{ExtractError, ExtractResult};

/// Geographic axis role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisRole {
    Latitude,
    Longitude,
}

impl fmt::Display for AxisRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxisRole::Latitude => write!(f, "latitude"),
            AxisRole::Longitude => write!(f, "longitude"),
        }
    }
}

/// Which strategy produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSource {
    LongName,
    VariableName,
    DimensionName,
}

/// A matcher strategy: catalog + role names + excluded name -> match.
type Matcher = fn(&dyn SourceFile, &AxisNames, Option<&str>) -> Option<String>;

const MATCHERS: [(MatchSource, Matcher); 3] = [
    (MatchSource::LongName, match_long_name),
    (MatchSource::VariableName, match_variable_name),
    (MatchSource::DimensionName, match_dimension_name),
];

fn match_long_name(src: &dyn SourceFile, names: &AxisNames, skip: Option<&str>) -> Option<String> {
    src.variables()
        .iter()
        .filter(|v| Some(v.name.as_str()) != skip)
        .find(|v| {
            v.long_name().is_some_and(|ln| {
                let ln = ln.to_lowercase();
                names.keywords.iter().any(|k| ln.contains(&k.to_lowercase()))
            })
        })
        .map(|v| v.name.clone())
}

fn match_variable_name(
    src: &dyn SourceFile,
    names: &AxisNames,
    skip: Option<&str>,
) -> Option<String> {
    src.variables()
        .iter()
        .filter(|v| Some(v.name.as_str()) != skip)
        .find(|v| is_alias(&v.name, names))
        .map(|v| v.name.clone())
}

fn match_dimension_name(
    src: &dyn SourceFile,
    names: &AxisNames,
    skip: Option<&str>,
) -> Option<String> {
    src.dimensions()
        .iter()
        .filter(|d| Some(d.name.as_str()) != skip)
        .find(|d| is_alias(&d.name, names))
        .map(|d| d.name.clone())
}

fn is_alias(name: &str, names: &AxisNames) -> bool {
    names.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
}

/// Resolve one axis by running the strategy table in order.
pub fn resolve_axis(
    src: &dyn SourceFile,
    names: &AxisNames,
    skip: Option<&str>,
) -> Option<(String, MatchSource)> {
    MATCHERS
        .iter()
        .find_map(|(source, matcher)| matcher(src, names, skip).map(|name| (name, *source)))
}

/// Variable names playing the latitude and longitude roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAxes {
    pub latitude: String,
    pub longitude: String,
}

impl ResolvedAxes {
    pub fn contains(&self, name: &str) -> bool {
        self.latitude == name || self.longitude == name
    }
}

/// Outcome of variable resolution for one file.
///
/// Always holds at least one measurement candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    axes: ResolvedAxes,
    measurement: String,
    others: Vec<String>,
}

impl Resolution {
    /// Build from candidates in catalog order; `None` when there are none.
    pub fn new(axes: ResolvedAxes, candidates: Vec<String>) -> Option<Self> {
        let mut iter = candidates.into_iter();
        let measurement = iter.next()?;
        Some(Self {
            axes,
            measurement,
            others: iter.collect(),
        })
    }

    pub fn axes(&self) -> &ResolvedAxes {
        &self.axes
    }

    /// The active measurement: the first candidate.
    pub fn measurement(&self) -> &str {
        &self.measurement
    }

    /// Rank >= 2 non-axis variables in catalog order, active one first.
    pub fn candidates(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.measurement.as_str()).chain(self.others.iter().map(String::as_str))
    }
}

/// Resolve the latitude and longitude axes.
pub fn resolve_axes(src: &dyn SourceFile, config: &ExtractConfig) -> ExtractResult<ResolvedAxes> {
    let (latitude, lat_source) =
        resolve_axis(src, &config.latitude, None).ok_or_else(|| ExtractError::AxisNotFound {
            axis: AxisRole::Latitude,
            file: src.filename().to_string(),
            detail: "no variable or dimension matched".to_string(),
        })?;

    let (longitude, lon_source) = resolve_axis(src, &config.longitude, Some(&latitude))
        .ok_or_else(|| ExtractError::AxisNotFound {
            axis: AxisRole::Longitude,
            file: src.filename().to_string(),
            detail: "no variable or dimension matched".to_string(),
        })?;

    debug!(
        file = src.filename(),
        latitude = %latitude,
        latitude_match = ?lat_source,
        longitude = %longitude,
        longitude_match = ?lon_source,
        "Resolved coordinate axes"
    );

    Ok(ResolvedAxes {
        latitude,
        longitude,
    })
}

/// List measurement candidates: non-axis variables varying over >= 2 dims.
pub fn measurement_candidates(src: &dyn SourceFile, axes: &ResolvedAxes) -> Vec<String> {
    src.variables()
        .iter()
        .filter(|v| !axes.contains(&v.name) && v.rank() >= 2)
        .map(|v| v.name.clone())
        .collect()
}

/// Resolve axes and measurement candidates.
pub fn resolve(src: &dyn SourceFile, config: &ExtractConfig) -> ExtractResult<Resolution> {
    let axes = resolve_axes(src, config)?;
    let candidates = measurement_candidates(src, &axes);

    let resolution =
        Resolution::new(axes, candidates).ok_or_else(|| ExtractError::NoMeasurementVariable {
            file: src.filename().to_string(),
        })?;

    if !resolution.others.is_empty() {
        debug!(
            file = src.filename(),
            selected = %resolution.measurement,
            ignored = ?resolution.others,
            "Multiple measurement candidates; using the first"
        );
    }

    Ok(resolution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use netcdf_parser::{Attribute, MemorySource};

    fn long_name(s: &str) -> Vec<Attribute> {
        vec![Attribute::new("long_name", s)]
    }

    #[test]
    fn test_long_name_beats_alias_even_when_later() {
        let src = MemorySource::new("t.nc")
            .with_dimension("a", 2)
            .with_dimension("b", 2)
            .with_variable("y", &["a"], vec![0.0, 1.0], vec![])
            .with_variable("nav_lat", &["a"], vec![0.0, 1.0], long_name("Latitude of grid cell"))
            .with_variable("lon", &["b"], vec![0.0, 1.0], vec![]);

        let axes = resolve_axes(&src, &ExtractConfig::default()).unwrap();
        assert_eq!(axes.latitude, "nav_lat");
        assert_eq!(axes.longitude, "lon");
    }

    #[test]
    fn test_alias_match_is_case_insensitive() {
        let src = MemorySource::new("t.nc")
            .with_dimension("LAT", 2)
            .with_dimension("LON", 3)
            .with_variable("LAT", &["LAT"], vec![0.0; 2], vec![])
            .with_variable("LONGITUDE", &["LON"], vec![0.0; 3], vec![]);

        let (name, source) = resolve_axis(&src, &AxisNames::latitude(), None).unwrap();
        assert_eq!(name, "LAT");
        assert_eq!(source, MatchSource::VariableName);

        let (name, _) = resolve_axis(&src, &AxisNames::longitude(), None).unwrap();
        assert_eq!(name, "LONGITUDE");
    }

    #[test]
    fn test_dimension_fallback() {
        let src = MemorySource::new("t.nc")
            .with_dimension("Y", 2)
            .with_dimension("X", 3)
            .with_variable("CR", &["Y", "X"], vec![0.0; 6], vec![]);

        let (name, source) = resolve_axis(&src, &AxisNames::longitude(), None).unwrap();
        assert_eq!(name, "X");
        assert_eq!(source, MatchSource::DimensionName);
    }

    #[test]
    fn test_longitude_never_reuses_latitude() {
        let src = MemorySource::new("t.nc")
            .with_dimension("n", 2)
            .with_variable("coords", &["n"], vec![0.0; 2], long_name("latitude and longitude"))
            .with_variable("lon", &["n"], vec![0.0; 2], vec![]);

        let axes = resolve_axes(&src, &ExtractConfig::default()).unwrap();
        assert_eq!(axes.latitude, "coords");
        assert_eq!(axes.longitude, "lon");
    }

    #[test]
    fn test_missing_longitude_fails() {
        let src = MemorySource::new("t.nc")
            .with_dimension("lat", 2)
            .with_variable("lat", &["lat"], vec![0.0; 2], vec![]);

        let err = resolve_axes(&src, &ExtractConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::AxisNotFound {
                axis: AxisRole::Longitude,
                ..
            }
        ));
    }

    #[test]
    fn test_candidates_in_catalog_order() {
        let src = MemorySource::new("t.nc")
            .with_dimension("time", 1)
            .with_dimension("lat", 2)
            .with_dimension("lon", 2)
            .with_variable("time", &["time"], vec![0.0], vec![])
            .with_variable("lat", &["lat"], vec![0.0; 2], vec![])
            .with_variable("lon", &["lon"], vec![0.0; 2], vec![])
            .with_variable("REF", &["time", "lat", "lon"], vec![0.0; 4], vec![])
            .with_variable("CR", &["lat", "lon"], vec![0.0; 4], vec![]);

        let resolution = resolve(&src, &ExtractConfig::default()).unwrap();
        assert_eq!(resolution.candidates().collect::<Vec<_>>(), vec!["REF", "CR"]);
        assert_eq!(resolution.measurement(), "REF");
        assert_eq!(resolution.axes().latitude, "lat");
    }

    #[test]
    fn test_resolution_needs_a_candidate() {
        let axes = ResolvedAxes {
            latitude: "lat".to_string(),
            longitude: "lon".to_string(),
        };
        assert!(Resolution::new(axes.clone(), vec![]).is_none());

        let resolution = Resolution::new(axes, vec!["CR".to_string()]).unwrap();
        assert_eq!(resolution.measurement(), "CR");
        assert_eq!(resolution.candidates().count(), 1);
    }

    #[test]
    fn test_no_measurement_variable() {
        let src = MemorySource::new("t.nc")
            .with_dimension("lat", 2)
            .with_dimension("lon", 2)
            .with_variable("lat", &["lat"], vec![0.0; 2], vec![])
            .with_variable("lon", &["lon"], vec![0.0; 2], vec![])
            .with_variable("station", &["lat"], vec![0.0; 2], vec![]);

        assert!(matches!(
            resolve(&src, &ExtractConfig::default()),
            Err(ExtractError::NoMeasurementVariable { .. })
        ));
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let src = MemorySource::new("t.nc")
            .with_dimension("y", 2)
            .with_dimension("x", 2)
            .with_variable("x", &["x"], vec![0.0; 2], vec![])
            .with_variable("y", &["y"], vec![0.0; 2], vec![])
            .with_variable("v", &["y", "x"], vec![0.0; 4], vec![]);

        let config = ExtractConfig::default();
        let first = resolve(&src, &config).unwrap();
        for _ in 0..5 {
            assert_eq!(resolve(&src, &config).unwrap(), first);
        }
    }
}
