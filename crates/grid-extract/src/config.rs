//! Configuration for grid extraction.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ExtractError, ExtractResult};

/// How a coordinate-grid cell `(i, j)` is paired with a measurement cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexMapping {
    /// Read measurement `(j, i)` when in bounds, else `(i, j)`.
    ///
    /// Compensates for radar mosaics whose data variable is stored with the
    /// axes swapped relative to the coordinate variables. Applying it to files
    /// without that quirk mispairs every value.
    #[default]
    Transposed,
    /// Read measurement `(i, j)`.
    Direct,
}

impl IndexMapping {
    /// Parse a mapping name, case-insensitively. `None` for unknown names.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "transposed" => Some(Self::Transposed),
            "direct" | "identity" => Some(Self::Direct),
            _ => None,
        }
    }
}

/// Keywords and aliases used to recognise one geographic axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisNames {
    /// Substrings searched for in a variable's `long_name`.
    pub keywords: Vec<String>,
    /// Exact (case-insensitive) variable or dimension names.
    pub aliases: Vec<String>,
}

impl AxisNames {
    fn new(keywords: &[&str], aliases: &[&str]) -> Self {
        Self {
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
            aliases: aliases.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn latitude() -> Self {
        Self::new(&["lat", "latitude"], &["lat", "latitude", "y"])
    }

    pub fn longitude() -> Self {
        Self::new(&["lon", "longitude"], &["lon", "longitude", "x"])
    }
}

/// Configuration for the extraction engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Latitude recognition rules.
    pub latitude: AxisNames,

    /// Longitude recognition rules.
    pub longitude: AxisNames,

    /// Grid-to-measurement index pairing.
    pub index_mapping: IndexMapping,

    /// Unpack `scale_factor` / `add_offset` on the measurement variable.
    pub apply_scale_offset: bool,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            latitude: AxisNames::latitude(),
            longitude: AxisNames::longitude(),
            index_mapping: IndexMapping::Transposed,
            apply_scale_offset: true,
        }
    }
}

impl ExtractConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply environment overrides on top of `self`.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("NC_INDEX_MAPPING") {
            self.set_index_mapping(&val);
        }

        if let Ok(val) = std::env::var("NC_APPLY_SCALE_OFFSET") {
            self.apply_scale_offset = val.to_lowercase() == "true" || val == "1";
        }

        self
    }

    /// Set the mapping from its name; an unknown name keeps the current one.
    fn set_index_mapping(&mut self, raw: &str) {
        match IndexMapping::parse(raw) {
            Some(mapping) => self.index_mapping = mapping,
            None => warn!(
                value = raw,
                keeping = ?self.index_mapping,
                "Unknown NC_INDEX_MAPPING, expected 'transposed' or 'direct'"
            ),
        }
    }

    /// Load configuration from a YAML file. Missing keys take defaults.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> ExtractResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ExtractError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> ExtractResult<Self> {
        let config: Self =
            serde_yaml::from_str(content).map_err(|e| ExtractError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ExtractResult<()> {
        for (label, names) in [("latitude", &self.latitude), ("longitude", &self.longitude)] {
            if names.keywords.is_empty() && names.aliases.is_empty() {
                return Err(ExtractError::Config(format!(
                    "{} needs at least one keyword or alias",
                    label
                )));
            }
            if names
                .keywords
                .iter()
                .chain(names.aliases.iter())
                .any(|s| s.trim().is_empty())
            {
                return Err(ExtractError::Config(format!(
                    "{} keywords and aliases must be non-empty",
                    label
                )));
            }
        }
        Ok(())
    }
}
