//! Batch driver configuration.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use grid_extract::ExtractConfig;
use renderer::{Palette, RenderOptions};

/// Settings for a `parse` run.
///
/// Defaults come from [`NcPointsConfig::from_env`]; command-line flags are
/// applied on top by the binary.
#[derive(Debug, Clone)]
pub struct NcPointsConfig {
    /// Output directory; `None` writes next to each input file.
    pub output_dir: Option<PathBuf>,
    /// Also render `<stem>_filtered.png`.
    pub render: bool,
    pub render_width: usize,
    pub render_height: usize,
    /// Palette file (YAML or JSON); `None` uses the reflectivity table.
    pub palette_file: Option<PathBuf>,
    /// Fan files out over the rayon pool.
    pub parallel: bool,
    /// Descend into subdirectories when scanning.
    pub recursive: bool,
    pub extract: ExtractConfig,
}

impl Default for NcPointsConfig {
    fn default() -> Self {
        let render = RenderOptions::default();
        Self {
            output_dir: None,
            render: false,
            render_width: render.width,
            render_height: render.height,
            palette_file: None,
            parallel: false,
            recursive: false,
            extract: ExtractConfig::default(),
        }
    }
}

impl NcPointsConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self {
            extract: ExtractConfig::from_env(),
            ..Self::default()
        };

        if let Ok(val) = std::env::var("NC_OUTPUT_DIR") {
            if !val.trim().is_empty() {
                config.output_dir = Some(PathBuf::from(val));
            }
        }

        if let Ok(val) = std::env::var("NC_RENDER") {
            config.render = parse_flag(&val);
        }

        if let Ok(val) = std::env::var("NC_RENDER_WIDTH") {
            if let Ok(width) = val.parse() {
                config.render_width = width;
            }
        }

        if let Ok(val) = std::env::var("NC_RENDER_HEIGHT") {
            if let Ok(height) = val.parse() {
                config.render_height = height;
            }
        }

        if let Ok(val) = std::env::var("NC_PALETTE_FILE") {
            if !val.trim().is_empty() {
                config.palette_file = Some(PathBuf::from(val));
            }
        }

        if let Ok(val) = std::env::var("NC_PARALLEL") {
            config.parallel = parse_flag(&val);
        }

        if let Ok(val) = std::env::var("NC_RECURSIVE") {
            config.recursive = parse_flag(&val);
        }

        config
    }

    /// Replace the extraction settings with a YAML file, keeping env
    /// overrides on top.
    pub fn with_extract_file(mut self, path: &Path) -> Result<Self> {
        self.extract = ExtractConfig::from_yaml_file(path)
            .with_context(|| format!("loading extraction config {}", path.display()))?
            .with_env_overrides();
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.render_width == 0 || self.render_height == 0 {
            bail!(
                "render size must be positive, got {}x{}",
                self.render_width,
                self.render_height
            );
        }
        self.extract.validate()?;
        Ok(())
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            width: self.render_width,
            height: self.render_height,
            ..RenderOptions::default()
        }
    }

    /// The configured palette, or the reflectivity table.
    pub fn palette(&self) -> Result<Palette> {
        match &self.palette_file {
            Some(path) => Palette::from_file(path)
                .with_context(|| format!("loading palette {}", path.display())),
            None => Ok(Palette::reflectivity()),
        }
    }

    /// Directory outputs for `source` are written to.
    pub fn output_dir_for(&self, source: &Path) -> PathBuf {
        match &self.output_dir {
            Some(dir) => dir.clone(),
            None => source
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        }
    }
}

fn parse_flag(val: &str) -> bool {
    matches!(val.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = NcPointsConfig::default();
        assert!(!config.render);
        assert!(!config.parallel);
        assert_eq!(config.render_width, 1200);
        assert!(config.validate().is_ok());
        assert_eq!(config.palette().unwrap().name(), "reflectivity");
    }

    #[test]
    fn test_output_dir_for() {
        let mut config = NcPointsConfig::default();
        assert_eq!(
            config.output_dir_for(Path::new("data/radar/a.nc")),
            PathBuf::from("data/radar")
        );
        config.output_dir = Some(PathBuf::from("/tmp/out"));
        assert_eq!(
            config.output_dir_for(Path::new("data/radar/a.nc")),
            PathBuf::from("/tmp/out")
        );
    }

    #[test]
    fn test_zero_render_size_rejected() {
        let config = NcPointsConfig {
            render_width: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("TRUE"));
        assert!(parse_flag(" 1 "));
        assert!(!parse_flag("no"));
    }
}
