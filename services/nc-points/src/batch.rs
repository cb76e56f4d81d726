//! Batch driver: extract every input file under both inclusion policies and
//! write the artifacts.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use grid_extract::{DataPoint, ExtractionPair, Extractor, InclusionPolicy};
use rayon::prelude::*;
use renderer::{render_result, Palette, RenderError, RenderOptions};
use tracing::{error, info, warn};

use crate::config::NcPointsConfig;
use crate::summary::filter_ratio;
use crate::writer;

/// Number of sample points kept per file.
pub const SAMPLE_POINTS: usize = 5;

/// What one successfully processed file produced.
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub source: PathBuf,
    pub variable: String,
    pub all_points: usize,
    pub filtered_points: usize,
    pub outputs: Vec<PathBuf>,
    /// First few points of the filtered result.
    pub sample: Vec<DataPoint>,
}

/// Outcome of a batch, in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub processed: Vec<FileOutcome>,
    pub failed: Vec<(PathBuf, String)>,
}

impl BatchReport {
    pub fn total_all(&self) -> usize {
        self.processed.iter().map(|f| f.all_points).sum()
    }

    pub fn total_filtered(&self) -> usize {
        self.processed.iter().map(|f| f.filtered_points).sum()
    }
}

/// Shared, read-only state for processing files.
pub struct BatchRunner {
    config: NcPointsConfig,
    extractor: Extractor,
    palette: Palette,
    render_options: RenderOptions,
}

impl BatchRunner {
    pub fn new(config: NcPointsConfig) -> Result<Self> {
        config.validate()?;
        let palette = config.palette()?;
        Ok(Self {
            extractor: Extractor::new(config.extract.clone()),
            render_options: config.render_options(),
            palette,
            config,
        })
    }

    pub fn config(&self) -> &NcPointsConfig {
        &self.config
    }

    /// Process `files`; a failing file is logged and skipped.
    ///
    /// With `parallel` set the files are spread over the rayon pool; the
    /// report keeps input order either way.
    pub fn run(&self, files: &[PathBuf]) -> BatchReport {
        let results: Vec<(PathBuf, Result<FileOutcome>)> = if self.config.parallel {
            files
                .par_iter()
                .map(|path| (path.clone(), self.process_file(path)))
                .collect()
        } else {
            files
                .iter()
                .map(|path| (path.clone(), self.process_file(path)))
                .collect()
        };

        let mut report = BatchReport::default();
        for (path, result) in results {
            match result {
                Ok(outcome) => report.processed.push(outcome),
                Err(e) => {
                    error!(file = %path.display(), error = %format!("{:#}", e), "Failed to process file");
                    report.failed.push((path, format!("{:#}", e)));
                }
            }
        }
        report
    }

    /// Extract one file and write its artifacts.
    pub fn process_file(&self, path: &Path) -> Result<FileOutcome> {
        info!(file = %path.display(), "Parsing file");

        let pair = self
            .extractor
            .extract_file_both(path)
            .with_context(|| format!("extracting {}", path.display()))?;

        let out_dir = self.config.output_dir_for(path);
        std::fs::create_dir_all(&out_dir)
            .with_context(|| format!("creating output directory {}", out_dir.display()))?;

        let outputs = self.write_outputs(path, &out_dir, &pair)?;

        let all_points = pair.all.data_points.len();
        let filtered_points = pair.filtered.data_points.len();
        info!(
            file = %path.display(),
            all_points = all_points,
            filtered_points = filtered_points,
            filter_ratio = %format!("{:.2}%", filter_ratio(filtered_points, all_points)),
            "Wrote outputs"
        );

        Ok(FileOutcome {
            source: path.to_path_buf(),
            variable: pair.filtered.data_variable.name.clone(),
            all_points,
            filtered_points,
            outputs,
            sample: pair
                .filtered
                .data_points
                .iter()
                .take(SAMPLE_POINTS)
                .copied()
                .collect(),
        })
    }

    fn write_outputs(
        &self,
        source: &Path,
        out_dir: &Path,
        pair: &ExtractionPair,
    ) -> Result<Vec<PathBuf>> {
        let mut outputs = Vec::with_capacity(3);

        for (policy, result) in [
            (InclusionPolicy::IncludeAll, &pair.all),
            (InclusionPolicy::ExcludeAbsent, &pair.filtered),
        ] {
            let path = writer::json_path(out_dir, source, policy);
            writer::write_result(&path, result)?;
            info!(
                path = %path.display(),
                points = result.data_points.len(),
                "Saved JSON"
            );
            outputs.push(path);
        }

        if self.config.render {
            let path = writer::png_path(out_dir, source);
            match render_result(&pair.filtered, &self.palette, &self.render_options) {
                Ok(raster) => {
                    raster
                        .save_png(&path)
                        .with_context(|| format!("writing {}", path.display()))?;
                    info!(
                        path = %path.display(),
                        width = raster.width(),
                        height = raster.height(),
                        "Saved image"
                    );
                    outputs.push(path);
                }
                Err(RenderError::NoData) => {
                    warn!(file = %source.display(), "No present values, skipping image");
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("rendering {}", path.display()));
                }
            }
        }

        Ok(outputs)
    }
}
