//! Batch summaries and read-back inspection of written artifacts.

use std::path::{Path, PathBuf};

use anyhow::Result;
use grid_extract::{DataPoint, ExtractionResult};
use renderer::{HistogramBin, Palette};
use tracing::{info, warn};

use crate::batch::{BatchReport, SAMPLE_POINTS};
use crate::scan::find_files;
use crate::writer::read_results;

/// Share of points kept by filtering, in percent. Zero for an empty input.
pub fn filter_ratio(filtered: usize, all: usize) -> f64 {
    if all == 0 {
        0.0
    } else {
        filtered as f64 / all as f64 * 100.0
    }
}

/// Log batch totals and sample points from the first processed file.
pub fn log_batch_report(report: &BatchReport) {
    if report.processed.is_empty() {
        warn!(failed = report.failed.len(), "No file was parsed successfully");
        return;
    }

    let total_all = report.total_all();
    let total_filtered = report.total_filtered();
    info!(
        files = report.processed.len(),
        failed = report.failed.len(),
        total_points = total_all,
        valid_points = total_filtered,
        filter_ratio = %format!("{:.2}%", filter_ratio(total_filtered, total_all)),
        "Batch complete"
    );

    let first = &report.processed[0];
    log_sample(&first.source.display().to_string(), &first.sample);
}

fn log_sample(file: &str, points: &[DataPoint]) {
    for (n, p) in points.iter().take(SAMPLE_POINTS).enumerate() {
        info!(
            file = file,
            point = n + 1,
            latitude = %format!("{:.4}", p.latitude),
            longitude = %format!("{:.4}", p.longitude),
            value = ?p.value.as_f64(),
            "Sample point"
        );
    }
}

/// Read-back statistics for one result inside a filtered artifact.
#[derive(Debug, Clone)]
pub struct ResultSummary {
    pub filename: String,
    pub points: usize,
    pub latitude_range: Option<[f64; 2]>,
    pub longitude_range: Option<[f64; 2]>,
    /// `[min, max]` over present values; `None` when every value is absent.
    pub value_range: Option<[f64; 2]>,
    pub variable_count: usize,
    pub dimension_count: usize,
    pub variable: String,
    pub units: String,
    pub long_name: String,
    pub histogram: Vec<HistogramBin>,
    pub sample: Vec<DataPoint>,
}

impl ResultSummary {
    fn new(result: &ExtractionResult, palette: &Palette) -> Self {
        Self {
            filename: result.file_info.filename.clone(),
            points: result.data_points.len(),
            latitude_range: result.coordinate_system.latitude_range,
            longitude_range: result.coordinate_system.longitude_range,
            value_range: value_range(&result.data_points),
            variable_count: result.file_info.variables.len(),
            dimension_count: result.file_info.dimensions.len(),
            variable: result.data_variable.name.clone(),
            units: result.data_variable.units.clone(),
            long_name: result.data_variable.long_name.clone(),
            histogram: palette.histogram(&result.data_points),
            sample: result
                .data_points
                .iter()
                .take(SAMPLE_POINTS)
                .copied()
                .collect(),
        }
    }
}

/// `[min, max]` over the present values of `points`.
pub fn value_range(points: &[DataPoint]) -> Option<[f64; 2]> {
    let mut values = points.iter().filter_map(|p| p.value.as_f64());
    let first = values.next()?;
    Some(values.fold([first, first], |[lo, hi], v| [lo.min(v), hi.max(v)]))
}

/// One `*_filtered.json` artifact.
#[derive(Debug, Clone)]
pub struct ArtifactSummary {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub results: Vec<ResultSummary>,
}

/// Everything `inspect` found in a directory.
#[derive(Debug, Clone, Default)]
pub struct InspectReport {
    pub filtered: Vec<ArtifactSummary>,
    pub total_filtered: usize,
    /// Point total over `*_all.json`; `None` when there are none.
    pub total_all: Option<usize>,
}

impl InspectReport {
    /// Kept share in percent, when `*_all.json` artifacts exist.
    pub fn filter_ratio(&self) -> Option<f64> {
        self.total_all
            .map(|all| filter_ratio(self.total_filtered, all))
    }
}

/// Read back the artifacts in `dir` and log what they contain.
pub fn inspect(dir: &Path, palette: &Palette) -> Result<InspectReport> {
    let filtered_files = find_files(dir, "_filtered.json", false)?;
    if filtered_files.is_empty() {
        warn!(dir = %dir.display(), "No filtered JSON files found");
        return Ok(InspectReport::default());
    }

    let mut report = InspectReport::default();

    for path in filtered_files {
        let size_bytes = std::fs::metadata(&path)?.len();
        let results = read_results(&path)?;
        info!(
            file = %path.display(),
            size_mb = %format!("{:.2}", size_bytes as f64 / (1024.0 * 1024.0)),
            results = results.len(),
            "Filtered artifact"
        );

        let summaries: Vec<ResultSummary> = results
            .iter()
            .map(|r| ResultSummary::new(r, palette))
            .collect();

        for s in &summaries {
            report.total_filtered += s.points;
            log_result_summary(s);
        }

        report.filtered.push(ArtifactSummary {
            path,
            size_bytes,
            results: summaries,
        });
    }

    info!(total_valid_points = report.total_filtered, "Filtered totals");

    let all_files = find_files(dir, "_all.json", false)?;
    if !all_files.is_empty() {
        let mut total_all = 0usize;
        for path in &all_files {
            total_all += read_results(path)?
                .iter()
                .map(|r| r.data_points.len())
                .sum::<usize>();
        }
        report.total_all = Some(total_all);

        info!(
            total_points = total_all,
            valid_points = report.total_filtered,
            removed_points = total_all.saturating_sub(report.total_filtered),
            filter_ratio = %format!("{:.2}%", filter_ratio(report.total_filtered, total_all)),
            "Filtering effect"
        );
    }

    Ok(report)
}

fn log_result_summary(s: &ResultSummary) {
    info!(
        source = %s.filename,
        points = s.points,
        latitude_range = ?s.latitude_range,
        longitude_range = ?s.longitude_range,
        value_range = ?s.value_range,
        variables = s.variable_count,
        dimensions = s.dimension_count,
        variable = %s.variable,
        units = %s.units,
        long_name = %s.long_name,
        "Result"
    );

    for bin in s.histogram.iter().filter(|b| b.count > 0) {
        info!(bin = %bin.label, count = bin.count, "Value distribution");
    }

    log_sample(&s.filename, &s.sample);
}
