//! JSON artifacts.
//!
//! Each artifact is a pretty-printed UTF-8 JSON array holding one
//! extraction result, named `<stem>_all.json` or `<stem>_filtered.json`.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use grid_extract::{ExtractionResult, InclusionPolicy};

/// File stem of `source`, `"output"` when it has none.
pub fn stem(source: &Path) -> String {
    source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output")
        .to_string()
}

/// `<dir>/<stem>_<all|filtered>.json`
pub fn json_path(dir: &Path, source: &Path, policy: InclusionPolicy) -> PathBuf {
    dir.join(format!("{}_{}.json", stem(source), policy.artifact_suffix()))
}

/// `<dir>/<stem>_filtered.png`
pub fn png_path(dir: &Path, source: &Path) -> PathBuf {
    dir.join(format!(
        "{}_{}.png",
        stem(source),
        InclusionPolicy::ExcludeAbsent.artifact_suffix()
    ))
}

/// Write `result` as a one-element array.
pub fn write_result(path: &Path, result: &ExtractionResult) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, std::slice::from_ref(result))
        .with_context(|| format!("writing {}", path.display()))?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}

/// Read every result in an artifact.
pub fn read_results(path: &Path) -> Result<Vec<ExtractionResult>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing {}", path.display()))
}
