//! Input discovery.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

/// Files under `dir` whose name ends with `suffix` (ASCII case-insensitive),
/// sorted by path.
///
/// Only `dir` itself is searched unless `recursive` is set.
pub fn find_files(dir: &Path, suffix: &str, recursive: bool) -> Result<Vec<PathBuf>> {
    let suffix = suffix.to_ascii_lowercase();
    let mut walker = WalkDir::new(dir).min_depth(1);
    if !recursive {
        walker = walker.max_depth(1);
    }

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.with_context(|| format!("scanning {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .file_name()
            .to_str()
            .map(|name| name.to_ascii_lowercase().ends_with(&suffix))
            .unwrap_or(false);
        if matches {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

/// NetCDF inputs (`*.nc`) in `dir`.
pub fn find_nc_files(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    find_files(dir, ".nc", recursive)
}
