use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::info;

use crate::error::{Result, TouchError};

/// File name for a session exported at `at`
pub fn export_file_name(at: DateTime<Local>) -> String {
    format!("TouchLog_{}.csv", at.format("%Y-%m-%d_%H-%M-%S"))
}

/// Write `text` into `dir` under a timestamped name, creating `dir` if needed.
///
/// An existing file is never overwritten; a numeric suffix is added instead.
pub fn write_export(dir: &Path, text: &str, at: DateTime<Local>) -> Result<PathBuf> {
    fs::create_dir_all(dir).map_err(|source| TouchError::Write {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = free_path(dir, &export_file_name(at));
    fs::write(&path, text).map_err(|source| TouchError::Write {
        path: path.clone(),
        source,
    })?;

    info!(path = %path.display(), bytes = text.len(), "session exported");
    Ok(path)
}

fn free_path(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let stem = file_name.trim_end_matches(".csv");
    (1..)
        .map(|n| dir.join(format!("{stem}_{n}.csv")))
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}
