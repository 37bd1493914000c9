//! Cleaned table output

use std::path::Path;

use polars::prelude::*;

use super::error::{PrepError, Result};

/// Write a table as comma-separated CSV with a header row and no index
/// column, creating parent directories as needed.
pub fn save_dataset(df: &mut DataFrame, path: &Path) -> Result<()> {
    let write_error = |message: String| PrepError::Write {
        path: path.to_path_buf(),
        message,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| write_error(e.to_string()))?;
    }

    let mut file = std::fs::File::create(path).map_err(|e| write_error(e.to_string()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .map_err(|e| write_error(e.to_string()))?;

    tracing::info!(path = %path.display(), rows = df.height(), "Wrote cleaned table");
    Ok(())
}
