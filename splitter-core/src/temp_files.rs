//! Output directory management.
//!
//! Segments go to the directory the caller names. Without one, a fresh
//! timestamped directory is created under the system temporary directory
//! and kept after the run, since it holds the results.

use std::path::{Path, PathBuf};

use chrono::Local;
use tempfile::Builder as TempFileBuilder;

use crate::error::CoreResult;

/// Prefix of automatically created output directories.
pub const OUTPUT_DIR_PREFIX: &str = "video_segments";

/// Creates (recursively) and returns the segment output directory.
pub fn prepare_output_dir(requested: Option<&Path>) -> CoreResult<PathBuf> {
    match requested {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            Ok(dir.to_path_buf())
        }
        None => create_timestamped_dir(&std::env::temp_dir()),
    }
}

/// Creates `<base>/video_segments_YYYYMMDD_HHMMSS_<random>` and keeps it.
pub fn create_timestamped_dir(base: &Path) -> CoreResult<PathBuf> {
    std::fs::create_dir_all(base)?;
    let prefix = format!(
        "{OUTPUT_DIR_PREFIX}_{}_",
        Local::now().format("%Y%m%d_%H%M%S")
    );
    let dir = TempFileBuilder::new().prefix(&prefix).tempdir_in(base)?;
    let path = dir.keep();
    log::debug!("Created output directory {}", path.display());
    Ok(path)
}
