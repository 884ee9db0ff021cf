// ============================================================================
// splitter-cli/src/logging.rs
// ============================================================================
//
// LOGGING SETUP: fern dispatch for console and log file
//
// Console output goes to stderr so stdout stays free for results (--json).
// In normal mode only warnings and errors reach the console; --verbose
// lowers that to debug. When a log directory is given, a timestamped log
// file receives everything at debug level regardless of verbosity.
//
// AI-ASSISTANT-INFO: Logging initialization and helper functions

use std::path::{Path, PathBuf};

use log::LevelFilter;

use crate::cli_error;
use crate::error::{CliErrorContext, CliResult};

/// Crates whose debug output drowns our own.
const NOISY_TARGETS: &[&str] = &["tract_core", "tract_hir", "tract_onnx", "tract_linalg"];

/// Returns the current local timestamp formatted as "YYYYMMDD_HHMMSS".
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Console level for the given verbosity.
pub fn console_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    }
}

/// Installs the global logger. Returns the log file path, if any.
pub fn init_logging(verbose: bool, log_dir: Option<&Path>) -> CliResult<Option<PathBuf>> {
    let console = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} {:<5} {}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                message
            ))
        })
        .level(console_level(verbose))
        .chain(std::io::stderr());

    let mut root = fern::Dispatch::new().level(LevelFilter::Debug).chain(console);
    for target in NOISY_TARGETS {
        root = root.level_for(*target, LevelFilter::Warn);
    }

    let log_path = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .cli_with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let path = dir.join(format!("video_splitter_{}.log", get_timestamp()));
            let file = fern::log_file(&path)
                .cli_with_context(|| format!("Failed to open log file {}", path.display()))?;
            root = root.chain(
                fern::Dispatch::new()
                    .format(|out, message, record| {
                        out.finish(format_args!(
                            "{} [{}] {} {}",
                            chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                            record.level(),
                            record.target(),
                            message
                        ))
                    })
                    .level(LevelFilter::Debug)
                    .chain(file),
            );
            Some(path)
        }
        None => None,
    };

    root.apply()
        .map_err(|e| cli_error!("Failed to initialize logging: {e}"))?;
    Ok(log_path)
}
