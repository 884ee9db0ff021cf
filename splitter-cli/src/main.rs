// ============================================================================
// splitter-cli/src/main.rs
// ============================================================================
//
// MAIN ENTRY POINT: video-splitter binary
//
// Exit codes: 0 on success, 1 when the split fails for any reason (invalid
// configuration, missing input, model or ffmpeg failure). Argument parsing
// errors are reported by clap with its own exit code.
//
// AI-ASSISTANT-INFO: Application entry point

use std::process::ExitCode;

use clap::Parser;
use splitter_cli::commands::split::result_json;
use splitter_cli::logging::init_logging;
use splitter_cli::error::recovery_hint;
use splitter_cli::terminal::{print_error, print_hint, print_summary};
use splitter_cli::{Cli, Commands, TerminalReporter, run_split};
use splitter_core::progress_reporting::{clear_progress_reporter, set_progress_reporter};

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let log_path = match init_logging(cli.verbose, cli.log_dir.as_deref()) {
        Ok(path) => path,
        Err(e) => {
            print_error(&e.to_string());
            return Ok(ExitCode::FAILURE);
        }
    };
    if let Some(path) = &log_path {
        log::info!("Logging to {}", path.display());
    }

    match cli.command {
        Commands::Split(args) => {
            // JSON mode keeps stdout for the result alone.
            if !args.json {
                set_progress_reporter(Box::new(TerminalReporter::new()));
            }

            let outcome = run_split(&args);
            clear_progress_reporter();

            match outcome {
                Ok(result) => {
                    if args.json {
                        println!("{}", result_json(&result)?);
                    } else {
                        print_summary(&result);
                    }
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    log::debug!("Split failed: {e:?}");
                    print_error(&e.to_string());
                    if let Some(hint) = recovery_hint(&e) {
                        print_hint(hint);
                    }
                    Ok(ExitCode::FAILURE)
                }
            }
        }
    }
}
