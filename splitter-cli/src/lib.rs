// ============================================================================
// splitter-cli/src/lib.rs
// ============================================================================
//
// SPLITTER CLI LIBRARY: internal modules of the video-splitter binary
//
// The binary in main.rs only parses arguments, sets up logging and output,
// and maps errors to exit codes. Everything else lives here so it can be
// unit tested.
//
// AI-ASSISTANT-INFO: CLI library entry point

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod terminal;

// Used by the cli_error! macro.
pub use splitter_core;

pub use cli::{Cli, Commands, SplitArgs};
pub use commands::run_split;
pub use error::{CliErrorContext, CliResult};
pub use terminal::TerminalReporter;
