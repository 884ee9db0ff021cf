// ============================================================================
// splitter-cli/src/commands/mod.rs
// ============================================================================
//
// COMMAND MODULES: one module per subcommand
//
// AI-ASSISTANT-INFO: Command implementations for the CLI

pub mod split;

pub use split::run_split;
