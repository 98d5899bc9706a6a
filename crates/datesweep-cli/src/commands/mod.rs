//! Subcommand implementations.

pub mod candidates_cmd;
pub mod ledger_cmd;
pub mod offsets_cmd;
pub mod run_cmd;
