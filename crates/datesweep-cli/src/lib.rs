//! datesweep command-line front end.

pub mod commands;
pub mod config;
pub mod output;

pub use config::{resolve_config_path, Overrides};
pub use output::OutputMode;
