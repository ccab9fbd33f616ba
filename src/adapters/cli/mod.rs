//! CLI Adapter

pub mod commands;

pub use commands::{CliApp, Command, RunCmd, ScanCmd};
