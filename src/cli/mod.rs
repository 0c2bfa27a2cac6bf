//! CLI module for campusdb
//!
//! Provides command-line interface for:
//! - init: Create the data directory and an empty snapshot
//! - exec: Apply JSON-lines requests and save
//! - check: Verify the snapshot

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{
    check, exec, exec_stream, handle_line, init, run, run_command, Request, BAD_REQUEST,
};
pub use config::{Config, DEFAULT_LOG_FILTER};
pub use errors::{CliError, CliErrorCode, CliResult};
