//! CLI argument definitions using clap
//!
//! Commands:
//! - campusdb init --config <path>
//! - campusdb exec --config <path>
//! - campusdb check --config <path>

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

/// campusdb - A strict, deterministic integrity engine for academic records
#[derive(Parser, Debug)]
#[command(name = "campusdb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the data directory and an empty snapshot
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./campusdb.json")]
        config: PathBuf,
    },

    /// Apply JSON-lines requests from stdin, then save
    Exec {
        /// Path to configuration file
        #[arg(long, default_value = "./campusdb.json")]
        config: PathBuf,
    },

    /// Verify the snapshot and print record counts
    Check {
        /// Path to configuration file
        #[arg(long, default_value = "./campusdb.json")]
        config: PathBuf,
    },
}

impl Command {
    pub fn config_path(&self) -> &Path {
        match self {
            Command::Init { config } | Command::Exec { config } | Command::Check { config } => {
                config
            }
        }
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
