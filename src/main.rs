//! campusdb CLI entry point
//!
//! Installs the log subscriber, then delegates to the CLI module. Prints
//! errors to stderr and exits non-zero on failure.

use campusdb::cli::{self, Cli, Config, DEFAULT_LOG_FILTER};
use campusdb::observability::{log_event, Event};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() {
    let cli = Cli::parse_args();

    // RUST_LOG wins; otherwise the config's filter, if the config loads
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directive = Config::load(cli.command.config_path())
            .map(|config| config.log_filter)
            .unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());
        EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    });
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    log_event(Event::BootStart);
    if let Err(e) = cli::run_command(cli.command) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
