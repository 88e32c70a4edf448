//! Pikeman CLI binary entry point.
//! Parses flags, wires the filesystem discovery and built-in engine, and
//! turns the run outcome into an exit status.

use clap::{CommandFactory, Parser};
use pikeman::cli::Cli;
use pikeman::discovery::FsDiscovery;
use pikeman::engine::LineEngine;
use pikeman::session::{self, RunError};
use pikeman::utils;
use std::io;
use tracing::debug;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.debug);

    let discovery = if cli.search_roots.is_empty() {
        FsDiscovery::from_env()
    } else {
        FsDiscovery::new(cli.search_roots.clone())
    };
    debug!("Package search roots: {:?}", discovery.search_roots());

    let color = utils::use_colors();
    let options = cli.run_options(color);
    let stdout = io::stdout();
    let stderr = io::stderr();
    let result = session::run(
        options,
        &discovery,
        &LineEngine,
        &mut stdout.lock(),
        &mut stderr.lock(),
    );
    match result {
        Ok(outcome) => std::process::exit(outcome.exit_code),
        Err(e) => {
            eprintln!("{} {}", utils::error_prefix(color), e);
            if let RunError::Usage(_) = e {
                eprintln!("{}", Cli::command().render_help());
            }
            std::process::exit(e.exit_code());
        }
    }
}

/// Initialize tracing based on CLI flags; `RUST_LOG` wins when set.
fn init_logging(verbose: bool, debug: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    debug!("Logging initialized at level: {}", level);
}
