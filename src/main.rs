//! dirserve - Network File Browser
//!
//! Entry point for the dirserve binary.

use clap::Parser;
use dirserve::cli::Cli;
use dirserve::logging::init_logging;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    if let Err(err) = dirserve::run_app(&cli) {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}
