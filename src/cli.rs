//! Command-line interface definitions for dirserve.
//!
//! All flags are optional; anything not given falls through to the
//! `DIRSERVE_*` environment, the `--config` file, and finally the built-in
//! defaults (see [`crate::config`]).
//!
//! # Example
//!
//! ```bash
//! # Serve the current directory on 127.0.0.1:8080
//! dirserve
//!
//! # Serve a specific tree on all interfaces
//! dirserve /srv/files --listen 0.0.0.0:8080
//!
//! # Verbose mode for debugging
//! dirserve -v /srv/files
//! ```

use clap::Parser;
use std::path::PathBuf;

/// Network file browser with cached directory-size aggregation.
///
/// Serves one directory tree over HTTP: listings with recursive directory
/// sizes, uploads, deletes, downloads, and name search.
#[derive(Debug, Parser)]
#[command(name = "dirserve")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to serve (defaults to the current directory)
    #[arg(value_name = "ROOT")]
    pub root: Option<PathBuf>,

    /// Listen address, host:port (e.g. 0.0.0.0:8080)
    #[arg(short, long, value_name = "ADDR")]
    pub listen: Option<String>,

    /// Recursion ceiling for directory sizing
    #[arg(long, value_name = "N")]
    pub max_depth: Option<usize>,

    /// Number of request worker threads
    #[arg(long, value_name = "N")]
    pub threads: Option<usize>,

    /// Path to a TOML configuration file
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}
