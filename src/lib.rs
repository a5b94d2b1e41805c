//! dirserve - Network File Browser
//!
//! An HTTP server over one directory tree: listings where every directory
//! carries its full recursive size, served from a memoizing cache with
//! path-scoped invalidation, plus uploads, deletes, downloads, and name
//! search.

pub mod api;
pub mod browse;
pub mod cli;
pub mod config;
pub mod logging;
pub mod signal;
pub mod sizing;

use std::sync::Arc;

use anyhow::Result;
use log::info;

use crate::api::ApiServer;
use crate::cli::Cli;
use crate::config::Config;
use crate::sizing::{Aggregator, SizeCache};

/// Run the server to completion.
///
/// Everything after CLI parsing and logger setup lives here: config
/// assembly, engine construction, signal hookup, and the serve loop.
/// Returns once the shutdown flag has drained the workers.
///
/// # Errors
///
/// Configuration and bind failures; serving itself only logs.
pub fn run_app(cli: &Cli) -> Result<()> {
    let config = Config::load(cli)?;
    info!(
        "Serving root {} (max depth {})",
        config.root.display(),
        config.max_depth
    );

    let cache = Arc::new(SizeCache::new());
    let sizes = Arc::new(Aggregator::new(&config.root, cache).with_max_depth(config.max_depth));

    let handler = signal::install_handler()?;
    let server = ApiServer::bind(&config.listen, Arc::clone(&sizes), config.threads)?;
    if let Some(addr) = server.local_addr() {
        info!("Listening on http://{}", addr);
    }
    server.run(&handler.get_flag());

    info!("Shutdown complete");
    Ok(())
}
