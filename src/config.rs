//! Application configuration management.
//!
//! Settings are layered, weakest first: built-in defaults, an optional
//! TOML file named with `--config`, `DIRSERVE_*` environment variables,
//! then CLI flags. The serving root is validated and canonicalized once
//! here, so everything downstream compares paths against one stable
//! absolute form.
//!
//! # Example file
//!
//! ```toml
//! root = "/srv/files"
//! listen = "0.0.0.0:8080"
//! max_depth = 64
//! threads = 8
//! ```

use std::net::ToSocketAddrs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cli::Cli;
use crate::sizing::DEFAULT_MAX_DEPTH;

/// Runtime settings for the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory served to clients.
    pub root: PathBuf,
    /// Listen address, host:port.
    pub listen: String,
    /// Recursion ceiling for sizing and invalidation walks.
    pub max_depth: usize,
    /// Worker threads handling requests.
    pub threads: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            listen: "127.0.0.1:8080".to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
            threads: 4,
        }
    }
}

impl Config {
    /// Assemble the configuration for this invocation.
    ///
    /// # Errors
    ///
    /// Fails on an unreadable or malformed config file, a root that is not
    /// an existing directory, a listen address that resolves to nothing,
    /// or a zero thread count.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = &cli.config {
            // figment skips missing files silently; an explicit flag should not
            if !path.is_file() {
                bail!("Config file {} does not exist", path.display());
            }
            figment = figment.merge(Toml::file(path));
        }
        figment = figment.merge(Env::prefixed("DIRSERVE_"));

        let mut config: Self = figment
            .extract()
            .context("Failed to assemble configuration")?;

        // CLI flags are the strongest layer
        if let Some(root) = &cli.root {
            config.root = root.clone();
        }
        if let Some(listen) = &cli.listen {
            config.listen = listen.clone();
        }
        if let Some(max_depth) = cli.max_depth {
            config.max_depth = max_depth;
        }
        if let Some(threads) = cli.threads {
            config.threads = threads;
        }

        config.validate()?;
        config.root = config
            .root
            .canonicalize()
            .with_context(|| format!("Cannot resolve serving root {}", config.root.display()))?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !self.root.is_dir() {
            bail!(
                "Serving root {} is not an existing directory",
                self.root.display()
            );
        }
        if self.threads == 0 {
            bail!("threads must be at least 1");
        }
        let resolved = self
            .listen
            .to_socket_addrs()
            .with_context(|| format!("Invalid listen address {}", self.listen))?;
        if resolved.count() == 0 {
            bail!("Listen address {} resolves to nothing", self.listen);
        }
        Ok(())
    }
}
