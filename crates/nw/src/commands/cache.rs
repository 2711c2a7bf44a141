//! `nw cache` command implementation.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use nw_cache::FileCache;
use nw_config::{CliSettings, Config};

use crate::error::CliError;
use crate::output::Output;

/// Cache maintenance subcommands.
#[derive(Subcommand)]
pub(crate) enum CacheCommand {
    /// Remove every cached API payload.
    Clear(ClearArgs),
}

impl CacheCommand {
    /// Execute the cache subcommand.
    ///
    /// # Errors
    ///
    /// Returns an error if the subcommand fails.
    pub(crate) fn execute(self, version: &str) -> Result<(), CliError> {
        match self {
            Self::Clear(args) => args.execute(version),
        }
    }
}

/// Arguments for the cache clear command.
#[derive(Args)]
pub(crate) struct ClearArgs {
    /// Path to configuration file (default: auto-discover nw.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Cache directory (overrides config).
    #[arg(long, env = "NOTION_CACHE_DIR")]
    cache_dir: Option<PathBuf>,
}

impl ClearArgs {
    fn execute(self, version: &str) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            cache_dir: self.cache_dir,
            ..Default::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let cache = &config.cache_resolved;

        output.highlight(&format!("Clearing {}", cache.dir.display()));
        let removed = FileCache::new(cache.dir.clone(), version, cache.max_age).clear();
        output.success(&format!("Removed {removed} cached entries."));

        Ok(())
    }
}
