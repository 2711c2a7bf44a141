//! `nw mirror` command implementation.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use clap::builder::BoolishValueParser;
use nw_cache::{Cache, FileCache, NullCache};
use nw_config::{CliSettings, Config};
use nw_mirror::{ColumnOverride, Mirror, MirrorOptions, MirrorReport};
use nw_notion::{ClientOptions, FetchStats, Fetcher, NotionClient, RateLimiter};

use crate::error::CliError;
use crate::output::Output;

/// Failures listed in full before the rest are summarized.
const MAX_LISTED_FAILURES: usize = 20;

/// Arguments for the mirror command.
#[derive(Args)]
pub(crate) struct MirrorArgs {
    /// Path to configuration file (default: auto-discover nw.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory (overrides config).
    #[arg(short, long, env = "NOTION_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Page id to mirror, 32-hex or dashed (overrides config).
    #[arg(long, env = "NOTION_ROOT_PAGE_ID")]
    root_page_id: Option<String>,

    /// Integration token (overrides config).
    #[arg(long, env = "NOTION_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Cache directory (overrides config).
    #[arg(long, env = "NOTION_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Enable caching (default: enabled).
    #[arg(long, env = "NOTION_USE_CACHE", value_parser = BoolishValueParser::new())]
    cache: Option<bool>,

    /// Disable caching. Wins over `--cache` and `NOTION_USE_CACHE`.
    #[arg(long)]
    no_cache: bool,

    /// Worker threads used to fetch content (overrides config).
    #[arg(short, long)]
    workers: Option<usize>,

    /// Enable verbose output (per-phase progress logs).
    #[arg(short, long)]
    pub verbose: bool,
}

impl MirrorArgs {
    /// Execute the mirror command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid or the root cannot be
    /// mirrored. Failures of individual objects are reported, not returned.
    pub(crate) fn execute(self, version: &str) -> Result<(), CliError> {
        let output = Output::new();

        let cache_enabled = self.resolve_cache_enabled();
        let cli_settings = CliSettings {
            token: self.token,
            root_page_id: self.root_page_id,
            output_dir: self.output_dir,
            cache_dir: self.cache_dir,
            cache_enabled,
            workers: self.workers,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let credentials = config.require_credentials()?;

        let client = NotionClient::new(
            &credentials.token,
            &ClientOptions {
                api_url: config.notion.api_url.clone(),
                notion_version: config.notion.notion_version.clone(),
                timeout: Duration::from_secs(config.notion.timeout_secs),
            },
        );
        let cache = create_cache(&config, version);
        let fetcher = Fetcher::new(
            Arc::new(client),
            cache.as_ref(),
            RateLimiter::new(config.fetch.max_calls, config.fetch.period()),
        );

        let options = MirrorOptions {
            output_dir: config.output_resolved.dir.clone(),
            workers: config.fetch.workers,
            column_overrides: config
                .tables
                .overrides
                .iter()
                .map(|o| ColumnOverride {
                    collection: o.collection.clone(),
                    columns: o.columns.clone(),
                })
                .collect(),
        };

        output.info(&format!(
            "Mirroring {} into {}...",
            credentials.root,
            options.output_dir.display()
        ));
        let report = Mirror::new(&fetcher, options).run(credentials.root)?;
        print_report(&output, &report, fetcher.stats());

        Ok(())
    }

    fn resolve_cache_enabled(&self) -> Option<bool> {
        if self.no_cache {
            Some(false)
        } else {
            self.cache
        }
    }
}

fn create_cache(config: &Config, version: &str) -> Box<dyn Cache> {
    let cache = &config.cache_resolved;
    if cache.enabled {
        tracing::debug!("caching API payloads in {}", cache.dir.display());
        Box::new(FileCache::new(cache.dir.clone(), version, cache.max_age))
    } else {
        Box::new(NullCache)
    }
}

fn print_report(output: &Output, report: &MirrorReport, stats: FetchStats) {
    output.success(&format!(
        "\nMirrored {} entities and {} rows into {} documents.",
        report.entities, report.rows, report.documents_written
    ));
    output.field("Links rewritten", &report.links_rewritten.to_string());
    output.field("API calls", &stats.remote_calls.to_string());
    output.field("Cache hits", &stats.cache_hits.to_string());

    if report.failures.is_empty() {
        return;
    }
    output.warning(&format!("\nFailures ({}):", report.failures.len()));
    for failure in report.failures.iter().take(MAX_LISTED_FAILURES) {
        output.info(&format!("  -> {failure}"));
    }
    if report.failures.len() > MAX_LISTED_FAILURES {
        output.info(&format!(
            "  ... and {} more (run with --verbose for details)",
            report.failures.len() - MAX_LISTED_FAILURES
        ));
    }
}
