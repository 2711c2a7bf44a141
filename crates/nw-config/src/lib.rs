//! Configuration management for notion-wiki.
//!
//! Parses `nw.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings (which also carry the `NOTION_*` environment variables) can
//! be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String values in the `[notion]` section support environment variable
//! expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `notion.token`
//! - `notion.root_page_id`
//! - `notion.api_url`

mod expand;

use std::path::{Path, PathBuf};
use std::time::Duration;

use nw_notion::{DEFAULT_API_URL, DEFAULT_NOTION_VERSION, EntityId};
use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override the integration token.
    pub token: Option<String>,
    /// Override the root page id.
    pub root_page_id: Option<String>,
    /// Override the output directory.
    pub output_dir: Option<PathBuf>,
    /// Override the cache directory.
    pub cache_dir: Option<PathBuf>,
    /// Override cache enabled flag.
    pub cache_enabled: Option<bool>,
    /// Override the fetch worker count.
    pub workers: Option<usize>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "nw.toml";

const DEFAULT_OUTPUT_DIR: &str = "notion_wiki";
const DEFAULT_CACHE_DIR: &str = "_notion_cache";
const DEFAULT_MAX_AGE_HOURS: u64 = 24;

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote API configuration.
    pub notion: NotionConfig,
    /// Output configuration (paths are relative strings from TOML).
    output: OutputConfigRaw,
    /// Cache configuration (paths are relative strings from TOML).
    cache: CacheConfigRaw,
    /// Fetch concurrency and rate limiting.
    pub fetch: FetchConfig,
    /// Collection table rendering.
    pub tables: TablesConfig,

    /// Resolved output configuration (set after loading).
    #[serde(skip)]
    pub output_resolved: OutputConfig,
    /// Resolved cache configuration (set after loading).
    #[serde(skip)]
    pub cache_resolved: CacheConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Remote API configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct NotionConfig {
    /// Integration token.
    pub token: Option<String>,
    /// Id of the page the mirror starts from.
    pub root_page_id: Option<String>,
    /// API base URL.
    pub api_url: String,
    /// Value sent in the `Notion-Version` header.
    pub notion_version: String,
    /// HTTP timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            token: None,
            root_page_id: None,
            api_url: DEFAULT_API_URL.to_owned(),
            notion_version: DEFAULT_NOTION_VERSION.to_owned(),
            timeout_secs: 30,
        }
    }
}

/// Validated credentials needed before any fetch.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Integration token.
    pub token: String,
    /// Parsed root page id.
    pub root: EntityId,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct OutputConfigRaw {
    dir: Option<String>,
}

/// Resolved output configuration with absolute paths.
#[derive(Debug, Default)]
pub struct OutputConfig {
    /// Directory receiving the mirrored documents.
    pub dir: PathBuf,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct CacheConfigRaw {
    enabled: Option<bool>,
    dir: Option<String>,
    max_age_hours: Option<u64>,
}

/// Resolved cache configuration.
#[derive(Debug)]
pub struct CacheConfig {
    /// Whether fetched payloads are cached on disk.
    pub enabled: bool,
    /// Cache root directory.
    pub dir: PathBuf,
    /// Entries older than this are refetched.
    pub max_age: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: PathBuf::from(DEFAULT_CACHE_DIR),
            max_age: hours(DEFAULT_MAX_AGE_HOURS),
        }
    }
}

/// Fetch concurrency and rate limiting.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Worker threads used while materializing content.
    pub workers: usize,
    /// Remote calls allowed per window.
    pub max_calls: u32,
    /// Rate limit window in milliseconds.
    pub period_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            workers: 3,
            max_calls: 3,
            period_ms: 1000,
        }
    }
}

impl FetchConfig {
    /// Rate limit window as a [`Duration`].
    #[must_use]
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }
}

/// Collection table rendering.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TablesConfig {
    /// Column selections for specific collections.
    pub overrides: Vec<ColumnOverride>,
}

/// Column selection for collections with a given title.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ColumnOverride {
    /// Collection title the override applies to.
    pub collection: String,
    /// Columns shown after the title column, in this order.
    pub columns: Vec<String>,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`notion.token`").
        field: String,
        /// Error message (e.g., "${`NOTION_TOKEN`} not set").
        message: String,
    },
}

fn hours(count: u64) -> Duration {
    Duration::from_secs(count.saturating_mul(60 * 60))
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `nw.toml` in current directory and parents,
    /// falling back to defaults relative to the current directory.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the resulting configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        config.validate()?;
        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(token) = &settings.token {
            self.notion.token = Some(token.clone());
        }
        if let Some(root) = &settings.root_page_id {
            self.notion.root_page_id = Some(root.clone());
        }
        if let Some(dir) = &settings.output_dir {
            self.output_resolved.dir.clone_from(dir);
        }
        if let Some(dir) = &settings.cache_dir {
            self.cache_resolved.dir.clone_from(dir);
        }
        if let Some(enabled) = settings.cache_enabled {
            self.cache_resolved.enabled = enabled;
        }
        if let Some(workers) = settings.workers {
            self.fetch.workers = workers;
        }
    }

    /// Get validated credentials.
    ///
    /// Missing or malformed credentials are a configuration failure: the
    /// caller must stop before issuing any fetch.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if the token or root id is missing,
    /// or the root id is not a 32-hex / dashed UUID identifier.
    pub fn require_credentials(&self) -> Result<Credentials, ConfigError> {
        let token = self.notion.token.as_deref().ok_or_else(|| {
            ConfigError::Validation(
                "notion.token required (config file or NOTION_TOKEN)".to_owned(),
            )
        })?;
        require_non_empty(token, "notion.token")?;

        let root = self.notion.root_page_id.as_deref().ok_or_else(|| {
            ConfigError::Validation(
                "notion.root_page_id required (config file or NOTION_ROOT_PAGE_ID)".to_owned(),
            )
        })?;
        let root = EntityId::parse(root.trim()).map_err(|e| {
            ConfigError::Validation(format!("notion.root_page_id is invalid: {e}"))
        })?;

        Ok(Credentials {
            token: token.trim().to_owned(),
            root,
        })
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            notion: NotionConfig::default(),
            output: OutputConfigRaw::default(),
            cache: CacheConfigRaw::default(),
            fetch: FetchConfig::default(),
            tables: TablesConfig::default(),
            output_resolved: OutputConfig {
                dir: base.join(DEFAULT_OUTPUT_DIR),
            },
            cache_resolved: CacheConfig {
                dir: base.join(DEFAULT_CACHE_DIR),
                ..CacheConfig::default()
            },
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Credentials are checked separately by [`Config::require_credentials`]
    /// so that commands which never talk to the API (cache maintenance) work
    /// without them.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.notion.api_url, "notion.api_url")?;
        require_http_url(&self.notion.api_url, "notion.api_url")?;
        require_non_empty(&self.notion.notion_version, "notion.notion_version")?;

        if self.notion.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "notion.timeout_secs must be greater than 0".to_owned(),
            ));
        }
        if self.fetch.workers == 0 {
            return Err(ConfigError::Validation(
                "fetch.workers must be at least 1".to_owned(),
            ));
        }
        if self.fetch.max_calls == 0 {
            return Err(ConfigError::Validation(
                "fetch.max_calls must be at least 1".to_owned(),
            ));
        }
        if self.fetch.period_ms == 0 {
            return Err(ConfigError::Validation(
                "fetch.period_ms must be greater than 0".to_owned(),
            ));
        }

        for table in &self.tables.overrides {
            require_non_empty(&table.collection, "tables.overrides.collection")?;
        }

        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref token) = self.notion.token {
            self.notion.token = Some(expand::expand_env(token, "notion.token")?);
        }
        if let Some(ref root) = self.notion.root_page_id {
            self.notion.root_page_id = Some(expand::expand_env(root, "notion.root_page_id")?);
        }
        self.notion.api_url = expand::expand_env(&self.notion.api_url, "notion.api_url")?;
        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let resolve = |path: Option<&str>, default: &str| config_dir.join(path.unwrap_or(default));

        self.output_resolved = OutputConfig {
            dir: resolve(self.output.dir.as_deref(), DEFAULT_OUTPUT_DIR),
        };
        self.cache_resolved = CacheConfig {
            enabled: self.cache.enabled.unwrap_or(true),
            dir: resolve(self.cache.dir.as_deref(), DEFAULT_CACHE_DIR),
            max_age: hours(self.cache.max_age_hours.unwrap_or(DEFAULT_MAX_AGE_HOURS)),
        };
    }
}
