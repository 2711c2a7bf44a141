//! CLI error types.

use nw_config::ConfigError;
use nw_mirror::MirrorError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Mirror(#[from] MirrorError),
}
