//! Error types for the mirror pipeline.

use std::fmt;
use std::path::PathBuf;

use nw_notion::{EntityId, FetchError};

/// Error that stops a mirror run.
#[derive(Debug, thiserror::Error)]
pub enum MirrorError {
    /// The root could not be retrieved as a page or a database.
    #[error("root {id} is not retrievable: {source}")]
    RootUnavailable {
        /// Configured root id.
        id: EntityId,
        /// Last fetch error.
        source: FetchError,
    },

    /// Invalid run options.
    #[error("invalid mirror options: {0}")]
    Config(String),

    /// Output directory cannot be created.
    #[error("cannot create output directory {}: {source}", path.display())]
    OutputDir {
        /// Output directory.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Pipeline phase in which a non-fatal failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Collect,
    Materialize,
    Resolve,
    Write,
    Rewrite,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Collect => "collect",
            Self::Materialize => "materialize",
            Self::Resolve => "resolve",
            Self::Write => "write",
            Self::Rewrite => "rewrite",
        })
    }
}

/// A problem with one object that did not stop the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// Object the failure concerns.
    pub id: EntityId,
    pub stage: Stage,
    pub message: String,
}

impl Failure {
    pub(crate) fn new(id: EntityId, stage: Stage, message: impl fmt::Display) -> Self {
        let failure = Self {
            id,
            stage,
            message: message.to_string(),
        };
        tracing::warn!("{failure}");
        failure
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.stage, self.id, self.message)
    }
}
