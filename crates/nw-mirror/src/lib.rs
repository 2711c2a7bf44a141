//! Mirror a Notion workspace subtree into relative-linked Markdown.
//!
//! The run is a sequence of phases, each a function of the previous phase's
//! output (see [`Mirror`]):
//!
//! - [`collect`]: entity graph from the root
//! - [`materialize`]: page blocks and collection rows
//! - [`PathTable`]: output path of every entity and row
//! - [`resolve_references`] and [`BacklinkIndex`]: relation targets, both ways
//! - [`render_documents`]: Markdown text
//! - [`write_documents`] and [`rewrite_tree`]: files on disk
//!
//! # Example
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::path::PathBuf;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use nw_cache::NullCache;
//! use nw_mirror::{Mirror, MirrorOptions};
//! use nw_notion::{ClientOptions, EntityId, Fetcher, NotionClient, RateLimiter};
//!
//! let client = NotionClient::new("secret_token", &ClientOptions::default());
//! let fetcher = Fetcher::new(
//!     Arc::new(client),
//!     &NullCache,
//!     RateLimiter::new(3, Duration::from_secs(1)),
//! );
//! let options = MirrorOptions {
//!     output_dir: PathBuf::from("notion_wiki"),
//!     workers: 3,
//!     column_overrides: Vec::new(),
//! };
//!
//! let root = EntityId::parse("0123456789abcdef0123456789abcdef")?;
//! let report = Mirror::new(&fetcher, options).run(root)?;
//! println!("{} documents written", report.documents_written);
//! # Ok(())
//! # }
//! ```

mod backlinks;
mod collect;
mod error;
mod materialize;
mod paths;
mod pipeline;
mod registry;
mod render;
mod resolve;
mod rewrite;
mod write;

pub use backlinks::{Backlink, BacklinkIndex};
pub use collect::{Collected, collect};
pub use error::{Failure, MirrorError, Stage};
pub use materialize::{Content, Materialized, Row, UNTITLED_RECORD, materialize};
pub use paths::{DOCUMENT_EXTENSION, PathTable, relative_path, slugify};
pub use pipeline::{Mirror, MirrorOptions, MirrorReport};
pub use registry::{Entity, EntityKind, Registry};
pub use render::{
    ColumnOverride, Document, RenderContext, escape_cell, render_block, render_documents,
    render_field,
};
pub use resolve::{References, Resolved, Target, resolve_references};
pub use rewrite::{LinkIndex, RewriteOutcome, rewrite_links, rewrite_tree};
pub use write::{WriteOutcome, write_documents};
