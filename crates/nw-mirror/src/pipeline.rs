//! The mirror run: every phase in order.
//!
//! 1. Collect the entity graph from the root
//! 2. Materialize page blocks and collection rows
//! 3. Build output paths
//! 4. Resolve relation targets and index backlinks
//! 5. Render documents
//! 6. Write documents
//! 7. Rewrite remaining links to Notion ids
//!
//! Each phase finishes before the next starts and hands its output on as an
//! immutable value.

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use nw_notion::{EntityId, Fetcher};
use tracing::info;

use crate::backlinks::BacklinkIndex;
use crate::collect::collect;
use crate::error::{Failure, MirrorError};
use crate::materialize::materialize;
use crate::paths::PathTable;
use crate::render::{ColumnOverride, Document, RenderContext, render_documents};
use crate::resolve::resolve_references;
use crate::rewrite::{LinkIndex, rewrite_tree};
use crate::write::write_documents;

/// Options of a mirror run.
#[derive(Debug, Clone)]
pub struct MirrorOptions {
    /// Output root, created if missing.
    pub output_dir: PathBuf,
    /// Size of the materialization worker pool.
    pub workers: usize,
    pub column_overrides: Vec<ColumnOverride>,
}

/// Summary of a finished run.
#[derive(Debug, Default)]
pub struct MirrorReport {
    /// Pages and collections collected.
    pub entities: usize,
    /// Collection rows materialized.
    pub rows: usize,
    pub documents_written: usize,
    pub links_rewritten: usize,
    /// Non-fatal failures of every phase, in phase order.
    pub failures: Vec<Failure>,
}

/// Mirrors a workspace subtree into Markdown files.
pub struct Mirror<'a> {
    fetcher: &'a Fetcher,
    options: MirrorOptions,
}

impl<'a> Mirror<'a> {
    /// Create a mirror reading through `fetcher`.
    #[must_use]
    pub fn new(fetcher: &'a Fetcher, options: MirrorOptions) -> Self {
        Self { fetcher, options }
    }

    /// Mirror everything reachable from `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the options are invalid
    /// - the output directory cannot be created
    /// - the root cannot be retrieved
    ///
    /// Problems with individual objects are reported in
    /// [`MirrorReport::failures`].
    pub fn run(&self, root: EntityId) -> Result<MirrorReport, MirrorError> {
        if self.options.workers == 0 {
            return Err(MirrorError::Config("workers must be at least 1".to_owned()));
        }
        let collected = collect(self.fetcher, root)?;
        let out_dir = &self.options.output_dir;
        fs::create_dir_all(out_dir).map_err(|source| MirrorError::OutputDir {
            path: out_dir.clone(),
            source,
        })?;
        let registry = collected.registry;
        let mut failures = collected.failures;

        let mut materialized = materialize(self.fetcher, &registry, self.options.workers)?;
        failures.append(&mut materialized.failures);

        let paths = PathTable::build(&registry, &materialized);
        let resolved = resolve_references(self.fetcher, &registry, &materialized, &paths);
        failures.extend(resolved.failures);
        let backlinks = BacklinkIndex::build(&materialized);

        let documents = render_documents(&RenderContext {
            registry: &registry,
            materialized: &materialized,
            paths: &paths,
            references: &resolved.references,
            backlinks: &backlinks,
            overrides: &self.options.column_overrides,
        });
        info!("rendered {} documents", documents.len());

        let outcome = write_documents(out_dir, &documents);
        failures.extend(outcome.failures);
        let paths_written: HashSet<String> = outcome.written.into_iter().collect();
        let written: Vec<Document> = documents
            .into_iter()
            .filter(|document| paths_written.contains(&document.path))
            .collect();

        let rewritten = rewrite_tree(out_dir, &written, &LinkIndex::from_paths(&paths));
        failures.extend(rewritten.failures);

        let report = MirrorReport {
            entities: registry.len(),
            rows: materialized.rows().len(),
            documents_written: written.len(),
            links_rewritten: rewritten.links_rewritten,
            failures,
        };
        info!(
            "mirrored {} entities and {} rows into {} documents ({} failures)",
            report.entities,
            report.rows,
            report.documents_written,
            report.failures.len()
        );
        Ok(report)
    }
}
