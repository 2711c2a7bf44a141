//! Link rewriting over the written tree.
//!
//! Rendered text can still hold links that point at raw Notion ids: workspace
//! URLs and dashed or bare ids. Links to ids with an output document are
//! replaced by a relative path to that document; all other links are left
//! as they are. Rewritten links never match again, so a second pass is a
//! no-op.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use nw_notion::EntityId;
use rayon::prelude::*;
use regex::{Captures, Regex};
use tracing::{debug, info};

use crate::error::{Failure, Stage};
use crate::paths::{PathTable, relative_path};
use crate::render::Document;

/// `](https://www.notion.so/<workspace>/<Title->32hex?query)`
static URL_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\]\(https://(?:www\.)?notion\.so/(?:[^)\s]*[/-])?([0-9a-f]{32})(?:[?#][^)\s]*)?\)")
        .unwrap()
});

/// `](8-4-4-4-12)`, optionally after the workspace host.
static DASHED_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\]\((?:https://(?:www\.)?notion\.so/(?:[^)\s]*/)?)?([0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12})\)",
    )
    .unwrap()
});

/// `](32hex)`
static BARE_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\]\(([0-9a-f]{32})\)").unwrap());

/// Output document of every linkable id, keyed by compact id.
#[derive(Debug, Clone, Default)]
pub struct LinkIndex {
    targets: HashMap<String, String>,
}

impl LinkIndex {
    /// Index every entity and row known to `paths`.
    #[must_use]
    pub fn from_paths(paths: &PathTable) -> Self {
        Self {
            targets: paths
                .link_targets()
                .map(|(id, document)| (id.compact(), document.to_owned()))
                .collect(),
        }
    }

    /// Document of an id given in compact or dashed form.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&str> {
        let compact = id.replace('-', "");
        self.targets.get(&compact).map(String::as_str)
    }

    /// Number of indexed ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Whether nothing is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Rewrite links in `text` belonging to document `from`.
///
/// Returns the new text and the number of links rewritten.
#[must_use]
pub fn rewrite_links(text: &str, from: &str, index: &LinkIndex) -> (String, usize) {
    let mut count = 0;
    let mut result = text.to_owned();

    for pattern in [&*URL_LINK, &*DASHED_LINK, &*BARE_LINK] {
        result = pattern
            .replace_all(&result, |caps: &Captures| match index.get(&caps[1]) {
                Some(document) => {
                    count += 1;
                    format!("]({})", relative_path(from, document))
                }
                None => caps[0].to_owned(),
            })
            .into_owned();
    }

    (result, count)
}

/// Result of rewriting the tree.
#[derive(Debug, Default)]
pub struct RewriteOutcome {
    pub files_changed: usize,
    pub links_rewritten: usize,
    pub failures: Vec<Failure>,
}

/// Rewrite links in every written document under `out_dir`.
///
/// Files are only written back when their content changed.
pub fn rewrite_tree(out_dir: &Path, documents: &[Document], index: &LinkIndex) -> RewriteOutcome {
    let results: Vec<Result<usize, Failure>> = documents
        .par_iter()
        .map(|document| rewrite_file(out_dir, document.id, &document.path, index))
        .collect();

    let mut outcome = RewriteOutcome::default();
    for result in results {
        match result {
            Ok(0) => {}
            Ok(count) => {
                outcome.files_changed += 1;
                outcome.links_rewritten += count;
            }
            Err(failure) => outcome.failures.push(failure),
        }
    }

    info!(
        "rewrote {} links in {} files",
        outcome.links_rewritten, outcome.files_changed
    );
    outcome
}

fn rewrite_file(
    out_dir: &Path,
    id: EntityId,
    path: &str,
    index: &LinkIndex,
) -> Result<usize, Failure> {
    let target = out_dir.join(path);
    let text = fs::read_to_string(&target).map_err(|e| {
        Failure::new(id, Stage::Rewrite, format!("cannot read {}: {e}", target.display()))
    })?;

    let (rewritten, count) = rewrite_links(&text, path, index);
    if rewritten == text {
        return Ok(0);
    }

    fs::write(&target, rewritten).map_err(|e| {
        Failure::new(id, Stage::Rewrite, format!("cannot write {}: {e}", target.display()))
    })?;
    debug!("rewrote {count} links in {}", target.display());
    Ok(count)
}
