//! Reference resolution for relation properties.
//!
//! Every id a relation points at is resolved once, in this order:
//!
//! 1. a registered entity: its title and document
//! 2. a materialized row: its title, and its own document if it has content,
//!    else its collection's table
//! 3. a single remote lookup as a page, then as a database: the fetched
//!    title, linked to the table of the page's collection when that
//!    collection was collected, else to the top-level document the title
//!    would map to. The lookup never expands the graph.
//! 4. unresolved: rendered as a placeholder holding the id
//!
//! Resolution happens before rendering so renderers stay pure.

use std::collections::HashMap;

use nw_notion::types::{Parent, PropertyValue};
use nw_notion::{EntityId, Fetcher};
use tracing::debug;

use crate::error::{Failure, Stage};
use crate::materialize::{Materialized, UNTITLED_RECORD};
use crate::paths::{DOCUMENT_EXTENSION, PathTable, slugify};
use crate::registry::Registry;

/// What a reference points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Display title and document path (relative to the output root).
    Resolved { title: String, document: String },
    /// Not found anywhere.
    Unresolved,
}

/// Resolution of every id referenced by a relation property.
#[derive(Debug, Clone, Default)]
pub struct References {
    targets: HashMap<EntityId, Target>,
}

impl References {
    /// Resolution of `id`. Ids that were never referenced are unresolved.
    #[must_use]
    pub fn get(&self, id: &EntityId) -> &Target {
        self.targets.get(id).unwrap_or(&Target::Unresolved)
    }

    /// Number of distinct referenced ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Whether nothing was referenced.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Output of the resolution phase.
#[derive(Debug, Default)]
pub struct Resolved {
    pub references: References,
    pub failures: Vec<Failure>,
}

/// Resolve every id referenced by a row's relation properties.
pub fn resolve_references(
    fetcher: &Fetcher,
    registry: &Registry,
    materialized: &Materialized,
    paths: &PathTable,
) -> Resolved {
    let mut resolved = Resolved::default();

    let referenced = materialized
        .rows()
        .iter()
        .flat_map(|row| row.properties.iter())
        .filter_map(|(_, value)| match value {
            PropertyValue::Relation(ids) => Some(ids),
            _ => None,
        })
        .flatten();

    for id in referenced {
        if resolved.references.targets.contains_key(id) {
            continue;
        }
        let target = resolve_local(registry, materialized, paths, id)
            .or_else(|| resolve_remote(fetcher, registry, paths, id))
            .unwrap_or_else(|| {
                resolved.failures.push(Failure::new(
                    *id,
                    Stage::Resolve,
                    "referenced object not found",
                ));
                Target::Unresolved
            });
        resolved.references.targets.insert(*id, target);
    }

    debug!("resolved {} referenced ids", resolved.references.len());
    resolved
}

fn resolve_local(
    registry: &Registry,
    materialized: &Materialized,
    paths: &PathTable,
    id: &EntityId,
) -> Option<Target> {
    let title = registry
        .get(id)
        .map(|entity| entity.title.clone())
        .or_else(|| materialized.row(id).map(|row| row.title.clone()))?;
    let document = paths.link_target(id)?.to_owned();
    Some(Target::Resolved { title, document })
}

fn resolve_remote(
    fetcher: &Fetcher,
    registry: &Registry,
    paths: &PathTable,
    id: &EntityId,
) -> Option<Target> {
    if let Ok(page) = fetcher.page(id) {
        let document = match page.parent {
            Parent::Database(collection) if registry.contains(&collection) => {
                paths.entity(&collection).map(str::to_owned)
            }
            _ => None,
        };
        let title = match page.parent {
            Parent::Database(_) => page.title_or(UNTITLED_RECORD),
            _ => page.title(),
        };
        let document = document
            .unwrap_or_else(|| format!("{}/index.{DOCUMENT_EXTENSION}", slugify(&title)));
        debug!("resolved {id} remotely as page \"{title}\"");
        return Some(Target::Resolved { title, document });
    }

    if let Ok(database) = fetcher.database(id) {
        let title = database.title();
        let document = format!("{}.{DOCUMENT_EXTENSION}", slugify(&title));
        debug!("resolved {id} remotely as collection \"{title}\"");
        return Some(Target::Resolved { title, document });
    }

    None
}
