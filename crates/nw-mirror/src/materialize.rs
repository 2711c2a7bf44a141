//! Bulk materialization: fetches the content of every registered entity.
//!
//! Pages get their blocks. Collections get their schema, their rows in query
//! order, and each row's own blocks. Fetches run on a bounded `rayon` pool;
//! results are assembled in registry order so the output does not depend on
//! scheduling.

use std::collections::HashMap;

use nw_notion::types::{Block, Database, PropertyValue};
use nw_notion::{EntityId, Fetcher};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::{Failure, MirrorError, Stage};
use crate::registry::{Entity, EntityKind, Registry};

/// Placeholder title for rows without one.
pub const UNTITLED_RECORD: &str = "Untitled Record";

/// Fetched content of a page or collection.
#[derive(Debug, Clone)]
pub enum Content {
    Page {
        blocks: Vec<Block>,
    },
    Collection {
        /// `None` when the schema could not be fetched.
        schema: Option<Database>,
        /// Row ids in query order.
        rows: Vec<EntityId>,
    },
}

/// One row of a collection.
#[derive(Debug, Clone)]
pub struct Row {
    pub id: EntityId,
    pub collection_id: EntityId,
    pub collection_title: String,
    pub title: String,
    pub properties: Vec<(String, PropertyValue)>,
    /// Empty when the row has no content of its own.
    pub blocks: Vec<Block>,
}

impl Row {
    /// Whether the row gets its own document.
    #[must_use]
    pub fn has_content(&self) -> bool {
        !self.blocks.is_empty()
    }

    /// Value of the property called `name`.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }
}

/// Output of the materialization phase.
#[derive(Debug, Default)]
pub struct Materialized {
    contents: HashMap<EntityId, Content>,
    rows: Vec<Row>,
    row_index: HashMap<EntityId, usize>,
    pub failures: Vec<Failure>,
}

impl Materialized {
    /// Content of a registered entity.
    #[must_use]
    pub fn content(&self, id: &EntityId) -> Option<&Content> {
        self.contents.get(id)
    }

    /// Blocks of a page, empty for anything else.
    #[must_use]
    pub fn blocks(&self, id: &EntityId) -> &[Block] {
        match self.contents.get(id) {
            Some(Content::Page { blocks }) => blocks,
            _ => &[],
        }
    }

    /// Schema of a collection.
    #[must_use]
    pub fn schema(&self, id: &EntityId) -> Option<&Database> {
        match self.contents.get(id) {
            Some(Content::Collection { schema, .. }) => schema.as_ref(),
            _ => None,
        }
    }

    /// Rows of a collection in query order.
    pub fn collection_rows(&self, id: &EntityId) -> impl Iterator<Item = &Row> {
        let ids: &[EntityId] = match self.contents.get(id) {
            Some(Content::Collection { rows, .. }) => rows,
            _ => &[],
        };
        ids.iter().filter_map(|row| self.row(row))
    }

    /// Look up a row.
    #[must_use]
    pub fn row(&self, id: &EntityId) -> Option<&Row> {
        self.row_index.get(id).map(|&idx| &self.rows[idx])
    }

    /// All rows, collection by collection in registry order.
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }
}

struct Fetched {
    id: EntityId,
    content: Content,
    rows: Vec<Row>,
    failures: Vec<Failure>,
}

/// Fetch the content of every registered entity on `workers` threads.
///
/// # Errors
///
/// Returns [`MirrorError::Config`] if the worker pool cannot be built. Fetch
/// failures are recorded and leave the affected content empty.
pub fn materialize(
    fetcher: &Fetcher,
    registry: &Registry,
    workers: usize,
) -> Result<Materialized, MirrorError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .build()
        .map_err(|e| MirrorError::Config(format!("failed to create worker pool: {e}")))?;

    let fetched: Vec<Fetched> = pool.install(|| {
        registry
            .entities()
            .par_iter()
            .map(|entity| materialize_one(fetcher, entity))
            .collect()
    });

    let mut materialized = Materialized::default();
    for item in fetched {
        materialized.failures.extend(item.failures);
        for row in item.rows {
            if materialized.row_index.contains_key(&row.id) {
                debug!("row {} already materialized, skipping duplicate", row.id);
                continue;
            }
            materialized
                .row_index
                .insert(row.id, materialized.rows.len());
            materialized.rows.push(row);
        }
        materialized.contents.insert(item.id, item.content);
    }

    info!(
        "materialized {} entities and {} rows",
        materialized.contents.len(),
        materialized.rows.len()
    );
    Ok(materialized)
}

fn materialize_one(fetcher: &Fetcher, entity: &Entity) -> Fetched {
    let mut failures = Vec::new();
    match entity.kind {
        EntityKind::Page => {
            let blocks = fetcher.children(&entity.id).unwrap_or_else(|e| {
                failures.push(Failure::new(
                    entity.id,
                    Stage::Materialize,
                    format!("cannot fetch page content: {e}"),
                ));
                Vec::new()
            });
            debug!("page \"{}\": {} blocks", entity.title, blocks.len());
            Fetched {
                id: entity.id,
                content: Content::Page { blocks },
                rows: Vec::new(),
                failures,
            }
        }
        EntityKind::Collection => {
            let schema = fetcher
                .database(&entity.id)
                .map_err(|e| {
                    failures.push(Failure::new(
                        entity.id,
                        Stage::Materialize,
                        format!("cannot fetch collection schema: {e}"),
                    ));
                })
                .ok();
            let pages = fetcher.rows(&entity.id).unwrap_or_else(|e| {
                failures.push(Failure::new(
                    entity.id,
                    Stage::Materialize,
                    format!("cannot query collection rows: {e}"),
                ));
                Vec::new()
            });

            let fetched_rows: Vec<(Row, Option<Failure>)> = pages
                .into_par_iter()
                .map(|page| {
                    let (blocks, failure) = match fetcher.children(&page.id) {
                        Ok(blocks) => (blocks, None),
                        Err(e) => (
                            Vec::new(),
                            Some(Failure::new(
                                page.id,
                                Stage::Materialize,
                                format!("cannot fetch row content: {e}"),
                            )),
                        ),
                    };
                    let row = Row {
                        id: page.id,
                        collection_id: entity.id,
                        collection_title: entity.title.clone(),
                        title: page.title_or(UNTITLED_RECORD),
                        properties: page.properties,
                        blocks,
                    };
                    (row, failure)
                })
                .collect();

            let mut rows = Vec::with_capacity(fetched_rows.len());
            for (row, failure) in fetched_rows {
                failures.extend(failure);
                rows.push(row);
            }
            debug!("collection \"{}\": {} rows", entity.title, rows.len());

            Fetched {
                id: entity.id,
                content: Content::Collection {
                    schema,
                    rows: rows.iter().map(|row| row.id).collect(),
                },
                rows,
                failures,
            }
        }
    }
}
