//! Reverse references: which rows point at a given id.

use std::collections::HashMap;

use nw_notion::EntityId;
use nw_notion::types::{PropertyValue, SchemaKind};

use crate::materialize::Materialized;

/// A row pointing at the indexed id through one relation property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backlink {
    pub source_row: EntityId,
    pub source_collection: String,
    pub source_title: String,
    pub property: String,
}

/// Backlinks per target id, in row order then schema order.
#[derive(Debug, Clone, Default)]
pub struct BacklinkIndex {
    entries: HashMap<EntityId, Vec<Backlink>>,
}

impl BacklinkIndex {
    /// Invert every relation property declared by a row's collection schema.
    #[must_use]
    pub fn build(materialized: &Materialized) -> Self {
        let mut index = Self::default();

        for row in materialized.rows() {
            let Some(schema) = materialized.schema(&row.collection_id) else {
                continue;
            };
            let relations = schema
                .properties
                .iter()
                .filter(|property| matches!(property.kind, SchemaKind::Relation { .. }));

            for property in relations {
                let Some(PropertyValue::Relation(targets)) = row.property(&property.name) else {
                    continue;
                };
                for target in targets {
                    index.entries.entry(*target).or_default().push(Backlink {
                        source_row: row.id,
                        source_collection: row.collection_title.clone(),
                        source_title: row.title.clone(),
                        property: property.name.clone(),
                    });
                }
            }
        }

        index
    }

    /// Backlinks of `id`; empty if nothing points at it.
    #[must_use]
    pub fn get(&self, id: &EntityId) -> &[Backlink] {
        self.entries.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Backlinks of `id` grouped by source collection, groups in order of
    /// first appearance.
    #[must_use]
    pub fn grouped(&self, id: &EntityId) -> Vec<(&str, Vec<&Backlink>)> {
        let mut groups: Vec<(&str, Vec<&Backlink>)> = Vec::new();
        for link in self.get(id) {
            match groups
                .iter_mut()
                .find(|(collection, _)| *collection == link.source_collection)
            {
                Some((_, links)) => links.push(link),
                None => groups.push((&link.source_collection, vec![link])),
            }
        }
        groups
    }
}
