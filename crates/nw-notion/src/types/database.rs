//! Databases and their property schemas.

use serde::{Deserialize, Deserializer};

use super::ordered;
use super::page::{Parent, UNTITLED};
use super::rich_text::{RichText, title_or};
use crate::EntityId;

/// A database with its schema.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Database {
    pub id: EntityId,
    #[serde(default)]
    pub parent: Parent,
    #[serde(default, rename = "title")]
    pub title_runs: Vec<RichText>,
    /// Property definitions in declaration order.
    #[serde(default, deserialize_with = "deserialize_schema")]
    pub properties: Vec<PropertySchema>,
}

impl Database {
    /// Title text, or [`UNTITLED`] when blank.
    #[must_use]
    pub fn title(&self) -> String {
        title_or(&self.title_runs, UNTITLED)
    }

    /// Databases this one points at through relation properties, in
    /// declaration order.
    pub fn related_databases(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.properties.iter().filter_map(|schema| match schema.kind {
            SchemaKind::Relation { database_id } => Some(database_id),
            _ => None,
        })
    }

    /// Name of the title property.
    #[must_use]
    pub fn title_property(&self) -> Option<&str> {
        self.properties
            .iter()
            .find(|schema| schema.kind == SchemaKind::Title)
            .map(|schema| schema.name.as_str())
    }
}

/// One property definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySchema {
    pub name: String,
    pub kind: SchemaKind,
}

/// What a property definition holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaKind {
    Title,
    /// Points at rows of another (or the same) database.
    Relation {
        database_id: EntityId,
    },
    /// Any other type tag.
    Other(String),
}

#[derive(Deserialize)]
struct RawSchema {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    relation: Option<RawRelation>,
}

#[derive(Deserialize)]
struct RawRelation {
    database_id: EntityId,
}

fn deserialize_schema<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<PropertySchema>, D::Error> {
    let entries: Vec<(String, RawSchema)> = ordered::deserialize(deserializer)?;
    Ok(entries
        .into_iter()
        .map(|(name, raw)| {
            let kind = match (raw.kind.as_str(), raw.relation) {
                ("title", _) => SchemaKind::Title,
                ("relation", Some(relation)) => SchemaKind::Relation {
                    database_id: relation.database_id,
                },
                _ => SchemaKind::Other(raw.kind),
            };
            PropertySchema { name, kind }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    const DB: &str = "1b2c3d4e-5f60-4718-8293-a4b5c6d7e8f9";
    const OTHER: &str = "8a3c0f4e-9b2d-4c6a-8e1f-0a2b3c4d5e6f";

    fn sample() -> Database {
        serde_json::from_value(json!({
            "object": "database",
            "id": DB,
            "title": [{"plain_text": "Tasks"}],
            "properties": {
                "Owner": {"id": "a", "name": "Owner", "type": "people", "people": {}},
                "Name": {"id": "title", "name": "Name", "type": "title", "title": {}},
                "Project": {
                    "id": "b", "name": "Project", "type": "relation",
                    "relation": {"database_id": OTHER, "type": "single_property"}
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_schema_keeps_declaration_order() {
        let db = sample();
        assert_eq!(
            db.properties,
            vec![
                PropertySchema {
                    name: "Owner".to_owned(),
                    kind: SchemaKind::Other("people".to_owned())
                },
                PropertySchema {
                    name: "Name".to_owned(),
                    kind: SchemaKind::Title
                },
                PropertySchema {
                    name: "Project".to_owned(),
                    kind: SchemaKind::Relation {
                        database_id: EntityId::parse(OTHER).unwrap()
                    }
                },
            ]
        );
        assert_eq!(db.title(), "Tasks");
        assert_eq!(db.title_property(), Some("Name"));
    }

    #[test]
    fn test_related_databases() {
        let related: Vec<EntityId> = sample().related_databases().collect();
        assert_eq!(related, vec![EntityId::parse(OTHER).unwrap()]);
    }

    #[test]
    fn test_untitled_database() {
        let db: Database = serde_json::from_value(json!({"id": DB, "title": []})).unwrap();
        assert_eq!(db.title(), "Untitled");
        assert!(db.properties.is_empty());
    }

    #[test]
    fn test_schema_survives_value_round_trip() {
        let value = json!({
            "id": DB,
            "properties": {
                "Zeta": {"type": "rich_text", "rich_text": {}},
                "Alpha": {"type": "title", "title": {}}
            }
        });
        let text = serde_json::to_string(&value).unwrap();
        let reparsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        let db: Database = serde_json::from_value(reparsed).unwrap();
        let names: Vec<&str> = db.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Zeta", "Alpha"]);
    }
}
