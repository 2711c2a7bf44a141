//! Pages and database rows.

use serde::{Deserialize, Deserializer};

use super::ordered;
use super::property::PropertyValue;
use super::rich_text::{RichText, title_or};
use crate::EntityId;

/// Placeholder for pages and databases without a title.
pub const UNTITLED: &str = "Untitled";

/// A page. Database rows are pages whose parent is a database.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Page {
    pub id: EntityId,
    #[serde(default)]
    pub parent: Parent,
    /// Properties in the order the API returned them.
    #[serde(default, deserialize_with = "ordered::deserialize")]
    pub properties: Vec<(String, PropertyValue)>,
}

impl Page {
    /// Runs of the title-typed property, if the page has one.
    #[must_use]
    pub fn title_runs(&self) -> Option<&[RichText]> {
        self.properties.iter().find_map(|(_, value)| match value {
            PropertyValue::Title(runs) => Some(runs.as_slice()),
            _ => None,
        })
    }

    /// Title text, or `placeholder` when blank.
    #[must_use]
    pub fn title_or(&self, placeholder: &str) -> String {
        title_or(self.title_runs().unwrap_or_default(), placeholder)
    }

    /// Title text, or [`UNTITLED`] when blank.
    #[must_use]
    pub fn title(&self) -> String {
        self.title_or(UNTITLED)
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

/// Where a page or database lives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Parent {
    #[default]
    Workspace,
    Page(EntityId),
    Database(EntityId),
    Block(EntityId),
}

#[derive(Deserialize)]
struct RawParent {
    #[serde(rename = "type", default)]
    parent_type: String,
    page_id: Option<EntityId>,
    database_id: Option<EntityId>,
    block_id: Option<EntityId>,
}

impl<'de> Deserialize<'de> for Parent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let RawParent {
            parent_type,
            page_id,
            database_id,
            block_id,
        } = RawParent::deserialize(deserializer)?;
        let parent = match (parent_type.as_str(), page_id, database_id, block_id) {
            ("page_id", Some(id), _, _) => Self::Page(id),
            ("database_id", _, Some(id), _) => Self::Database(id),
            ("block_id", _, _, Some(id)) => Self::Block(id),
            _ => Self::Workspace,
        };
        Ok(parent)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    const PAGE: &str = "8a3c0f4e-9b2d-4c6a-8e1f-0a2b3c4d5e6f";
    const DB: &str = "1b2c3d4e-5f60-4718-8293-a4b5c6d7e8f9";

    #[test]
    fn test_row_page_keeps_property_order() {
        let page: Page = serde_json::from_value(json!({
            "object": "page",
            "id": PAGE,
            "parent": {"type": "database_id", "database_id": DB},
            "properties": {
                "Status": {"type": "select", "select": {"name": "Open"}},
                "Name": {"type": "title", "title": [{"plain_text": "Alpha"}]},
                "Done": {"type": "checkbox", "checkbox": true}
            }
        }))
        .unwrap();

        let names: Vec<&str> = page.properties.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["Status", "Name", "Done"]);
        assert_eq!(page.title(), "Alpha");
        assert_eq!(page.parent, Parent::Database(EntityId::parse(DB).unwrap()));
        assert_eq!(page.property("Done"), Some(&PropertyValue::Checkbox(true)));
    }

    #[test]
    fn test_blank_title_uses_placeholder() {
        let page: Page = serde_json::from_value(json!({
            "id": PAGE,
            "parent": {"type": "workspace", "workspace": true},
            "properties": {"title": {"type": "title", "title": []}}
        }))
        .unwrap();

        assert_eq!(page.title(), "Untitled");
        assert_eq!(page.title_or("Untitled Record"), "Untitled Record");
        assert_eq!(page.parent, Parent::Workspace);
    }

    #[test]
    fn test_missing_properties_and_parent() {
        let page: Page = serde_json::from_value(json!({"id": PAGE})).unwrap();
        assert!(page.properties.is_empty());
        assert_eq!(page.parent, Parent::Workspace);
        assert_eq!(page.title(), "Untitled");
    }
}
