//! Typed property values of pages and database rows.

use serde::{Deserialize, Deserializer};
use serde_json::{Number, Value};

use super::rich_text::RichText;
use crate::EntityId;

/// A property value, one variant per `type` tag.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Title(Vec<RichText>),
    RichText(Vec<RichText>),
    Number(Option<Number>),
    Select(Option<String>),
    MultiSelect(Vec<String>),
    Status(Option<String>),
    /// Start date only.
    Date(Option<String>),
    Relation(Vec<EntityId>),
    Checkbox(bool),
    Url(Option<String>),
    Email(Option<String>),
    PhoneNumber(Option<String>),
    CreatedTime(Option<String>),
    LastEditedTime(Option<String>),
    CreatedBy(Option<String>),
    LastEditedBy(Option<String>),
    People(Vec<String>),
    /// Computed value, itself typed (`string`, `number`, `boolean`, `date`).
    Formula(Value),
    /// Any other type, with its nested value.
    Other {
        type_name: String,
        value: Value,
    },
}

#[derive(Deserialize)]
struct Named {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Deserialize)]
struct DateValue {
    #[serde(default)]
    start: Option<String>,
}

#[derive(Deserialize)]
struct RelationItem {
    id: EntityId,
}

impl PropertyValue {
    /// Decode from the `type` tag and the body stored under that tag.
    ///
    /// A recognized tag with a body of the wrong shape decodes to
    /// [`PropertyValue::Other`] so that one odd property never hides a row.
    fn from_tagged(type_name: &str, body: Value) -> Self {
        Self::parse(type_name, &body).unwrap_or_else(|| Self::Other {
            type_name: type_name.to_owned(),
            value: body,
        })
    }

    fn parse(type_name: &str, body: &Value) -> Option<Self> {
        fn name(body: &Value) -> Option<Option<String>> {
            if body.is_null() {
                return Some(None);
            }
            Named::deserialize(body).ok().map(|n| n.name)
        }
        fn names(body: &Value) -> Option<Vec<String>> {
            Vec::<Named>::deserialize(body)
                .ok()
                .map(|items| items.into_iter().filter_map(|n| n.name).collect())
        }
        fn string(body: &Value) -> Option<Option<String>> {
            Option::<String>::deserialize(body).ok()
        }

        let value = match type_name {
            "title" => Self::Title(Vec::deserialize(body).ok()?),
            "rich_text" => Self::RichText(Vec::deserialize(body).ok()?),
            "number" => Self::Number(Option::<Number>::deserialize(body).ok()?),
            "select" => Self::Select(name(body)?),
            "multi_select" => Self::MultiSelect(names(body)?),
            "status" => Self::Status(name(body)?),
            "date" => Self::Date(
                Option::<DateValue>::deserialize(body)
                    .ok()?
                    .and_then(|d| d.start),
            ),
            "relation" => Self::Relation(
                Vec::<RelationItem>::deserialize(body)
                    .ok()?
                    .into_iter()
                    .map(|item| item.id)
                    .collect(),
            ),
            "checkbox" => Self::Checkbox(bool::deserialize(body).ok()?),
            "url" => Self::Url(string(body)?),
            "email" => Self::Email(string(body)?),
            "phone_number" => Self::PhoneNumber(string(body)?),
            "created_time" => Self::CreatedTime(string(body)?),
            "last_edited_time" => Self::LastEditedTime(string(body)?),
            "created_by" => Self::CreatedBy(name(body)?),
            "last_edited_by" => Self::LastEditedBy(name(body)?),
            "people" => Self::People(names(body)?),
            "formula" => Self::Formula(body.clone()),
            _ => return None,
        };
        Some(value)
    }
}

impl<'de> Deserialize<'de> for PropertyValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut object = serde_json::Map::deserialize(deserializer)?;
        let type_name = match object.get("type") {
            Some(Value::String(tag)) => tag.clone(),
            _ => {
                // Untagged: use the first key that is not metadata.
                object
                    .keys()
                    .find(|key| key.as_str() != "id")
                    .cloned()
                    .unwrap_or_default()
            }
        };
        let body = object.remove(&type_name).unwrap_or(Value::Null);
        Ok(Self::from_tagged(&type_name, body))
    }
}
