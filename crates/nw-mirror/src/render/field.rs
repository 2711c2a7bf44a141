//! Field renderer: one property value to one table cell.

use nw_notion::types::{PropertyValue, plain_text};
use serde_json::Value;

use crate::paths::relative_path;
use crate::resolve::{References, Target};

/// Render a property value as seen from document `from`.
///
/// The result is raw text; use [`escape_cell`] before placing it in a table.
#[must_use]
pub fn render_field(value: &PropertyValue, from: &str, references: &References) -> String {
    match value {
        PropertyValue::Title(runs) | PropertyValue::RichText(runs) => plain_text(runs),
        PropertyValue::Number(number) => number.as_ref().map(ToString::to_string).unwrap_or_default(),
        PropertyValue::Select(name)
        | PropertyValue::Status(name)
        | PropertyValue::Date(name)
        | PropertyValue::Url(name)
        | PropertyValue::Email(name)
        | PropertyValue::PhoneNumber(name)
        | PropertyValue::CreatedTime(name)
        | PropertyValue::LastEditedTime(name)
        | PropertyValue::CreatedBy(name)
        | PropertyValue::LastEditedBy(name) => name.clone().unwrap_or_default(),
        PropertyValue::MultiSelect(names) | PropertyValue::People(names) => names.join(", "),
        PropertyValue::Checkbox(checked) => checkbox(*checked),
        PropertyValue::Relation(ids) => ids
            .iter()
            .map(|id| match references.get(id) {
                Target::Resolved { title, document } => {
                    format!("[{title}]({})", relative_path(from, document))
                }
                Target::Unresolved => format!("[not found: {id}]"),
            })
            .collect::<Vec<_>>()
            .join(", "),
        PropertyValue::Formula(result) => formula(result),
        PropertyValue::Other { value, .. } => stringify(value),
    }
}

/// Make text safe for a single table cell.
#[must_use]
pub fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
        .replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
}

fn checkbox(checked: bool) -> String {
    if checked { "X".to_owned() } else { String::new() }
}

/// A formula result is tagged like a property: `{"type": "number", "number": 3}`.
fn formula(result: &Value) -> String {
    let inner = result
        .get("type")
        .and_then(Value::as_str)
        .and_then(|tag| result.get(tag));
    match inner {
        Some(Value::Bool(checked)) => checkbox(*checked),
        Some(Value::Object(date)) => date
            .get("start")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned(),
        Some(value) => stringify(value),
        None => String::new(),
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use nw_notion::EntityId;
    use nw_notion::types::RichText;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn render(value: &PropertyValue) -> String {
        render_field(value, "c/alpha.md", &References::default())
    }

    fn runs(parts: &[&str]) -> Vec<RichText> {
        parts
            .iter()
            .map(|part| RichText {
                plain_text: (*part).to_owned(),
                href: None,
            })
            .collect()
    }

    #[test]
    fn test_text_fields() {
        assert_eq!(render(&PropertyValue::Title(runs(&["Al", "pha"]))), "Alpha");
        assert_eq!(render(&PropertyValue::RichText(runs(&["a ", "b"]))), "a b");
        assert_eq!(render(&PropertyValue::Url(Some("https://x.io".into()))), "https://x.io");
        assert_eq!(render(&PropertyValue::Email(None)), "");
    }

    #[test]
    fn test_number_field() {
        assert_eq!(render(&PropertyValue::Number(Some(42.into()))), "42");
        assert_eq!(
            render(&PropertyValue::Number(serde_json::Number::from_f64(2.5))),
            "2.5"
        );
        assert_eq!(render(&PropertyValue::Number(None)), "");
    }

    #[test]
    fn test_choice_fields() {
        assert_eq!(render(&PropertyValue::Select(Some("High".into()))), "High");
        assert_eq!(render(&PropertyValue::Status(None)), "");
        assert_eq!(
            render(&PropertyValue::MultiSelect(vec!["a".into(), "b".into()])),
            "a, b"
        );
        assert_eq!(render(&PropertyValue::Checkbox(true)), "X");
        assert_eq!(render(&PropertyValue::Checkbox(false)), "");
        assert_eq!(render(&PropertyValue::Date(Some("2024-05-01".into()))), "2024-05-01");
    }

    #[test]
    fn test_formula_field() {
        assert_eq!(
            render(&PropertyValue::Formula(json!({"type": "number", "number": 3}))),
            "3"
        );
        assert_eq!(
            render(&PropertyValue::Formula(json!({"type": "string", "string": "ok"}))),
            "ok"
        );
        assert_eq!(
            render(&PropertyValue::Formula(json!({"type": "boolean", "boolean": true}))),
            "X"
        );
        assert_eq!(
            render(&PropertyValue::Formula(
                json!({"type": "date", "date": {"start": "2024-01-02"}})
            )),
            "2024-01-02"
        );
        assert_eq!(render(&PropertyValue::Formula(json!({}))), "");
    }

    #[test]
    fn test_other_field_stringifies_value() {
        let value = PropertyValue::Other {
            type_name: "unique_id".to_owned(),
            value: json!({"prefix": "T", "number": 7}),
        };
        assert_eq!(render(&value), r#"{"prefix":"T","number":7}"#);
        let value = PropertyValue::Other {
            type_name: "verification".to_owned(),
            value: json!("verified"),
        };
        assert_eq!(render(&value), "verified");
    }

    #[test]
    fn test_unresolved_relation_renders_placeholder() {
        let id = EntityId::parse("0000000000004000800000000000ffff").unwrap();
        assert_eq!(
            render(&PropertyValue::Relation(vec![id])),
            "[not found: 00000000-0000-4000-8000-00000000ffff]"
        );
        assert_eq!(render(&PropertyValue::Relation(vec![])), "");
    }

    #[test]
    fn test_escape_cell() {
        assert_eq!(escape_cell("a|b\nc\r\nd"), "a\\|b c d");
    }
}
