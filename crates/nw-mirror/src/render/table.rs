//! Collection tables.

use nw_notion::types::{Database, PropertyValue, SchemaKind};

use crate::materialize::Row;
use crate::paths::relative_path;
use crate::registry::Entity;

use super::field::{escape_cell, render_field};
use super::{RenderContext, heading, markdown_table};

/// Fixed column list for tables of the collection titled `collection`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnOverride {
    pub collection: String,
    /// Columns shown after the title column, in this order.
    pub columns: Vec<String>,
}

/// A table column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Column {
    pub name: String,
    pub is_title: bool,
}

/// Columns of a collection table.
///
/// With a schema: the title column first when an override applies, followed
/// by the override columns present in the schema; otherwise every schema
/// property in declaration order. Without a schema the columns come from the
/// rows' own properties, title first.
pub(super) fn columns(
    title: &str,
    schema: Option<&Database>,
    rows: &[&Row],
    overrides: &[ColumnOverride],
) -> Vec<Column> {
    let Some(schema) = schema else {
        return columns_from_rows(rows);
    };
    let all = schema.properties.iter().map(|property| Column {
        name: property.name.clone(),
        is_title: property.kind == SchemaKind::Title,
    });

    match overrides.iter().find(|o| o.collection == title) {
        Some(over) => {
            let mut selected: Vec<Column> = all.clone().filter(|c| c.is_title).collect();
            for name in &over.columns {
                if let Some(column) = all.clone().find(|c| &c.name == name && !c.is_title) {
                    selected.push(column);
                }
            }
            selected
        }
        None => all.collect(),
    }
}

fn columns_from_rows(rows: &[&Row]) -> Vec<Column> {
    let mut columns: Vec<Column> = Vec::new();
    for (name, value) in rows.iter().flat_map(|row| row.properties.iter()) {
        if columns.iter().any(|c| &c.name == name) {
            continue;
        }
        let column = Column {
            name: name.clone(),
            is_title: matches!(value, PropertyValue::Title(_)),
        };
        if column.is_title {
            columns.insert(0, column);
        } else {
            columns.push(column);
        }
    }
    columns
}

/// Render a collection as a heading and one table row per record.
pub(super) fn render_table(ctx: &RenderContext<'_>, entity: &Entity, path: &str) -> String {
    let mut out = heading(&entity.title);
    let rows: Vec<&Row> = ctx.materialized.collection_rows(&entity.id).collect();
    if rows.is_empty() {
        return out;
    }

    let columns = columns(
        &entity.title,
        ctx.materialized.schema(&entity.id),
        &rows,
        ctx.overrides,
    );
    let header: Vec<String> = columns.iter().map(|c| escape_cell(&c.name)).collect();
    let body: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|column| cell(ctx, row, column, path))
                .collect()
        })
        .collect();

    out.push_str(&markdown_table(&header, &body));
    out
}

fn cell(ctx: &RenderContext<'_>, row: &Row, column: &Column, from: &str) -> String {
    if column.is_title {
        let title = escape_cell(&row.title);
        return match ctx.paths.row(&row.id) {
            Some(document) => format!("[{title}]({})", relative_path(from, document)),
            None => title,
        };
    }
    row.property(&column.name)
        .map(|value| escape_cell(&render_field(value, from, ctx.references)))
        .unwrap_or_default()
}
