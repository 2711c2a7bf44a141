//! Standalone documents of rows with content.

use nw_notion::types::{PropertyValue, SchemaKind};

use crate::materialize::Row;
use crate::paths::relative_path;

use super::field::{escape_cell, render_field};
use super::{RenderContext, heading, markdown_table, push_blocks};

/// Render a row: heading, link back to its table, property table, blocks and
/// one backlink table per referencing collection.
pub(super) fn render_row(ctx: &RenderContext<'_>, row: &Row, path: &str) -> String {
    let mut out = heading(&row.title);

    if let Some(table) = ctx.paths.entity(&row.collection_id) {
        out.push_str(&format!(
            "*Database record: [{}]({})*\n\n",
            row.collection_title,
            relative_path(path, table)
        ));
    }

    let properties = property_rows(ctx, row, path);
    if !properties.is_empty() {
        let header = ["Property".to_owned(), "Value".to_owned()];
        out.push_str(&markdown_table(&header, &properties));
        out.push('\n');
    }

    push_blocks(&mut out, ctx, &row.blocks, path);

    for (collection, links) in ctx.backlinks.grouped(&row.id) {
        out.push_str(&format!("## Referenced by {collection}\n\n"));
        let rows: Vec<Vec<String>> = links
            .iter()
            .map(|link| {
                let title = escape_cell(&link.source_title);
                let record = match ctx.paths.link_target(&link.source_row) {
                    Some(document) => format!("[{title}]({})", relative_path(path, document)),
                    None => title,
                };
                vec![record, escape_cell(&link.property)]
            })
            .collect();
        out.push_str(&markdown_table(
            &["Record".to_owned(), "Property".to_owned()],
            &rows,
        ));
        out.push('\n');
    }

    out
}

/// Non-title properties in schema order, or in row order without a schema.
fn property_rows(ctx: &RenderContext<'_>, row: &Row, path: &str) -> Vec<Vec<String>> {
    let cells = |name: &str, value: &PropertyValue| {
        vec![
            escape_cell(name),
            escape_cell(&render_field(value, path, ctx.references)),
        ]
    };

    match ctx.materialized.schema(&row.collection_id) {
        Some(schema) => schema
            .properties
            .iter()
            .filter(|property| property.kind != SchemaKind::Title)
            .map(|property| match row.property(&property.name) {
                Some(value) => cells(&property.name, value),
                None => vec![escape_cell(&property.name), String::new()],
            })
            .collect(),
        None => row
            .properties
            .iter()
            .filter(|(_, value)| !matches!(value, PropertyValue::Title(_)))
            .map(|(name, value)| cells(name, value))
            .collect(),
    }
}
