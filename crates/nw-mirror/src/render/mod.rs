//! Markdown rendering.
//!
//! Renderers are pure: they read the phase outputs through [`RenderContext`]
//! and return document text. Documents are rendered in parallel and returned
//! in a fixed order (registry order, then rows in query order).

mod block;
mod field;
mod page;
mod row;
mod table;

use nw_notion::EntityId;
use nw_notion::types::Block;
use rayon::prelude::*;

pub use block::render_block;
pub use field::{escape_cell, render_field};
pub use table::ColumnOverride;

use crate::backlinks::BacklinkIndex;
use crate::materialize::{Materialized, Row};
use crate::paths::PathTable;
use crate::registry::{Entity, EntityKind, Registry};
use crate::resolve::References;

/// A rendered document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Entity or row the document was rendered from.
    pub id: EntityId,
    /// Path relative to the output root.
    pub path: String,
    pub content: String,
}

/// Read-only inputs shared by every renderer.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    pub registry: &'a Registry,
    pub materialized: &'a Materialized,
    pub paths: &'a PathTable,
    pub references: &'a References,
    pub backlinks: &'a BacklinkIndex,
    pub overrides: &'a [ColumnOverride],
}

enum Job<'a> {
    Entity(&'a Entity, &'a str),
    Row(&'a Row, &'a str),
}

/// Render every entity and every row with content.
#[must_use]
pub fn render_documents(ctx: &RenderContext<'_>) -> Vec<Document> {
    let mut jobs = Vec::new();
    for entity in ctx.registry.entities() {
        if let Some(path) = ctx.paths.entity(&entity.id) {
            jobs.push(Job::Entity(entity, path));
        }
    }
    for row in ctx.materialized.rows() {
        if let Some(path) = ctx.paths.row(&row.id) {
            jobs.push(Job::Row(row, path));
        }
    }

    jobs.par_iter()
        .map(|job| match *job {
            Job::Entity(entity, path) => Document {
                id: entity.id,
                path: path.to_owned(),
                content: match entity.kind {
                    EntityKind::Page => page::render_page(ctx, entity, path),
                    EntityKind::Collection => table::render_table(ctx, entity, path),
                },
            },
            Job::Row(row, path) => Document {
                id: row.id,
                path: path.to_owned(),
                content: row::render_row(ctx, row, path),
            },
        })
        .collect()
}

/// Document heading.
fn heading(title: &str) -> String {
    format!("# {title}\n\n")
}

/// A GFM table: header, separator, rows. Cells must already be escaped.
fn markdown_table(header: &[String], rows: &[Vec<String>]) -> String {
    let line = |cells: &[String]| format!("| {} |\n", cells.join(" | "));
    let mut out = line(header);
    out.push_str(&line(&vec!["---".to_owned(); header.len()]));
    for row in rows {
        out.push_str(&line(row));
    }
    out
}

/// Append every non-empty rendered block followed by a blank line.
fn push_blocks(out: &mut String, ctx: &RenderContext<'_>, blocks: &[Block], from: &str) {
    for block in blocks {
        let rendered = render_block(block, from, ctx.paths);
        if !rendered.is_empty() {
            out.push_str(&rendered);
            out.push_str("\n\n");
        }
    }
}
