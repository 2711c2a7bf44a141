use crate::registry::Entity;

use super::{RenderContext, heading, push_blocks};

/// Render a page: heading, then its blocks.
pub(super) fn render_page(ctx: &RenderContext<'_>, entity: &Entity, path: &str) -> String {
    let mut out = heading(&entity.title);
    push_blocks(&mut out, ctx, ctx.materialized.blocks(&entity.id), path);
    out
}
