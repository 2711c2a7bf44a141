//! Block renderer: one content block to one Markdown paragraph.

use nw_notion::types::{Block, BlockKind, UNTITLED};

use crate::paths::{PathTable, relative_path};

/// Render one block as seen from document `from`.
///
/// Unsupported blocks render as an empty string and are skipped by callers.
#[must_use]
pub fn render_block(block: &Block, from: &str, paths: &PathTable) -> String {
    match &block.kind {
        BlockKind::Paragraph { text } => text.clone(),
        BlockKind::Heading { level, text } => {
            format!("{} {text}", "#".repeat(usize::from(*level)))
        }
        BlockKind::BulletedListItem { text } => format!("* {text}"),
        BlockKind::NumberedListItem { text } => format!("1. {text}"),
        BlockKind::Quote { text } => format!("> {text}"),
        BlockKind::Code { language, text } => format!("```{language}\n{text}\n```"),
        BlockKind::Divider => "---".to_owned(),
        BlockKind::Image { url, caption } => format!("![{caption}]({url})"),
        BlockKind::Callout { emoji, text } => format!("> {emoji} {text}"),
        BlockKind::Bookmark { url, caption } => {
            let label = if caption.is_empty() { url } else { caption };
            format!("[{label}]({url})")
        }
        BlockKind::File { url, caption } => {
            let label = if caption.is_empty() {
                "Attachment"
            } else {
                caption
            };
            format!("[{label}]({url})")
        }
        BlockKind::Equation { expression } => {
            format!("<span class=\"math-block\">\n{expression}\n</span>")
        }
        BlockKind::ChildPage { title } | BlockKind::ChildDatabase { title } => {
            let title = if title.trim().is_empty() {
                UNTITLED
            } else {
                title
            };
            let target = paths
                .entity(&block.id)
                .map_or_else(|| block.id.to_string(), |doc| relative_path(from, doc));
            format!("[{title}]({target})")
        }
        BlockKind::Unsupported { .. } => String::new(),
    }
}
