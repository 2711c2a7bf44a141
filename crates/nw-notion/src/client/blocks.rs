//! Block operations for Notion API.

use serde_json::Value;
use tracing::debug;

use super::{NotionClient, PAGE_SIZE, collect_pages};
use crate::EntityId;
use crate::error::NotionError;

impl NotionClient {
    /// Get a single block.
    pub(crate) fn get_block(&self, id: &EntityId) -> Result<Value, NotionError> {
        debug!("GET block {id}");
        self.get(&format!("blocks/{id}"), &[])
    }

    /// Get every direct child of a block or page.
    pub(crate) fn get_block_children(&self, id: &EntityId) -> Result<Vec<Value>, NotionError> {
        let path = format!("blocks/{id}/children");
        let page_size = PAGE_SIZE.to_string();
        let children = collect_pages(|cursor| {
            let mut params = vec![("page_size", page_size.as_str())];
            if let Some(cursor) = cursor {
                params.push(("start_cursor", cursor));
            }
            self.get(&path, &params)
        })?;
        debug!("block {id} has {} children", children.len());
        Ok(children)
    }
}
