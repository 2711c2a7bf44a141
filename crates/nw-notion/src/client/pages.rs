//! Page operations for Notion API.

use serde_json::Value;
use tracing::debug;

use super::NotionClient;
use crate::EntityId;
use crate::error::NotionError;

impl NotionClient {
    /// Get a page with its properties.
    pub(crate) fn get_page(&self, id: &EntityId) -> Result<Value, NotionError> {
        debug!("GET page {id}");
        self.get(&format!("pages/{id}"), &[])
    }
}
