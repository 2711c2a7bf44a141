//! Database operations for Notion API.

use serde_json::{Value, json};
use tracing::debug;

use super::{NotionClient, PAGE_SIZE, collect_pages};
use crate::EntityId;
use crate::error::NotionError;

impl NotionClient {
    /// Get a database with its property schema.
    pub(crate) fn get_database(&self, id: &EntityId) -> Result<Value, NotionError> {
        debug!("GET database {id}");
        self.get(&format!("databases/{id}"), &[])
    }

    /// Query every row of a database, in the API's default order.
    pub(crate) fn query_all_rows(&self, id: &EntityId) -> Result<Vec<Value>, NotionError> {
        let path = format!("databases/{id}/query");
        let rows = collect_pages(|cursor| {
            let mut body = json!({ "page_size": PAGE_SIZE });
            if let Some(cursor) = cursor {
                body["start_cursor"] = Value::from(cursor);
            }
            self.post(&path, &body)
        })?;
        debug!("database {id} has {} rows", rows.len());
        Ok(rows)
    }
}
