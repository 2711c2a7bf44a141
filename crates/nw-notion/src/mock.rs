//! In-memory Notion API for testing.
//!
//! Provides [`MockApi`], a [`NotionApi`] serving canned JSON payloads and
//! counting how often each object was requested, plus [`fixtures`] for
//! building those payloads.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use serde_json::Value;

use crate::client::NotionApi;
use crate::error::NotionError;
use crate::fetcher::FetchKind;
use crate::EntityId;

fn parse_id(id: &str) -> EntityId {
    EntityId::parse(id).unwrap_or_else(|e| panic!("mock fixture id: {e}"))
}

fn payload_id(value: &Value) -> EntityId {
    let id = value["id"]
        .as_str()
        .unwrap_or_else(|| panic!("mock payload without string id: {value}"));
    parse_id(id)
}

/// Mock Notion API for testing.
///
/// Objects that were never registered answer with [`NotionError::NotFound`].
///
/// # Example
///
/// ```ignore
/// use nw_notion::mock::{MockApi, fixtures};
///
/// let api = MockApi::new()
///     .with_page(fixtures::page(ROOT, fixtures::workspace(), "Home"))
///     .with_children(ROOT, vec![fixtures::paragraph(BLOCK, "Hello")]);
/// ```
#[derive(Debug, Default)]
pub struct MockApi {
    objects: HashMap<(FetchKind, EntityId), Value>,
    failures: HashMap<(FetchKind, EntityId), u16>,
    latency: Option<Duration>,
    calls: Mutex<HashMap<(FetchKind, EntityId), usize>>,
}

impl MockApi {
    /// Create an API with no objects.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with(mut self, kind: FetchKind, id: EntityId, value: Value) -> Self {
        self.objects.insert((kind, id), value);
        self
    }

    /// Serve a block payload, addressed by its `id` field.
    ///
    /// # Panics
    ///
    /// Panics if the payload has no valid `id`.
    #[must_use]
    pub fn with_block(self, block: Value) -> Self {
        let id = payload_id(&block);
        self.with(FetchKind::Block, id, block)
    }

    /// Serve `children` as the child list of `parent`.
    ///
    /// Child page and child database blocks are also served as single
    /// blocks.
    ///
    /// # Panics
    ///
    /// Panics if `parent` or a child id is invalid.
    #[must_use]
    pub fn with_children(mut self, parent: &str, children: Vec<Value>) -> Self {
        for child in &children {
            self = self.with_block(child.clone());
        }
        self.with(FetchKind::Children, parse_id(parent), Value::Array(children))
    }

    /// Serve a page payload, addressed by its `id` field.
    ///
    /// # Panics
    ///
    /// Panics if the payload has no valid `id`.
    #[must_use]
    pub fn with_page(self, page: Value) -> Self {
        let id = payload_id(&page);
        self.with(FetchKind::Page, id, page)
    }

    /// Serve a database payload, addressed by its `id` field.
    ///
    /// # Panics
    ///
    /// Panics if the payload has no valid `id`.
    #[must_use]
    pub fn with_database(self, database: Value) -> Self {
        let id = payload_id(&database);
        self.with(FetchKind::Database, id, database)
    }

    /// Serve `rows` as the query result of `database`.
    ///
    /// Rows with a valid id are also served as pages.
    ///
    /// # Panics
    ///
    /// Panics if `database` is invalid.
    #[must_use]
    pub fn with_rows(mut self, database: &str, rows: Vec<Value>) -> Self {
        for row in &rows {
            if let Some(id) = row["id"].as_str().and_then(|id| EntityId::parse(id).ok()) {
                self = self.with(FetchKind::Page, id, row.clone());
            }
        }
        self.with(FetchKind::Query, parse_id(database), Value::Array(rows))
    }

    /// Answer requests for `(kind, id)` with an HTTP error status.
    ///
    /// # Panics
    ///
    /// Panics if `id` is invalid.
    #[must_use]
    pub fn with_failure(mut self, kind: FetchKind, id: &str, status: u16) -> Self {
        self.failures.insert((kind, parse_id(id)), status);
        self
    }

    /// Delay every answer, to widen race windows in concurrency tests.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of requests for `(kind, id)` so far.
    ///
    /// # Panics
    ///
    /// Panics if `id` is invalid or the internal lock is poisoned.
    pub fn calls(&self, kind: FetchKind, id: &str) -> usize {
        let calls = self.calls.lock().unwrap();
        calls.get(&(kind, parse_id(id))).copied().unwrap_or(0)
    }

    /// Number of requests of any kind so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    fn answer(&self, kind: FetchKind, id: &EntityId) -> Result<Value, NotionError> {
        *self.calls.lock().unwrap().entry((kind, *id)).or_default() += 1;
        if let Some(latency) = self.latency {
            std::thread::sleep(latency);
        }
        if let Some(&status) = self.failures.get(&(kind, *id)) {
            return Err(NotionError::Http {
                status,
                body: "mock failure".to_owned(),
            });
        }
        self.objects
            .get(&(kind, *id))
            .cloned()
            .ok_or(NotionError::NotFound)
    }

    fn answer_list(&self, kind: FetchKind, id: &EntityId) -> Result<Vec<Value>, NotionError> {
        match self.answer(kind, id)? {
            Value::Array(items) => Ok(items),
            other => Ok(vec![other]),
        }
    }
}

impl NotionApi for MockApi {
    fn retrieve_block(&self, id: &EntityId) -> Result<Value, NotionError> {
        self.answer(FetchKind::Block, id)
    }

    fn list_block_children(&self, id: &EntityId) -> Result<Vec<Value>, NotionError> {
        self.answer_list(FetchKind::Children, id)
    }

    fn retrieve_page(&self, id: &EntityId) -> Result<Value, NotionError> {
        self.answer(FetchKind::Page, id)
    }

    fn retrieve_database(&self, id: &EntityId) -> Result<Value, NotionError> {
        self.answer(FetchKind::Database, id)
    }

    fn query_database(&self, id: &EntityId) -> Result<Vec<Value>, NotionError> {
        self.answer_list(FetchKind::Query, id)
    }
}

/// Builders for API payloads in the shape the Notion API returns them.
pub mod fixtures {
    use serde_json::{Map, Value, json};

    fn text(content: &str) -> Value {
        json!([{"type": "text", "plain_text": content, "href": null}])
    }

    /// Parent of a top-level page.
    #[must_use]
    pub fn workspace() -> Value {
        json!({"type": "workspace", "workspace": true})
    }

    /// Parent pointing at a page.
    #[must_use]
    pub fn page_parent(id: &str) -> Value {
        json!({"type": "page_id", "page_id": id})
    }

    /// Parent pointing at a database.
    #[must_use]
    pub fn database_parent(id: &str) -> Value {
        json!({"type": "database_id", "database_id": id})
    }

    /// A page whose `title` property holds `title`.
    #[must_use]
    pub fn page(id: &str, parent: Value, title: &str) -> Value {
        json!({
            "object": "page",
            "id": id,
            "parent": parent,
            "properties": {"title": {"id": "title", "type": "title", "title": text(title)}}
        })
    }

    /// A database row with the given property values.
    #[must_use]
    pub fn row(id: &str, database: &str, properties: Value) -> Value {
        json!({
            "object": "page",
            "id": id,
            "parent": database_parent(database),
            "properties": properties
        })
    }

    /// A database with the given property schema.
    #[must_use]
    pub fn database(id: &str, title: &str, properties: Value) -> Value {
        json!({
            "object": "database",
            "id": id,
            "parent": workspace(),
            "title": text(title),
            "properties": properties
        })
    }

    /// Schema of a title property.
    #[must_use]
    pub fn title_schema() -> Value {
        json!({"type": "title", "title": {}})
    }

    /// Schema of a relation property pointing at `database`.
    #[must_use]
    pub fn relation_schema(database: &str) -> Value {
        json!({"type": "relation", "relation": {"database_id": database, "type": "single_property"}})
    }

    /// Schema of any property type without configuration.
    #[must_use]
    pub fn schema(type_name: &str) -> Value {
        let mut object = Map::new();
        object.insert("type".to_owned(), json!(type_name));
        object.insert(type_name.to_owned(), json!({}));
        Value::Object(object)
    }

    /// Title property value.
    #[must_use]
    pub fn title_value(title: &str) -> Value {
        json!({"type": "title", "title": text(title)})
    }

    /// Rich text property value.
    #[must_use]
    pub fn rich_text_value(content: &str) -> Value {
        json!({"type": "rich_text", "rich_text": text(content)})
    }

    /// Relation property value.
    #[must_use]
    pub fn relation_value(ids: &[&str]) -> Value {
        let items: Vec<Value> = ids.iter().map(|id| json!({"id": id})).collect();
        json!({"type": "relation", "relation": items, "has_more": false})
    }

    /// Paragraph block.
    #[must_use]
    pub fn paragraph(id: &str, content: &str) -> Value {
        block(id, "paragraph", json!({"rich_text": text(content)}), false)
    }

    /// Block of any type with the given body.
    #[must_use]
    pub fn block(id: &str, block_type: &str, body: Value, has_children: bool) -> Value {
        let mut object = Map::new();
        object.insert("object".to_owned(), json!("block"));
        object.insert("id".to_owned(), json!(id));
        object.insert("type".to_owned(), json!(block_type));
        object.insert("has_children".to_owned(), json!(has_children));
        object.insert(block_type.to_owned(), body);
        Value::Object(object)
    }

    /// Block for a nested page.
    #[must_use]
    pub fn child_page(id: &str, title: &str) -> Value {
        block(id, "child_page", json!({"title": title}), true)
    }

    /// Block for a nested database.
    #[must_use]
    pub fn child_database(id: &str, title: &str) -> Value {
        block(id, "child_database", json!({"title": title}), false)
    }
}
