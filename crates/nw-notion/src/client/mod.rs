//! Notion REST API client.
//!
//! Sync HTTP client for the public Notion API with bearer-token
//! authentication. Every method returns the raw JSON payload; decoding into
//! typed objects happens in the [`Fetcher`](crate::Fetcher), after caching.

mod blocks;
mod databases;
mod pages;

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use ureq::Agent;

use crate::EntityId;
use crate::error::NotionError;

/// Default API base URL.
pub const DEFAULT_API_URL: &str = "https://api.notion.com/v1";

/// API version sent with every request.
pub const DEFAULT_NOTION_VERSION: &str = "2022-06-28";

/// Items requested per page of a paginated endpoint.
const PAGE_SIZE: u32 = 100;

/// Raw access to the five endpoints the mirror needs.
///
/// List endpoints return the `results` of every page concatenated.
pub trait NotionApi: Send + Sync {
    /// `GET /blocks/{id}`.
    fn retrieve_block(&self, id: &EntityId) -> Result<Value, NotionError>;

    /// `GET /blocks/{id}/children`, all pages.
    fn list_block_children(&self, id: &EntityId) -> Result<Vec<Value>, NotionError>;

    /// `GET /pages/{id}`.
    fn retrieve_page(&self, id: &EntityId) -> Result<Value, NotionError>;

    /// `GET /databases/{id}`.
    fn retrieve_database(&self, id: &EntityId) -> Result<Value, NotionError>;

    /// `POST /databases/{id}/query`, all pages.
    fn query_database(&self, id: &EntityId) -> Result<Vec<Value>, NotionError>;
}

/// Connection settings for [`NotionClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub api_url: String,
    pub notion_version: String,
    pub timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            notion_version: DEFAULT_NOTION_VERSION.to_owned(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Notion REST API client.
pub struct NotionClient {
    agent: Agent,
    base_url: String,
    token: String,
    notion_version: String,
}

impl NotionClient {
    /// Create a client authenticating with an integration `token`.
    #[must_use]
    pub fn new(token: &str, options: &ClientOptions) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(options.timeout))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            base_url: options.api_url.trim_end_matches('/').to_owned(),
            token: token.to_owned(),
            notion_version: options.notion_version.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    fn auth_header(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// `GET` with query parameters.
    fn get(&self, path: &str, params: &[(&str, &str)]) -> Result<Value, NotionError> {
        let url = self.url(path);
        let mut request = self
            .agent
            .get(&url)
            .header("Authorization", &self.auth_header())
            .header("Notion-Version", &self.notion_version)
            .header("Accept", "application/json");
        for (key, value) in params {
            request = request.query(key, value);
        }

        read_response(request.call()?)
    }

    /// `POST` a JSON body.
    fn post(&self, path: &str, body: &Value) -> Result<Value, NotionError> {
        let url = self.url(path);
        let response = self
            .agent
            .post(&url)
            .header("Authorization", &self.auth_header())
            .header("Notion-Version", &self.notion_version)
            .header("Accept", "application/json")
            .send_json(body)?;

        read_response(response)
    }
}

impl NotionApi for NotionClient {
    fn retrieve_block(&self, id: &EntityId) -> Result<Value, NotionError> {
        self.get_block(id)
    }

    fn list_block_children(&self, id: &EntityId) -> Result<Vec<Value>, NotionError> {
        self.get_block_children(id)
    }

    fn retrieve_page(&self, id: &EntityId) -> Result<Value, NotionError> {
        self.get_page(id)
    }

    fn retrieve_database(&self, id: &EntityId) -> Result<Value, NotionError> {
        self.get_database(id)
    }

    fn query_database(&self, id: &EntityId) -> Result<Vec<Value>, NotionError> {
        self.query_all_rows(id)
    }
}

fn read_response(response: ureq::http::Response<ureq::Body>) -> Result<Value, NotionError> {
    let status = response.status().as_u16();
    let mut body_reader = response.into_body();

    if status == 404 {
        return Err(NotionError::NotFound);
    }
    if status >= 400 {
        let error_body = body_reader
            .read_to_string()
            .unwrap_or_else(|_| "(unable to read error body)".to_owned());
        return Err(NotionError::Http {
            status,
            body: error_body,
        });
    }

    Ok(body_reader.read_json()?)
}

/// One page of a paginated list response.
#[derive(Debug, Deserialize)]
struct ListPage {
    #[serde(default)]
    results: Vec<Value>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    next_cursor: Option<String>,
}

/// Follow `next_cursor` until `has_more` is false.
///
/// `fetch_page` receives `None` for the first page. A response claiming more
/// results without a cursor ends the walk.
fn collect_pages<F>(mut fetch_page: F) -> Result<Vec<Value>, NotionError>
where
    F: FnMut(Option<&str>) -> Result<Value, NotionError>,
{
    let mut results = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let page: ListPage = serde_json::from_value(fetch_page(cursor.as_deref())?)?;
        results.extend(page.results);
        match page.next_cursor {
            Some(next) if page.has_more => cursor = Some(next),
            _ => return Ok(results),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_collect_pages_follows_cursor() {
        let mut seen = Vec::new();
        let results = collect_pages(|cursor| {
            seen.push(cursor.map(str::to_owned));
            Ok(match cursor {
                None => json!({"results": [1, 2], "has_more": true, "next_cursor": "c2"}),
                Some("c2") => json!({"results": [3], "has_more": false, "next_cursor": null}),
                Some(other) => panic!("unexpected cursor {other}"),
            })
        })
        .unwrap();

        assert_eq!(results, vec![json!(1), json!(2), json!(3)]);
        assert_eq!(seen, vec![None, Some("c2".to_owned())]);
    }

    #[test]
    fn test_collect_pages_stops_without_cursor() {
        let mut calls = 0;
        let results = collect_pages(|_| {
            calls += 1;
            Ok(json!({"results": [1], "has_more": true, "next_cursor": null}))
        })
        .unwrap();

        assert_eq!(results, vec![json!(1)]);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_collect_pages_propagates_error() {
        let result = collect_pages(|_| Err(NotionError::NotFound));
        assert!(matches!(result, Err(NotionError::NotFound)));
    }

    #[test]
    fn test_client_trims_base_url() {
        let client = NotionClient::new(
            "secret",
            &ClientOptions {
                api_url: "https://api.notion.com/v1/".to_owned(),
                ..ClientOptions::default()
            },
        );
        assert_eq!(client.url("pages/x"), "https://api.notion.com/v1/pages/x");
        assert_eq!(client.auth_header(), "Bearer secret");
    }
}
