//! Cached, coalescing, rate-limited access to the Notion API.
//!
//! Every object is addressed by `(kind, id)`. The first request for a key in
//! a run consults the cache, then the API, and stores the outcome in a
//! per-key slot; every later or concurrent request for the same key gets
//! that outcome without touching the cache or the network again.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use nw_cache::{Cache, CacheBucket, CacheBucketExt};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::client::NotionApi;
use crate::error::FetchError;
use crate::rate_limit::RateLimiter;
use crate::EntityId;
use crate::types::{Block, Database, Page};

/// What is being fetched. Each kind has its own cache bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchKind {
    /// A single block.
    Block,
    /// The direct children of a block or page.
    Children,
    /// A page with its properties.
    Page,
    /// A database with its schema.
    Database,
    /// Every row of a database.
    Query,
}

impl FetchKind {
    const ALL: [Self; 5] = [
        Self::Block,
        Self::Children,
        Self::Page,
        Self::Database,
        Self::Query,
    ];

    /// Cache bucket name.
    #[must_use]
    pub fn bucket(self) -> &'static str {
        match self {
            Self::Block => "block",
            Self::Children => "children",
            Self::Page => "page",
            Self::Database => "database",
            Self::Query => "query",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchStats {
    /// Calls that reached the API.
    pub remote_calls: usize,
    /// Requests answered from the cache.
    pub cache_hits: usize,
}

type Outcome = Result<Arc<Value>, FetchError>;
type Slot = Arc<OnceLock<Outcome>>;

/// Cached access to the Notion API.
pub struct Fetcher {
    api: Arc<dyn NotionApi>,
    buckets: Vec<Box<dyn CacheBucket>>,
    limiter: RateLimiter,
    slots: Mutex<HashMap<(FetchKind, EntityId), Slot>>,
    remote_calls: AtomicUsize,
    cache_hits: AtomicUsize,
}

impl Fetcher {
    /// Create a fetcher over `api`, caching in `cache`.
    pub fn new(api: Arc<dyn NotionApi>, cache: &dyn Cache, limiter: RateLimiter) -> Self {
        let buckets = FetchKind::ALL
            .iter()
            .map(|kind| cache.bucket(kind.bucket()))
            .collect();
        Self {
            api,
            buckets,
            limiter,
            slots: Mutex::new(HashMap::new()),
            remote_calls: AtomicUsize::new(0),
            cache_hits: AtomicUsize::new(0),
        }
    }

    /// Retrieve a single block.
    pub fn block(&self, id: &EntityId) -> Result<Block, FetchError> {
        self.decode(FetchKind::Block, id)
    }

    /// Retrieve the direct children of a block or page.
    ///
    /// Children that cannot be decoded are skipped.
    pub fn children(&self, id: &EntityId) -> Result<Vec<Block>, FetchError> {
        self.decode_list(FetchKind::Children, id)
    }

    /// Retrieve a page or database row.
    pub fn page(&self, id: &EntityId) -> Result<Page, FetchError> {
        self.decode(FetchKind::Page, id)
    }

    /// Retrieve a database with its schema.
    pub fn database(&self, id: &EntityId) -> Result<Database, FetchError> {
        self.decode(FetchKind::Database, id)
    }

    /// Retrieve every row of a database, in query order.
    ///
    /// Rows that cannot be decoded are skipped.
    pub fn rows(&self, id: &EntityId) -> Result<Vec<Page>, FetchError> {
        self.decode_list(FetchKind::Query, id)
    }

    /// Counters accumulated so far.
    pub fn stats(&self) -> FetchStats {
        FetchStats {
            remote_calls: self.remote_calls.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
        }
    }

    fn decode<T: DeserializeOwned>(&self, kind: FetchKind, id: &EntityId) -> Result<T, FetchError> {
        let value = self.load(kind, id)?;
        T::deserialize(value.as_ref()).map_err(|e| {
            warn!("cannot decode {} {id}: {e}", kind.bucket());
            FetchError::Decode(e.to_string())
        })
    }

    fn decode_list<T: DeserializeOwned>(
        &self,
        kind: FetchKind,
        id: &EntityId,
    ) -> Result<Vec<T>, FetchError> {
        let value = self.load(kind, id)?;
        let Some(items) = value.as_array() else {
            return Err(FetchError::Decode(format!(
                "{} {id} is not a list",
                kind.bucket()
            )));
        };
        Ok(items
            .iter()
            .filter_map(|item| match T::deserialize(item) {
                Ok(decoded) => Some(decoded),
                Err(e) => {
                    warn!("skipping undecodable item of {} {id}: {e}", kind.bucket());
                    None
                }
            })
            .collect())
    }

    /// Raw payload for `(kind, id)`, resolved at most once per run.
    fn load(&self, kind: FetchKind, id: &EntityId) -> Outcome {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry((kind, *id)).or_default())
        };
        slot.get_or_init(|| self.load_uncached(kind, id)).clone()
    }

    fn load_uncached(&self, kind: FetchKind, id: &EntityId) -> Outcome {
        let key = id.compact();
        let bucket = &self.buckets[kind.index()];

        if let Some(value) = bucket.get_json::<Value>(&key) {
            debug!("cache hit: {} {id}", kind.bucket());
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Arc::new(value));
        }
        debug!("cache miss: {} {id}", kind.bucket());

        self.limiter.acquire();
        self.remote_calls.fetch_add(1, Ordering::Relaxed);
        let result = match kind {
            FetchKind::Block => self.api.retrieve_block(id),
            FetchKind::Children => self.api.list_block_children(id).map(Value::Array),
            FetchKind::Page => self.api.retrieve_page(id),
            FetchKind::Database => self.api.retrieve_database(id),
            FetchKind::Query => self.api.query_database(id).map(Value::Array),
        };

        match result {
            Ok(value) => {
                bucket.set_json(&key, &value);
                Ok(Arc::new(value))
            }
            Err(e) => {
                warn!("failed to fetch {} {id}: {e}", kind.bucket());
                Err(FetchError::from(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use nw_cache::{FileCache, NullCache};
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;
    use crate::mock::{MockApi, fixtures};

    const PAGE: &str = "8a3c0f4e-9b2d-4c6a-8e1f-0a2b3c4d5e6f";
    const DB: &str = "1b2c3d4e-5f60-4718-8293-a4b5c6d7e8f9";

    fn id(value: &str) -> EntityId {
        EntityId::parse(value).unwrap()
    }

    fn limiter() -> RateLimiter {
        RateLimiter::new(1000, Duration::from_secs(1))
    }

    fn sample_api() -> Arc<MockApi> {
        Arc::new(
            MockApi::new()
                .with_page(fixtures::page(PAGE, fixtures::workspace(), "Home"))
                .with_children(PAGE, vec![fixtures::paragraph(
                    "0c1d2e3f-4a5b-4c6d-8e7f-8091a2b3c4d5",
                    "Hello",
                )])
                .with_database(fixtures::database(DB, "Tasks", json!({
                    "Name": fixtures::title_schema(),
                })))
                .with_rows(DB, vec![
                    fixtures::row(
                        "2a2b2c2d-3e3f-4a4b-8c8d-9e9fa0a1a2a3",
                        DB,
                        json!({"Name": fixtures::title_value("Alpha")}),
                    ),
                    json!({"id": "broken"}),
                ]),
        )
    }

    #[test]
    fn test_typed_accessors() {
        let api = sample_api();
        let fetcher = Fetcher::new(api, &NullCache, limiter());

        assert_eq!(fetcher.page(&id(PAGE)).unwrap().title(), "Home");
        assert_eq!(fetcher.children(&id(PAGE)).unwrap().len(), 1);
        assert_eq!(fetcher.database(&id(DB)).unwrap().title(), "Tasks");

        let rows = fetcher.rows(&id(DB)).unwrap();
        assert_eq!(rows.len(), 1, "undecodable row is skipped");
        assert_eq!(rows[0].title(), "Alpha");
    }

    #[test]
    fn test_same_key_fetched_once_per_run() {
        let api = sample_api();
        let fetcher = Fetcher::new(Arc::clone(&api) as Arc<dyn NotionApi>, &NullCache, limiter());

        for _ in 0..3 {
            fetcher.page(&id(PAGE)).unwrap();
        }

        assert_eq!(api.calls(FetchKind::Page, PAGE), 1);
        assert_eq!(fetcher.stats().remote_calls, 1);
    }

    #[test]
    fn test_kinds_are_distinct_keys() {
        let api = sample_api();
        let fetcher = Fetcher::new(Arc::clone(&api) as Arc<dyn NotionApi>, &NullCache, limiter());

        fetcher.page(&id(PAGE)).unwrap();
        fetcher.children(&id(PAGE)).unwrap();

        assert_eq!(api.calls(FetchKind::Page, PAGE), 1);
        assert_eq!(api.calls(FetchKind::Children, PAGE), 1);
    }

    #[test]
    fn test_failure_is_remembered() {
        let api = sample_api();
        let fetcher = Fetcher::new(Arc::clone(&api) as Arc<dyn NotionApi>, &NullCache, limiter());
        let missing = id("ffffffff-ffff-4fff-8fff-ffffffffffff");

        assert_eq!(fetcher.page(&missing), Err(FetchError::NotFound));
        assert_eq!(fetcher.page(&missing), Err(FetchError::NotFound));
        assert_eq!(api.calls(FetchKind::Page, "ffffffff-ffff-4fff-8fff-ffffffffffff"), 1);
    }

    #[test]
    fn test_concurrent_requests_coalesce() {
        let api = Arc::new(
            MockApi::new()
                .with_page(fixtures::page(PAGE, fixtures::workspace(), "Home"))
                .with_latency(Duration::from_millis(50)),
        );
        let fetcher = Fetcher::new(Arc::clone(&api) as Arc<dyn NotionApi>, &NullCache, limiter());

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| fetcher.page(&id(PAGE)).unwrap());
            }
        });

        assert_eq!(api.calls(FetchKind::Page, PAGE), 1);
    }

    #[test]
    fn test_warm_cache_skips_remote() {
        let tmp = TempDir::new().unwrap();
        let cache = FileCache::new(tmp.path().to_path_buf(), "v1", Duration::from_secs(3600));

        let cold_api = sample_api();
        let cold = Fetcher::new(Arc::clone(&cold_api) as Arc<dyn NotionApi>, &cache, limiter());
        cold.database(&id(DB)).unwrap();
        assert_eq!(cold.stats().remote_calls, 1);

        let warm_api = sample_api();
        let warm = Fetcher::new(Arc::clone(&warm_api) as Arc<dyn NotionApi>, &cache, limiter());
        let db = warm.database(&id(DB)).unwrap();

        assert_eq!(db.title(), "Tasks");
        assert_eq!(warm_api.total_calls(), 0);
        assert_eq!(
            warm.stats(),
            FetchStats {
                remote_calls: 0,
                cache_hits: 1
            }
        );
    }

    #[test]
    fn test_failures_are_not_cached() {
        let tmp = TempDir::new().unwrap();
        let cache = FileCache::new(tmp.path().to_path_buf(), "v1", Duration::from_secs(3600));

        let failing = Arc::new(MockApi::new().with_failure(FetchKind::Page, PAGE, 500));
        let first = Fetcher::new(failing, &cache, limiter());
        assert!(matches!(first.page(&id(PAGE)), Err(FetchError::Transport(_))));

        let api = sample_api();
        let second = Fetcher::new(Arc::clone(&api) as Arc<dyn NotionApi>, &cache, limiter());
        assert_eq!(second.page(&id(PAGE)).unwrap().title(), "Home");
        assert_eq!(api.calls(FetchKind::Page, PAGE), 1);
    }

    #[test]
    fn test_wrong_shape_is_decode_error() {
        let api = Arc::new(MockApi::new().with_page(json!({"id": PAGE, "properties": []})));
        let fetcher = Fetcher::new(api, &NullCache, limiter());

        assert!(matches!(fetcher.page(&id(PAGE)), Err(FetchError::Decode(_))));
    }
}
