//! Cache abstraction layer for notion-wiki.
//!
//! Remote payloads are cached per `(kind, id)`: the kind selects a bucket,
//! the id is the key. Two traits form the core API:
//!
//! - [`Cache`]: Factory for named cache buckets
//! - [`CacheBucket`]: Key-value store whose entries expire with age
//!
//! A cache never reports errors. Expired, unreadable or corrupt entries are
//! evicted and behave exactly like a miss.
//!
//! # Implementations
//!
//! - [`NullCache`] / [`NullCacheBucket`]: No-op implementations (always miss)
//! - [`FileCache`]: File-based implementation with version validation and TTL
//!
//! # Example
//!
//! ```
//! use nw_cache::{Cache, NullCache};
//!
//! let cache = NullCache;
//! let bucket = cache.bucket("page");
//! bucket.set("0f3c", b"{}");
//! assert_eq!(bucket.get("0f3c"), None); // NullCache always misses
//! ```

mod ext;
mod file;

pub use ext::CacheBucketExt;
pub use file::FileCache;

/// A named partition within a [`Cache`].
///
/// Each bucket stores raw byte payloads under string keys. Whether an entry
/// is still fresh is the bucket's concern: callers only see hits and misses.
pub trait CacheBucket: Send + Sync {
    /// Retrieve a cached value.
    ///
    /// Returns `None` on miss, on expiry and on a corrupt entry. Expired and
    /// corrupt entries are removed as a side effect.
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Store a value in the cache, stamping it with the current time.
    ///
    /// Overwrites any existing entry for the same key.
    fn set(&self, key: &str, value: &[u8]);

    /// Drop an entry. Missing entries are ignored.
    fn remove(&self, key: &str);
}

/// Factory for named cache [`CacheBucket`]s.
///
/// A `Cache` produces buckets that are logically isolated from each other.
/// The file-based cache stores each bucket in a separate subdirectory.
pub trait Cache: Send + Sync {
    /// Open or create a named bucket.
    ///
    /// # Arguments
    ///
    /// * `name` - Bucket name (e.g., "block", "page", "database")
    fn bucket(&self, name: &str) -> Box<dyn CacheBucket>;
}

/// No-op [`CacheBucket`] that never stores or retrieves data.
pub struct NullCacheBucket;

impl CacheBucket for NullCacheBucket {
    fn get(&self, _key: &str) -> Option<Vec<u8>> {
        None
    }

    fn set(&self, _key: &str, _value: &[u8]) {}

    fn remove(&self, _key: &str) {}
}

/// No-op [`Cache`] that always returns [`NullCacheBucket`]s.
///
/// Used when caching is disabled.
pub struct NullCache;

impl Cache for NullCache {
    fn bucket(&self, _name: &str) -> Box<dyn CacheBucket> {
        Box::new(NullCacheBucket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_cache_always_misses() {
        let cache = NullCache;
        let bucket = cache.bucket("page");

        assert_eq!(bucket.get("key"), None);

        bucket.set("key", b"hello");
        assert_eq!(bucket.get("key"), None);
    }

    #[test]
    fn test_null_cache_different_buckets_all_miss() {
        let cache = NullCache;

        for name in &["block", "children", "page", "database", "query"] {
            let bucket = cache.bucket(name);
            bucket.set("k", b"data");
            assert_eq!(bucket.get("k"), None, "bucket {name} should miss");
        }
    }
}
