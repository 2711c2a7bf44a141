//! Extension trait for [`CacheBucket`] with typed convenience methods.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::CacheBucket;

/// Typed convenience methods for [`CacheBucket`].
///
/// Implemented as default methods on an extension trait so that
/// [`CacheBucket`] stays object-safe and implementors only handle raw bytes.
pub trait CacheBucketExt: CacheBucket {
    /// Retrieve a JSON-deserialized value from the cache.
    ///
    /// Returns `None` on miss. An entry that no longer decodes as `T` is
    /// corrupt: it is removed and reported as a miss.
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = self.get(key)?;
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!("evicting undecodable cache entry {key}: {e}");
                self.remove(key);
                None
            }
        }
    }

    /// Store a value as JSON in the cache.
    ///
    /// Silently does nothing if serialization fails.
    fn set_json<T: Serialize>(&self, key: &str, value: &T) {
        if let Ok(bytes) = serde_json::to_vec_pretty(value) {
            self.set(key, &bytes);
        }
    }
}

impl<B: CacheBucket + ?Sized> CacheBucketExt for B {}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde::Deserialize;
    use tempfile::TempDir;

    use super::*;
    use crate::{Cache, FileCache};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Payload {
        title: String,
    }

    #[test]
    fn test_json_round_trip() {
        let tmp = TempDir::new().unwrap();
        let cache = FileCache::new(tmp.path().to_path_buf(), "v1", Duration::from_secs(60));
        let bucket = cache.bucket("page");

        bucket.set_json(
            "abc",
            &Payload {
                title: "Alpha".to_owned(),
            },
        );

        let loaded: Option<Payload> = bucket.get_json("abc");
        assert_eq!(
            loaded,
            Some(Payload {
                title: "Alpha".to_owned()
            })
        );
    }

    #[test]
    fn test_corrupt_json_is_evicted() {
        let tmp = TempDir::new().unwrap();
        let cache = FileCache::new(tmp.path().to_path_buf(), "v1", Duration::from_secs(60));
        let bucket = cache.bucket("page");

        bucket.set("abc", b"{not json");

        let loaded: Option<Payload> = bucket.get_json("abc");
        assert_eq!(loaded, None);
        assert_eq!(bucket.get("abc"), None);
    }
}
