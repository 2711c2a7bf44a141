//! File-based cache implementation.
//!
//! [`FileCache`] stores cache entries as files on disk, organized into buckets
//! (subdirectories). Each entry is a single file with a fixed header followed
//! by the payload:
//!
//! ```text
//! [fetched_at: i64 LE unix seconds][payload bytes]
//! ```
//!
//! On read, the header is checked against the configured maximum age. Stale
//! entries and entries too short to hold a header are deleted and reported
//! as misses.
//!
//! On construction, [`FileCache`] validates a `VERSION` file in the cache root.
//! If the version mismatches or is missing, the entire cache directory is wiped
//! and recreated. This ensures caches written by another format are never used.

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;

use crate::{Cache, CacheBucket};

/// Size of the `fetched_at` header in bytes.
const HEADER_LEN: usize = 8;

/// File-based [`Cache`] rooted at a directory on disk.
///
/// Directory layout:
/// ```text
/// {root}/
/// +-- VERSION            # contains the cache version string
/// +-- page/              # bucket "page"
/// |   +-- 0f3c....json   # cache entry keyed by compact entity id
/// +-- database/          # bucket "database"
///     +-- ...
/// ```
pub struct FileCache {
    root: PathBuf,
    max_age: Duration,
}

impl FileCache {
    /// Create a new file-based cache at `root`, validating the cache version.
    ///
    /// Entries older than `max_age` are treated as absent. If the `VERSION`
    /// file inside `root` does not match `version`, the entire cache
    /// directory is removed and recreated. Errors during validation are
    /// logged but never fatal.
    #[must_use]
    pub fn new(root: PathBuf, version: &str, max_age: Duration) -> Self {
        validate_version(&root, version);
        Self { root, max_age }
    }

    /// Remove every cached entry, keeping the `VERSION` file.
    ///
    /// Returns the number of entry files deleted.
    pub fn clear(&self) -> usize {
        let Ok(entries) = fs::read_dir(&self.root) else {
            return 0;
        };

        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                removed += count_files(&path);
                if let Err(e) = fs::remove_dir_all(&path) {
                    tracing::warn!("failed to remove cache bucket {}: {e}", path.display());
                }
            }
        }
        tracing::info!("cleared {removed} cache entries");
        removed
    }
}

impl Cache for FileCache {
    fn bucket(&self, name: &str) -> Box<dyn CacheBucket> {
        Box::new(FileCacheBucket {
            dir: self.root.join(name),
            max_age_secs: i64::try_from(self.max_age.as_secs()).unwrap_or(i64::MAX),
        })
    }
}

/// A single bucket backed by a directory on disk.
struct FileCacheBucket {
    dir: PathBuf,
    max_age_secs: i64,
}

impl FileCacheBucket {
    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Read an entry as seen at time `now` (unix seconds).
    fn get_at(&self, key: &str, now: i64) -> Option<Vec<u8>> {
        let path = self.entry_path(key);
        let mut file = File::open(&path).ok()?;

        let mut header = [0u8; HEADER_LEN];
        if file.read_exact(&mut header).is_err() {
            tracing::debug!("evicting truncated cache entry {}", path.display());
            drop(file);
            self.remove(key);
            return None;
        }

        let fetched_at = i64::from_le_bytes(header);
        let age = now.saturating_sub(fetched_at);
        if age > self.max_age_secs || age < -self.max_age_secs {
            tracing::debug!("evicting stale cache entry {} (age {age}s)", path.display());
            drop(file);
            self.remove(key);
            return None;
        }

        let mut data = Vec::new();
        if file.read_to_end(&mut data).is_err() {
            drop(file);
            self.remove(key);
            return None;
        }
        Some(data)
    }
}

impl CacheBucket for FileCacheBucket {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.get_at(key, Utc::now().timestamp())
    }

    fn set(&self, key: &str, value: &[u8]) {
        write_entry(&self.entry_path(key), Utc::now().timestamp(), value);
    }

    fn remove(&self, key: &str) {
        let path = self.entry_path(key);
        if let Err(e) = fs::remove_file(&path)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            tracing::warn!("failed to evict cache entry {}: {e}", path.display());
        }
    }
}

/// Write an entry stamped with `fetched_at`.
///
/// Silently ignores errors, the cache is optional.
fn write_entry(path: &Path, fetched_at: i64, value: &[u8]) {
    let Some(parent) = path.parent() else {
        return;
    };
    if let Err(e) = fs::create_dir_all(parent) {
        tracing::debug!("failed to create cache bucket {}: {e}", parent.display());
        return;
    }

    let mut buf = Vec::with_capacity(HEADER_LEN + value.len());
    buf.extend_from_slice(&fetched_at.to_le_bytes());
    buf.extend_from_slice(value);

    if let Err(e) = fs::write(path, &buf) {
        tracing::debug!("failed to write cache entry {}: {e}", path.display());
    }
}

fn count_files(dir: &Path) -> usize {
    let Ok(entries) = fs::read_dir(dir) else {
        return 0;
    };
    entries
        .flatten()
        .map(|entry| {
            let path = entry.path();
            if path.is_dir() { count_files(&path) } else { 1 }
        })
        .sum()
}

/// Validate the cache version, wiping the directory on mismatch.
fn validate_version(root: &Path, version: &str) {
    let version_file = root.join("VERSION");

    match fs::read_to_string(&version_file) {
        Ok(stored) if stored == version => {
            tracing::debug!("cache version matches: {version}");
            return;
        }
        Ok(stored) => {
            tracing::info!(
                "cache version mismatch (stored={stored}, current={version}), wiping cache"
            );
        }
        Err(_) => {
            tracing::info!("no cache VERSION file found, initializing cache");
        }
    }

    if root.exists()
        && let Err(e) = fs::remove_dir_all(root)
    {
        tracing::warn!("failed to remove cache directory: {e}");
    }
    if let Err(e) = fs::create_dir_all(root) {
        tracing::warn!("failed to create cache directory: {e}");
        return;
    }
    if let Err(e) = fs::write(&version_file, version) {
        tracing::warn!("failed to write cache VERSION file: {e}");
    }
}
