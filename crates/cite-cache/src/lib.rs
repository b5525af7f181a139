//! Render cache abstraction for the citation engine.
//!
//! Rendered reference lists are memoized under a content-hash key. This crate
//! keeps the engine independent of where those fragments live. Two traits
//! form the core API:
//!
//! - [`Cache`]: Factory for named cache buckets
//! - [`CacheBucket`]: Key-value store where every entry carries an expiry
//!
//! # Implementations
//!
//! - [`NullCache`] / [`NullCacheBucket`]: No-op implementations (always miss)
//! - [`MemoryCache`]: In-process map, shared between bucket handles
//! - [`FileCache`]: File-based implementation with version validation
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use cite_cache::{Cache, NullCache};
//!
//! let cache = NullCache;
//! let bucket = cache.bucket("citeref");
//! bucket.set("abc123", b"<ol>...</ol>", Duration::from_secs(60));
//! assert_eq!(bucket.get("abc123"), None); // NullCache always misses
//! ```

mod file;
mod memory;

use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub use file::FileCache;
pub use memory::MemoryCache;

/// A named partition within a [`Cache`].
///
/// Each entry is written with a time-to-live. Reads after the entry expired
/// behave exactly like a miss. Stores are eventually consistent: a `get`
/// right after a `set` may still miss, and callers must tolerate that.
pub trait CacheBucket: Send + Sync {
    /// Retrieve a cached value.
    ///
    /// Returns `None` on miss, on expiry, or if the stored entry is unreadable.
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Store a value that expires after `ttl`.
    ///
    /// Overwrites any existing entry for the same key. Failures are swallowed:
    /// the cache is an optimization, never a source of truth.
    fn set(&self, key: &str, value: &[u8], ttl: Duration);
}

/// Factory for named cache [`CacheBucket`]s.
///
/// A `Cache` produces buckets that are logically isolated from each other.
pub trait Cache: Send + Sync {
    /// Open or create a named bucket.
    ///
    /// Calling `bucket` multiple times with the same name returns handles
    /// that share the same underlying storage.
    fn bucket(&self, name: &str) -> Box<dyn CacheBucket>;
}

/// No-op [`CacheBucket`] that never stores or retrieves data.
pub struct NullCacheBucket;

impl CacheBucket for NullCacheBucket {
    fn get(&self, _key: &str) -> Option<Vec<u8>> {
        None
    }

    fn set(&self, _key: &str, _value: &[u8], _ttl: Duration) {}
}

/// No-op [`Cache`] that always returns [`NullCacheBucket`]s.
///
/// Use when reference caching is disabled.
pub struct NullCache;

impl Cache for NullCache {
    fn bucket(&self, _name: &str) -> Box<dyn CacheBucket> {
        Box::new(NullCacheBucket)
    }
}

/// Absolute expiry time (seconds since the Unix epoch) for an entry written now.
pub(crate) fn expiry_after(ttl: Duration) -> u64 {
    now_secs().saturating_add(ttl.as_secs())
}

/// Whether an entry with the given expiry is still live.
pub(crate) fn is_live(expires_at: u64) -> bool {
    now_secs() < expires_at
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}
