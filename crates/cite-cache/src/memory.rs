//! In-process cache implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::{Cache, CacheBucket, expiry_after, is_live};

type Entries = HashMap<String, (u64, Vec<u8>)>;

/// In-memory [`Cache`].
///
/// Buckets with the same name share one map, so a fragment stored through one
/// handle is visible through every other handle for that bucket. Expired
/// entries are dropped lazily on read.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use cite_cache::{Cache, MemoryCache};
///
/// let cache = MemoryCache::new();
/// cache.bucket("citeref").set("k", b"v", Duration::from_secs(60));
/// assert_eq!(cache.bucket("citeref").get("k"), Some(b"v".to_vec()));
/// assert_eq!(cache.bucket("other").get("k"), None);
/// ```
#[derive(Clone, Debug, Default)]
pub struct MemoryCache {
    buckets: Arc<RwLock<HashMap<String, Arc<RwLock<Entries>>>>>,
}

impl MemoryCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self, name: &str) -> Arc<RwLock<Entries>> {
        if let Ok(buckets) = self.buckets.read()
            && let Some(entries) = buckets.get(name)
        {
            return Arc::clone(entries);
        }
        let mut buckets = match self.buckets.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Arc::clone(buckets.entry(name.to_owned()).or_default())
    }
}

impl Cache for MemoryCache {
    fn bucket(&self, name: &str) -> Box<dyn CacheBucket> {
        Box::new(MemoryCacheBucket {
            entries: self.entries(name),
        })
    }
}

struct MemoryCacheBucket {
    entries: Arc<RwLock<Entries>>,
}

impl CacheBucket for MemoryCacheBucket {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        {
            let entries = self.entries.read().ok()?;
            let (expires_at, data) = entries.get(key)?;
            if is_live(*expires_at) {
                return Some(data.clone());
            }
        }
        // Expired: drop it so the map does not grow without bound
        if let Ok(mut entries) = self.entries.write() {
            entries.remove(key);
        }
        None
    }

    fn set(&self, key: &str, value: &[u8], ttl: Duration) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key.to_owned(), (expiry_after(ttl), value.to_vec()));
        }
    }
}
