//! Reference lists persisted as files, one directory per bucket.
//!
//! Every entry file starts with an 8-byte little-endian expiry (seconds
//! since the Unix epoch) followed by the fragment bytes. Reads check the
//! expiry before loading the rest of the file.
//!
//! The root holds a `VERSION` stamp. Opening the cache with a different
//! stamp discards everything under the root, so fragments written by an
//! older engine are never reused.

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{Cache, CacheBucket, expiry_after, is_live};

/// [`Cache`] stored under a root directory.
///
/// ```text
/// {root}/VERSION                 stamp written by `FileCache::new`
/// {root}/citeref/{sanitized key} entry files of the "citeref" bucket
/// ```
pub struct FileCache {
    root: PathBuf,
}

impl FileCache {
    /// Open the cache at `root`, resetting it unless its stamp equals `version`.
    ///
    /// Filesystem failures are logged; the cache then behaves as a miss-only
    /// store for entries it cannot read.
    #[must_use]
    pub fn new(root: PathBuf, version: &str) -> Self {
        match read_stamp(&root) {
            Stamp::Found(stored) if stored == version => {
                tracing::debug!(root = %root.display(), version, "Cache stamp up to date");
            }
            stamp => {
                tracing::info!(root = %root.display(), ?stamp, version, "Resetting reference list cache");
                reset_root(&root, version);
            }
        }
        Self { root }
    }
}

impl Cache for FileCache {
    fn bucket(&self, name: &str) -> Box<dyn CacheBucket> {
        Box::new(FileCacheBucket {
            dir: self.root.join(name),
        })
    }
}

/// A single bucket backed by a directory on disk.
struct FileCacheBucket {
    dir: PathBuf,
}

impl FileCacheBucket {
    /// Map a cache key to a file name. Keys may contain `:` or `/`.
    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(name)
    }
}

impl CacheBucket for FileCacheBucket {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        let path = self.path_for(key);
        let mut file = File::open(&path).ok()?;

        let mut header = [0u8; 8];
        file.read_exact(&mut header).ok()?;
        if !is_live(u64::from_le_bytes(header)) {
            tracing::debug!(key, "cache entry expired");
            return None;
        }

        let mut data = Vec::new();
        file.read_to_end(&mut data).ok()?;
        Some(data)
    }

    fn set(&self, key: &str, value: &[u8], ttl: Duration) {
        let path = self.path_for(key);

        if let Err(e) = fs::create_dir_all(&self.dir) {
            tracing::warn!(error = %e, "failed to create cache bucket directory");
            return;
        }

        let mut buf = Vec::with_capacity(8 + value.len());
        buf.extend_from_slice(&expiry_after(ttl).to_le_bytes());
        buf.extend_from_slice(value);

        if let Err(e) = fs::write(&path, &buf) {
            tracing::warn!(path = %path.display(), error = %e, "failed to write cache entry");
        }
    }
}

const STAMP_FILE: &str = "VERSION";

/// Contents of the stamp file.
#[derive(Debug)]
enum Stamp {
    Missing,
    Found(String),
}

fn read_stamp(root: &Path) -> Stamp {
    fs::read_to_string(root.join(STAMP_FILE)).map_or(Stamp::Missing, Stamp::Found)
}

/// Empty `root` and write a fresh stamp.
fn reset_root(root: &Path, version: &str) {
    if root.exists()
        && let Err(e) = fs::remove_dir_all(root)
    {
        tracing::warn!(root = %root.display(), error = %e, "Failed to clear cache directory");
    }
    let written = fs::create_dir_all(root).and_then(|()| fs::write(root.join(STAMP_FILE), version));
    if let Err(e) = written {
        tracing::warn!(root = %root.display(), error = %e, "Failed to stamp cache directory");
    }
}
