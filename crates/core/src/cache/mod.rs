//! Disk-backed content cache with per-key exclusive access.
//!
//! This module provides a persistent, crash-tolerant key→entry store:
//!
//! - One namespace directory per provider, one JSON file per key
//! - Per-key mutual exclusion via lazily created async mutexes
//! - Atomic writes (temp file + rename) so a reader never observes a
//!   half-written entry
//! - Merge-on-write semantics for HTTP validators

pub mod entry;
pub mod hash;

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::Error;

pub use entry::{CacheBody, CacheEntry, CacheUpdate};

type LockMap = Arc<StdMutex<HashMap<String, Arc<AsyncMutex<()>>>>>;

/// Key-addressed persistent store for one cache namespace.
///
/// Cloning is cheap; clones share the same lock table, so two handles to
/// the same namespace still serialize access per key.
#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
    locks: LockMap,
}

impl DiskCache {
    /// Create a cache rooted at `dir`. The directory is created lazily on
    /// the first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), locks: Arc::new(StdMutex::new(HashMap::new())) }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Run `f` inside an exclusive access window for `key`.
    ///
    /// Concurrent callers targeting the same key are serialized; different
    /// keys proceed independently. The window is released on completion or
    /// failure, and `f`'s result or error propagates unchanged.
    pub async fn with_entry<F, Fut, R>(&self, key: &str, f: F) -> Result<R, Error>
    where
        F: FnOnce(CacheRef) -> Fut,
        Fut: Future<Output = Result<R, Error>>,
    {
        validate_key(key)?;

        let guard = self.acquire(key).await;
        let result = f(self.entry_ref(key)).await;
        drop(guard);
        self.release(key);

        result
    }

    /// Run `f` inside exclusive access windows for all of `keys`.
    ///
    /// Locks are acquired in lexicographic key order so two callers
    /// requesting overlapping key sets in different orders cannot
    /// deadlock. `f` receives one reference per key in input order.
    pub async fn with_entries<F, Fut, R>(&self, keys: &[String], f: F) -> Result<R, Error>
    where
        F: FnOnce(Vec<CacheRef>) -> Fut,
        Fut: Future<Output = Result<R, Error>>,
    {
        for key in keys {
            validate_key(key)?;
        }

        let mut ordered: Vec<&String> = keys.iter().collect();
        ordered.sort_unstable();
        if ordered.windows(2).any(|w| w[0] == w[1]) {
            return Err(Error::InvalidCacheKey("duplicate key in multi-key window".into()));
        }

        let mut guards = Vec::with_capacity(ordered.len());
        for key in &ordered {
            guards.push(self.acquire(key).await);
        }

        let refs = keys.iter().map(|key| self.entry_ref(key)).collect();
        let result = f(refs).await;

        drop(guards);
        for key in ordered {
            self.release(key);
        }

        result
    }

    fn entry_ref(&self, key: &str) -> CacheRef {
        CacheRef { path: self.dir.join(key) }
    }

    async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().expect("cache lock table poisoned");
            locks
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };

        lock.lock_owned().await
    }

    /// Drop the key's mutex from the table once no window holds or waits
    /// on it, so the table does not grow with every key ever touched.
    fn release(&self, key: &str) {
        let mut locks = self.locks.lock().expect("cache lock table poisoned");
        if let Some(lock) = locks.get(key)
            && Arc::strong_count(lock) == 1
        {
            locks.remove(key);
        }
    }

    #[cfg(test)]
    fn lock_count(&self) -> usize {
        self.locks.lock().unwrap().len()
    }
}

/// A transient lease on one cache key, valid for the duration of one
/// exclusive access window. Not meant to be stored.
#[derive(Debug)]
pub struct CacheRef {
    path: PathBuf,
}

impl CacheRef {
    /// Read the persisted entry. A missing entry is not an error.
    pub async fn read(&self) -> Result<Option<CacheEntry>, Error> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::cache_io(&self.path, e)),
        };

        Ok(Some(serde_json::from_slice(&raw)?))
    }

    /// Merge `update` into the stored entry and persist the result.
    ///
    /// The write is atomic from the perspective of a crash: the merged
    /// entry is written to a temp file and renamed over the target.
    pub async fn write(&self, update: CacheUpdate) -> Result<CacheEntry, Error> {
        let merged = self.read().await?.unwrap_or_default().merged(update);

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::cache_io(parent, e))?;
        }

        let tmp = tmp_path(&self.path);
        let raw = serde_json::to_vec(&merged)?;

        tokio::fs::write(&tmp, &raw).await.map_err(|e| Error::cache_io(&tmp, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| Error::cache_io(&self.path, e))?;

        Ok(merged)
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Keys map 1:1 to file names inside the namespace directory, so anything
/// that could traverse out of it is rejected outright.
fn validate_key(key: &str) -> Result<(), Error> {
    let traversal = key.is_empty()
        || key == "."
        || key == ".."
        || key.contains('/')
        || key.contains('\\')
        || key.contains('\0');

    if traversal {
        return Err(Error::InvalidCacheKey(key.to_string()));
    }

    Ok(())
}
