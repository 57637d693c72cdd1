//! Cache-aside wrapper with self-healing reads.
//!
//! [`ResultCache::get_or_compute`] takes a key derived by the caller and a
//! compute closure. It never turns a storage problem into an error: corrupt
//! entries are deleted and recomputed, failed writes are logged. Errors from
//! the compute closure pass through untouched.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use esma_common::{Table, INDEX_ARTIFACT_COLUMN};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CacheError;
use crate::key::{CacheKey, CallOptions};
use crate::store::EntryStore;

/// Directory under the home directory holding all cache folders.
const HOME_SUBDIR: &str = "esma_data_py";

/// A value that can be stored in a [`ResultCache`].
pub trait CacheValue: Serialize + DeserializeOwned {
    /// Fixes up a value that was just read back from storage.
    fn restore(&mut self) {}
}

impl CacheValue for Table {
    fn restore(&mut self) {
        self.drop_column(INDEX_ARTIFACT_COLUMN);
    }
}

/// Returns `$HOME/esma_data_py/<folder>`.
pub fn default_root(folder: &str) -> Result<PathBuf, CacheError> {
    let home = std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .ok_or(CacheError::MissingHomeDir)?;
    Ok(home.join(HOME_SUBDIR).join(folder))
}

/// Memoizes results on disk, keyed by [`CacheKey`].
///
/// Concurrent readers are safe. Concurrent first writers of the same key are
/// not coordinated: each computes the value and the last rename wins.
///
/// Cache hits log a notice once per entry path. The set of notified paths
/// lives as long as the cache and is never evicted, which is fine for a
/// command-line process but grows without bound in a long-running service.
pub struct ResultCache {
    store: EntryStore,
    notify_hits: bool,
    notified: Mutex<HashSet<PathBuf>>,
}

impl ResultCache {
    /// Creates a cache storing entries under `root`. The directory is
    /// created on the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            store: EntryStore::new(root),
            notify_hits: true,
            notified: Mutex::new(HashSet::new()),
        }
    }

    /// Enables or disables the cached-data notice.
    pub fn with_hit_notices(mut self, enabled: bool) -> Self {
        self.notify_hits = enabled;
        self
    }

    /// The underlying entry store.
    pub fn store(&self) -> &EntryStore {
        &self.store
    }

    /// The cache root directory.
    pub fn root(&self) -> &Path {
        self.store.root()
    }

    /// Returns the cached value for `key`, or computes it.
    ///
    /// - No entry, or `options.update`: run `compute(options)`; persist the
    ///   result only if `options.save`.
    /// - Entry present: decode it, drop storage artifacts via
    ///   [`CacheValue::restore`], and return it.
    /// - Entry present but unreadable: delete it, run `compute` with
    ///   `update` forced on, persist the fresh value and return it.
    pub fn get_or_compute<T, E, F>(
        &self,
        key: &CacheKey,
        options: CallOptions,
        mut compute: F,
    ) -> Result<T, E>
    where
        T: CacheValue,
        F: FnMut(CallOptions) -> Result<T, E>,
    {
        if options.update || !self.store.contains(key) {
            return self.compute_fresh(key, options, &mut compute);
        }

        match self.store.read::<T>(key) {
            Ok(Some(mut value)) => {
                value.restore();
                self.notify_hit(key);
                Ok(value)
            }
            // Removed between the existence check and the read.
            Ok(None) => self.compute_fresh(key, options, &mut compute),
            Err(err) => {
                tracing::warn!(
                    target = "esma.cache",
                    path = %self.store.entry_path(key).display(),
                    error = %err,
                    "unable to load cached data, recomputing"
                );
                if let Err(err) = self.store.remove(key) {
                    tracing::debug!(target = "esma.cache", error = %err, "failed to remove stale entry");
                }
                let forced = CallOptions {
                    update: true,
                    ..options
                };
                let value = compute(forced)?;
                self.persist(key, &value);
                Ok(value)
            }
        }
    }

    fn compute_fresh<T, E, F>(&self, key: &CacheKey, options: CallOptions, compute: &mut F) -> Result<T, E>
    where
        T: CacheValue,
        F: FnMut(CallOptions) -> Result<T, E>,
    {
        let value = compute(options)?;
        if options.save {
            self.persist(key, &value);
        }
        Ok(value)
    }

    fn persist<T: CacheValue>(&self, key: &CacheKey, value: &T) {
        match self.store.write(key, value) {
            Ok(path) => {
                tracing::info!(target = "esma.cache", path = %path.display(), "data saved");
            }
            Err(err) => {
                tracing::error!(
                    target = "esma.cache",
                    key = %key,
                    error = %err,
                    "error, file not saved"
                );
            }
        }
    }

    /// Logs the cached-data notice the first time `key` is served.
    /// Returns `true` if the notice was emitted.
    fn notify_hit(&self, key: &CacheKey) -> bool {
        if !self.notify_hits {
            return false;
        }
        let path = self.store.entry_path(key);
        let mut notified = self.notified.lock().unwrap_or_else(PoisonError::into_inner);
        if !notified.insert(path.clone()) {
            return false;
        }
        tracing::info!(
            target = "esma.cache",
            path = %path.display(),
            "previously saved data used; set update=true to get the most up-to-date data"
        );
        true
    }
}
