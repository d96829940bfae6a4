//! File Store
//!
//! One file per block, sharded by routing key. See [`crate::path`] for the
//! layout and [`crate::record`] for the file format.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::callback::{StorableBlock, StoreCallback};
use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::path::KeyPathMapper;
use crate::record::{self, BlockRecord, RecordShape};

use super::locks::KeyLocks;
use super::stats::Counters;
use super::{BlockStore, FetchOptions, Fetched, StoreAccessStats};

/// Directory below the node data directory that holds all file stores
pub const DATASTORE_DIR: &str = "datastore-files";

/// Number of per-key lock stripes
const KEY_LOCK_STRIPES: usize = 64;

/// File-backed block store for one block type
///
/// ## Concurrency
/// - Every operation runs synchronously on the caller's thread.
/// - Counters: atomics, no cross-field consistency.
/// - `max_keys`: Mutex, capacity reads/writes are serialized.
/// - Records are renamed into place, so a fetch never sees a half-written
///   file.
/// - `put`/`remove` and corrupt-record purges hold a striped key lock, so
///   two puts to the same key cannot interleave their collision check and
///   write. Fetches don't lock.
pub struct FileStore<C: StoreCallback> {
    config: StoreConfig,

    /// Block type capability, shared with the block type's owner
    callback: Arc<C>,

    /// Record lengths, read once from the callback
    shape: RecordShape,

    mapper: KeyPathMapper,

    /// Advisory capacity
    max_keys: Mutex<u64>,

    counters: Counters,

    key_locks: KeyLocks,
}

impl<C: StoreCallback> FileStore<C> {
    /// Open or create the store `{base_dir}/datastore-files/{name}`
    ///
    /// The initial key count comes from counting record files. If that
    /// listing fails the store still opens, with a key count of zero.
    /// Temporary files left by interrupted writes are deleted.
    pub fn open(config: StoreConfig, callback: Arc<C>) -> Result<Self> {
        config.validate()?;

        let root = config.base_dir.join(DATASTORE_DIR).join(&config.name);
        fs::create_dir_all(&root)?;

        let mapper = KeyPathMapper::new(root);
        let key_count = match mapper.record_paths() {
            Ok(paths) => paths.len() as u64,
            Err(e) => {
                warn!(
                    store = %config.name,
                    error = %e,
                    "failed to count records, starting with key count 0"
                );
                0
            }
        };

        let shape = RecordShape::of(&*callback);

        info!(
            store = %config.name,
            root = %mapper.root().display(),
            key_count,
            max_keys = config.max_keys,
            record_len = shape.record_len(),
            "opened file store"
        );

        let store = Self {
            max_keys: Mutex::new(config.max_keys),
            config,
            callback,
            shape,
            mapper,
            counters: Counters::with_keys(key_count),
            key_locks: KeyLocks::new(KEY_LOCK_STRIPES),
        };

        match store.remove_temp_files() {
            Ok(0) => {}
            Ok(swept) => info!(store = %store.config.name, swept, "removed leftover temp files"),
            Err(e) => warn!(store = %store.config.name, error = %e, "failed to sweep temp files"),
        }

        Ok(store)
    }

    /// Delete the record for a routing key
    ///
    /// Returns whether a record was there to delete.
    pub fn remove(&self, routing_key: &[u8]) -> Result<bool> {
        let path = self.mapper.path(routing_key)?;

        let _guard = self.key_locks.lock(routing_key);
        let removed = record::remove_record(&path)?;
        if removed {
            self.counters.key_removed();
        }

        debug!(store = %self.config.name, key = %hex::encode_upper(routing_key), removed, "remove");
        Ok(removed)
    }

    /// Delete every record and any leftover temp files
    ///
    /// Returns the number of records deleted. Each deletion lowers the key
    /// count under its key lock, so a put racing with the walk keeps its
    /// record counted.
    pub fn clear(&self) -> Result<u64> {
        let mut removed = 0;

        for path in self.mapper.record_paths()? {
            let Some(routing_key) = self.mapper.routing_key_from_path(&path) else {
                continue;
            };

            let _guard = self.key_locks.lock(&routing_key);
            if record::remove_record(&path)? {
                self.counters.key_removed();
                removed += 1;
            }
        }

        let swept = self.remove_temp_files()?;
        info!(store = %self.config.name, removed, swept, "cleared store");
        Ok(removed)
    }

    /// Routing keys of every record on disk, in no particular order
    pub fn routing_keys(&self) -> Result<Vec<Vec<u8>>> {
        let paths = self.mapper.record_paths()?;
        Ok(paths
            .iter()
            .filter_map(|p| self.mapper.routing_key_from_path(p))
            .collect())
    }

    /// Raw record for a routing key, without verification or counting
    pub fn read_record(&self, routing_key: &[u8]) -> Result<Option<BlockRecord>> {
        let path = self.mapper.path(routing_key)?;
        Ok(record::read_record(&path, &self.shape))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Directory holding this store's shard directories
    pub fn root(&self) -> &Path {
        self.mapper.root()
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn callback(&self) -> &Arc<C> {
        &self.callback
    }

    pub fn shape(&self) -> RecordShape {
        self.shape
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn check_len(field: &'static str, expected: usize, actual: usize) -> Result<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(StoreError::ShapeMismatch {
                field,
                expected,
                actual,
            })
        }
    }

    /// Delete temp files of writes that never reached their rename
    ///
    /// Writers hold the key lock from temp creation to rename, so a temp
    /// file seen under the lock belongs to no live write in this store.
    fn remove_temp_files(&self) -> Result<u64> {
        let mut swept = 0;

        for path in self.mapper.temp_paths()? {
            let Some(routing_key) = self.mapper.routing_key_from_temp_path(&path) else {
                continue;
            };

            let _guard = self.key_locks.lock(&routing_key);
            if record::remove_record(&path)? {
                debug!(path = %path.display(), "removed leftover temp file");
                swept += 1;
            }
        }

        Ok(swept)
    }

    /// Delete a record that failed verification
    ///
    /// Only deletes if the file still holds the bytes that failed; a valid
    /// record written in the meantime is kept.
    fn purge_corrupt(&self, path: &Path, routing_key: &[u8], corrupt: &BlockRecord) {
        let _guard = self.key_locks.lock(routing_key);

        match record::read_record(path, &self.shape) {
            Some(current) if current == *corrupt => {}
            Some(_) => {
                debug!(path = %path.display(), "record rewritten since verification, keeping it");
                return;
            }
            None => {
                warn!(path = %path.display(), "race condition: removing non-existent block");
                return;
            }
        }

        match record::remove_record(path) {
            Ok(true) => self.counters.key_removed(),
            Ok(false) => {
                warn!(path = %path.display(), "race condition: removing non-existent block");
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to remove corrupt block");
            }
        }
    }
}

impl<C: StoreCallback> BlockStore<C::Block> for FileStore<C> {
    fn fetch(
        &self,
        routing_key: &[u8],
        full_key: Option<&[u8]>,
        options: FetchOptions,
    ) -> Result<Option<Fetched<C::Block>>> {
        let path = self.mapper.path(routing_key)?;

        let Some(record) = record::read_record(&path, &self.shape) else {
            self.counters.record_miss();
            return Ok(None);
        };

        if options.ignore_old_blocks && record.old_block {
            debug!(key = %hex::encode_upper(routing_key), "skipping old block");
            return Ok(None);
        }

        let full_key = if self.shape.stores_full_keys {
            &record.full_key[..]
        } else {
            full_key.unwrap_or_default()
        };

        match self.callback.construct(
            &record.data,
            &record.header,
            routing_key,
            full_key,
            options.visibility(),
        ) {
            Ok(block) => {
                self.counters.record_hit();
                Ok(Some(Fetched {
                    block,
                    old_block: record.old_block,
                }))
            }
            Err(e) => {
                warn!(
                    store = %self.config.name,
                    key = %hex::encode_upper(routing_key),
                    error = %e,
                    "stored block failed verification, deleting"
                );
                self.purge_corrupt(&path, routing_key, &record);
                self.counters.record_miss();
                Ok(None)
            }
        }
    }

    fn put(
        &self,
        block: &C::Block,
        data: &[u8],
        header: &[u8],
        overwrite: bool,
        is_old_block: bool,
    ) -> Result<()> {
        let routing_key = block.routing_key();
        let path = self.mapper.path(routing_key)?;

        Self::check_len("header", self.shape.header_len, header.len())?;
        Self::check_len("data", self.shape.data_len, data.len())?;
        let full_key = if self.shape.stores_full_keys {
            Self::check_len("full key", self.shape.full_key_len, block.full_key().len())?;
            Bytes::copy_from_slice(block.full_key())
        } else {
            Bytes::new()
        };

        // Counts attempts, including ones rejected as collisions
        self.counters.record_write();

        let incoming = BlockRecord::new(
            Bytes::copy_from_slice(header),
            Bytes::copy_from_slice(data),
            full_key,
            is_old_block,
        );

        let _guard = self.key_locks.lock(routing_key);

        let existing = record::read_record(&path, &self.shape);
        if let Some(old) = &existing {
            if self.callback.collisions_possible() && !old.same_content(&incoming, &self.shape) {
                if !overwrite {
                    debug!(key = %hex::encode_upper(routing_key), "rejecting colliding put");
                    return Err(StoreError::collision(routing_key));
                }
                debug!(key = %hex::encode_upper(routing_key), "overwriting colliding block");
            }
        }

        // A short or unreadable file still occupies the key
        let is_new_key = existing.is_none() && !path.is_file();

        record::write_record(&path, &incoming, self.config.sync_writes)?;

        if is_new_key {
            self.counters.key_added();
        }

        let max_keys = self.max_keys();
        let key_count = self.counters.keys();
        if key_count > max_keys {
            // No eviction: capacity is advisory
            debug!(store = %self.config.name, key_count, max_keys, "store above capacity");
        }

        Ok(())
    }

    fn max_keys(&self) -> u64 {
        *self.max_keys.lock()
    }

    fn set_max_keys(&self, max_keys: u64, shrink_now: bool) -> Result<()> {
        let mut current = self.max_keys.lock();
        debug!(
            store = %self.config.name,
            old = *current,
            new = max_keys,
            shrink_now,
            "set max keys"
        );
        *current = max_keys;
        Ok(())
    }

    fn hits(&self) -> u64 {
        self.counters.hits()
    }

    fn misses(&self) -> u64 {
        self.counters.misses()
    }

    fn writes(&self) -> u64 {
        self.counters.writes()
    }

    fn key_count(&self) -> u64 {
        self.counters.keys()
    }

    fn session_access_stats(&self) -> StoreAccessStats {
        self.counters.snapshot()
    }

    fn total_access_stats(&self) -> Result<StoreAccessStats> {
        Err(StoreError::Unsupported("lifetime access stats"))
    }

    /// Always true: the file store keeps no presence filter
    fn probably_in_store(&self, _routing_key: &[u8]) -> bool {
        true
    }

    fn bloom_false_positive(&self) -> Option<u64> {
        None
    }

    fn start(&self, long_start: bool) -> Result<bool> {
        debug!(store = %self.config.name, long_start, "start");
        Ok(false)
    }

    fn close(&self) {
        debug!(store = %self.config.name, "close");
    }
}
