//! Store Module
//!
//! The block store surface the rest of a node talks to, and the file-backed
//! engine that implements it.
//!
//! ## Responsibilities
//! - Fetch blocks by routing key, purging records that fail verification
//! - Put blocks under the collision policy of their block type
//! - Session access statistics
//! - Capacity bookkeeping (advisory only, no eviction)
//! - Best-effort migration into another store

mod file_store;
mod locks;
mod migrate;
mod stats;

pub use file_store::{FileStore, DATASTORE_DIR};
pub use migrate::MigrationReport;
pub use stats::StoreAccessStats;

use crate::callback::{CacheVisibility, StorableBlock};
use crate::error::Result;

/// Flags controlling a single fetch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Don't move the block up a recency order. The file store keeps no
    /// such order, so this is accepted and ignored.
    pub dont_promote: bool,
    pub can_read_client_cache: bool,
    pub can_read_slashdot_cache: bool,
    /// Treat records flagged as old blocks as not present
    pub ignore_old_blocks: bool,
}

impl FetchOptions {
    pub fn visibility(&self) -> CacheVisibility {
        CacheVisibility {
            can_read_client_cache: self.can_read_client_cache,
            can_read_slashdot_cache: self.can_read_slashdot_cache,
        }
    }
}

/// A block returned by a fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched<T> {
    pub block: T,
    /// The record was stored as an old block; callers should treat it as
    /// provisional.
    pub old_block: bool,
}

/// Store-level operations for one block type
pub trait BlockStore<T: StorableBlock>: Send + Sync {
    /// Look up a block
    ///
    /// `Ok(None)` for absent, filtered or corrupt records. `full_key` is
    /// handed to the block type when the store doesn't keep full keys.
    fn fetch(
        &self,
        routing_key: &[u8],
        full_key: Option<&[u8]>,
        options: FetchOptions,
    ) -> Result<Option<Fetched<T>>>;

    /// Store a block
    ///
    /// Fails with `KeyCollision` when different content already occupies
    /// the key, the block type allows collisions and `overwrite` is false.
    fn put(
        &self,
        block: &T,
        data: &[u8],
        header: &[u8],
        overwrite: bool,
        is_old_block: bool,
    ) -> Result<()>;

    fn max_keys(&self) -> u64;

    /// Update the advisory capacity
    fn set_max_keys(&self, max_keys: u64, shrink_now: bool) -> Result<()>;

    fn hits(&self) -> u64;
    fn misses(&self) -> u64;
    fn writes(&self) -> u64;
    fn key_count(&self) -> u64;

    /// Counters since this process opened the store
    fn session_access_stats(&self) -> StoreAccessStats;

    /// Counters across restarts
    fn total_access_stats(&self) -> Result<StoreAccessStats>;

    /// Cheap presence hint; may return false positives
    fn probably_in_store(&self, routing_key: &[u8]) -> bool;

    /// False positive count of the presence filter, if there is one
    fn bloom_false_positive(&self) -> Option<u64>;

    /// Returns true if a long-running start was kicked off
    fn start(&self, long_start: bool) -> Result<bool>;

    fn close(&self);
}
