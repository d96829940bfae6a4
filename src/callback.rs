//! Block Construction Callback
//!
//! The store never interprets payload bytes. Each block type plugs in a
//! [`StoreCallback`] that declares the fixed record shape and turns raw bytes
//! back into a typed, verified block.

use crate::error::KeyVerifyError;

/// A block that can be filed in a store
pub trait StorableBlock {
    /// Identity the block is stored under
    fn routing_key(&self) -> &[u8];

    /// Richer key for block types that need more than the routing key to
    /// verify content. Empty for types without one.
    fn full_key(&self) -> &[u8];
}

/// Which restricted caches a fetch may read from
///
/// Passed through to [`StoreCallback::construct`]; the file store itself
/// keeps a single cache and does not filter on these.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheVisibility {
    pub can_read_client_cache: bool,
    pub can_read_slashdot_cache: bool,
}

/// Per-block-type capability a store is bound to
///
/// Lengths must be constant for the lifetime of the callback: a store
/// reads them once at open and never mixes record shapes.
pub trait StoreCallback: Send + Sync {
    type Block: StorableBlock;

    /// Length of the block header in bytes
    fn header_length(&self) -> usize;

    /// Length of the block payload in bytes
    fn data_length(&self) -> usize;

    /// Length of the full key in bytes (only meaningful if stored)
    fn full_key_length(&self) -> usize;

    /// Whether records carry the full key
    fn stores_full_keys(&self) -> bool;

    /// Whether two different contents can legitimately claim one routing key.
    /// When false the key itself guarantees identical content.
    fn collisions_possible(&self) -> bool;

    /// Verify raw bytes against the key and build the typed block
    fn construct(
        &self,
        data: &[u8],
        header: &[u8],
        routing_key: &[u8],
        full_key: &[u8],
        visibility: CacheVisibility,
    ) -> Result<Self::Block, KeyVerifyError>;
}
