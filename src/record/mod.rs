//! Block Record Module
//!
//! The on-disk unit of the store: one file per routing key.
//!
//! ## File Format
//! ```text
//! ┌──────────────┬──────────────┬──────────────────┬───────────┐
//! │ Header       │ Data         │ Full Key         │ Stale (1) │
//! │ (header_len) │ (data_len)   │ (full_key_len,   │ 0x00 or   │
//! │              │              │  0 if not stored)│ 0x01      │
//! └──────────────┴──────────────┴──────────────────┴───────────┘
//! ```
//!
//! No magic, no length prefixes, no checksum: every length is fixed by the
//! block type's callback, and verification is the callback's job.

mod codec;
mod file;

use bytes::Bytes;

use crate::callback::StoreCallback;

pub use codec::{decode, encode};
pub use file::{read_record, remove_record, write_record, TEMP_MARKER};

/// Fixed record lengths for one store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordShape {
    pub header_len: usize,
    pub data_len: usize,
    /// Zero when full keys are not stored
    pub full_key_len: usize,
    pub stores_full_keys: bool,
}

impl RecordShape {
    pub fn new(header_len: usize, data_len: usize, full_key_len: Option<usize>) -> Self {
        Self {
            header_len,
            data_len,
            full_key_len: full_key_len.unwrap_or(0),
            stores_full_keys: full_key_len.is_some(),
        }
    }

    /// Read the shape a callback declares
    pub fn of<C: StoreCallback + ?Sized>(callback: &C) -> Self {
        let full_key_len = callback
            .stores_full_keys()
            .then(|| callback.full_key_length());
        Self::new(callback.header_length(), callback.data_length(), full_key_len)
    }

    /// Total bytes of an encoded record, stale byte included
    pub fn record_len(&self) -> usize {
        self.header_len + self.data_len + self.full_key_len + 1
    }
}

/// One stored block as it sits on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockRecord {
    pub header: Bytes,
    pub data: Bytes,
    /// Empty when the store does not keep full keys
    pub full_key: Bytes,
    /// Superseded but retained; only surfaced when the caller opts in
    pub old_block: bool,
}

impl BlockRecord {
    pub fn new(
        header: impl Into<Bytes>,
        data: impl Into<Bytes>,
        full_key: impl Into<Bytes>,
        old_block: bool,
    ) -> Self {
        Self {
            header: header.into(),
            data: data.into(),
            full_key: full_key.into(),
            old_block,
        }
    }

    /// Byte-identical header and data, and full key when the shape stores one.
    /// The stale flag is not part of the content.
    pub fn same_content(&self, other: &BlockRecord, shape: &RecordShape) -> bool {
        self.header == other.header
            && self.data == other.data
            && (!shape.stores_full_keys || self.full_key == other.full_key)
    }
}
