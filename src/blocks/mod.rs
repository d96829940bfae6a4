//! Reference Block Types
//!
//! Two block types that plug into the store through
//! [`StoreCallback`](crate::callback::StoreCallback):
//!
//! | Type      | Routing key                | Full key stored | Collisions |
//! |-----------|----------------------------|-----------------|------------|
//! | Content   | SHA-256(header ‖ data)     | no              | impossible |
//! | Named     | SHA-256(owner ‖ H(name))   | yes (64 bytes)  | possible   |
//!
//! ## Header Format (32 bytes, shared)
//! ```text
//! ┌──────────┬──────────────┬──────────────┬──────────────────┐
//! │ Type (2) │ Data CRC (4) │ Payload (4)  │ Reserved (22)    │
//! │ u16 BE   │ u32 BE       │ len, u32 BE  │ zero             │
//! └──────────┴──────────────┴──────────────┴──────────────────┘
//! ```
//!
//! Data is the payload zero-padded to the store's fixed data length.

pub mod content;
pub mod named;

pub use content::{ContentBlock, ContentCallback};
pub use named::{NamedBlock, NamedCallback};

use sha2::{Digest, Sha256};

use crate::error::{KeyVerifyError, Result, StoreError};

/// Header length of both reference block types
pub const HEADER_LENGTH: usize = 32;

/// Default payload size
pub const DEFAULT_DATA_LENGTH: usize = 1024;

/// SHA-256 output length
pub const ROUTING_KEY_LENGTH: usize = 32;

/// Block type tag in the header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum BlockType {
    Content = 0x0001,
    Named = 0x0002,
}

/// Decoded block header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BlockHeader {
    pub block_type: u16,
    pub checksum: u32,
    pub payload_len: u32,
}

impl BlockHeader {
    /// Header describing `data` (already padded) carrying `payload_len`
    /// meaningful bytes
    pub fn describe(block_type: BlockType, data: &[u8], payload_len: usize) -> Self {
        Self {
            block_type: block_type as u16,
            checksum: crc32fast::hash(data),
            payload_len: payload_len as u32,
        }
    }

    pub fn encode(&self) -> [u8; HEADER_LENGTH] {
        let mut out = [0u8; HEADER_LENGTH];
        out[0..2].copy_from_slice(&self.block_type.to_be_bytes());
        out[2..6].copy_from_slice(&self.checksum.to_be_bytes());
        out[6..10].copy_from_slice(&self.payload_len.to_be_bytes());
        out
    }

    pub fn decode(header: &[u8]) -> std::result::Result<Self, KeyVerifyError> {
        if header.len() != HEADER_LENGTH {
            return Err(KeyVerifyError::new(format!(
                "header length {} != {}",
                header.len(),
                HEADER_LENGTH
            )));
        }
        if header[10..].iter().any(|&b| b != 0) {
            return Err(KeyVerifyError::new("reserved header bytes are not zero"));
        }

        Ok(Self {
            block_type: u16::from_be_bytes([header[0], header[1]]),
            checksum: u32::from_be_bytes([header[2], header[3], header[4], header[5]]),
            payload_len: u32::from_be_bytes([header[6], header[7], header[8], header[9]]),
        })
    }

    /// Check type tag, payload length and data checksum
    pub fn verify(&self, expected: BlockType, data: &[u8]) -> std::result::Result<(), KeyVerifyError> {
        if self.block_type != expected as u16 {
            return Err(KeyVerifyError::new(format!(
                "block type {:#06x}, expected {:#06x}",
                self.block_type, expected as u16
            )));
        }
        if self.payload_len as usize > data.len() {
            return Err(KeyVerifyError::new(format!(
                "payload length {} exceeds data length {}",
                self.payload_len,
                data.len()
            )));
        }
        if crc32fast::hash(data) != self.checksum {
            return Err(KeyVerifyError::new("data checksum mismatch"));
        }
        Ok(())
    }
}

/// Zero-pad a payload to the fixed data length
pub(crate) fn pad_payload(payload: &[u8], data_length: usize) -> Result<Vec<u8>> {
    if payload.len() > data_length {
        return Err(StoreError::PayloadTooLarge {
            len: payload.len(),
            max: data_length,
        });
    }
    let mut data = vec![0u8; data_length];
    data[..payload.len()].copy_from_slice(payload);
    Ok(data)
}

pub(crate) fn sha256(parts: &[&[u8]]) -> [u8; ROUTING_KEY_LENGTH] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}
