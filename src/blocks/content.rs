//! Content-keyed blocks
//!
//! The routing key is the SHA-256 of the header and data, so a key can only
//! ever name one content: collisions are impossible and no full key is
//! stored.

use crate::callback::{CacheVisibility, StorableBlock, StoreCallback};
use crate::error::{KeyVerifyError, Result};

use super::{pad_payload, sha256, BlockHeader, BlockType, HEADER_LENGTH, ROUTING_KEY_LENGTH};

/// A verified content-keyed block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentBlock {
    routing_key: [u8; ROUTING_KEY_LENGTH],
    header: [u8; HEADER_LENGTH],
    data: Vec<u8>,
    payload_len: usize,
}

impl ContentBlock {
    /// Encode a payload into a block of `data_length` bytes
    pub fn encode(payload: &[u8], data_length: usize) -> Result<Self> {
        let data = pad_payload(payload, data_length)?;
        let header = BlockHeader::describe(BlockType::Content, &data, payload.len()).encode();
        let routing_key = sha256(&[&header[..], &data[..]]);

        Ok(Self {
            routing_key,
            header,
            data,
            payload_len: payload.len(),
        })
    }

    pub fn header(&self) -> &[u8] {
        &self.header
    }

    /// Padded data as stored
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Meaningful bytes of the data
    pub fn payload(&self) -> &[u8] {
        &self.data[..self.payload_len]
    }
}

impl StorableBlock for ContentBlock {
    fn routing_key(&self) -> &[u8] {
        &self.routing_key
    }

    fn full_key(&self) -> &[u8] {
        &[]
    }
}

/// Store callback for content-keyed blocks
#[derive(Debug, Clone)]
pub struct ContentCallback {
    data_length: usize,
}

impl ContentCallback {
    pub fn new(data_length: usize) -> Self {
        Self { data_length }
    }
}

impl StoreCallback for ContentCallback {
    type Block = ContentBlock;

    fn header_length(&self) -> usize {
        HEADER_LENGTH
    }

    fn data_length(&self) -> usize {
        self.data_length
    }

    fn full_key_length(&self) -> usize {
        0
    }

    fn stores_full_keys(&self) -> bool {
        false
    }

    fn collisions_possible(&self) -> bool {
        false
    }

    fn construct(
        &self,
        data: &[u8],
        header: &[u8],
        routing_key: &[u8],
        _full_key: &[u8],
        _visibility: CacheVisibility,
    ) -> std::result::Result<ContentBlock, KeyVerifyError> {
        if data.len() != self.data_length {
            return Err(KeyVerifyError::new(format!(
                "data length {} != {}",
                data.len(),
                self.data_length
            )));
        }

        let decoded = BlockHeader::decode(header)?;
        decoded.verify(BlockType::Content, data)?;

        let computed = sha256(&[header, data]);
        if routing_key != &computed[..] {
            return Err(KeyVerifyError::new("routing key does not match content hash"));
        }

        let mut header_bytes = [0u8; HEADER_LENGTH];
        header_bytes.copy_from_slice(header);

        Ok(ContentBlock {
            routing_key: computed,
            header: header_bytes,
            data: data.to_vec(),
            payload_len: decoded.payload_len as usize,
        })
    }
}
