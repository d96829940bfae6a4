//! Named blocks
//!
//! An owner publishes content under a name. The full key is
//! `owner (32) ‖ SHA-256(name) (32)` and the routing key is its SHA-256, so
//! the key says nothing about the content: an owner can publish different
//! content under the same name, which is a collision. Full keys are stored
//! so a fetched record can be checked against its routing key.

use crate::callback::{CacheVisibility, StorableBlock, StoreCallback};
use crate::error::{KeyVerifyError, Result};

use super::{pad_payload, sha256, BlockHeader, BlockType, HEADER_LENGTH, ROUTING_KEY_LENGTH};

/// Owner id length
pub const OWNER_LENGTH: usize = 32;

/// Full key length: owner id plus name hash
pub const FULL_KEY_LENGTH: usize = OWNER_LENGTH + ROUTING_KEY_LENGTH;

/// A verified named block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedBlock {
    routing_key: [u8; ROUTING_KEY_LENGTH],
    full_key: [u8; FULL_KEY_LENGTH],
    header: [u8; HEADER_LENGTH],
    data: Vec<u8>,
    payload_len: usize,
}

impl NamedBlock {
    /// Encode a payload published by `owner` under `name`
    pub fn encode(
        owner: &[u8; OWNER_LENGTH],
        name: &str,
        payload: &[u8],
        data_length: usize,
    ) -> Result<Self> {
        let data = pad_payload(payload, data_length)?;
        let header = BlockHeader::describe(BlockType::Named, &data, payload.len()).encode();
        let full_key = Self::full_key_for(owner, name);

        Ok(Self {
            routing_key: sha256(&[&full_key[..]]),
            full_key,
            header,
            data,
            payload_len: payload.len(),
        })
    }

    /// `owner ‖ SHA-256(name)`
    pub fn full_key_for(owner: &[u8; OWNER_LENGTH], name: &str) -> [u8; FULL_KEY_LENGTH] {
        let mut full_key = [0u8; FULL_KEY_LENGTH];
        full_key[..OWNER_LENGTH].copy_from_slice(owner);
        full_key[OWNER_LENGTH..].copy_from_slice(&sha256(&[name.as_bytes()]));
        full_key
    }

    /// Routing key a block published by `owner` under `name` is stored at
    pub fn routing_key_for(owner: &[u8; OWNER_LENGTH], name: &str) -> [u8; ROUTING_KEY_LENGTH] {
        sha256(&[&Self::full_key_for(owner, name)[..]])
    }

    pub fn owner(&self) -> &[u8] {
        &self.full_key[..OWNER_LENGTH]
    }

    pub fn header(&self) -> &[u8] {
        &self.header
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn payload(&self) -> &[u8] {
        &self.data[..self.payload_len]
    }
}

impl StorableBlock for NamedBlock {
    fn routing_key(&self) -> &[u8] {
        &self.routing_key
    }

    fn full_key(&self) -> &[u8] {
        &self.full_key
    }
}

/// Store callback for named blocks
#[derive(Debug, Clone)]
pub struct NamedCallback {
    data_length: usize,
}

impl NamedCallback {
    pub fn new(data_length: usize) -> Self {
        Self { data_length }
    }
}

impl StoreCallback for NamedCallback {
    type Block = NamedBlock;

    fn header_length(&self) -> usize {
        HEADER_LENGTH
    }

    fn data_length(&self) -> usize {
        self.data_length
    }

    fn full_key_length(&self) -> usize {
        FULL_KEY_LENGTH
    }

    fn stores_full_keys(&self) -> bool {
        true
    }

    fn collisions_possible(&self) -> bool {
        true
    }

    fn construct(
        &self,
        data: &[u8],
        header: &[u8],
        routing_key: &[u8],
        full_key: &[u8],
        _visibility: CacheVisibility,
    ) -> std::result::Result<NamedBlock, KeyVerifyError> {
        if data.len() != self.data_length {
            return Err(KeyVerifyError::new(format!(
                "data length {} != {}",
                data.len(),
                self.data_length
            )));
        }

        let full_key: [u8; FULL_KEY_LENGTH] = full_key.try_into().map_err(|_| {
            KeyVerifyError::new(format!(
                "full key length {} != {}",
                full_key.len(),
                FULL_KEY_LENGTH
            ))
        })?;

        let computed = sha256(&[&full_key[..]]);
        if routing_key != &computed[..] {
            return Err(KeyVerifyError::new("routing key does not match full key"));
        }

        let decoded = BlockHeader::decode(header)?;
        decoded.verify(BlockType::Named, data)?;

        let mut header_bytes = [0u8; HEADER_LENGTH];
        header_bytes.copy_from_slice(header);

        Ok(NamedBlock {
            routing_key: computed,
            full_key,
            header: header_bytes,
            data: data.to_vec(),
            payload_len: decoded.payload_len as usize,
        })
    }
}
