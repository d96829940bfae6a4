//! Record codec
//!
//! Encoding and decoding of the raw `header || data || full_key || stale`
//! concatenation.

use bytes::{BufMut, Bytes, BytesMut};

use super::{BlockRecord, RecordShape};

const STALE: u8 = 0x01;
const FRESH: u8 = 0x00;

/// Encode a record to bytes
pub fn encode(record: &BlockRecord) -> Vec<u8> {
    let len = record.header.len() + record.data.len() + record.full_key.len() + 1;

    let mut buf = BytesMut::with_capacity(len);
    buf.put_slice(&record.header);
    buf.put_slice(&record.data);
    buf.put_slice(&record.full_key);
    buf.put_u8(if record.old_block { STALE } else { FRESH });

    buf.to_vec()
}

/// Decode a record from bytes
///
/// Returns `None` if the buffer is shorter than the shape requires; the
/// store treats that exactly like a missing file. Bytes past the stale flag
/// are ignored. Any non-zero stale byte counts as stale.
pub fn decode(mut buf: Bytes, shape: &RecordShape) -> Option<BlockRecord> {
    if buf.len() < shape.record_len() {
        return None;
    }

    let header = buf.split_to(shape.header_len);
    let data = buf.split_to(shape.data_len);
    let full_key = buf.split_to(shape.full_key_len);
    let old_block = buf[0] != FRESH;

    Some(BlockRecord {
        header,
        data,
        full_key,
        old_block,
    })
}
