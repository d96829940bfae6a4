//! Tests for the block record codec and record files
//!
//! These tests verify:
//! - Raw `header || data || full_key || stale` layout
//! - Short buffers decode as absent
//! - Record files are written whole, with shard directories created
//! - Unreadable files read as absent

use std::fs;

use bytes::Bytes;
use nodestore::record::{
    decode, encode, read_record, remove_record, write_record, BlockRecord, RecordShape, TEMP_MARKER,
};
use tempfile::TempDir;

fn shape_with_full_key() -> RecordShape {
    RecordShape::new(4, 8, Some(3))
}

fn shape_without_full_key() -> RecordShape {
    RecordShape::new(4, 8, None)
}

fn sample_record(old_block: bool) -> BlockRecord {
    BlockRecord::new(
        vec![1u8, 2, 3, 4],
        vec![10u8, 11, 12, 13, 14, 15, 16, 17],
        vec![0xAAu8, 0xBB, 0xCC],
        old_block,
    )
}

// =============================================================================
// Shape Tests
// =============================================================================

#[test]
fn test_record_len_includes_stale_byte() {
    assert_eq!(shape_with_full_key().record_len(), 4 + 8 + 3 + 1);
    assert_eq!(shape_without_full_key().record_len(), 4 + 8 + 1);
    assert!(!shape_without_full_key().stores_full_keys);
}

// =============================================================================
// Codec Tests
// =============================================================================

#[test]
fn test_encode_layout() {
    let bytes = encode(&sample_record(true));

    assert_eq!(
        bytes,
        vec![1, 2, 3, 4, 10, 11, 12, 13, 14, 15, 16, 17, 0xAA, 0xBB, 0xCC, 0x01]
    );
}

#[test]
fn test_encode_fresh_block_stale_byte_zero() {
    let bytes = encode(&sample_record(false));

    assert_eq!(*bytes.last().unwrap(), 0x00);
}

#[test]
fn test_decode_splits_fields() {
    let bytes = encode(&sample_record(true));

    let record = decode(Bytes::from(bytes), &shape_with_full_key()).unwrap();

    assert_eq!(record, sample_record(true));
}

#[test]
fn test_decode_without_full_key() {
    let record = BlockRecord::new(vec![1u8, 2, 3, 4], vec![9u8; 8], Bytes::new(), false);

    let decoded = decode(Bytes::from(encode(&record)), &shape_without_full_key()).unwrap();

    assert!(decoded.full_key.is_empty());
    assert_eq!(decoded, record);
}

#[test]
fn test_decode_short_buffer_is_absent() {
    let mut bytes = encode(&sample_record(false));
    bytes.pop(); // lose the stale byte

    assert_eq!(decode(Bytes::from(bytes), &shape_with_full_key()), None);
    assert_eq!(decode(Bytes::new(), &shape_with_full_key()), None);
}

#[test]
fn test_decode_ignores_trailing_bytes() {
    let mut bytes = encode(&sample_record(false));
    bytes.extend_from_slice(b"trailing garbage");

    let record = decode(Bytes::from(bytes), &shape_with_full_key()).unwrap();

    assert_eq!(record, sample_record(false));
}

#[test]
fn test_decode_any_nonzero_stale_byte_is_stale() {
    let mut bytes = encode(&sample_record(false));
    *bytes.last_mut().unwrap() = 0x7F;

    let record = decode(Bytes::from(bytes), &shape_with_full_key()).unwrap();

    assert!(record.old_block);
}

#[test]
fn test_same_content_ignores_stale_flag() {
    let shape = shape_with_full_key();

    assert!(sample_record(false).same_content(&sample_record(true), &shape));
}

#[test]
fn test_same_content_full_key_only_when_stored() {
    let a = sample_record(false);
    let b = BlockRecord::new(a.header.clone(), a.data.clone(), vec![0u8, 0, 0], false);

    assert!(!a.same_content(&b, &shape_with_full_key()));
    assert!(a.same_content(&b, &shape_without_full_key()));
}

// =============================================================================
// File Tests
// =============================================================================

#[test]
fn test_write_then_read_record() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("AB/CD/EF.dat");

    write_record(&path, &sample_record(true), false).unwrap();

    assert!(path.exists());
    assert_eq!(read_record(&path, &shape_with_full_key()), Some(sample_record(true)));
}

#[test]
fn test_write_record_with_sync() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("00/00/01.dat");

    write_record(&path, &sample_record(false), true).unwrap();

    assert_eq!(read_record(&path, &shape_with_full_key()), Some(sample_record(false)));
}

#[test]
fn test_write_record_leaves_no_temp_files() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("AB/CD/EF.dat");

    write_record(&path, &sample_record(false), false).unwrap();
    write_record(&path, &sample_record(true), false).unwrap();

    let names: Vec<String> = fs::read_dir(temp_dir.path().join("AB/CD"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["EF.dat".to_string()]);
    assert!(names.iter().all(|n| !n.contains(TEMP_MARKER)));
}

#[test]
fn test_write_record_replaces_existing() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("AB/CD/EF.dat");

    write_record(&path, &sample_record(false), false).unwrap();
    let replacement = BlockRecord::new(vec![9u8; 4], vec![9u8; 8], vec![9u8; 3], true);
    write_record(&path, &replacement, false).unwrap();

    assert_eq!(read_record(&path, &shape_with_full_key()), Some(replacement));
}

#[test]
fn test_read_missing_record_is_absent() {
    let temp_dir = TempDir::new().unwrap();

    assert_eq!(
        read_record(&temp_dir.path().join("00/00/00.dat"), &shape_with_full_key()),
        None
    );
}

#[test]
fn test_read_truncated_record_is_absent() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("00.dat");
    fs::write(&path, [1u8, 2, 3]).unwrap();

    assert_eq!(read_record(&path, &shape_with_full_key()), None);
}

#[test]
fn test_read_directory_is_absent() {
    let temp_dir = TempDir::new().unwrap();

    assert_eq!(read_record(temp_dir.path(), &shape_with_full_key()), None);
}

#[test]
fn test_remove_record() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("AB/CD/EF.dat");
    write_record(&path, &sample_record(false), false).unwrap();

    assert!(remove_record(&path).unwrap());
    assert!(!path.exists());
    assert!(!remove_record(&path).unwrap());
}
