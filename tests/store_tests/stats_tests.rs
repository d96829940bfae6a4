//! Tests for access statistics, capacity and lifecycle
//!
//! These tests verify:
//! - Session snapshots and derived rates
//! - Lifetime stats are reported as unsupported
//! - Capacity is stored but not enforced
//! - Key count is rebuilt from disk on open
//! - Explicit removal and clearing

#[path = "../common/mod.rs"]
mod common;

use std::fs;
use std::sync::Arc;
use std::thread;

use common::*;
use nodestore::blocks::ContentCallback;
use nodestore::store::DATASTORE_DIR;
use nodestore::{BlockStore, FetchOptions, FileStore, StorableBlock, StoreAccessStats, StoreConfig, StoreError};
use tempfile::TempDir;

// =============================================================================
// Snapshot Tests
// =============================================================================

#[test]
fn test_session_stats_snapshot() {
    let (_temp, store) = setup_content_store();
    let block = content(b"stats");
    store.put(&block, block.data(), block.header(), false, false).unwrap();
    store.fetch(block.routing_key(), None, FetchOptions::default()).unwrap();
    store.fetch(block.routing_key(), None, FetchOptions::default()).unwrap();
    store.fetch(&[0u8; 32], None, FetchOptions::default()).unwrap();

    let stats = store.session_access_stats();

    assert_eq!(
        stats,
        StoreAccessStats {
            hits: 2,
            misses: 1,
            false_pos: 0,
            writes: 1,
            key_count: 1,
        }
    );
    assert_eq!(stats.accesses(), 3);
}

#[test]
fn test_snapshot_is_a_copy() {
    let (_temp, store) = setup_content_store();
    let before = store.session_access_stats();

    store.fetch(&[1u8; 32], None, FetchOptions::default()).unwrap();

    assert_eq!(before.misses, 0);
    assert_eq!(store.session_access_stats().misses, 1);
}

#[test]
fn test_derived_rates() {
    let stats = StoreAccessStats {
        hits: 3,
        misses: 1,
        false_pos: 0,
        writes: 10,
        key_count: 5,
    };

    assert_eq!(stats.success_rate(), Some(0.75));
    assert_eq!(stats.access_rate(2), Some(2.0));
    assert_eq!(stats.write_rate(5), Some(2.0));
    assert_eq!(stats.write_rate(0), None);
    assert_eq!(StoreAccessStats::default().success_rate(), None);
}

#[test]
fn test_accesses_saturate() {
    let stats = StoreAccessStats {
        hits: u64::MAX,
        misses: 1,
        ..StoreAccessStats::default()
    };

    assert_eq!(stats.accesses(), u64::MAX);
}

#[test]
fn test_total_stats_unsupported() {
    let (_temp, store) = setup_content_store();

    assert!(matches!(
        store.total_access_stats(),
        Err(StoreError::Unsupported(_))
    ));
}

#[test]
fn test_presence_stub_and_no_filter() {
    let (_temp, store) = setup_content_store();

    assert!(store.probably_in_store(&[0xAB; 32]));
    assert_eq!(store.bloom_false_positive(), None);
}

#[test]
fn test_counters_are_per_store() {
    let temp_dir = TempDir::new().unwrap();
    let chk = content_store(temp_dir.path(), "chk");
    let other = content_store(temp_dir.path(), "chk-cache");

    chk.fetch(&[1u8; 32], None, FetchOptions::default()).unwrap();

    assert_eq!(chk.misses(), 1);
    assert_eq!(other.misses(), 0);
}

// =============================================================================
// Capacity Tests
// =============================================================================

#[test]
fn test_max_keys_set_and_get() {
    let (_temp, store) = setup_content_store();
    assert_eq!(store.max_keys(), 1000);

    store.set_max_keys(5, true).unwrap();

    assert_eq!(store.max_keys(), 5);
}

#[test]
fn test_capacity_not_enforced() {
    let (_temp, store) = setup_content_store();
    store.set_max_keys(2, true).unwrap();

    for i in 0..5u8 {
        let block = content(&[i]);
        store.put(&block, block.data(), block.header(), false, false).unwrap();
    }

    assert_eq!(store.key_count(), 5);
    assert_eq!(store.routing_keys().unwrap().len(), 5);
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_open_creates_store_directory() {
    let temp_dir = TempDir::new().unwrap();

    let store = content_store(temp_dir.path(), "chk");

    let expected = temp_dir.path().join(DATASTORE_DIR).join("chk");
    assert!(expected.is_dir());
    assert_eq!(store.root(), expected.as_path());
    assert_eq!(store.key_count(), 0);
}

#[test]
fn test_open_rejects_bad_names() {
    let temp_dir = TempDir::new().unwrap();

    for name in ["", "..", "a/b", "."] {
        let config = StoreConfig::builder().base_dir(temp_dir.path()).name(name).build();
        let result = FileStore::open(config, Arc::new(ContentCallback::new(DATA_LEN)));
        assert!(matches!(result, Err(StoreError::Config(_))), "name {:?}", name);
    }
}

#[test]
fn test_reopen_counts_existing_records() {
    let temp_dir = TempDir::new().unwrap();
    {
        let store = content_store(temp_dir.path(), "chk");
        for i in 0..7u8 {
            let block = content(&[i; 3]);
            store.put(&block, block.data(), block.header(), false, false).unwrap();
        }
        store.close();
    }

    // Stray files are not records
    let root = temp_dir.path().join(DATASTORE_DIR).join("chk");
    fs::write(root.join("README"), b"not a record").unwrap();

    let store = content_store(temp_dir.path(), "chk");

    assert_eq!(store.key_count(), 7);
    // Session counters start over
    assert_eq!(store.writes(), 0);
    assert_eq!(store.hits(), 0);
}

#[test]
fn test_reopen_removes_leftover_temp_files() {
    let temp_dir = TempDir::new().unwrap();
    let block = content(b"survivor");
    let leftover = {
        let store = content_store(temp_dir.path(), "chk");
        store.put(&block, block.data(), block.header(), false, false).unwrap();
        let path = record_path(&store, block.routing_key());
        let leftover = path.with_file_name(format!(
            "{}.tmp.99999.3",
            path.file_name().unwrap().to_str().unwrap()
        ));
        fs::write(&leftover, b"partial").unwrap();
        leftover
    };

    let store = content_store(temp_dir.path(), "chk");

    assert!(!leftover.exists());
    assert_eq!(store.key_count(), 1);
    assert!(store
        .fetch(block.routing_key(), None, FetchOptions::default())
        .unwrap()
        .is_some());
}

#[test]
fn test_reopen_ignores_lowercase_hex_files() {
    let temp_dir = TempDir::new().unwrap();
    let root = content_store(temp_dir.path(), "chk").root().to_path_buf();

    fs::create_dir_all(root.join("0a/ff")).unwrap();
    fs::write(root.join("0a/ff/abcd.dat"), vec![0u8; 2048]).unwrap();

    let store = content_store(temp_dir.path(), "chk");

    assert_eq!(store.key_count(), 0);
    assert!(store.routing_keys().unwrap().is_empty());
}

#[test]
fn test_start_reports_no_long_start() {
    let (_temp, store) = setup_content_store();

    assert!(!store.start(true).unwrap());
    assert!(!store.start(false).unwrap());
}

// =============================================================================
// Remove / Clear Tests
// =============================================================================

#[test]
fn test_remove_present_and_absent() {
    let (_temp, store) = setup_content_store();
    let block = content(b"remove me");
    store.put(&block, block.data(), block.header(), false, false).unwrap();

    assert!(store.remove(block.routing_key()).unwrap());
    assert_eq!(store.key_count(), 0);
    assert!(store
        .fetch(block.routing_key(), None, FetchOptions::default())
        .unwrap()
        .is_none());

    assert!(!store.remove(block.routing_key()).unwrap());
    assert_eq!(store.key_count(), 0);
}

#[test]
fn test_clear_removes_everything() {
    let temp_dir = TempDir::new().unwrap();
    let store = content_store(temp_dir.path(), "chk");
    for i in 0..4u8 {
        let block = content(&[i; 8]);
        store.put(&block, block.data(), block.header(), false, false).unwrap();
    }

    assert_eq!(store.clear().unwrap(), 4);
    assert_eq!(store.key_count(), 0);
    assert!(store.routing_keys().unwrap().is_empty());

    drop(store);
    assert_eq!(content_store(temp_dir.path(), "chk").key_count(), 0);
}

#[test]
fn test_clear_removes_leftover_temp_files() {
    let (_temp, store) = setup_content_store();
    let block = content(b"with temp");
    store.put(&block, block.data(), block.header(), false, false).unwrap();

    let path = record_path(&store, block.routing_key());
    let leftover = path.with_file_name(format!(
        "{}.tmp.99999.0",
        path.file_name().unwrap().to_str().unwrap()
    ));
    fs::write(&leftover, b"partial").unwrap();

    assert_eq!(store.clear().unwrap(), 1);
    assert!(!path.exists());
    assert!(!leftover.exists());
}

#[test]
fn test_clear_keeps_concurrent_puts_counted() {
    let (_temp, store) = setup_content_store();
    let store = Arc::new(store);

    let writer = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for i in 0..100u8 {
                let block = content(&[i, 0xC1]);
                store.put(&block, block.data(), block.header(), false, false).unwrap();
            }
        })
    };

    for _ in 0..20 {
        store.clear().unwrap();
    }
    writer.join().unwrap();

    assert_eq!(store.key_count(), store.routing_keys().unwrap().len() as u64);
}
