//! # nodestore
//!
//! The on-disk block store of a peer-to-peer data network node:
//! - Fixed-shape opaque blocks, one file each, keyed by routing key
//! - Two-level hex sharding; the filesystem is the index
//! - Per-block-type verification through a pluggable callback
//! - Collision policy for block types whose keys don't pin content
//! - Session access statistics
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Node (caller threads)                    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ fetch / put / remove
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                        FileStore<C>                          │
//! │        (collision policy, counters, striped key locks)       │
//! └──────┬──────────────────────┬───────────────────────┬───────┘
//!        │                      │                       │
//!        ▼                      ▼                       ▼
//! ┌─────────────┐       ┌──────────────┐       ┌─────────────────┐
//! │KeyPathMapper│       │ Record codec │       │ StoreCallback C │
//! │ key → path  │       │ bytes ↔ rec  │       │ bytes → block   │
//! └─────────────┘       └──────────────┘       └─────────────────┘
//! ```
//!
//! Not implemented: eviction (capacity is advisory), lifetime statistics,
//! a real presence filter, recency promotion.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod path;
pub mod record;
pub mod callback;
pub mod store;
pub mod blocks;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{KeyVerifyError, Result, StoreError};
pub use config::StoreConfig;
pub use callback::{CacheVisibility, StorableBlock, StoreCallback};
pub use store::{BlockStore, FetchOptions, Fetched, FileStore, MigrationReport, StoreAccessStats};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of nodestore
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
