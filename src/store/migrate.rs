//! Store migration
//!
//! Copies every record of a file store into another store of the same block
//! type. Not atomic: a crash midway leaves the target partially filled.
//! Re-running is safe because identical re-writes are never collisions.

use tracing::{debug, info, warn};

use crate::callback::{CacheVisibility, StoreCallback};
use crate::error::{Result, StoreError};

use super::{BlockStore, FileStore};

/// Outcome of a migration run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Records put into the target
    pub migrated: u64,
    /// Records that failed verification and were left behind
    pub invalid: u64,
    /// Records whose key already held different content in the target
    pub collisions: u64,
    /// Records that vanished or could not be read during the walk
    pub unreadable: u64,
}

impl<C: StoreCallback> FileStore<C> {
    /// Copy every record into `target`
    ///
    /// Records failing verification are logged and skipped, collisions in
    /// the target are ignored. Any other error from the target aborts the
    /// run.
    pub fn migrate_to<S>(&self, target: &S, can_read_client_cache: bool) -> Result<MigrationReport>
    where
        S: BlockStore<C::Block> + ?Sized,
    {
        let visibility = CacheVisibility {
            can_read_client_cache,
            can_read_slashdot_cache: false,
        };
        let mut report = MigrationReport::default();

        for routing_key in self.routing_keys()? {
            let Some(record) = self.read_record(&routing_key)? else {
                report.unreadable += 1;
                continue;
            };

            let block = match self.callback().construct(
                &record.data,
                &record.header,
                &routing_key,
                &record.full_key,
                visibility,
            ) {
                Ok(block) => block,
                Err(e) => {
                    warn!(
                        key = %hex::encode_upper(&routing_key),
                        error = %e,
                        "caught while migrating, skipping block"
                    );
                    report.invalid += 1;
                    continue;
                }
            };

            match target.put(&block, &record.data, &record.header, false, record.old_block) {
                Ok(()) => report.migrated += 1,
                Err(StoreError::KeyCollision { .. }) => {
                    debug!(key = %hex::encode_upper(&routing_key), "collision in target, ignoring");
                    report.collisions += 1;
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            store = %self.name(),
            migrated = report.migrated,
            invalid = report.invalid,
            collisions = report.collisions,
            unreadable = report.unreadable,
            "migration finished"
        );

        Ok(report)
    }
}
