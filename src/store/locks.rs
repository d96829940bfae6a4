//! Striped per-key locks
//!
//! Serializes the read-check-write of `put`, explicit removal and the
//! self-healing delete for keys that hash to the same stripe. Plain reads
//! never lock.

use parking_lot::{Mutex, MutexGuard};

pub(crate) struct KeyLocks {
    stripes: Box<[Mutex<()>]>,
}

impl KeyLocks {
    pub fn new(stripes: usize) -> Self {
        Self {
            stripes: (0..stripes.max(1)).map(|_| Mutex::new(())).collect(),
        }
    }

    pub fn lock(&self, routing_key: &[u8]) -> MutexGuard<'_, ()> {
        let index = crc32fast::hash(routing_key) as usize % self.stripes.len();
        self.stripes[index].lock()
    }
}
