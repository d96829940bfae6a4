//! Record file I/O
//!
//! Reads treat every irregularity as "no such record". Writes go to a
//! temporary sibling and are renamed into place, so readers only ever see a
//! complete old record or a complete new one.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::BytesMut;
use tracing::debug;

use super::{codec, BlockRecord, RecordShape};

/// Infix of temporary file names: `{name}.dat.tmp.{pid}.{seq}`
pub const TEMP_MARKER: &str = ".tmp.";

/// Distinguishes temp files of concurrent writers in one process
static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Read the record at `path`
///
/// Missing file, permission problems and short files all yield `None`.
pub fn read_record(path: &Path, shape: &RecordShape) -> Option<BlockRecord> {
    let mut file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            if e.kind() != io::ErrorKind::NotFound {
                debug!(path = %path.display(), error = %e, "record unreadable");
            }
            return None;
        }
    };

    let mut buf = BytesMut::zeroed(shape.record_len());
    if let Err(e) = file.read_exact(&mut buf) {
        debug!(path = %path.display(), error = %e, "short or unreadable record");
        return None;
    }

    codec::decode(buf.freeze(), shape)
}

/// Write a record to `path`, creating shard directories as needed
pub fn write_record(path: &Path, record: &BlockRecord, sync: bool) -> io::Result<()> {
    let parent = path.parent().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("record path has no parent: {}", path.display()),
        )
    })?;
    fs::create_dir_all(parent)?;

    let tmp = temp_path(path);
    let result = write_and_rename(&tmp, path, &codec::encode(record), sync);
    if result.is_err() {
        // Best effort; the rename never happened so the target is intact
        let _ = fs::remove_file(&tmp);
    }
    result
}

/// Delete the record at `path`
///
/// `Ok(false)` if there was nothing to delete.
pub fn remove_record(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

// =============================================================================
// Private Helpers
// =============================================================================

fn write_and_rename(tmp: &Path, dest: &Path, bytes: &[u8], sync: bool) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(tmp)?;

    file.write_all(bytes)?;
    if sync {
        file.sync_all()?;
    }
    drop(file);

    fs::rename(tmp, dest)
}

fn temp_path(dest: &Path) -> PathBuf {
    let seq = TEMP_SEQ.fetch_add(1, Ordering::SeqCst);
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(format!("{}{}.{}", TEMP_MARKER, std::process::id(), seq));
    dest.with_file_name(name)
}
