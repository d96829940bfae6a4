//! Key Path Mapping
//!
//! Maps routing keys to record files and back. The filesystem is the index:
//! there is no separate key table, every lookup recomputes the path.
//!
//! ## Layout
//! ```text
//! {root}/
//!   ├── 00/
//!   │    ├── 00/
//!   │    │    ├── 3FA9...C1.dat     key = 00 00 3F A9 ... C1
//!   │    │    └── ...
//!   │    └── ...  (up to 256 second-level shards)
//!   └── ...       (up to 256 first-level shards)
//! ```
//!
//! Hex is uppercase. Bytes 0 and 1 of the key pick the two shard levels, the
//! remaining bytes form the file name.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::{Result, StoreError};
use crate::record::TEMP_MARKER;

/// Extension of record files
pub const RECORD_EXTENSION: &str = "dat";

/// Shortest routing key the store accepts (one byte per shard level)
pub const MIN_ROUTING_KEY_LEN: usize = 2;

/// Maps routing keys to paths below a store root
#[derive(Debug, Clone)]
pub struct KeyPathMapper {
    root: PathBuf,
}

impl KeyPathMapper {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The store root all record paths live under
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Compute the record path for a routing key
    ///
    /// `[0x0A, 0xFF, 0x12, 0x34]` → `{root}/0A/FF/1234.dat`
    pub fn path(&self, routing_key: &[u8]) -> Result<PathBuf> {
        if routing_key.len() < MIN_ROUTING_KEY_LEN {
            return Err(StoreError::InvalidRoutingKey {
                len: routing_key.len(),
            });
        }

        let file_name = format!(
            "{}.{}",
            hex::encode_upper(&routing_key[2..]),
            RECORD_EXTENSION
        );

        Ok(self
            .root
            .join(hex::encode_upper(&routing_key[0..1]))
            .join(hex::encode_upper(&routing_key[1..2]))
            .join(file_name))
    }

    /// Recover the routing key from a record path
    ///
    /// Returns `None` for anything that is not `{root}/HH/HH/HEX.dat`
    /// (temporary files, foreign files, wrong depth, non-hex or lowercase
    /// names). Only names [`path`](Self::path) could have produced map back.
    pub fn routing_key_from_path(&self, path: &Path) -> Option<Vec<u8>> {
        let relative = path.strip_prefix(&self.root).ok()?;

        let parts = relative
            .components()
            .map(|c| match c {
                Component::Normal(s) => s.to_str(),
                _ => None,
            })
            .collect::<Option<Vec<&str>>>()?;

        let [first, second, file] = parts.as_slice() else {
            return None;
        };

        if !Self::is_shard_name(first) || !Self::is_shard_name(second) {
            return None;
        }

        let rest = file.strip_suffix(RECORD_EXTENSION)?.strip_suffix('.')?;
        if !Self::is_upper_hex(rest) {
            return None;
        }

        let mut key = hex::decode(first).ok()?;
        key.extend(hex::decode(second).ok()?);
        key.extend(hex::decode(rest).ok()?);
        Some(key)
    }

    /// Recover the routing key a temporary file was being written for
    ///
    /// Temp files are named `{record}.tmp.{pid}.{seq}` next to their record.
    pub fn routing_key_from_temp_path(&self, path: &Path) -> Option<Vec<u8>> {
        let name = path.file_name()?.to_str()?;
        let (record_name, suffix) = name.split_once(TEMP_MARKER)?;
        let (pid, seq) = suffix.split_once('.')?;
        if !Self::is_decimal(pid) || !Self::is_decimal(seq) {
            return None;
        }

        self.routing_key_from_path(&path.with_file_name(record_name))
    }

    /// List every record file in the store
    ///
    /// Walks the two shard levels; entries that don't fit the layout are
    /// skipped. Errors listing the root or a shard directory propagate.
    pub fn record_paths(&self) -> io::Result<Vec<PathBuf>> {
        self.shard_files(|path| self.routing_key_from_path(path).is_some())
    }

    /// List temporary files left behind by interrupted writes
    pub fn temp_paths(&self) -> io::Result<Vec<PathBuf>> {
        self.shard_files(|path| self.routing_key_from_temp_path(path).is_some())
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Regular files two shard levels down that pass `keep`
    fn shard_files(&self, keep: impl Fn(&Path) -> bool) -> io::Result<Vec<PathBuf>> {
        let mut paths = Vec::new();

        for first in Self::shard_dirs(&self.root)? {
            for second in Self::shard_dirs(&first)? {
                for entry in fs::read_dir(&second)? {
                    let entry = entry?;
                    // Renamed or removed by a concurrent writer since listing
                    let file_type = match entry.file_type() {
                        Ok(t) => t,
                        Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                        Err(e) => return Err(e),
                    };
                    if !file_type.is_file() {
                        continue;
                    }

                    let path = entry.path();
                    if keep(&path) {
                        paths.push(path);
                    }
                }
            }
        }

        Ok(paths)
    }

    /// Subdirectories of `dir` named like a shard ("00".."FF")
    fn shard_dirs(dir: &Path) -> io::Result<Vec<PathBuf>> {
        let mut dirs = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let is_shard = entry
                .file_name()
                .to_str()
                .map(Self::is_shard_name)
                .unwrap_or(false);
            if is_shard {
                dirs.push(entry.path());
            }
        }
        Ok(dirs)
    }

    fn is_shard_name(name: &str) -> bool {
        name.len() == 2 && Self::is_upper_hex(name)
    }

    /// `path` writes uppercase; lowercase names are not ours
    fn is_upper_hex(s: &str) -> bool {
        s.bytes().all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b))
    }

    fn is_decimal(s: &str) -> bool {
        !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
    }
}
