//! Content storage for documents and artifacts
//!
//! Everything the engine persists or reads goes through [`ContentStore`], a
//! small key-value capability keyed by absolute paths. [`FsStore`] is backed
//! by the real filesystem; [`MemoryStore`] keeps everything in memory with a
//! manual clock for tests.

mod fs;
mod memory;

use std::path::{Path, PathBuf};

use crate::error::Result;

pub use fs::FsStore;
pub use memory::MemoryStore;

/// Key-value access to documents and artifact files.
///
/// Missing keys are reported as [`ClozeError::NotFound`](crate::error::ClozeError::NotFound),
/// distinct from other I/O failures.
pub trait ContentStore {
    /// Read the raw bytes stored under `key`
    fn read(&self, key: &Path) -> Result<Vec<u8>>;

    /// Store `bytes` under `key`, creating missing parent directories
    fn write(&self, key: &Path, bytes: &[u8]) -> Result<()>;

    /// Whether a file exists under `key`
    fn exists(&self, key: &Path) -> bool;

    /// Modification time of `key` in milliseconds since the Unix epoch
    fn modified(&self, key: &Path) -> Result<i64>;

    /// Current time on the same basis as [`ContentStore::modified`]
    fn now(&self) -> i64;

    /// Create a directory and its parents; succeeds if it already exists
    fn create_dir(&self, key: &Path) -> Result<()>;

    /// Remove the file stored under `key`
    fn remove(&self, key: &Path) -> Result<()>;

    /// Names of the immediate subdirectories of `key`, sorted
    fn list_dirs(&self, key: &Path) -> Result<Vec<String>>;

    /// All files below `key`, recursively, sorted
    fn list_files(&self, key: &Path) -> Result<Vec<PathBuf>>;

    /// Read `key` as UTF-8 text, replacing invalid sequences
    fn read_to_string(&self, key: &Path) -> Result<String> {
        let bytes = self.read(key)?;
        Ok(String::from_utf8(bytes)
            .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned()))
    }
}
