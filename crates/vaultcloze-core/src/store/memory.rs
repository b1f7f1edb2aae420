use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use super::ContentStore;
use crate::error::{ClozeError, Result};

#[derive(Debug, Clone)]
struct Entry {
    bytes: Vec<u8>,
    modified: i64,
}

/// In-memory [`ContentStore`] with a manual clock.
///
/// Writes are stamped with the current clock value and counted, so tests can
/// assert both staleness decisions and the absence of writes.
#[derive(Debug)]
pub struct MemoryStore {
    files: RefCell<BTreeMap<PathBuf, Entry>>,
    dirs: RefCell<BTreeSet<PathBuf>>,
    denied: RefCell<BTreeSet<PathBuf>>,
    clock: Cell<i64>,
    writes: Cell<usize>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            files: RefCell::new(BTreeMap::new()),
            dirs: RefCell::new(BTreeSet::new()),
            denied: RefCell::new(BTreeSet::new()),
            clock: Cell::new(1),
            writes: Cell::new(0),
        }
    }

    /// Set the clock used to stamp subsequent writes
    pub fn set_time(&self, now: i64) {
        self.clock.set(now);
    }

    /// Number of successful writes since creation
    pub fn writes(&self) -> usize {
        self.writes.get()
    }

    /// Make every write or directory creation at or below `prefix` fail
    pub fn deny_writes(&self, prefix: impl Into<PathBuf>) {
        self.denied.borrow_mut().insert(prefix.into());
    }

    /// Store a file without counting it as a write, stamped with `modified`
    pub fn insert(&self, key: impl Into<PathBuf>, text: &str, modified: i64) {
        self.files.borrow_mut().insert(
            key.into(),
            Entry {
                bytes: text.as_bytes().to_vec(),
                modified,
            },
        );
    }

    /// Whether a directory was created at `key` (or implied by a file)
    pub fn is_dir(&self, key: &Path) -> bool {
        self.dirs.borrow().contains(key)
            || self
                .files
                .borrow()
                .keys()
                .any(|k| k.starts_with(key) && k != key)
    }

    fn check_denied(&self, key: &Path) -> Result<()> {
        if self.denied.borrow().iter().any(|p| key.starts_with(p)) {
            return Err(ClozeError::io(
                "write",
                key,
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "write denied"),
            ));
        }
        Ok(())
    }

    fn not_found(key: &Path) -> ClozeError {
        ClozeError::NotFound {
            path: key.to_path_buf(),
        }
    }
}

impl ContentStore for MemoryStore {
    fn read(&self, key: &Path) -> Result<Vec<u8>> {
        self.files
            .borrow()
            .get(key)
            .map(|e| e.bytes.clone())
            .ok_or_else(|| Self::not_found(key))
    }

    fn write(&self, key: &Path, bytes: &[u8]) -> Result<()> {
        self.check_denied(key)?;
        if let Some(parent) = key.parent() {
            self.create_dir(parent)?;
        }
        self.files.borrow_mut().insert(
            key.to_path_buf(),
            Entry {
                bytes: bytes.to_vec(),
                modified: self.clock.get(),
            },
        );
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }

    fn exists(&self, key: &Path) -> bool {
        self.files.borrow().contains_key(key)
    }

    fn modified(&self, key: &Path) -> Result<i64> {
        self.files
            .borrow()
            .get(key)
            .map(|e| e.modified)
            .ok_or_else(|| Self::not_found(key))
    }

    fn now(&self) -> i64 {
        self.clock.get()
    }

    fn create_dir(&self, key: &Path) -> Result<()> {
        self.check_denied(key)?;
        let mut dirs = self.dirs.borrow_mut();
        for ancestor in key.ancestors() {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            dirs.insert(ancestor.to_path_buf());
        }
        Ok(())
    }

    fn remove(&self, key: &Path) -> Result<()> {
        self.files
            .borrow_mut()
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| Self::not_found(key))
    }

    fn list_dirs(&self, key: &Path) -> Result<Vec<String>> {
        if !self.is_dir(key) {
            return Err(Self::not_found(key));
        }

        let mut names = BTreeSet::new();
        let dirs = self.dirs.borrow();
        let files = self.files.borrow();
        let file_dirs = files.keys().filter_map(|k| k.parent());
        for dir in dirs.iter().map(PathBuf::as_path).chain(file_dirs) {
            if let Ok(rest) = dir.strip_prefix(key) {
                if let Some(first) = rest.components().next() {
                    names.insert(first.as_os_str().to_string_lossy().into_owned());
                }
            }
        }
        Ok(names.into_iter().collect())
    }

    fn list_files(&self, key: &Path) -> Result<Vec<PathBuf>> {
        if !self.is_dir(key) {
            return Err(Self::not_found(key));
        }
        Ok(self
            .files
            .borrow()
            .keys()
            .filter(|k| k.starts_with(key) && k.as_path() != key)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_are_stamped_and_counted() {
        let store = MemoryStore::new();
        store.set_time(42);
        store.write(Path::new("/c/a.txt"), b"a").unwrap();

        assert_eq!(store.modified(Path::new("/c/a.txt")).unwrap(), 42);
        assert_eq!(store.writes(), 1);
        assert!(store.is_dir(Path::new("/c")));
    }

    #[test]
    fn test_insert_does_not_count() {
        let store = MemoryStore::new();
        store.insert("/v/note.md", "text", 7);
        assert_eq!(store.writes(), 0);
        assert_eq!(store.read_to_string(Path::new("/v/note.md")).unwrap(), "text");
    }

    #[test]
    fn test_denied_writes_fail() {
        let store = MemoryStore::new();
        store.deny_writes("/c/locked");
        let err = store.write(Path::new("/c/locked/x"), b"x").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::IoFailure);
        assert!(store.write(Path::new("/c/open/x"), b"x").is_ok());
    }

    #[test]
    fn test_list_dirs_from_files_and_dirs() {
        let store = MemoryStore::new();
        store.insert("/m/h1/o1/1/data.json", "{}", 1);
        store.create_dir(Path::new("/m/h1/o1/3")).unwrap();
        store.insert("/m/history.json", "{}", 1);

        assert_eq!(
            store.list_dirs(Path::new("/m/h1/o1")).unwrap(),
            vec!["1", "3"]
        );
        assert_eq!(store.list_dirs(Path::new("/m")).unwrap(), vec!["h1"]);
    }

    #[test]
    fn test_list_missing_dir_is_not_found() {
        let store = MemoryStore::new();
        assert!(store.list_dirs(Path::new("/none")).unwrap_err().is_not_found());
    }

    #[test]
    fn test_remove() {
        let store = MemoryStore::new();
        store.insert("/a", "x", 1);
        store.remove(Path::new("/a")).unwrap();
        assert!(!store.exists(Path::new("/a")));
        assert!(store.remove(Path::new("/a")).unwrap_err().is_not_found());
    }
}
