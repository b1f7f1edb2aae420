use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use walkdir::WalkDir;

use super::ContentStore;
use crate::error::{ClozeError, Result};

/// [`ContentStore`] backed by the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStore;

impl FsStore {
    pub fn new() -> Self {
        FsStore
    }
}

impl ContentStore for FsStore {
    fn read(&self, key: &Path) -> Result<Vec<u8>> {
        fs::read(key).map_err(|e| ClozeError::io("read", key, e))
    }

    fn write(&self, key: &Path, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = key.parent() {
            self.create_dir(parent)?;
        }
        fs::write(key, bytes).map_err(|e| ClozeError::io("write", key, e))
    }

    fn exists(&self, key: &Path) -> bool {
        key.is_file()
    }

    fn modified(&self, key: &Path) -> Result<i64> {
        let modified = fs::metadata(key)
            .and_then(|m| m.modified())
            .map_err(|e| ClozeError::io("stat", key, e))?;
        Ok(DateTime::<Utc>::from(modified).timestamp_millis())
    }

    fn now(&self) -> i64 {
        Utc::now().timestamp_millis()
    }

    fn create_dir(&self, key: &Path) -> Result<()> {
        fs::create_dir_all(key).map_err(|e| ClozeError::io("create directory", key, e))
    }

    fn remove(&self, key: &Path) -> Result<()> {
        fs::remove_file(key).map_err(|e| ClozeError::io("remove", key, e))
    }

    fn list_dirs(&self, key: &Path) -> Result<Vec<String>> {
        let entries = fs::read_dir(key).map_err(|e| ClozeError::io("list", key, e))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ClozeError::io("list", key, e))?;
            if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    fn list_files(&self, key: &Path) -> Result<Vec<PathBuf>> {
        if !key.is_dir() {
            return Err(ClozeError::NotFound {
                path: key.to_path_buf(),
            });
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(key).follow_links(true) {
            match entry {
                Ok(entry) if entry.file_type().is_file() => files.push(entry.into_path()),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(root = %key.display(), error = %e, "skipping unreadable entry");
                }
            }
        }
        files.sort();
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn test_write_creates_parents_and_reads_back() {
        let dir = tempdir().unwrap();
        let store = FsStore::new();
        let key = dir.path().join("a/b/c.txt");

        store.write(&key, b"hello").unwrap();
        assert!(store.exists(&key));
        assert_eq!(store.read_to_string(&key).unwrap(), "hello");
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let err = FsStore::new().read(&dir.path().join("nope")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_modified_not_after_now() {
        let dir = tempdir().unwrap();
        let store = FsStore::new();
        let key = dir.path().join("f.md");
        store.write(&key, b"x").unwrap();
        assert!(store.modified(&key).unwrap() <= store.now());
    }

    #[test]
    fn test_rewrite_within_a_second_is_later_than_now() {
        let dir = tempdir().unwrap();
        let store = FsStore::new();
        let key = dir.path().join("f.md");
        store.write(&key, b"first").unwrap();
        let processed_at = store.now().max(store.modified(&key).unwrap());

        sleep(Duration::from_millis(50));
        store.write(&key, b"second").unwrap();

        assert!(store.modified(&key).unwrap() > processed_at);
    }

    #[test]
    fn test_list_dirs_and_files() {
        let dir = tempdir().unwrap();
        let store = FsStore::new();
        store.write(&dir.path().join("2/data.json"), b"{}").unwrap();
        store.write(&dir.path().join("1/data.json"), b"{}").unwrap();
        store.write(&dir.path().join("top.json"), b"{}").unwrap();

        assert_eq!(store.list_dirs(dir.path()).unwrap(), vec!["1", "2"]);
        assert_eq!(store.list_files(dir.path()).unwrap().len(), 3);
    }

    #[test]
    fn test_create_dir_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = FsStore::new();
        let key = dir.path().join("x/y");
        store.create_dir(&key).unwrap();
        store.create_dir(&key).unwrap();
        assert!(key.is_dir());
    }
}
