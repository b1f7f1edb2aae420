use assert_cmd::{cargo::cargo_bin_cmd, Command};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub fn vaultcloze() -> Command {
    let mut cmd = cargo_bin_cmd!("vaultcloze");
    cmd.env_remove("VAULTCLOZE_VAULT")
        .env_remove("VAULTCLOZE_COLLECTION")
        .env_remove("VAULTCLOZE_LOG")
        .env_remove("RUST_LOG");
    cmd
}

/// A temporary vault and collection side by side
pub struct Fixture {
    _dir: TempDir,
    pub vault: PathBuf,
    pub collection: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let vault = dir.path().join("vault");
        let collection = dir.path().join("collection");
        fs::create_dir_all(&vault).unwrap();
        fs::create_dir_all(&collection).unwrap();
        Fixture {
            _dir: dir,
            vault,
            collection,
        }
    }

    pub fn write_note(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.vault.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    pub fn read_note(&self, rel: &str) -> String {
        fs::read_to_string(self.vault.join(rel)).unwrap()
    }

    /// Command with `--vault` and `--collection` pointing at the fixture
    pub fn cmd(&self) -> Command {
        let mut cmd = vaultcloze();
        cmd.arg("--vault")
            .arg(&self.vault)
            .arg("--collection")
            .arg(&self.collection);
        cmd
    }

    /// Every file named `name` below the collection, sorted
    pub fn artifacts(&self, name: &str) -> Vec<PathBuf> {
        let mut found = Vec::new();
        collect(&self.collection, name, &mut found);
        found.sort();
        found
    }

    pub fn run_json(&self, args: &[&str]) -> serde_json::Value {
        let output = self
            .cmd()
            .args(["--format", "json"])
            .args(args)
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "stderr: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).unwrap()
    }
}

fn collect(dir: &Path, name: &str, found: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect(&path, name, found);
        } else if path.file_name().is_some_and(|n| n == name) {
            found.push(path);
        }
    }
}
