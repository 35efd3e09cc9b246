//! Persisted path -> content hash record

use eyre::{Context, Result};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Last-known content hash per repository-relative path
///
/// Stored as a flat JSON object so it survives restarts and a touched but
/// unchanged file is not reported again.
#[derive(Debug, Clone, Default)]
pub struct FileRecord {
    path: Option<PathBuf>,
    hashes: BTreeMap<String, String>,
}

impl FileRecord {
    /// A record that is never written to disk
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load from `path`, starting empty when the file does not exist yet
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let hashes = if path.exists() {
            let content = fs::read_to_string(&path).context(format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&content).context(format!("Failed to parse {}", path.display()))?
        } else {
            debug!(?path, "FileRecord::load: no record yet");
            BTreeMap::new()
        };

        info!(count = hashes.len(), path = %path.display(), "Loaded file hashes");
        Ok(Self {
            path: Some(path),
            hashes,
        })
    }

    /// Rewrite the backing file; no-op for in-memory records
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).context("Failed to create state directory")?;
        }

        let content = serde_json::to_string_pretty(&self.hashes)?;
        fs::write(path, content).context(format!("Failed to write {}", path.display()))?;
        debug!(count = self.hashes.len(), "FileRecord::save: written");
        Ok(())
    }

    pub fn get(&self, rel_path: &str) -> Option<&str> {
        self.hashes.get(rel_path).map(String::as_str)
    }

    /// Store `hash`; returns false when it equals the stored hash
    pub fn update(&mut self, rel_path: &str, hash: String) -> bool {
        if self.get(rel_path) == Some(hash.as_str()) {
            return false;
        }
        self.hashes.insert(rel_path.to_string(), hash);
        true
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    pub fn backing_file(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// Hex SHA-256 of the file contents, or the empty string if it cannot be read
///
/// A file deleted between the event and the read hashes to "", which differs
/// from any stored hash and is therefore reported as a change.
pub fn hash_file(path: &Path) -> String {
    match fs::read(path) {
        Ok(bytes) => hex::encode(Sha256::digest(&bytes)),
        Err(e) => {
            debug!(?path, error = %e, "hash_file: unreadable, using empty hash");
            String::new()
        }
    }
}
