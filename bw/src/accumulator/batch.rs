//! ChangeAccumulator: hash-deduplicated, per-category batching of changes

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::ignore::IgnoreSet;
use super::record::{FileRecord, hash_file};
use crate::domain::{Category, ChangeEvent, UpdateRequest, classify};

/// Buffers changed paths per category until the quiescence window has passed
pub struct ChangeAccumulator {
    repo_root: PathBuf,
    ignore: IgnoreSet,
    record: FileRecord,
    pending: BTreeMap<Category, BTreeSet<String>>,
    last_flush: Option<DateTime<Utc>>,
}

impl ChangeAccumulator {
    pub fn new(repo_root: impl Into<PathBuf>, ignore: IgnoreSet, record: FileRecord) -> Self {
        let repo_root = repo_root.into();
        debug!(?repo_root, patterns = ignore.len(), "ChangeAccumulator::new: called");
        Self {
            repo_root,
            ignore,
            record,
            pending: BTreeMap::new(),
            last_flush: None,
        }
    }

    /// Record one filesystem event
    ///
    /// Returns the category the path was added to, or `None` when the event
    /// was ignored or the content hash is unchanged.
    pub fn on_event(&mut self, event: &ChangeEvent) -> Option<Category> {
        if event.is_directory {
            return None;
        }

        let Some(rel_path) = self.relative_path(&event.path) else {
            debug!(path = ?event.path, "ChangeAccumulator::on_event: outside repository");
            return None;
        };

        if self.ignore.is_ignored(&rel_path) {
            debug!(%rel_path, "ChangeAccumulator::on_event: ignored");
            return None;
        }

        let hash = hash_file(&event.path);
        if !self.record.update(&rel_path, hash) {
            debug!(%rel_path, "ChangeAccumulator::on_event: content unchanged");
            return None;
        }

        let category = classify(&rel_path);
        info!(%rel_path, %category, kind = ?event.kind, "Change detected");
        self.pending.entry(category).or_default().insert(rel_path);
        Some(category)
    }

    /// Emit one UpdateRequest per non-empty category once the window has passed
    ///
    /// Returns an empty list while `now - last_flush < quiescence`. Otherwise
    /// clears the pending sets, moves the flush time to `now` and persists the
    /// hash record.
    pub fn flush(&mut self, now: DateTime<Utc>, quiescence: Duration) -> Vec<UpdateRequest> {
        if let Some(last) = self.last_flush {
            // A clock that went backwards counts as no time elapsed
            let elapsed = (now - last).to_std().unwrap_or(Duration::ZERO);
            if elapsed < quiescence {
                return Vec::new();
            }
        }

        let mut requests = Vec::new();
        for category in Category::ALL {
            let Some(paths) = self.pending.remove(&category) else {
                continue;
            };
            if paths.is_empty() {
                continue;
            }

            let paths: Vec<String> = paths.into_iter().collect();
            let description = describe(category, &paths);
            debug!(%category, count = paths.len(), %description, "ChangeAccumulator::flush: emitting batch");
            requests.push(UpdateRequest::new(category.as_str(), paths, description));
        }

        self.last_flush = Some(now);
        self.persist();
        requests
    }

    /// Write the hash record; failures are logged, not raised
    pub fn persist(&self) {
        if let Err(e) = self.record.save() {
            warn!(error = %e, "Failed to persist file hashes");
        }
    }

    /// Number of paths waiting across all categories
    pub fn pending_count(&self) -> usize {
        self.pending.values().map(BTreeSet::len).sum()
    }

    pub fn pending(&self, category: Category) -> Vec<String> {
        self.pending
            .get(&category)
            .map(|paths| paths.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn record(&self) -> &FileRecord {
        &self.record
    }

    pub fn last_flush(&self) -> Option<DateTime<Utc>> {
        self.last_flush
    }

    fn relative_path(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.repo_root).ok()?;
        if rel.as_os_str().is_empty() {
            return None;
        }
        let parts: Vec<String> = rel.components().map(|c| c.as_os_str().to_string_lossy().into_owned()).collect();
        Some(parts.join("/"))
    }
}

/// "Update <path>" for one file, "Update <N> <category> files" otherwise
fn describe(category: Category, paths: &[String]) -> String {
    match paths {
        [only] => format!("Update {}", only),
        _ => format!("Update {} {} files", paths.len(), category),
    }
}
