//! Polling filesystem scanner
//!
//! Walks the checkout and reports files that appeared or whose size or
//! modification time changed since the previous scan.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::accumulator::IgnoreSet;
use crate::domain::{ChangeEvent, ChangeKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Stamp {
    modified: Option<SystemTime>,
    len: u64,
}

/// Turns successive directory walks into ChangeEvents
pub struct PollingScanner {
    root: PathBuf,
    ignore: IgnoreSet,
    seen: HashMap<PathBuf, Stamp>,
    baseline_taken: bool,
}

impl PollingScanner {
    pub fn new(root: impl Into<PathBuf>, ignore: IgnoreSet) -> Self {
        Self {
            root: root.into(),
            ignore,
            seen: HashMap::new(),
            baseline_taken: false,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of files currently tracked
    pub fn tracked(&self) -> usize {
        self.seen.len()
    }

    /// Walk the tree once
    ///
    /// The first call only records a baseline and returns nothing. Later calls
    /// return created and modified files, sorted by path.
    pub fn scan(&mut self) -> Vec<ChangeEvent> {
        let mut current = HashMap::with_capacity(self.seen.len());
        let root = self.root.clone();
        let ignore = &self.ignore;

        let walker = WalkDir::new(&root).follow_links(false).into_iter().filter_entry(|entry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            match relative(&root, entry.path()) {
                Some(rel) => !ignore.is_ignored(&format!("{}/", rel)),
                None => true,
            }
        });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "Failed to read directory entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(metadata) = entry.metadata() else {
                continue;
            };
            current.insert(
                entry.into_path(),
                Stamp {
                    modified: metadata.modified().ok(),
                    len: metadata.len(),
                },
            );
        }

        let mut events: Vec<ChangeEvent> = Vec::new();
        if self.baseline_taken {
            for (path, stamp) in &current {
                match self.seen.get(path) {
                    None => events.push(ChangeEvent::new(path.clone(), ChangeKind::Created, false)),
                    Some(previous) if previous != stamp => {
                        events.push(ChangeEvent::new(path.clone(), ChangeKind::Modified, false))
                    }
                    Some(_) => {}
                }
            }
            events.sort_by(|a, b| a.path.cmp(&b.path));
        } else {
            debug!(files = current.len(), root = ?self.root, "PollingScanner::scan: baseline taken");
            self.baseline_taken = true;
        }

        self.seen = current;
        events
    }
}

fn relative(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}
