//! Snapshot registry for loading every pool snapshot in a directory.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use super::PoolSnapshot;

/// Pool snapshots indexed by pool name.
#[derive(Debug, Default)]
pub struct SnapshotRegistry {
    snapshots: BTreeMap<String, PoolSnapshot>,
}

impl SnapshotRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load all `*.toml` snapshots from a directory.
    ///
    /// Files that fail to parse are logged and skipped. A later file with the
    /// same pool name replaces an earlier one.
    pub fn load_from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        info!(snapshot_dir = %dir.display(), "Loading pool snapshots");

        let mut registry = Self::new();
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read snapshot directory: {}", dir.display()))?;

        let mut paths: Vec<_> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|e| e == "toml"))
            .collect();
        paths.sort();

        for path in paths {
            match PoolSnapshot::from_file(&path) {
                Ok(snapshot) => {
                    debug!(
                        pool = %snapshot.name(),
                        file = %path.display(),
                        "Loaded pool snapshot"
                    );
                    registry.insert(snapshot);
                }
                Err(e) => {
                    warn!(
                        file = %path.display(),
                        error = %e,
                        "Failed to load pool snapshot"
                    );
                }
            }
        }

        info!(pools = registry.len(), "Pool snapshots loaded");
        Ok(registry)
    }

    pub fn insert(&mut self, snapshot: PoolSnapshot) {
        self.snapshots.insert(snapshot.name().to_string(), snapshot);
    }

    pub fn get(&self, name: &str) -> Option<&PoolSnapshot> {
        self.snapshots.get(name)
    }

    /// Snapshots in pool-name order.
    pub fn iter(&self) -> impl Iterator<Item = &PoolSnapshot> {
        self.snapshots.values()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
