use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where the known-set and its companions live on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub dir: PathBuf,
    pub file: String,
    pub backup: String,
    /// Track the previous full snapshot to report removed listings.
    pub snapshot: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
            file: "vehicles.json".to_string(),
            backup: "vehicles_backup.json".to_string(),
            snapshot: false,
        }
    }
}

impl StoreConfig {
    pub fn known_path(&self) -> PathBuf {
        self.dir.join(&self.file)
    }

    pub fn backup_path(&self) -> PathBuf {
        self.dir.join(&self.backup)
    }

    pub fn snapshot_path(&self) -> Option<PathBuf> {
        self.snapshot.then(|| self.dir.join("snapshot.json"))
    }
}
