//! JSON file persistence for the known set and the optional snapshot.

use crate::error::{ErrorKind, Result};
use crate::known::KnownSet;
use carwatch_config::StoreConfig;
use carwatch_extract::Listing;
use exn::ResultExt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Known-set store backed by a primary JSON file and a backup copy taken
/// before every save.
#[derive(Debug, Clone)]
pub struct JsonStore {
    primary: PathBuf,
    backup: PathBuf,
    snapshot: Option<PathBuf>,
}

impl JsonStore {
    pub fn new(primary: impl Into<PathBuf>, backup: impl Into<PathBuf>) -> Self {
        Self {
            primary: primary.into(),
            backup: backup.into(),
            snapshot: None,
        }
    }

    /// Also keep the full listing set of the last cycle at `path`.
    pub fn with_snapshot(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot = Some(path.into());
        self
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        let store = Self::new(config.known_path(), config.backup_path());
        match config.snapshot_path() {
            Some(path) => store.with_snapshot(path),
            None => store,
        }
    }

    pub fn primary_path(&self) -> &Path {
        &self.primary
    }

    pub fn tracks_snapshot(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Load the known set, never failing.
    ///
    /// Tries the primary file, then the backup; if neither is readable the
    /// result is empty and every listing on the next page will be reported.
    pub async fn load(&self) -> KnownSet {
        match read_json::<KnownSet>(&self.primary).await {
            Ok(known) => {
                tracing::debug!(path = %self.primary.display(), entries = known.len(), "Known listings loaded");
                return known;
            },
            Err(err) if matches!(&*err, ErrorKind::NotFound(_)) => {
                tracing::info!(path = %self.primary.display(), "No known listings file yet");
            },
            Err(err) => tracing::warn!(error = ?err, "Known listings unreadable; trying backup"),
        }
        match read_json::<KnownSet>(&self.backup).await {
            Ok(known) => {
                tracing::warn!(path = %self.backup.display(), entries = known.len(), "Known listings restored from backup");
                known
            },
            Err(err) => {
                if !matches!(&*err, ErrorKind::NotFound(_)) {
                    tracing::warn!(error = ?err, "Backup unreadable; starting with no known listings");
                }
                KnownSet::default()
            },
        }
    }

    /// Persist `known`, keeping the previous primary as the backup.
    ///
    /// The new contents are written beside the primary and renamed over it,
    /// so a crash mid-write leaves the old file intact.
    pub async fn save(&self, known: &KnownSet) -> Result<()> {
        if fs::try_exists(&self.primary).await.unwrap_or(false)
            && let Err(err) = copy_file(&self.primary, &self.backup).await
        {
            tracing::warn!(error = ?err, "Could not back up known listings before saving");
        }
        write_json(&self.primary, known).await?;
        tracing::debug!(path = %self.primary.display(), entries = known.len(), "Known listings saved");
        Ok(())
    }

    /// Delete the primary and backup files. Returns how many existed.
    pub async fn reset(&self) -> Result<usize> {
        let mut removed = 0;
        for path in [&self.primary, &self.backup] {
            match fs::remove_file(path).await {
                Ok(()) => removed += 1,
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {},
                Err(err) => return Err(ErrorKind::from_io(err, path).into()),
            }
        }
        tracing::info!(removed, "Known listings reset");
        Ok(removed)
    }

    /// Listings from the last snapshot; empty when snapshots are disabled,
    /// missing or unreadable.
    pub async fn load_snapshot(&self) -> Vec<Listing> {
        let Some(path) = &self.snapshot else {
            return Vec::new();
        };
        match read_json::<Vec<Listing>>(path).await {
            Ok(listings) => listings,
            Err(err) => {
                if !matches!(&*err, ErrorKind::NotFound(_)) {
                    tracing::warn!(error = ?err, "Snapshot unreadable; ignoring");
                }
                Vec::new()
            },
        }
    }

    /// Replace the snapshot with `listings`. A no-op when snapshots are
    /// disabled.
    pub async fn save_snapshot(&self, listings: &[Listing]) -> Result<()> {
        match &self.snapshot {
            Some(path) => write_json(path, listings).await,
            None => Ok(()),
        }
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path).await.map_err(|err| ErrorKind::from_io(err, path))?;
    serde_json::from_slice(&bytes).or_raise(|| ErrorKind::Corrupt(path.to_path_buf()))
}

async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await.map_err(|err| ErrorKind::from_io(err, parent))?;
    }
    let json = serde_json::to_vec_pretty(value).or_raise(|| ErrorKind::Serialize)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, json).await.map_err(|err| ErrorKind::from_io(err, &tmp))?;
    fs::rename(&tmp, path).await.map_err(|err| ErrorKind::from_io(err, path))?;
    Ok(())
}

async fn copy_file(from: &Path, to: &Path) -> Result<()> {
    fs::copy(from, to).await.map_err(|err| ErrorKind::from_io(err, from))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn listing(name: &str, price: &str) -> Listing {
        Listing {
            name: name.to_string(),
            price: price.to_string(),
            year: Some("2020(R02)年".to_string()),
            site_marked_new: true,
            detected_at: OffsetDateTime::UNIX_EPOCH,
            source_url: "https://example.com/".to_string(),
        }
    }

    fn store(dir: &Path) -> JsonStore {
        JsonStore::new(dir.join("data/vehicles.json"), dir.join("data/vehicles_backup.json"))
    }

    #[tokio::test]
    async fn missing_files_load_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(store(dir.path()).load().await.is_empty());
    }

    #[tokio::test]
    async fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let known: KnownSet = [listing("V", "100万円"), listing("W", "120万円")].into_iter().collect();
        store.save(&known).await.unwrap();
        assert_eq!(store.load().await, known);
        // No temp file left behind.
        assert!(!dir.path().join("data/vehicles.json.tmp").exists());
    }

    #[tokio::test]
    async fn save_keeps_previous_as_backup() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let first: KnownSet = [listing("V", "100万円")].into_iter().collect();
        let mut second = first.clone();
        second.apply([listing("W", "120万円")]);

        store.save(&first).await.unwrap();
        assert!(!dir.path().join("data/vehicles_backup.json").exists());
        store.save(&second).await.unwrap();
        let backup = JsonStore::new(dir.path().join("data/vehicles_backup.json"), dir.path().join("nope.json"));
        assert_eq!(backup.load().await, first);
    }

    #[tokio::test]
    async fn corrupt_primary_falls_back_to_backup() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let first: KnownSet = [listing("V", "100万円")].into_iter().collect();
        store.save(&first).await.unwrap();
        store.save(&first).await.unwrap();
        std::fs::write(dir.path().join("data/vehicles.json"), b"{ not json").unwrap();
        assert_eq!(store.load().await, first);
    }

    #[tokio::test]
    async fn corrupt_everything_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("data")).unwrap();
        std::fs::write(dir.path().join("data/vehicles.json"), b"[]").unwrap();
        std::fs::write(dir.path().join("data/vehicles_backup.json"), b"garbage").unwrap();
        assert!(store(dir.path()).load().await.is_empty());
    }

    #[tokio::test]
    async fn reset_removes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let known: KnownSet = [listing("V", "100万円")].into_iter().collect();
        store.save(&known).await.unwrap();
        store.save(&known).await.unwrap();
        assert_eq!(store.reset().await.unwrap(), 2);
        assert_eq!(store.reset().await.unwrap(), 0);
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let disabled = store(dir.path());
        disabled.save_snapshot(&[listing("V", "100万円")]).await.unwrap();
        assert!(disabled.load_snapshot().await.is_empty());

        let enabled = store(dir.path()).with_snapshot(dir.path().join("data/snapshot.json"));
        assert!(enabled.load_snapshot().await.is_empty());
        let listings = vec![listing("V", "100万円"), listing("W", "120万円")];
        enabled.save_snapshot(&listings).await.unwrap();
        assert_eq!(enabled.load_snapshot().await, listings);
    }

    #[test]
    fn from_config_paths() {
        let config = StoreConfig {
            dir: PathBuf::from("/var/lib/carwatch"),
            snapshot: true,
            ..StoreConfig::default()
        };
        let store = JsonStore::from_config(&config);
        assert_eq!(store.primary_path(), Path::new("/var/lib/carwatch/vehicles.json"));
        assert!(store.tracks_snapshot());
    }
}
