#![deny(warnings)]

//! Persistence gateway: versioned save records for a player's game.
//!
//! The engine only needs [`Gateway::load`] and [`Gateway::save`]. A JSON file
//! store is provided for local saves, plus an in-memory store for tests and
//! embedding.

use serde::{Deserialize, Serialize};
use sim_core::{PlayerState, Timestamp};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Format version written by this build.
pub const CURRENT_VERSION: u32 = 1;

/// What gets written to storage. Missing fields take their defaults so
/// older saves keep loading.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveRecord {
    /// Format version; 0 for saves written before versioning.
    pub version: u32,
    /// Epoch seconds of the save.
    pub saved_at: Timestamp,
    /// The full player state.
    pub player: PlayerState,
}

impl SaveRecord {
    /// Wrap `player` for writing at `now`.
    pub fn new(player: &PlayerState, now: Timestamp) -> Self {
        Self {
            version: CURRENT_VERSION,
            saved_at: now,
            player: player.clone(),
        }
    }

    /// Parse a record, rejecting versions newer than this build understands.
    pub fn from_json(text: &str) -> Result<Self, StorageError> {
        let record: SaveRecord = serde_json::from_str(text).map_err(StorageError::Decode)?;
        if record.version > CURRENT_VERSION {
            return Err(StorageError::UnsupportedVersion(record.version));
        }
        Ok(record)
    }

    /// Pretty-printed JSON form.
    pub fn to_json(&self) -> Result<String, StorageError> {
        serde_json::to_string_pretty(self).map_err(StorageError::Encode)
    }
}

/// Storage failures. Callers treat these as non-fatal.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying I/O failed.
    #[error("storage I/O failed: {0}")]
    Io(#[from] io::Error),
    /// Record could not be serialized.
    #[error("failed to encode save: {0}")]
    Encode(#[source] serde_json::Error),
    /// Stored bytes are not a valid record.
    #[error("failed to decode save: {0}")]
    Decode(#[source] serde_json::Error),
    /// Record was written by a newer format.
    #[error("unsupported save version {0}")]
    UnsupportedVersion(u32),
}

/// Load/save contract for a single player's game.
pub trait Gateway {
    /// The stored player, or `None` when nothing has been saved yet.
    fn load(&self) -> Result<Option<PlayerState>, StorageError>;
    /// Replace the stored player with `player`.
    fn save(&mut self, player: &PlayerState, now: Timestamp) -> Result<(), StorageError>;
}

/// Default location for local saves.
pub fn default_save_path() -> PathBuf {
    PathBuf::from("./saves/warfront.json")
}

/// One JSON file per game. Writes go to a sibling temp file and are renamed
/// into place so a crash never leaves a half-written save.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Store backed by `path`. Nothing is touched until the first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File this store reads and writes.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the full record including metadata.
    pub fn load_record(&self) -> Result<Option<SaveRecord>, StorageError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let record = SaveRecord::from_json(&text)?;
        debug!(path = %self.path.display(), version = record.version, "save loaded");
        Ok(Some(record))
    }
}

impl Gateway for JsonFileStore {
    fn load(&self) -> Result<Option<PlayerState>, StorageError> {
        Ok(self.load_record()?.map(|r| r.player))
    }

    fn save(&mut self, player: &PlayerState, now: Timestamp) -> Result<(), StorageError> {
        let text = SaveRecord::new(player, now).to_json()?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &self.path)?;
        info!(path = %self.path.display(), player = %player.name, "game saved");
        Ok(())
    }
}

/// Keeps the last record in memory. `fail_saves` makes every save fail,
/// which is how callers exercise their error handling.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    /// Last saved record.
    pub record: Option<SaveRecord>,
    /// Successful saves so far.
    pub saves: u32,
    /// Reject saves with an I/O error.
    pub fail_saves: bool,
}

impl MemoryStore {
    /// Store preloaded with `player`.
    pub fn with_player(player: &PlayerState, now: Timestamp) -> Self {
        Self {
            record: Some(SaveRecord::new(player, now)),
            ..Self::default()
        }
    }
}

impl Gateway for MemoryStore {
    fn load(&self) -> Result<Option<PlayerState>, StorageError> {
        Ok(self.record.as_ref().map(|r| r.player.clone()))
    }

    fn save(&mut self, player: &PlayerState, now: Timestamp) -> Result<(), StorageError> {
        if self.fail_saves {
            return Err(StorageError::Io(io::Error::new(
                io::ErrorKind::Other,
                "storage unavailable",
            )));
        }
        self.record = Some(SaveRecord::new(player, now));
        self.saves += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_core::{AssetId, RulesConfig, TerritoryId};
    use tempfile::tempdir;

    fn sample() -> PlayerState {
        let mut p = PlayerState::new("Saver", &RulesConfig::default()).unwrap();
        p.country = Some("iran".into());
        p.treasury = 470_000;
        p.military.insert(AssetId::from("militia"), 2);
        p.owned_territories.insert(TerritoryId::from("irn"));
        p
    }

    #[test]
    fn file_store_saves_into_missing_directory() {
        let dir = tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("nested/game.json"));
        assert_eq!(store.load().unwrap(), None);

        store.save(&sample(), 1_700_000_000).unwrap();
        assert_eq!(store.load().unwrap(), Some(sample()));
        let record = store.load_record().unwrap().unwrap();
        assert_eq!(record.version, CURRENT_VERSION);
        assert_eq!(record.saved_at, 1_700_000_000);
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn legacy_record_fills_defaults() {
        let record =
            SaveRecord::from_json(r#"{"player": {"name": "Old", "treasury": 5, "stray": true}}"#)
                .unwrap();
        assert_eq!(record.version, 0);
        assert_eq!(record.player.name, "Old");
        assert_eq!(record.player.treasury, 5);
        assert_eq!(record.player.level, 1);
        assert_eq!(record.player.income_cooldown_secs, 3600);
        assert!(record.player.owned_territories.is_empty());
    }

    #[test]
    fn newer_version_rejected() {
        let err = SaveRecord::from_json(r#"{"version": 99}"#).unwrap_err();
        assert!(matches!(err, StorageError::UnsupportedVersion(99)));
    }

    #[test]
    fn corrupt_file_is_decode_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("game.json");
        fs::write(&path, "not json").unwrap();
        let store = JsonFileStore::new(&path);
        assert!(matches!(store.load(), Err(StorageError::Decode(_))));
    }

    #[test]
    fn memory_store_failure_keeps_previous_record() {
        let mut store = MemoryStore::with_player(&sample(), 10);
        store.fail_saves = true;
        let mut changed = sample();
        changed.treasury = 0;
        assert!(matches!(store.save(&changed, 20), Err(StorageError::Io(_))));
        assert_eq!(store.load().unwrap(), Some(sample()));
        assert_eq!(store.saves, 0);
    }
}
