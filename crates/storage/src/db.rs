//! sled snapshot store.
//!
//! The whole relational image lives under a single key, encoded as a JSON
//! array of byte values. Every save replaces the previous image wholesale.

use sled::Db;
use std::path::Path;
use thiserror::Error;

/// Key the inventory image is stored under.
pub const SNAPSHOT_KEY: &str = "materialsDB";

/// Storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Corrupt snapshot under {key}: {reason}")]
    CorruptSnapshot { key: String, reason: String },

    #[error("Database image failed integrity check: {0}")]
    CorruptImage(String),

    #[error("Schema version {found} is newer than supported version {supported}")]
    UnsupportedSchemaVersion { found: i64, supported: i64 },

    #[error("Engine source {source_name} unavailable: {reason}")]
    EngineUnavailable { source_name: String, reason: String },
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Wrapper around sled holding serialized inventory images.
pub struct Storage {
    db: Db,
}

impl Storage {
    /// Open a store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Open an in-memory store (for testing).
    pub fn open_temporary() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db })
    }

    /// Replace the image stored under `key` and flush it to disk.
    pub fn save_snapshot<K: AsRef<[u8]>>(&self, key: K, image: &[u8]) -> Result<()> {
        let encoded = serde_json::to_vec(image)?;
        self.db.insert(key, encoded)?;
        self.db.flush()?;
        Ok(())
    }

    /// Load the image stored under `key`.
    ///
    /// Returns `CorruptSnapshot` when the stored value is not a byte array;
    /// the entry is left in place for the caller to discard.
    pub fn load_snapshot<K: AsRef<[u8]>>(&self, key: K) -> Result<Option<Vec<u8>>> {
        let key = key.as_ref();
        match self.db.get(key)? {
            Some(bytes) => serde_json::from_slice::<Vec<u8>>(&bytes)
                .map(Some)
                .map_err(|e| StorageError::CorruptSnapshot {
                    key: String::from_utf8_lossy(key).into_owned(),
                    reason: e.to_string(),
                }),
            None => Ok(None),
        }
    }

    /// Remove the image stored under `key`.
    pub fn discard_snapshot<K: AsRef<[u8]>>(&self, key: K) -> Result<()> {
        self.db.remove(key)?;
        self.db.flush()?;
        Ok(())
    }

    /// Check if an image is stored under `key`.
    pub fn contains<K: AsRef<[u8]>>(&self, key: K) -> Result<bool> {
        Ok(self.db.contains_key(key)?)
    }

    /// Get the underlying sled database.
    pub fn inner(&self) -> &Db {
        &self.db
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }
}
