//! The inventory handle.
//!
//! This module owns startup and persistence: resolving an engine source,
//! restoring the last snapshot, bringing the schema up to date, and flushing
//! the full image back to the snapshot store after every write. The ledger
//! operations themselves live in sibling modules as further `impl Inventory`
//! blocks.

use crate::config::InventoryConfig;
use rusqlite::Connection;
use stockledger_core::ValidationError;
use stockledger_storage::{engine, EngineSource, MemoryEngine, Schema, Storage, StorageError};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Errors that can occur during inventory operations.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("inventory is not initialized")]
    NotInitialized,

    #[error("no engine source could be opened: {0}")]
    InitializationFailed(#[source] StorageError),

    #[error("no engine sources configured")]
    NoEngineSources,

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("material not found: {0}")]
    MaterialNotFound(i64),

    #[error("order not found: {0}")]
    OrderNotFound(i64),

    #[error("order number already exists: {0}")]
    DuplicateOrderNumber(String),
}

pub type Result<T> = std::result::Result<T, InventoryError>;

/// A local inventory ledger bound to one snapshot store.
///
/// Created uninitialized; [`Inventory::init`] must succeed before any ledger
/// or query call, which otherwise fail with [`InventoryError::NotInitialized`].
pub struct Inventory {
    /// Durable snapshot store.
    store: Storage,
    /// Configuration.
    config: InventoryConfig,
    /// Engine sources, in the order they are tried.
    sources: Vec<Box<dyn EngineSource>>,
    /// Working database. `None` until initialized.
    conn: Option<Connection>,
}

impl Inventory {
    /// Create an uninitialized inventory with the default configuration.
    pub fn new(store: Storage) -> Self {
        Self::with_config(store, InventoryConfig::default())
    }

    /// Create an uninitialized inventory with the given configuration.
    pub fn with_config(store: Storage, config: InventoryConfig) -> Self {
        Self {
            store,
            config,
            sources: vec![Box::new(MemoryEngine)],
            conn: None,
        }
    }

    /// Replace the engine sources tried by [`Inventory::init`].
    pub fn with_sources(mut self, sources: Vec<Box<dyn EngineSource>>) -> Self {
        self.sources = sources;
        self
    }

    /// Open an inventory and initialize it in one step.
    pub fn open(store: Storage, config: InventoryConfig) -> Result<Self> {
        let mut inventory = Self::with_config(store, config);
        inventory.init()?;
        Ok(inventory)
    }

    pub fn is_initialized(&self) -> bool {
        self.conn.is_some()
    }

    pub fn config(&self) -> &InventoryConfig {
        &self.config
    }

    /// Get the underlying snapshot store.
    pub fn store(&self) -> &Storage {
        &self.store
    }

    /// Resolve an engine, restore the last snapshot and ensure the schema.
    ///
    /// Sources are tried in order; a source that cannot be opened is skipped.
    /// A corrupt snapshot is discarded and replaced by an empty schema. Any
    /// other failure after a source opened, including a failed migration, is
    /// returned as is. On error the inventory stays uninitialized.
    pub fn init(&mut self) -> Result<()> {
        if self.conn.is_some() {
            return Ok(());
        }

        let mut last_error = None;
        for source in &self.sources {
            let conn = match source.open() {
                Ok(conn) => conn,
                Err(e) => {
                    error!(source = source.name(), error = %e, "engine source failed");
                    last_error = Some(e);
                    continue;
                }
            };

            let conn = self.restore(source.as_ref(), conn)?;
            let outcome = Schema::new(&conn).ensure_schema()?;
            if outcome.is_changed() {
                flush_image(&self.store, &self.config.snapshot_key, &conn)?;
            }

            info!(source = source.name(), ?outcome, "inventory initialized");
            self.conn = Some(conn);
            return Ok(());
        }

        Err(match last_error {
            Some(e) => InventoryError::InitializationFailed(e),
            None => InventoryError::NoEngineSources,
        })
    }

    /// Load the stored image into `conn`, falling back to an empty database.
    fn restore(&self, source: &dyn EngineSource, mut conn: Connection) -> Result<Connection> {
        let key = &self.config.snapshot_key;
        let image = match self.store.load_snapshot(key) {
            Ok(Some(image)) => image,
            Ok(None) => {
                debug!(key = %key, "no stored snapshot");
                return Ok(conn);
            }
            Err(StorageError::CorruptSnapshot { reason, .. }) => {
                warn!(key = %key, reason = %reason, "stored snapshot is unreadable, starting empty");
                self.store.discard_snapshot(key)?;
                return Ok(conn);
            }
            Err(e) => return Err(e.into()),
        };

        match engine::import_image(&mut conn, &image) {
            Ok(()) => Ok(conn),
            Err(e) => {
                warn!(key = %key, error = %e, "stored snapshot is not a usable database, starting empty");
                self.store.discard_snapshot(key)?;
                Ok(source.open()?)
            }
        }
    }

    /// The working connection, or `NotInitialized`.
    pub(crate) fn conn(&self) -> Result<&Connection> {
        self.conn.as_ref().ok_or(InventoryError::NotInitialized)
    }

    pub(crate) fn conn_mut(&mut self) -> Result<&mut Connection> {
        self.conn.as_mut().ok_or(InventoryError::NotInitialized)
    }

    /// Write the full database image to the snapshot store.
    pub fn flush(&self) -> Result<()> {
        flush_image(&self.store, &self.config.snapshot_key, self.conn()?)
    }
}

fn flush_image(store: &Storage, key: &str, conn: &Connection) -> Result<()> {
    let image = engine::export_image(conn)?;
    store.save_snapshot(key, &image)?;
    debug!(key, bytes = image.len(), "snapshot flushed");
    Ok(())
}
