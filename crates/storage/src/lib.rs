//! Persistent storage layer for stockledger.
//!
//! This crate provides everything below the ledger:
//! - Snapshot store (sled, one key holding the whole database image)
//! - Engine sources (where the SQLite connection comes from)
//! - Image export/import between a connection and raw bytes
//! - Schema management (creation, versioning, rebuild-with-backfill)
//! - Lenient value coercion for rows written by older versions
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                     Ledger Layer                         │
//! │        (Materials, Movements, Orders, Queries)           │
//! └────────────────────────┬────────────────────────────────┘
//!                          │
//! ┌────────────────────────▼────────────────────────────────┐
//! │                   Storage Layer                          │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────┐  │
//! │  │ Schema      │  │ Engine      │  │ Storage (sled)  │  │
//! │  │  - tables   │  │  - sources  │  │  - snapshot key │  │
//! │  │  - version  │  │  - export   │  │  - JSON bytes   │  │
//! │  │  - backfill │  │  - import   │  │                 │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────┘  │
//! └────────────────────────┬────────────────────────────────┘
//!                          │
//! ┌────────────────────────▼────────────────────────────────┐
//! │            SQLite (working copy) + sled (durable)        │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use stockledger_storage::{engine, EngineSource, MemoryEngine, Schema, Storage, SNAPSHOT_KEY};
//!
//! let storage = Storage::open("./inventory_data").unwrap();
//! let conn = MemoryEngine.open().unwrap();
//!
//! Schema::new(&conn).ensure_schema().unwrap();
//! let image = engine::export_image(&conn).unwrap();
//! storage.save_snapshot(SNAPSHOT_KEY, &image).unwrap();
//! ```

pub mod coerce;
pub mod db;
pub mod engine;
pub mod schema;

// Re-export commonly used types
pub use coerce::RowExt;
pub use db::{Result, Storage, StorageError, SNAPSHOT_KEY};
pub use engine::{EngineSource, FileEngine, MemoryEngine};
pub use schema::{Schema, SchemaOutcome, CURRENT_VERSION};
