//! Inventory ledger for stockledger.
//!
//! This crate ties the domain types and storage layer into one handle:
//! - **Inventory**: startup, snapshot restore and flush-after-write
//! - **Materials**: material CRUD and the stock counter
//! - **Movements**: inbound/outbound records applied to stock atomically
//! - **Orders**: purchase orders with a status state machine
//! - **Queries**: lookups, search, low stock and valuation
//!
//! # Example
//!
//! ```rust,no_run
//! use stockledger_core::{MaterialFields, NewInbound, NewOutbound};
//! use stockledger_ledger::{Inventory, InventoryConfig};
//! use stockledger_storage::Storage;
//!
//! // Setup storage
//! let storage = Storage::open("./inventory_data").unwrap();
//!
//! // Open the inventory, restoring the last snapshot
//! let mut inventory = Inventory::open(storage, InventoryConfig::default()).unwrap();
//!
//! // Register a material and move some stock
//! let bolt = inventory
//!     .add_material(&MaterialFields::new("Bolt", "Hardware", "pcs").with_thresholds(10, 0))
//!     .unwrap();
//! inventory.record_inbound(&NewInbound::new(bolt, 50, "alice")).unwrap();
//! inventory.record_outbound(&NewOutbound::new(bolt, 45, "bob", "alice")).unwrap();
//!
//! assert_eq!(inventory.low_stock_materials().unwrap().len(), 1);
//! ```

pub mod config;
pub mod inventory;
pub mod materials;
pub mod movements;
pub mod orders;
pub mod query;

// Re-export commonly used types
pub use config::InventoryConfig;
pub use inventory::{Inventory, InventoryError, Result};
