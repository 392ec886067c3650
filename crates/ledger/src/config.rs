//! Inventory configuration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use stockledger_core::OrderStatus;
use stockledger_storage::SNAPSHOT_KEY;

/// Inventory configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// Key the database image is stored under.
    pub snapshot_key: String,
    /// Maximum number of results returned by a material search.
    pub search_limit: usize,
    /// Number of movements listed when no limit is given.
    pub movement_limit: usize,
    /// Order statuses that cannot be left once reached.
    pub terminal_statuses: Vec<OrderStatus>,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            snapshot_key: SNAPSHOT_KEY.to_string(),
            search_limit: 20,
            movement_limit: 100,
            terminal_statuses: OrderStatus::DEFAULT_TERMINAL.to_vec(),
        }
    }
}

impl InventoryConfig {
    /// Load a configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let raw = fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(std::io::Error::from)
    }
}
