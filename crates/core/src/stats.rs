//! Inventory-wide aggregates.

use serde::{Deserialize, Serialize};

/// Summary figures over all materials.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    /// Number of materials, including those without a price.
    pub total_materials: i64,
    /// Materials at or below their minimum stock.
    pub low_stock_count: i64,
    /// Sum of `current_stock * unit_price`.
    pub total_value: f64,
}
