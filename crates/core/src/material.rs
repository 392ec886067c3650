//! Material records and their editable field set.

use crate::validate::{require, ValidationError};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A trackable inventory item as stored in the ledger.
///
/// `current_stock` is denormalized: it only ever changes through stock
/// movements, never through a field edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Surrogate key assigned by the engine.
    pub id: i64,
    /// Human-assigned code. Not unique; absent on rows migrated from old images.
    pub code: Option<String>,
    pub name: String,
    pub category: String,
    pub specification: String,
    pub unit: String,
    /// Running stock level. May be negative after an over-issue.
    pub current_stock: i64,
    pub min_stock: i64,
    pub max_stock: i64,
    pub unit_price: f64,
    pub location: String,
    pub supplier: String,
    pub remark: String,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

impl Material {
    /// A material is low on stock when it is at or below its minimum.
    pub fn is_low_stock(&self) -> bool {
        self.current_stock <= self.min_stock
    }

    /// Value of the stock on hand.
    pub fn stock_value(&self) -> f64 {
        self.current_stock as f64 * self.unit_price
    }

    /// The editable fields of this material, for a read-modify-update cycle.
    pub fn fields(&self) -> MaterialFields {
        MaterialFields {
            code: self.code.clone(),
            name: self.name.clone(),
            category: self.category.clone(),
            specification: self.specification.clone(),
            unit: self.unit.clone(),
            min_stock: self.min_stock,
            max_stock: self.max_stock,
            unit_price: self.unit_price,
            location: self.location.clone(),
            supplier: self.supplier.clone(),
            remark: self.remark.clone(),
        }
    }
}

/// Fields accepted when adding or updating a material.
///
/// There is deliberately no `current_stock` here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialFields {
    pub code: Option<String>,
    pub name: String,
    pub category: String,
    pub specification: String,
    pub unit: String,
    pub min_stock: i64,
    pub max_stock: i64,
    pub unit_price: f64,
    pub location: String,
    pub supplier: String,
    pub remark: String,
}

impl MaterialFields {
    /// Create a field set with the three required fields and defaults elsewhere.
    pub fn new(name: impl Into<String>, category: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            unit: unit.into(),
            ..Self::default()
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_specification(mut self, specification: impl Into<String>) -> Self {
        self.specification = specification.into();
        self
    }

    /// Set the low/high stock thresholds.
    pub fn with_thresholds(mut self, min_stock: i64, max_stock: i64) -> Self {
        self.min_stock = min_stock;
        self.max_stock = max_stock;
        self
    }

    pub fn with_unit_price(mut self, unit_price: f64) -> Self {
        self.unit_price = unit_price;
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_supplier(mut self, supplier: impl Into<String>) -> Self {
        self.supplier = supplier.into();
        self
    }

    pub fn with_remark(mut self, remark: impl Into<String>) -> Self {
        self.remark = remark.into();
        self
    }

    /// Check that name, category and unit are present.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("name", &self.name)?;
        require("category", &self.category)?;
        require("unit", &self.unit)?;
        Ok(())
    }

    /// The code as stored: an empty string when none was assigned.
    pub fn stored_code(&self) -> &str {
        self.code.as_deref().unwrap_or("")
    }
}
