//! Inbound and outbound stock movements.
//!
//! Movements are append-only. Each one carries a signed stock delta that the
//! ledger applies to the owning material in the same write:
//! inbound adds its quantity, outbound removes the absolute value of its
//! quantity whatever sign the caller supplied.

use crate::validate::{require, ValidationError};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Anything that moves stock in or out of a material.
pub trait StockMovement {
    /// The material whose counter this movement changes.
    fn material_id(&self) -> i64;

    /// Signed change to apply to `current_stock`.
    fn stock_delta(&self) -> i64;
}

/// A goods receipt to be recorded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewInbound {
    pub material_id: i64,
    pub quantity: i64,
    pub unit_price: f64,
    pub total_amount: f64,
    pub supplier: String,
    pub batch_number: String,
    pub production_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub operator: String,
    pub remark: String,
}

impl NewInbound {
    pub fn new(material_id: i64, quantity: i64, operator: impl Into<String>) -> Self {
        Self {
            material_id,
            quantity,
            operator: operator.into(),
            ..Self::default()
        }
    }

    /// Set the unit price. Unless a total was already given, the total
    /// amount follows from the quantity.
    pub fn with_unit_price(mut self, unit_price: f64) -> Self {
        self.unit_price = unit_price;
        if self.total_amount == 0.0 {
            self.total_amount = unit_price * self.quantity as f64;
        }
        self
    }

    /// Set the total amount as invoiced, independent of the unit price.
    pub fn with_total_amount(mut self, total_amount: f64) -> Self {
        self.total_amount = total_amount;
        self
    }

    pub fn with_supplier(mut self, supplier: impl Into<String>) -> Self {
        self.supplier = supplier.into();
        self
    }

    pub fn with_batch(
        mut self,
        batch_number: impl Into<String>,
        production_date: Option<NaiveDate>,
        expiry_date: Option<NaiveDate>,
    ) -> Self {
        self.batch_number = batch_number.into();
        self.production_date = production_date;
        self.expiry_date = expiry_date;
        self
    }

    pub fn with_remark(mut self, remark: impl Into<String>) -> Self {
        self.remark = remark.into();
        self
    }

    /// Inbound quantities must be positive and an operator must be named.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.quantity <= 0 {
            return Err(ValidationError::NonPositiveQuantity(self.quantity));
        }
        require("operator", &self.operator)
    }
}

impl StockMovement for NewInbound {
    fn material_id(&self) -> i64 {
        self.material_id
    }

    fn stock_delta(&self) -> i64 {
        self.quantity
    }
}

/// A goods issue to be recorded.
///
/// The quantity is not sign-checked; see [`StockMovement::stock_delta`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewOutbound {
    pub material_id: i64,
    pub quantity: i64,
    pub purpose: String,
    pub department: String,
    pub recipient: String,
    pub operator: String,
    pub remark: String,
}

impl NewOutbound {
    pub fn new(
        material_id: i64,
        quantity: i64,
        recipient: impl Into<String>,
        operator: impl Into<String>,
    ) -> Self {
        Self {
            material_id,
            quantity,
            recipient: recipient.into(),
            operator: operator.into(),
            ..Self::default()
        }
    }

    pub fn with_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = purpose.into();
        self
    }

    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = department.into();
        self
    }

    pub fn with_remark(mut self, remark: impl Into<String>) -> Self {
        self.remark = remark.into();
        self
    }

    /// Recipient and operator are required; the quantity is left to the caller.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("recipient", &self.recipient)?;
        require("operator", &self.operator)
    }
}

impl StockMovement for NewOutbound {
    fn material_id(&self) -> i64 {
        self.material_id
    }

    fn stock_delta(&self) -> i64 {
        -self.quantity.saturating_abs()
    }
}

/// A stored inbound movement joined with its material's display fields.
///
/// The display fields are `None` when the material has since been deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundRecord {
    pub id: i64,
    pub material_id: i64,
    pub quantity: i64,
    pub unit_price: f64,
    pub total_amount: f64,
    pub supplier: String,
    pub batch_number: String,
    pub production_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub operator: String,
    pub remark: String,
    pub created_at: Option<NaiveDateTime>,
    pub material_name: Option<String>,
    pub unit: Option<String>,
    pub category: Option<String>,
}

/// A stored outbound movement joined with its material's display fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundRecord {
    pub id: i64,
    pub material_id: i64,
    pub quantity: i64,
    pub purpose: String,
    pub department: String,
    pub recipient: String,
    pub operator: String,
    pub remark: String,
    pub created_at: Option<NaiveDateTime>,
    pub material_name: Option<String>,
    pub unit: Option<String>,
    pub category: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inbound_delta_is_quantity() {
        let inbound = NewInbound::new(7, 50, "A");
        assert_eq!(inbound.material_id(), 7);
        assert_eq!(inbound.stock_delta(), 50);
    }

    #[test]
    fn test_outbound_delta_ignores_sign() {
        let positive = NewOutbound::new(1, 5, "B", "A");
        let negative = NewOutbound::new(1, -5, "B", "A");
        assert_eq!(positive.stock_delta(), -5);
        assert_eq!(negative.stock_delta(), -5);
        assert_eq!(NewOutbound::new(1, 0, "B", "A").stock_delta(), 0);
    }

    #[test]
    fn test_outbound_delta_does_not_overflow() {
        let extreme = NewOutbound::new(1, i64::MIN, "B", "A");
        assert_eq!(extreme.stock_delta(), -i64::MAX);
    }

    #[test]
    fn test_inbound_validation() {
        assert!(NewInbound::new(1, 1, "A").validate().is_ok());
        assert_eq!(
            NewInbound::new(1, 0, "A").validate(),
            Err(ValidationError::NonPositiveQuantity(0))
        );
        assert_eq!(
            NewInbound::new(1, -4, "A").validate(),
            Err(ValidationError::NonPositiveQuantity(-4))
        );
        assert_eq!(
            NewInbound::new(1, 3, "").validate(),
            Err(ValidationError::MissingField("operator"))
        );
    }

    #[test]
    fn test_outbound_validation_allows_any_quantity() {
        assert!(NewOutbound::new(1, -5, "B", "A").validate().is_ok());
        assert!(NewOutbound::new(1, 0, "B", "A").validate().is_ok());
        assert_eq!(
            NewOutbound::new(1, 5, "", "A").validate(),
            Err(ValidationError::MissingField("recipient"))
        );
        assert_eq!(
            NewOutbound::new(1, 5, "B", " ").validate(),
            Err(ValidationError::MissingField("operator"))
        );
    }

    #[test]
    fn test_unit_price_sets_total() {
        let inbound = NewInbound::new(1, 4, "A").with_unit_price(2.5);
        assert_eq!(inbound.total_amount, 10.0);
    }

    #[test]
    fn test_explicit_total_is_kept() {
        let before = NewInbound::new(1, 4, "A").with_total_amount(9.0).with_unit_price(2.5);
        assert_eq!(before.unit_price, 2.5);
        assert_eq!(before.total_amount, 9.0);

        let after = NewInbound::new(1, 4, "A").with_unit_price(2.5).with_total_amount(9.0);
        assert_eq!(after.total_amount, 9.0);
    }
}
