//! Purchase orders.
//!
//! Orders form a separate ledger: they never touch material stock.

use crate::validate::{require, ValidationError};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a purchase order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Approved,
    Fulfilled,
    Cancelled,
}

impl OrderStatus {
    /// Terminal states when the caller does not configure its own.
    pub const DEFAULT_TERMINAL: [OrderStatus; 2] = [OrderStatus::Fulfilled, OrderStatus::Cancelled];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Approved => "approved",
            OrderStatus::Fulfilled => "fulfilled",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Check a transition against the given terminal set.
    ///
    /// Any status may move to a different one unless it is terminal.
    pub fn transition(self, next: OrderStatus, terminal: &[OrderStatus]) -> Result<OrderStatus, ValidationError> {
        if terminal.contains(&self) || self == next {
            return Err(ValidationError::InvalidTransition {
                from: self.to_string(),
                to: next.to_string(),
            });
        }
        Ok(next)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "approved" => Ok(OrderStatus::Approved),
            "fulfilled" | "completed" => Ok(OrderStatus::Fulfilled),
            "cancelled" | "canceled" => Ok(OrderStatus::Cancelled),
            other => Err(ValidationError::UnknownStatus(other.to_string())),
        }
    }
}

/// A purchase order to be created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub order_number: String,
    pub supplier: String,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub total_amount: f64,
    pub order_date: NaiveDate,
    #[serde(default)]
    pub expected_date: Option<NaiveDate>,
    pub operator: String,
    #[serde(default)]
    pub remark: String,
}

impl NewOrder {
    pub fn new(
        order_number: impl Into<String>,
        supplier: impl Into<String>,
        order_date: NaiveDate,
        operator: impl Into<String>,
    ) -> Self {
        Self {
            order_number: order_number.into(),
            supplier: supplier.into(),
            status: OrderStatus::Pending,
            total_amount: 0.0,
            order_date,
            expected_date: None,
            operator: operator.into(),
            remark: String::new(),
        }
    }

    pub fn with_total_amount(mut self, total_amount: f64) -> Self {
        self.total_amount = total_amount;
        self
    }

    pub fn with_expected_date(mut self, expected_date: NaiveDate) -> Self {
        self.expected_date = Some(expected_date);
        self
    }

    pub fn with_remark(mut self, remark: impl Into<String>) -> Self {
        self.remark = remark.into();
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require("order_number", &self.order_number)?;
        require("supplier", &self.supplier)?;
        require("operator", &self.operator)
    }
}

/// A stored purchase order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_number: String,
    pub supplier: String,
    pub status: OrderStatus,
    pub total_amount: f64,
    pub order_date: Option<NaiveDate>,
    pub expected_date: Option<NaiveDate>,
    pub actual_date: Option<NaiveDate>,
    pub operator: String,
    pub remark: String,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}
