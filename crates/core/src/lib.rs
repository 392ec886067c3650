//! Core inventory types for stockledger.
//!
//! This crate provides the domain types shared by storage and the ledger:
//! - Materials and their editable field set
//! - Inbound/outbound stock movements and the stock delta rule
//! - Purchase orders and their status transitions
//! - Aggregate statistics
//! - Field validation

pub mod material;
pub mod movement;
pub mod order;
pub mod stats;
pub mod validate;

// Re-export commonly used types at the crate root
pub use material::{Material, MaterialFields};
pub use movement::{InboundRecord, NewInbound, NewOutbound, OutboundRecord, StockMovement};
pub use order::{NewOrder, Order, OrderStatus};
pub use stats::Statistics;
pub use validate::ValidationError;
