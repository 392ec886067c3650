//! Purchase order sub-ledger. Orders never affect stock.

use crate::inventory::{Inventory, InventoryError, Result};
use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};
use stockledger_core::{NewOrder, Order, OrderStatus};
use stockledger_storage::RowExt;
use tracing::{info, warn};

impl Inventory {
    /// Create a purchase order. Returns the new id.
    pub fn add_order(&mut self, order: &NewOrder) -> Result<i64> {
        order.validate()?;
        let conn = self.conn()?;

        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM orders WHERE order_number = ?1)",
            [&order.order_number],
            |row| row.get(0),
        )?;
        if exists {
            return Err(InventoryError::DuplicateOrderNumber(order.order_number.clone()));
        }

        conn.execute(
            "INSERT INTO orders (
                order_number, supplier, status, total_amount, order_date, expected_date, operator, remark
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                order.order_number,
                order.supplier,
                order.status.as_str(),
                order.total_amount,
                order.order_date,
                order.expected_date,
                order.operator,
                order.remark,
            ],
        )?;
        let id = conn.last_insert_rowid();
        info!(id, order_number = %order.order_number, "order added");

        self.flush()?;
        Ok(id)
    }

    /// All orders, newest first.
    pub fn list_orders(&self) -> Result<Vec<Order>> {
        let mut stmt = self
            .conn()?
            .prepare("SELECT * FROM orders ORDER BY created_at DESC, id DESC")?;
        let orders = stmt
            .query_map([], order_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(orders)
    }

    pub fn get_order(&self, id: i64) -> Result<Option<Order>> {
        let order = self
            .conn()?
            .query_row("SELECT * FROM orders WHERE id = ?1", [id], order_from_row)
            .optional()?;
        Ok(order)
    }

    /// Move an order to `status`, stamping `actual_date` when one is given.
    ///
    /// Orders in a configured terminal status cannot change, and neither can
    /// orders whose stored status is not recognised.
    pub fn update_order_status(
        &mut self,
        id: i64,
        status: OrderStatus,
        actual_date: Option<NaiveDate>,
    ) -> Result<()> {
        let stored: Option<String> = self
            .conn()?
            .query_row("SELECT status FROM orders WHERE id = ?1", [id], |row| row.opt_text("status"))
            .optional()?
            .ok_or(InventoryError::OrderNotFound(id))?;
        let current = match stored {
            Some(raw) => raw.parse::<OrderStatus>()?,
            None => OrderStatus::default(),
        };
        current.transition(status, &self.config().terminal_statuses)?;

        self.conn()?.execute(
            "UPDATE orders
             SET status = ?1, actual_date = COALESCE(?2, actual_date), updated_at = CURRENT_TIMESTAMP
             WHERE id = ?3",
            params![status.as_str(), actual_date, id],
        )?;
        info!(id, from = %current, to = %status, "order status changed");

        self.flush()
    }
}

fn order_from_row(row: &Row<'_>) -> rusqlite::Result<Order> {
    let id = row.int_or_zero("id")?;
    // Listed as pending; `update_order_status` refuses to move such an order.
    let status = match row.opt_text("status")? {
        Some(raw) => raw.parse::<OrderStatus>().unwrap_or_else(|_| {
            warn!(id, status = %raw, "unrecognised order status");
            OrderStatus::default()
        }),
        None => OrderStatus::default(),
    };

    Ok(Order {
        id,
        order_number: row.text_or_default("order_number")?,
        supplier: row.text_or_default("supplier")?,
        status,
        total_amount: row.real_or_zero("total_amount")?,
        order_date: row.opt_date("order_date")?,
        expected_date: row.opt_date("expected_date")?,
        actual_date: row.opt_date("actual_date")?,
        operator: row.text_or_default("operator")?,
        remark: row.text_or_default("remark")?,
        created_at: row.opt_timestamp("created_at")?,
        updated_at: row.opt_timestamp("updated_at")?,
    })
}
