//! Inbound and outbound movements.
//!
//! Recording a movement inserts the movement row and applies its stock delta
//! inside one transaction, so a movement never exists without its effect on
//! `current_stock`. Movement rows are never updated or deleted.

use crate::inventory::{Inventory, Result};
use crate::materials::apply_stock_delta;
use rusqlite::{params, Row};
use stockledger_core::{InboundRecord, NewInbound, NewOutbound, OutboundRecord, StockMovement};
use stockledger_storage::RowExt;
use tracing::info;

impl Inventory {
    /// Record a goods receipt and add its quantity to stock.
    ///
    /// Returns the id of the movement row. A movement for a material that
    /// does not exist (or was deleted) is not recorded: the call fails with
    /// [`MaterialNotFound`](crate::InventoryError::MaterialNotFound) and the insert is rolled back.
    pub fn record_inbound(&mut self, movement: &NewInbound) -> Result<i64> {
        movement.validate()?;
        let tx = self.conn_mut()?.transaction()?;
        tx.execute(
            "INSERT INTO inbound_records (
                material_id, quantity, unit_price, total_amount, supplier, batch_number,
                production_date, expiry_date, operator, remark
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                movement.material_id,
                movement.quantity,
                movement.unit_price,
                movement.total_amount,
                movement.supplier,
                movement.batch_number,
                movement.production_date,
                movement.expiry_date,
                movement.operator,
                movement.remark,
            ],
        )?;
        let id = tx.last_insert_rowid();
        apply_stock_delta(&tx, movement.material_id(), movement.stock_delta())?;
        tx.commit()?;
        info!(id, material_id = movement.material_id, quantity = movement.quantity, "inbound recorded");

        self.flush()?;
        Ok(id)
    }

    /// Record a goods issue and remove the absolute value of its quantity from stock.
    ///
    /// The quantity is stored as a magnitude. Stock is allowed to go negative.
    /// Like [`Inventory::record_inbound`], an unknown material fails with
    /// [`MaterialNotFound`](crate::InventoryError::MaterialNotFound) and nothing is written.
    pub fn record_outbound(&mut self, movement: &NewOutbound) -> Result<i64> {
        movement.validate()?;
        let tx = self.conn_mut()?.transaction()?;
        tx.execute(
            "INSERT INTO outbound_records (
                material_id, quantity, purpose, department, recipient, operator, remark
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                movement.material_id,
                movement.quantity.saturating_abs(),
                movement.purpose,
                movement.department,
                movement.recipient,
                movement.operator,
                movement.remark,
            ],
        )?;
        let id = tx.last_insert_rowid();
        apply_stock_delta(&tx, movement.material_id(), movement.stock_delta())?;
        tx.commit()?;
        info!(id, material_id = movement.material_id, delta = movement.stock_delta(), "outbound recorded");

        self.flush()?;
        Ok(id)
    }

    /// Most recent inbound movements, newest first.
    ///
    /// Uses the configured movement limit when `limit` is `None`.
    pub fn inbound_records(&self, limit: Option<usize>) -> Result<Vec<InboundRecord>> {
        let limit = limit.unwrap_or(self.config().movement_limit);
        let mut stmt = self.conn()?.prepare(
            "SELECT ir.*, m.name AS material_name, m.unit AS material_unit, m.category AS material_category
             FROM inbound_records ir
             LEFT JOIN materials m ON ir.material_id = m.id
             ORDER BY ir.created_at DESC, ir.id DESC
             LIMIT ?1",
        )?;
        let records = stmt
            .query_map([to_sql_limit(limit)], inbound_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Most recent outbound movements, newest first.
    pub fn outbound_records(&self, limit: Option<usize>) -> Result<Vec<OutboundRecord>> {
        let limit = limit.unwrap_or(self.config().movement_limit);
        let mut stmt = self.conn()?.prepare(
            "SELECT o.*, m.name AS material_name, m.unit AS material_unit, m.category AS material_category
             FROM outbound_records o
             LEFT JOIN materials m ON o.material_id = m.id
             ORDER BY o.created_at DESC, o.id DESC
             LIMIT ?1",
        )?;
        let records = stmt
            .query_map([to_sql_limit(limit)], outbound_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }
}

/// SQLite limits are signed.
pub(crate) fn to_sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

fn inbound_from_row(row: &Row<'_>) -> rusqlite::Result<InboundRecord> {
    Ok(InboundRecord {
        id: row.int_or_zero("id")?,
        material_id: row.int_or_zero("material_id")?,
        quantity: row.int_or_zero("quantity")?,
        unit_price: row.real_or_zero("unit_price")?,
        total_amount: row.real_or_zero("total_amount")?,
        supplier: row.text_or_default("supplier")?,
        batch_number: row.text_or_default("batch_number")?,
        production_date: row.opt_date("production_date")?,
        expiry_date: row.opt_date("expiry_date")?,
        operator: row.text_or_default("operator")?,
        remark: row.text_or_default("remark")?,
        created_at: row.opt_timestamp("created_at")?,
        material_name: row.opt_text("material_name")?,
        unit: row.opt_text("material_unit")?,
        category: row.opt_text("material_category")?,
    })
}

fn outbound_from_row(row: &Row<'_>) -> rusqlite::Result<OutboundRecord> {
    Ok(OutboundRecord {
        id: row.int_or_zero("id")?,
        material_id: row.int_or_zero("material_id")?,
        quantity: row.int_or_zero("quantity")?,
        purpose: row.text_or_default("purpose")?,
        department: row.text_or_default("department")?,
        recipient: row.text_or_default("recipient")?,
        operator: row.text_or_default("operator")?,
        remark: row.text_or_default("remark")?,
        created_at: row.opt_timestamp("created_at")?,
        material_name: row.opt_text("material_name")?,
        unit: row.opt_text("material_unit")?,
        category: row.opt_text("material_category")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InventoryConfig, InventoryError};
    use chrono::NaiveDate;
    use stockledger_core::MaterialFields;
    use stockledger_storage::Storage;

    fn setup() -> (Inventory, i64) {
        let mut inventory =
            Inventory::open(Storage::open_temporary().unwrap(), InventoryConfig::default()).unwrap();
        let id = inventory
            .add_material(&MaterialFields::new("Bolt", "Hardware", "pcs").with_thresholds(10, 0))
            .unwrap();
        (inventory, id)
    }

    fn stock(inventory: &Inventory, id: i64) -> i64 {
        inventory.get_material(id).unwrap().unwrap().current_stock
    }

    #[test]
    fn test_inbound_adds_stock() {
        let (mut inventory, id) = setup();
        inventory.record_inbound(&NewInbound::new(id, 50, "A")).unwrap();
        assert_eq!(stock(&inventory, id), 50);
    }

    #[test]
    fn test_outbound_sign_is_ignored() {
        let (mut inventory, id) = setup();
        inventory.record_inbound(&NewInbound::new(id, 20, "A")).unwrap();

        inventory.record_outbound(&NewOutbound::new(id, 5, "B", "A")).unwrap();
        assert_eq!(stock(&inventory, id), 15);

        inventory.record_outbound(&NewOutbound::new(id, -5, "B", "A")).unwrap();
        assert_eq!(stock(&inventory, id), 10);

        let quantities: Vec<i64> = inventory
            .outbound_records(None)
            .unwrap()
            .iter()
            .map(|r| r.quantity)
            .collect();
        assert_eq!(quantities, vec![5, 5]);
    }

    #[test]
    fn test_outbound_can_overdraw() {
        let (mut inventory, id) = setup();
        inventory.record_outbound(&NewOutbound::new(id, 8, "B", "A")).unwrap();
        assert_eq!(stock(&inventory, id), -8);
    }

    #[test]
    fn test_invalid_inbound_changes_nothing() {
        let (mut inventory, id) = setup();
        let result = inventory.record_inbound(&NewInbound::new(id, 0, "A"));
        assert!(matches!(result, Err(InventoryError::Validation(_))));
        assert!(inventory.inbound_records(None).unwrap().is_empty());
        assert_eq!(stock(&inventory, id), 0);
    }

    #[test]
    fn test_movement_for_unknown_material_is_rolled_back() {
        let (mut inventory, _) = setup();
        let result = inventory.record_inbound(&NewInbound::new(404, 5, "A"));
        assert!(matches!(result, Err(InventoryError::MaterialNotFound(404))));
        assert!(inventory.inbound_records(None).unwrap().is_empty());

        let result = inventory.record_outbound(&NewOutbound::new(404, 5, "B", "A"));
        assert!(matches!(result, Err(InventoryError::MaterialNotFound(404))));
        assert!(inventory.outbound_records(None).unwrap().is_empty());
    }

    #[test]
    fn test_inbound_listing_fields() {
        let (mut inventory, id) = setup();
        let made = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let expires = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        inventory
            .record_inbound(
                &NewInbound::new(id, 4, "A")
                    .with_unit_price(2.5)
                    .with_supplier("Acme")
                    .with_batch("LOT-9", Some(made), Some(expires)),
            )
            .unwrap();

        let records = inventory.inbound_records(None).unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.total_amount, 10.0);
        assert_eq!(record.batch_number, "LOT-9");
        assert_eq!(record.production_date, Some(made));
        assert_eq!(record.expiry_date, Some(expires));
        assert_eq!(record.material_name.as_deref(), Some("Bolt"));
        assert_eq!(record.unit.as_deref(), Some("pcs"));
        assert_eq!(record.category.as_deref(), Some("Hardware"));
    }

    #[test]
    fn test_listing_is_newest_first_and_limited() {
        let (mut inventory, id) = setup();
        let mut ids = Vec::new();
        for quantity in 1..=5 {
            ids.push(inventory.record_inbound(&NewInbound::new(id, quantity, "A")).unwrap());
        }

        let records = inventory.inbound_records(Some(3)).unwrap();
        let listed: Vec<i64> = records.iter().map(|r| r.id).collect();
        assert_eq!(listed, vec![ids[4], ids[3], ids[2]]);
    }

    #[test]
    fn test_deleted_material_keeps_history() {
        let (mut inventory, id) = setup();
        inventory.record_inbound(&NewInbound::new(id, 10, "A")).unwrap();
        inventory
            .record_outbound(&NewOutbound::new(id, 3, "B", "A").with_department("Assembly"))
            .unwrap();

        inventory.delete_material(id).unwrap();

        let inbound = inventory.inbound_records(None).unwrap();
        assert_eq!(inbound.len(), 1);
        assert_eq!(inbound[0].material_id, id);
        assert_eq!(inbound[0].material_name, None);
        assert_eq!(inbound[0].unit, None);

        let outbound = inventory.outbound_records(None).unwrap();
        assert_eq!(outbound.len(), 1);
        assert_eq!(outbound[0].department, "Assembly");
        assert_eq!(outbound[0].category, None);
    }
}
