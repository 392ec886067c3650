//! Material CRUD and the stock counter.
//!
//! `current_stock` is only ever written by [`apply_stock_delta`]: field
//! updates leave it alone, and movements go through the same statement.

use crate::inventory::{Inventory, InventoryError, Result};
use rusqlite::{params, Connection, Row};
use stockledger_core::{Material, MaterialFields};
use stockledger_storage::RowExt;
use tracing::{debug, info};

impl Inventory {
    /// Add a material. Stock starts at zero. Returns the new id.
    pub fn add_material(&mut self, fields: &MaterialFields) -> Result<i64> {
        fields.validate()?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO materials (
                material_code, name, category, specification, unit,
                current_stock, min_stock, max_stock, unit_price, location, supplier, remark
             ) VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                fields.stored_code(),
                fields.name,
                fields.category,
                fields.specification,
                fields.unit,
                fields.min_stock,
                fields.max_stock,
                fields.unit_price,
                fields.location,
                fields.supplier,
                fields.remark,
            ],
        )?;
        let id = conn.last_insert_rowid();
        info!(id, name = %fields.name, "material added");

        self.flush()?;
        Ok(id)
    }

    /// Replace every editable field of a material. Stock is not touched.
    pub fn update_material(&mut self, id: i64, fields: &MaterialFields) -> Result<()> {
        fields.validate()?;
        let changed = self.conn()?.execute(
            "UPDATE materials
             SET material_code = ?1, name = ?2, category = ?3, specification = ?4, unit = ?5,
                 min_stock = ?6, max_stock = ?7, unit_price = ?8, location = ?9, supplier = ?10,
                 remark = ?11, updated_at = CURRENT_TIMESTAMP
             WHERE id = ?12",
            params![
                fields.stored_code(),
                fields.name,
                fields.category,
                fields.specification,
                fields.unit,
                fields.min_stock,
                fields.max_stock,
                fields.unit_price,
                fields.location,
                fields.supplier,
                fields.remark,
                id,
            ],
        )?;
        if changed == 0 {
            return Err(InventoryError::MaterialNotFound(id));
        }
        debug!(id, "material updated");

        self.flush()
    }

    /// Delete a material. Its movement history is kept.
    pub fn delete_material(&mut self, id: i64) -> Result<()> {
        let changed = self
            .conn()?
            .execute("DELETE FROM materials WHERE id = ?1", [id])?;
        if changed == 0 {
            return Err(InventoryError::MaterialNotFound(id));
        }
        info!(id, "material deleted");

        self.flush()
    }

    /// Add `delta` to a material's stock. The result may be negative.
    pub fn adjust_stock(&mut self, id: i64, delta: i64) -> Result<()> {
        apply_stock_delta(self.conn()?, id, delta)?;
        self.flush()
    }
}

/// `current_stock += delta` in a single statement, stamping `updated_at`.
pub(crate) fn apply_stock_delta(conn: &Connection, id: i64, delta: i64) -> Result<()> {
    let changed = conn.execute(
        "UPDATE materials
         SET current_stock = current_stock + ?1, updated_at = CURRENT_TIMESTAMP
         WHERE id = ?2",
        params![delta, id],
    )?;
    if changed == 0 {
        return Err(InventoryError::MaterialNotFound(id));
    }
    debug!(id, delta, "stock adjusted");
    Ok(())
}

/// Map a `SELECT * FROM materials` row.
pub(crate) fn material_from_row(row: &Row<'_>) -> rusqlite::Result<Material> {
    Ok(Material {
        id: row.int_or_zero("id")?,
        code: row.opt_text("material_code")?.filter(|code| !code.is_empty()),
        name: row.text_or_default("name")?,
        category: row.text_or_default("category")?,
        specification: row.text_or_default("specification")?,
        unit: row.text_or_default("unit")?,
        current_stock: row.int_or_zero("current_stock")?,
        min_stock: row.int_or_zero("min_stock")?,
        max_stock: row.int_or_zero("max_stock")?,
        unit_price: row.real_or_zero("unit_price")?,
        location: row.text_or_default("location")?,
        supplier: row.text_or_default("supplier")?,
        remark: row.text_or_default("remark")?,
        created_at: row.opt_timestamp("created_at")?,
        updated_at: row.opt_timestamp("updated_at")?,
    })
}
