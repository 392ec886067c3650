//! Read-only views over materials. Nothing here writes or flushes.

use crate::inventory::{Inventory, Result};
use crate::materials::material_from_row;
use crate::movements::to_sql_limit;
use rusqlite::OptionalExtension;
use stockledger_core::{Material, Statistics};

impl Inventory {
    /// All materials, ordered by name.
    pub fn list_materials(&self) -> Result<Vec<Material>> {
        let mut stmt = self
            .conn()?
            .prepare("SELECT * FROM materials ORDER BY name, id")?;
        let materials = stmt
            .query_map([], material_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(materials)
    }

    pub fn get_material(&self, id: i64) -> Result<Option<Material>> {
        let material = self
            .conn()?
            .query_row("SELECT * FROM materials WHERE id = ?1", [id], material_from_row)
            .optional()?;
        Ok(material)
    }

    /// First material carrying `code`. Codes are not unique.
    pub fn get_material_by_code(&self, code: &str) -> Result<Option<Material>> {
        let material = self
            .conn()?
            .query_row(
                "SELECT * FROM materials WHERE material_code = ?1 ORDER BY id LIMIT 1",
                [code],
                material_from_row,
            )
            .optional()?;
        Ok(material)
    }

    /// Materials whose code or name contains `keyword`, ordered by name.
    ///
    /// Matching follows SQLite `LIKE` (ASCII case-insensitive). At most
    /// `search_limit` results are returned.
    pub fn search_materials(&self, keyword: &str) -> Result<Vec<Material>> {
        let pattern = format!("%{keyword}%");
        let mut stmt = self.conn()?.prepare(
            "SELECT * FROM materials
             WHERE material_code LIKE ?1 OR name LIKE ?1
             ORDER BY name, id
             LIMIT ?2",
        )?;
        let materials = stmt
            .query_map(
                rusqlite::params![pattern, to_sql_limit(self.config().search_limit)],
                material_from_row,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(materials)
    }

    /// Materials at or below their minimum stock.
    pub fn low_stock_materials(&self) -> Result<Vec<Material>> {
        let mut stmt = self.conn()?.prepare(
            "SELECT * FROM materials WHERE current_stock <= min_stock ORDER BY name, id",
        )?;
        let materials = stmt
            .query_map([], material_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(materials)
    }

    /// Material count, low-stock count and stock valuation.
    pub fn statistics(&self) -> Result<Statistics> {
        let stats = self.conn()?.query_row(
            "SELECT
                COUNT(*),
                COALESCE(SUM(CASE WHEN current_stock <= min_stock THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(current_stock * unit_price), 0.0)
             FROM materials",
            [],
            |row| {
                Ok(Statistics {
                    total_materials: row.get(0)?,
                    low_stock_count: row.get(1)?,
                    total_value: row.get(2)?,
                })
            },
        )?;
        Ok(stats)
    }
}
