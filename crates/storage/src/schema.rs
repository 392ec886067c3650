//! Table definitions and schema migration.
//!
//! The schema version is tracked in `PRAGMA user_version`. Images written
//! before versioning existed carry version 0; for those the materials table is
//! introspected and, when it lacks a required column, rebuilt in place with its
//! rows backfilled under the current column set.

use crate::coerce;
use crate::db::{Result, StorageError};
use rusqlite::types::Value;
use rusqlite::{params, Connection};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Schema version written by this build.
pub const CURRENT_VERSION: i64 = 1;

/// Columns whose absence marks an outdated materials table.
pub const REQUIRED_MATERIAL_COLUMNS: [&str; 3] = ["material_code", "location", "supplier"];

const MATERIALS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS materials (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        material_code TEXT,
        name TEXT NOT NULL,
        category TEXT NOT NULL,
        specification TEXT,
        unit TEXT NOT NULL,
        current_stock INTEGER DEFAULT 0,
        min_stock INTEGER DEFAULT 0,
        max_stock INTEGER DEFAULT 0,
        unit_price REAL DEFAULT 0,
        location TEXT,
        supplier TEXT,
        remark TEXT,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
        updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
    );";

const MOVEMENT_AND_ORDER_TABLES: &str = "
    CREATE TABLE IF NOT EXISTS inbound_records (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        material_id INTEGER NOT NULL,
        quantity INTEGER NOT NULL,
        unit_price REAL DEFAULT 0,
        total_amount REAL DEFAULT 0,
        supplier TEXT,
        batch_number TEXT,
        production_date DATE,
        expiry_date DATE,
        operator TEXT NOT NULL,
        remark TEXT,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY (material_id) REFERENCES materials(id)
    );

    CREATE TABLE IF NOT EXISTS outbound_records (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        material_id INTEGER NOT NULL,
        quantity INTEGER NOT NULL,
        purpose TEXT,
        department TEXT,
        recipient TEXT NOT NULL,
        operator TEXT NOT NULL,
        remark TEXT,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY (material_id) REFERENCES materials(id)
    );

    CREATE TABLE IF NOT EXISTS orders (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        order_number TEXT UNIQUE NOT NULL,
        supplier TEXT NOT NULL,
        status TEXT DEFAULT 'pending',
        total_amount REAL DEFAULT 0,
        order_date DATE NOT NULL,
        expected_date DATE,
        actual_date DATE,
        operator TEXT NOT NULL,
        remark TEXT,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
        updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
    );";

const BACKFILL_MATERIAL: &str = "
    INSERT INTO materials (
        id, material_code, name, category, specification, unit,
        current_stock, min_stock, max_stock, unit_price,
        location, supplier, remark, created_at, updated_at
    ) VALUES (
        ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
        COALESCE(?14, CURRENT_TIMESTAMP), COALESCE(?15, CURRENT_TIMESTAMP)
    )";

/// What `ensure_schema` had to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaOutcome {
    /// The image was already at the current version.
    Current,
    /// No materials table existed; all tables were created.
    Created,
    /// An unversioned image already had every required column.
    Stamped,
    /// The materials table was rebuilt; `rows` rows were backfilled.
    Rebuilt { rows: usize },
}

impl SchemaOutcome {
    /// Whether the image changed and needs to be persisted.
    pub fn is_changed(&self) -> bool {
        !matches!(self, SchemaOutcome::Current)
    }
}

/// Owns the table definitions for one connection.
pub struct Schema<'a> {
    conn: &'a Connection,
}

impl<'a> Schema<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Bring the schema to [`CURRENT_VERSION`]. Idempotent.
    pub fn ensure_schema(&self) -> Result<SchemaOutcome> {
        let mut version = self.version()?;
        if version > CURRENT_VERSION {
            return Err(StorageError::UnsupportedSchemaVersion {
                found: version,
                supported: CURRENT_VERSION,
            });
        }
        if version == CURRENT_VERSION {
            self.create_tables()?;
            debug!(version, "schema is current");
            return Ok(SchemaOutcome::Current);
        }

        let mut outcome = SchemaOutcome::Stamped;
        while version < CURRENT_VERSION {
            outcome = match version {
                0 => self.upgrade_unversioned()?,
                other => {
                    return Err(StorageError::UnsupportedSchemaVersion {
                        found: other,
                        supported: CURRENT_VERSION,
                    })
                }
            };
            version += 1;
            self.set_version(version)?;
        }
        info!(version, ?outcome, "schema upgraded");
        Ok(outcome)
    }

    /// Read the version tag.
    pub fn version(&self) -> Result<i64> {
        Ok(self.conn.query_row("PRAGMA user_version", [], |row| row.get(0))?)
    }

    fn set_version(&self, version: i64) -> Result<()> {
        self.conn.execute_batch(&format!("PRAGMA user_version = {version}"))?;
        Ok(())
    }

    /// Check if a table exists.
    pub fn table_exists(&self, table: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Column names of a table, in declaration order.
    pub fn columns(&self, table: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(&format!("PRAGMA table_info({table})"))?;
        let columns = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(columns)
    }

    /// Required material columns missing from the current table.
    pub fn missing_material_columns(&self) -> Result<Vec<&'static str>> {
        let columns = self.columns("materials")?;
        Ok(REQUIRED_MATERIAL_COLUMNS
            .into_iter()
            .filter(|required| !columns.iter().any(|c| c == required))
            .collect())
    }

    /// Create every table that does not exist yet.
    pub fn create_tables(&self) -> Result<()> {
        self.conn.execute_batch(MATERIALS_TABLE)?;
        self.conn.execute_batch(MOVEMENT_AND_ORDER_TABLES)?;
        Ok(())
    }

    /// Version 0 → 1: introspect the materials table and rebuild it if needed.
    fn upgrade_unversioned(&self) -> Result<SchemaOutcome> {
        if !self.table_exists("materials")? {
            self.create_tables()?;
            info!("created inventory tables");
            return Ok(SchemaOutcome::Created);
        }

        let outcome = if rebuild_needed(self.missing_material_columns()) {
            retry_once(|| self.rebuild_materials())?
        } else {
            SchemaOutcome::Stamped
        };
        self.create_tables()?;
        Ok(outcome)
    }

    /// Drop and recreate the materials table, restoring every existing row.
    ///
    /// Runs in one transaction: on failure the old table is left untouched.
    pub fn rebuild_materials(&self) -> Result<SchemaOutcome> {
        let backup = self.backup_materials()?;
        info!(rows = backup.len(), "backed up materials");

        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DROP TABLE IF EXISTS materials", [])?;
        tx.execute_batch(MATERIALS_TABLE)?;
        {
            let mut stmt = tx.prepare(BACKFILL_MATERIAL)?;
            for row in &backup {
                let material = BackfillRow::from_legacy(row);
                stmt.execute(params![
                    material.id,
                    material.code,
                    material.name,
                    material.category,
                    material.specification,
                    material.unit,
                    material.current_stock,
                    material.min_stock,
                    material.max_stock,
                    material.unit_price,
                    material.location,
                    material.supplier,
                    material.remark,
                    material.created_at,
                    material.updated_at,
                ])?;
            }
        }
        tx.commit()?;

        info!(rows = backup.len(), "materials table rebuilt");
        Ok(SchemaOutcome::Rebuilt { rows: backup.len() })
    }

    /// Read every materials row into memory, keyed by column name.
    ///
    /// A failed read yields no rows only if the table was not confirmed to
    /// hold any; otherwise the error is returned.
    fn backup_materials(&self) -> Result<Vec<LegacyRow>> {
        let read = self.read_all("materials");
        if read.is_ok() {
            return read;
        }
        let confirmed: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM materials", [], |row| row.get(0))
            .unwrap_or(0);
        recover_backup(read, confirmed)
    }

    fn read_all(&self, table: &str) -> Result<Vec<LegacyRow>> {
        let mut stmt = self.conn.prepare(&format!("SELECT * FROM {table}"))?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let rows = stmt
            .query_map([], |row| {
                let mut values = HashMap::with_capacity(names.len());
                for (i, name) in names.iter().enumerate() {
                    values.insert(name.clone(), Value::from(row.get_ref(i)?));
                }
                Ok(values)
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

/// Whether the introspection result calls for a rebuild.
///
/// A table that cannot be introspected is rebuilt as if it were outdated.
fn rebuild_needed(introspection: Result<Vec<&'static str>>) -> bool {
    match introspection {
        Ok(missing) if missing.is_empty() => {
            debug!("materials table has every required column");
            false
        }
        Ok(missing) => {
            info!(?missing, "materials table is outdated, rebuilding");
            true
        }
        Err(e) => {
            warn!(error = %e, "materials table introspection failed, rebuilding");
            true
        }
    }
}

/// Run `op`, and once more if it fails. The second error is returned.
fn retry_once<T>(mut op: impl FnMut() -> Result<T>) -> Result<T> {
    op().or_else(|e| {
        warn!(error = %e, "materials rebuild failed, retrying");
        op()
    })
}

/// Settle a failed backup read. Zero rows are only accepted when the table
/// was not confirmed to hold any.
fn recover_backup(read: Result<Vec<LegacyRow>>, confirmed: i64) -> Result<Vec<LegacyRow>> {
    match read {
        Ok(rows) => Ok(rows),
        Err(e) if confirmed > 0 => Err(e),
        Err(e) => {
            warn!(error = %e, "no readable materials to back up");
            Ok(Vec::new())
        }
    }
}

/// A materials row from an older table, by column name.
type LegacyRow = HashMap<String, Value>;

/// A legacy row mapped onto the current column set.
#[derive(Debug, Clone, PartialEq)]
struct BackfillRow {
    id: Option<i64>,
    code: String,
    name: String,
    category: String,
    specification: String,
    unit: String,
    current_stock: i64,
    min_stock: i64,
    max_stock: i64,
    unit_price: f64,
    location: String,
    supplier: String,
    remark: String,
    created_at: Option<String>,
    updated_at: Option<String>,
}

impl BackfillRow {
    fn from_legacy(row: &LegacyRow) -> Self {
        let text = |column: &str| row.get(column).and_then(coerce::text);
        let int = |column: &str| row.get(column).and_then(coerce::integer).unwrap_or(0);
        let stamp = |column: &str| {
            row.get(column)
                .and_then(coerce::timestamp)
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        };

        Self {
            id: row.get("id").and_then(coerce::integer),
            code: text("material_code").or_else(|| text("code")).unwrap_or_default(),
            name: text("name").unwrap_or_default(),
            category: text("category").unwrap_or_default(),
            specification: text("specification").unwrap_or_default(),
            unit: text("unit").unwrap_or_default(),
            current_stock: int("current_stock"),
            min_stock: int("min_stock"),
            max_stock: int("max_stock"),
            unit_price: row.get("unit_price").and_then(coerce::real).unwrap_or(0.0),
            location: text("location").unwrap_or_default(),
            supplier: text("supplier").unwrap_or_default(),
            remark: text("remark").unwrap_or_default(),
            created_at: stamp("created_at"),
            updated_at: stamp("updated_at"),
        }
    }
}
