//! SQLite engine sources and image export/import.
//!
//! An [`EngineSource`] knows how to open a connection. Startup walks an
//! ordered list of sources and keeps the first one that opens. Whatever the
//! source, the working database is loaded from and saved to the snapshot
//! store as a complete SQLite file image.

use crate::db::{Result, StorageError};
use rusqlite::backup::Progress;
use rusqlite::{Connection, DatabaseName, OpenFlags};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// File name used for the scratch copy of an image.
const IMAGE_FILE: &str = "image.sqlite";

/// A place an engine connection can be opened from.
pub trait EngineSource {
    /// Name used in diagnostics.
    fn name(&self) -> &str;

    /// Open a fresh, empty-or-existing connection.
    fn open(&self) -> Result<Connection>;
}

/// Private in-memory database. The default source.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryEngine;

impl EngineSource for MemoryEngine {
    fn name(&self) -> &str {
        "memory"
    }

    fn open(&self) -> Result<Connection> {
        Ok(Connection::open_in_memory()?)
    }
}

/// Database backed by a working file.
///
/// The file is only a working copy: its contents are replaced from the
/// snapshot store at startup.
#[derive(Debug, Clone)]
pub struct FileEngine {
    path: PathBuf,
    name: String,
}

impl FileEngine {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = format!("file:{}", path.display());
        Self { path, name }
    }
}

impl EngineSource for FileEngine {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&self) -> Result<Connection> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE;
        Connection::open_with_flags(&self.path, flags).map_err(|e| StorageError::EngineUnavailable {
            source_name: self.name.clone(),
            reason: e.to_string(),
        })
    }
}

/// Serialize the main database of `conn` into a standalone SQLite image.
pub fn export_image(conn: &Connection) -> Result<Vec<u8>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join(IMAGE_FILE);
    conn.backup(DatabaseName::Main, &path, None)?;
    let image = fs::read(&path)?;
    debug!(bytes = image.len(), "exported database image");
    Ok(image)
}

/// Replace the main database of `conn` with the given image.
///
/// The image is checked before it is restored. Bytes that are not a SQLite
/// database fail with an SQLite error, an image with damaged pages fails with
/// `CorruptImage`; either way `conn` is left unchanged.
pub fn import_image(conn: &mut Connection, image: &[u8]) -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join(IMAGE_FILE);
    fs::write(&path, image)?;
    check_integrity(&Connection::open_with_flags(&path, OpenFlags::SQLITE_OPEN_READ_ONLY)?)?;
    conn.restore(DatabaseName::Main, &path, None::<fn(Progress)>)?;
    debug!(bytes = image.len(), "imported database image");
    Ok(())
}

/// Run `PRAGMA quick_check` over the main database.
pub fn check_integrity(conn: &Connection) -> Result<()> {
    let mut stmt = conn.prepare("PRAGMA quick_check")?;
    let problems = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    match problems.as_slice() {
        [ok] if ok == "ok" => Ok(()),
        _ => Err(StorageError::CorruptImage(problems.join("; "))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_engine_opens() {
        let conn = MemoryEngine.open().unwrap();
        let one: i64 = conn.query_row("SELECT 1", [], |row| row.get(0)).unwrap();
        assert_eq!(one, 1);
    }

    #[test]
    fn test_file_engine_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let engine = FileEngine::new(dir.path().join("missing").join("db.sqlite"));
        assert!(matches!(
            engine.open(),
            Err(StorageError::EngineUnavailable { .. })
        ));
    }

    #[test]
    fn test_image_round_trip() {
        let conn = MemoryEngine.open().unwrap();
        conn.execute_batch(
            "CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT);
             INSERT INTO items (name) VALUES ('bolt'), ('nut');",
        )
        .unwrap();

        let image = export_image(&conn).unwrap();
        assert!(image.starts_with(b"SQLite format 3\0"));

        let mut restored = MemoryEngine.open().unwrap();
        import_image(&mut restored, &image).unwrap();
        let count: i64 = restored
            .query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 2);
    }

    /// An image whose header is intact but whose table pages are overwritten.
    fn damaged_image() -> Vec<u8> {
        let conn = MemoryEngine.open().unwrap();
        conn.execute_batch(
            "CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT);
             WITH RECURSIVE n(i) AS (SELECT 1 UNION ALL SELECT i + 1 FROM n WHERE i < 400)
             INSERT INTO items (name) SELECT printf('item %04d with a fairly long name', i) FROM n;",
        )
        .unwrap();
        let mut image = export_image(&conn).unwrap();
        assert!(image.len() > 16384);
        image[4096..16384].fill(0xAB);
        image
    }

    #[test]
    fn test_import_rejects_damaged_pages() {
        let mut conn = MemoryEngine.open().unwrap();
        conn.execute_batch("CREATE TABLE kept (id INTEGER PRIMARY KEY)").unwrap();

        assert!(import_image(&mut conn, &damaged_image()).is_err());

        // The connection still holds its own database
        let kept: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE name = 'kept'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(kept, 1);
    }

    #[test]
    fn test_check_integrity_accepts_healthy_database() {
        let conn = MemoryEngine.open().unwrap();
        conn.execute_batch("CREATE TABLE items (id INTEGER PRIMARY KEY)").unwrap();
        check_integrity(&conn).unwrap();
    }

    #[test]
    fn test_import_rejects_garbage() {
        let mut conn = MemoryEngine.open().unwrap();
        let garbage = vec![0x42; 4096];
        assert!(matches!(
            import_image(&mut conn, &garbage),
            Err(StorageError::Sqlite(_))
        ));
    }
}
