use crate::Result;
use rusqlite::Connection;
use std::path::Path;

/// Owns the SQLite connection backing a document store file.
pub struct Storage {
    conn: Connection,
}

impl Storage {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(Self { conn })
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;

        // Validate database structure
        let table_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master
             WHERE type='table'
             AND name IN ('documents', 'store_meta')",
            [],
            |row| row.get(0)
        )?;

        if table_count != 2 {
            return Err(crate::VoiceNotesError::InvalidStore(
                "Not a valid Voice Notes database".to_string()
            ));
        }

        // Migrate: stores written before the collection index existed
        let index_exists: bool = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master
                 WHERE type='index' AND name='idx_documents_collection'",
                [],
                |row| row.get::<_, i64>(0).map(|count| count > 0)
            )?;

        if !index_exists {
            log::info!("migrating document store: adding collection index");
            conn.execute(
                "CREATE INDEX idx_documents_collection ON documents(collection)",
                []
            )?;
        }

        Ok(Self { conn })
    }

    /// Opens `path` if it already holds a store, otherwise creates one.
    pub fn open_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let has_content = std::fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false);
        if has_content {
            Self::open(path)
        } else {
            Self::create(path)
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn table_names(storage: &Storage) -> Vec<String> {
        storage
            .connection()
            .prepare("SELECT name FROM sqlite_master WHERE type='table'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn test_create_storage() {
        let temp = NamedTempFile::new().unwrap();
        let storage = Storage::create(temp.path()).unwrap();

        let tables = table_names(&storage);
        assert!(tables.contains(&"documents".to_string()));
        assert!(tables.contains(&"store_meta".to_string()));
    }

    #[test]
    fn test_open_existing_storage() {
        let temp = NamedTempFile::new().unwrap();

        Storage::create(temp.path()).unwrap();
        let storage = Storage::open(temp.path()).unwrap();

        let version: String = storage
            .connection()
            .query_row(
                "SELECT value FROM store_meta WHERE key = 'schema_version'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(version, "1");
    }

    #[test]
    fn test_open_invalid_database() {
        let temp = NamedTempFile::new().unwrap();

        // Create empty file (not a valid Voice Notes DB)
        std::fs::write(temp.path(), "not a database").unwrap();

        let result = Storage::open(temp.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_open_or_create_on_empty_file_creates_schema() {
        let temp = NamedTempFile::new().unwrap();
        let storage = Storage::open_or_create(temp.path()).unwrap();
        assert!(table_names(&storage).contains(&"documents".to_string()));

        drop(storage);
        assert!(Storage::open_or_create(temp.path()).is_ok());
    }

    #[test]
    fn test_migration_adds_collection_index() {
        let temp = NamedTempFile::new().unwrap();

        // Create database with old schema (no index)
        {
            let conn = Connection::open(temp.path()).unwrap();
            conn.execute(
                "CREATE TABLE documents (
                    collection TEXT NOT NULL,
                    id TEXT NOT NULL,
                    fields_json TEXT NOT NULL,
                    written_at INTEGER NOT NULL,
                    PRIMARY KEY (collection, id)
                )",
                [],
            ).unwrap();
            conn.execute("CREATE TABLE store_meta (key TEXT PRIMARY KEY, value TEXT NOT NULL)", []).unwrap();
        }

        let storage = Storage::open(temp.path()).unwrap();

        let index_exists: bool = storage
            .connection()
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='index' AND name='idx_documents_collection'",
                [],
                |row| row.get::<_, i64>(0).map(|count| count > 0)
            )
            .unwrap();

        assert!(index_exists, "collection index should exist after migration");
    }
}
