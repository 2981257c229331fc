//! Document store seam and its SQLite implementation.
//!
//! A [`DocumentStore`] holds schemaless [`Document`]s grouped into
//! slash-separated collections (`users/{uid}/notes`). Every write is
//! announced on a broadcast change feed so live queries can re-run without
//! polling. The notes repository only talks to this trait, never to SQLite
//! directly.
//!
//! All methods are blocking; async callers run them on
//! `tokio::task::spawn_blocking`.

use crate::{Document, Result, Storage, VoiceNotesError};
use rusqlite::OptionalExtension;
use std::cmp::Ordering;
use std::fmt;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Capacity of the change feed; slower subscribers see `Lagged` and re-query.
const CHANGE_FEED_CAPACITY: usize = 64;

/// Path of a collection of documents, e.g. `users/alice/notes`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionPath(String);

impl CollectionPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// The per-principal notes collection.
    pub fn user_notes(user_id: &str) -> Self {
        Self(format!("users/{user_id}/notes"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// A read over one collection, optionally ordered by a document field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub collection: CollectionPath,
    pub order_by: Option<OrderBy>,
}

impl Query {
    pub fn collection(collection: CollectionPath) -> Self {
        Self { collection, order_by: None }
    }

    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by = Some(OrderBy { field: field.to_string(), direction });
        self
    }

    /// Sorts `docs` in place by this query's ordering. Documents missing the
    /// field sort before those that have it (ascending). The sort is stable.
    pub fn sort(&self, docs: &mut [StoredDocument]) {
        let Some(order) = &self.order_by else { return };
        docs.sort_by(|a, b| {
            let ord = match (a.fields.get(&order.field), b.fields.get(&order.field)) {
                (Some(x), Some(y)) => x.compare(y),
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            match order.direction {
                Direction::Ascending => ord,
                Direction::Descending => ord.reverse(),
            }
        });
    }
}

/// A document together with the key it is stored under.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub fields: Document,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

/// Announced on the change feed after every successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub collection: CollectionPath,
    pub id: String,
    pub kind: ChangeKind,
}

/// Backend holding per-collection documents.
///
/// Implementations must be safe to share across threads; the repository
/// keeps one behind an `Arc` and calls it from blocking worker tasks.
pub trait DocumentStore: Send + Sync {
    /// Inserts `doc` under a freshly generated id and returns that id.
    fn add(&self, collection: &CollectionPath, doc: &Document) -> Result<String>;

    /// Writes `doc` at `id`, replacing any existing document there.
    fn set(&self, collection: &CollectionPath, id: &str, doc: &Document) -> Result<()>;

    /// Reads the document at `id`, or `None` if there is none.
    fn get(&self, collection: &CollectionPath, id: &str) -> Result<Option<Document>>;

    /// Removes the document at `id`. Removing a missing id is not an error.
    fn delete(&self, collection: &CollectionPath, id: &str) -> Result<()>;

    /// Returns a snapshot of every document matching `query`.
    fn query(&self, query: &Query) -> Result<Vec<StoredDocument>>;

    /// Subscribes to the change feed. Only writes made after this call are seen.
    fn changes(&self) -> broadcast::Receiver<ChangeEvent>;
}

/// [`DocumentStore`] backed by a local SQLite file.
pub struct SqliteDocumentStore {
    storage: Mutex<Storage>,
    changes: broadcast::Sender<ChangeEvent>,
}

impl SqliteDocumentStore {
    pub fn new(storage: Storage) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self {
            storage: Mutex::new(storage),
            changes,
        }
    }

    /// Opens the store at `path`, creating the schema on first use.
    ///
    /// # Errors
    ///
    /// Returns [`VoiceNotesError::InvalidStore`] if the file exists but is not a
    /// Voice Notes store, or [`VoiceNotesError::Database`] for any SQLite failure.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(Storage::open_or_create(path)?))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Storage>> {
        self.storage
            .lock()
            .map_err(|_| VoiceNotesError::Transport("document store lock poisoned".to_string()))
    }

    fn announce(&self, collection: &CollectionPath, id: &str, kind: ChangeKind) {
        log::debug!("{kind:?} {collection}/{id}");
        // No receivers is fine: nobody is watching this store right now.
        let _ = self.changes.send(ChangeEvent {
            collection: collection.clone(),
            id: id.to_string(),
            kind,
        });
    }
}

impl DocumentStore for SqliteDocumentStore {
    fn add(&self, collection: &CollectionPath, doc: &Document) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let fields_json = serde_json::to_string(doc)?;
        {
            let storage = self.lock()?;
            storage.connection().execute(
                "INSERT INTO documents (collection, id, fields_json, written_at) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![collection.as_str(), id, fields_json, chrono::Utc::now().timestamp_millis()],
            )?;
        }
        self.announce(collection, &id, ChangeKind::Added);
        Ok(id)
    }

    fn set(&self, collection: &CollectionPath, id: &str, doc: &Document) -> Result<()> {
        let fields_json = serde_json::to_string(doc)?;
        let existed = {
            let mut storage = self.lock()?;
            let tx = storage.connection_mut().transaction()?;
            let existed: bool = tx.query_row(
                "SELECT COUNT(*) FROM documents WHERE collection = ?1 AND id = ?2",
                rusqlite::params![collection.as_str(), id],
                |row| row.get::<_, i64>(0).map(|count| count > 0),
            )?;
            tx.execute(
                "INSERT INTO documents (collection, id, fields_json, written_at) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(collection, id) DO UPDATE SET
                    fields_json = excluded.fields_json,
                    written_at = excluded.written_at",
                rusqlite::params![collection.as_str(), id, fields_json, chrono::Utc::now().timestamp_millis()],
            )?;
            tx.commit()?;
            existed
        };
        let kind = if existed { ChangeKind::Modified } else { ChangeKind::Added };
        self.announce(collection, id, kind);
        Ok(())
    }

    fn get(&self, collection: &CollectionPath, id: &str) -> Result<Option<Document>> {
        let fields_json: Option<String> = {
            let storage = self.lock()?;
            storage
                .connection()
                .query_row(
                    "SELECT fields_json FROM documents WHERE collection = ?1 AND id = ?2",
                    rusqlite::params![collection.as_str(), id],
                    |row| row.get(0),
                )
                .optional()?
        };
        match fields_json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn delete(&self, collection: &CollectionPath, id: &str) -> Result<()> {
        let removed = {
            let storage = self.lock()?;
            storage.connection().execute(
                "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
                rusqlite::params![collection.as_str(), id],
            )?
        };
        if removed > 0 {
            self.announce(collection, id, ChangeKind::Removed);
        }
        Ok(())
    }

    fn query(&self, query: &Query) -> Result<Vec<StoredDocument>> {
        let rows = {
            let storage = self.lock()?;
            let mut stmt = storage
                .connection()
                .prepare("SELECT id, fields_json FROM documents WHERE collection = ?1 ORDER BY id")?;
            let rows = stmt
                .query_map([query.collection.as_str()], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        };

        let mut docs = rows
            .into_iter()
            .map(|(id, fields_json)| {
                Ok(StoredDocument {
                    id,
                    fields: serde_json::from_str(&fields_json)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        query.sort(&mut docs);
        Ok(docs)
    }

    fn changes(&self) -> broadcast::Receiver<ChangeEvent> {
        self.changes.subscribe()
    }
}
