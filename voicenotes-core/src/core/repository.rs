//! Per-user notes on top of a [`DocumentStore`].
//!
//! Every operation is scoped to `users/{uid}/notes` for the principal the
//! [`AuthProvider`] reports at call time, and fails with
//! [`VoiceNotesError::NotAuthenticated`] before touching the store when nobody
//! is signed in. Store calls are blocking and run on
//! `tokio::task::spawn_blocking`, so callers must be inside a tokio runtime.

use crate::core::note::fields;
use crate::core::search::filter_notes;
use crate::{
    AuthProvider, ChangeEvent, CollectionPath, Direction, DocumentStore, Note, Query, Result,
    Subscription, VoiceNotesError,
};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

/// Notes store adapter used by the presentation layer.
pub struct NotesRepository {
    store: Arc<dyn DocumentStore>,
    auth: Arc<dyn AuthProvider>,
}

impl NotesRepository {
    pub fn new(store: Arc<dyn DocumentStore>, auth: Arc<dyn AuthProvider>) -> Self {
        Self { store, auth }
    }

    fn principal(&self) -> Result<String> {
        self.auth
            .current_principal_id()
            .filter(|id| !id.is_empty())
            .ok_or(VoiceNotesError::NotAuthenticated)
    }

    fn notes_collection(&self) -> Result<CollectionPath> {
        Ok(CollectionPath::user_notes(&self.principal()?))
    }

    /// Live list of the principal's notes, newest `updatedAt` first.
    ///
    /// Emits the current notes immediately, then again after every write to
    /// the collection. A failed read is emitted as `Err` and the subscription
    /// keeps listening for the next change.
    ///
    /// # Errors
    ///
    /// Returns [`VoiceNotesError::NotAuthenticated`] if nobody is signed in.
    pub fn list(&self) -> Result<Subscription<Result<Vec<Note>>>> {
        let query = Query::collection(self.notes_collection()?)
            .order_by(fields::UPDATED_AT, Direction::Descending);
        let store = Arc::clone(&self.store);
        // Subscribe before the first read so no write can slip in between.
        let mut changes = store.changes();
        log::debug!("subscribing to {}", query.collection);

        Ok(Subscription::spawn(move |emitter| async move {
            loop {
                let snapshot = load_notes(Arc::clone(&store), query.clone()).await;
                if let Err(e) = &snapshot {
                    log::warn!("notes snapshot for {} failed: {e}", query.collection);
                }
                if !emitter.emit(snapshot).await {
                    return;
                }
                if !wait_for_change(&mut changes, &query.collection).await {
                    return;
                }
            }
        }))
    }

    /// Live list filtered by a fixed `term` (see [`filter_notes`]).
    ///
    /// # Errors
    ///
    /// Returns [`VoiceNotesError::NotAuthenticated`] if nobody is signed in.
    pub fn search(&self, term: &str) -> Result<Subscription<Result<Vec<Note>>>> {
        let mut notes = self.list()?;
        let term = term.to_string();
        Ok(Subscription::spawn(move |emitter| async move {
            while let Some(item) = notes.next().await {
                let item = item.map(|list| filter_notes(&list, &term));
                if !emitter.emit(item).await {
                    return;
                }
            }
        }))
    }

    /// Reads one note, distinguishing "not found" (`Ok(None)`) from a failed read.
    ///
    /// # Errors
    ///
    /// Returns [`VoiceNotesError::NotAuthenticated`] if nobody is signed in, or
    /// the store's error if the read fails.
    pub async fn fetch(&self, note_id: &str) -> Result<Option<Note>> {
        let collection = self.notes_collection()?;
        let store = Arc::clone(&self.store);
        let id = note_id.to_string();
        let doc = tokio::task::spawn_blocking(move || store.get(&collection, &id)).await??;
        Ok(doc.map(|fields| Note::from_document(note_id, &fields)))
    }

    /// Reads one note; any store failure reads as absent.
    ///
    /// # Errors
    ///
    /// Returns [`VoiceNotesError::NotAuthenticated`] if nobody is signed in.
    pub async fn get(&self, note_id: &str) -> Result<Option<Note>> {
        match self.fetch(note_id).await {
            Err(VoiceNotesError::NotAuthenticated) => Err(VoiceNotesError::NotAuthenticated),
            Err(e) => {
                log::warn!("reading note {note_id} failed, treating as absent: {e}");
                Ok(None)
            }
            found => found,
        }
    }

    /// Persists `note` and returns its identifier.
    ///
    /// A note without an id is inserted and receives a new one; otherwise the
    /// stored document at that id is replaced wholesale. `updated_at` is set
    /// to now and `owner_id` to the current principal, whatever the caller
    /// passed in.
    ///
    /// # Errors
    ///
    /// Returns [`VoiceNotesError::ValidationFailed`] for blank content and
    /// [`VoiceNotesError::NotAuthenticated`] without a principal, both before
    /// any store call; otherwise the store's error if the write fails.
    pub async fn save(&self, note: Note) -> Result<String> {
        note.validate()?;
        let principal = self.principal()?;
        let collection = CollectionPath::user_notes(&principal);
        let note = Note {
            updated_at: chrono::Utc::now(),
            owner_id: principal,
            ..note
        };

        let store = Arc::clone(&self.store);
        let id = tokio::task::spawn_blocking(move || {
            let doc = note.to_document();
            if note.is_persisted() {
                store.set(&collection, &note.id, &doc).map(|()| note.id)
            } else {
                store.add(&collection, &doc)
            }
        })
        .await??;

        log::info!("saved note {id}");
        Ok(id)
    }

    /// Deletes the note at `note_id`. Deleting a missing note succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`VoiceNotesError::NotAuthenticated`] if nobody is signed in, or
    /// the store's error if the delete fails.
    pub async fn delete(&self, note_id: &str) -> Result<()> {
        let collection = self.notes_collection()?;
        let store = Arc::clone(&self.store);
        let id = note_id.to_string();
        tokio::task::spawn_blocking(move || store.delete(&collection, &id)).await??;
        log::info!("deleted note {note_id}");
        Ok(())
    }
}

async fn load_notes(store: Arc<dyn DocumentStore>, query: Query) -> Result<Vec<Note>> {
    let docs = tokio::task::spawn_blocking(move || store.query(&query)).await??;
    Ok(docs
        .iter()
        .map(|doc| Note::from_document(&doc.id, &doc.fields))
        .collect())
}

/// Waits until `collection` changes. Returns `false` if the feed closed.
async fn wait_for_change(
    changes: &mut broadcast::Receiver<ChangeEvent>,
    collection: &CollectionPath,
) -> bool {
    loop {
        match changes.recv().await {
            Ok(event) if &event.collection == collection => break,
            Ok(_) => continue,
            Err(RecvError::Lagged(skipped)) => {
                log::warn!("change feed lagged by {skipped} events; re-reading {collection}");
                break;
            }
            Err(RecvError::Closed) => return false,
        }
    }
    // A burst of writes needs only one re-read.
    loop {
        match changes.try_recv() {
            Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
            Err(TryRecvError::Empty) => return true,
            Err(TryRecvError::Closed) => return false,
        }
    }
}
