//! Core library for Voice Notes: per-user short notes kept in a document
//! store, observed as a live, searchable list.
//!
//! The usual wiring is a [`SqliteDocumentStore`] and a [`Session`] injected
//! into a [`NotesRepository`], which in turn backs a [`NotesViewModel`] that
//! publishes [`NotesUiState`] for whatever front end renders it.
//!
//! Types are re-exported from their respective sub-modules for convenience;
//! consumers should import from the crate root rather than the `core` module.

pub mod core;

// Re-export commonly used types.
#[doc(inline)]
pub use core::{
    auth::{AuthProvider, Session},
    document_store::{
        ChangeEvent, ChangeKind, CollectionPath, Direction, DocumentStore, OrderBy, Query,
        SqliteDocumentStore, StoredDocument,
    },
    error::{ErrorKind, Result, VoiceNotesError},
    note::{Document, FieldValue, Note, UNTITLED},
    presentation::{NotesUiState, NotesViewModel},
    repository::NotesRepository,
    search::{combine_latest, filter_notes, FilteredNotes, SearchTerm},
    storage::Storage,
    subscription::{Emitter, Subscription},
    time_ago::format_time_ago,
};
