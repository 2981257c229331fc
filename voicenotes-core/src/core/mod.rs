//! Internal domain modules for the Voice Notes core library.
//!
//! All public types from these modules are re-exported at the crate root
//! with `#[doc(inline)]`; import from there in preference to this module.

pub mod auth;
pub mod document_store;
pub mod error;
pub mod note;
pub mod presentation;
pub mod repository;
pub mod search;
pub mod storage;
pub mod subscription;
pub mod time_ago;

#[doc(inline)]
pub use auth::{AuthProvider, Session};
#[doc(inline)]
pub use document_store::{
    ChangeEvent, ChangeKind, CollectionPath, Direction, DocumentStore, OrderBy, Query,
    SqliteDocumentStore, StoredDocument,
};
#[doc(inline)]
pub use error::{ErrorKind, Result, VoiceNotesError};
#[doc(inline)]
pub use note::{Document, FieldValue, Note, UNTITLED};
#[doc(inline)]
pub use presentation::{NotesUiState, NotesViewModel};
#[doc(inline)]
pub use repository::NotesRepository;
#[doc(inline)]
pub use search::{combine_latest, filter_notes, FilteredNotes, SearchTerm};
#[doc(inline)]
pub use storage::Storage;
#[doc(inline)]
pub use subscription::{Emitter, Subscription};
#[doc(inline)]
pub use time_ago::format_time_ago;
