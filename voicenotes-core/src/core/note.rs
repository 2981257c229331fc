//! The note entity and the schemaless document it is stored as.

use crate::{Result, VoiceNotesError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Title shown for notes saved without one.
pub const UNTITLED: &str = "Untitled";

/// Document keys a [`Note`] is written under.
pub mod fields {
    pub const TITLE: &str = "title";
    pub const CONTENT: &str = "content";
    pub const CREATED_AT: &str = "createdAt";
    pub const UPDATED_AT: &str = "updatedAt";
    pub const USER_ID: &str = "userId";
}

/// A single value inside a [`Document`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
}

impl FieldValue {
    /// Orders two values of the same variant; mixed variants compare equal.
    pub fn compare(&self, other: &FieldValue) -> Ordering {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Number(a), Self::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (Self::Boolean(a), Self::Boolean(b)) => a.cmp(b),
            (Self::Timestamp(a), Self::Timestamp(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

/// A schemaless key-value record in the document store.
pub type Document = BTreeMap<String, FieldValue>;

/// A user's note.
///
/// `id` is empty until the note has been saved once; `owner_id` is stamped by
/// the repository on every save and is never taken from the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub owner_id: String,
}

impl Note {
    /// Creates an unsaved note stamped with the current time.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            title: title.into(),
            content: content.into(),
            created_at: now,
            updated_at: now,
            owner_id: String::new(),
        }
    }

    /// Returns `true` once the store has assigned an identifier.
    pub fn is_persisted(&self) -> bool {
        !self.id.is_empty()
    }

    /// The title to show in lists; blank titles render as "Untitled".
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            UNTITLED
        } else {
            &self.title
        }
    }

    /// Checks the invariants a note must satisfy before it may be saved.
    ///
    /// # Errors
    ///
    /// Returns [`VoiceNotesError::ValidationFailed`] if `content` is empty or
    /// whitespace-only.
    pub fn validate(&self) -> Result<()> {
        validate_content(&self.content)
    }

    /// Case-insensitive substring match on title or content.
    pub fn matches(&self, term: &str) -> bool {
        let needle = term.to_lowercase();
        self.title.to_lowercase().contains(&needle)
            || self.content.to_lowercase().contains(&needle)
    }

    /// Serializes the note into the document written to the store.
    ///
    /// The identifier is not part of the document; the store keys it.
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert(fields::TITLE.to_string(), FieldValue::Text(self.title.clone()));
        doc.insert(fields::CONTENT.to_string(), FieldValue::Text(self.content.clone()));
        doc.insert(fields::CREATED_AT.to_string(), FieldValue::Timestamp(self.created_at));
        doc.insert(fields::UPDATED_AT.to_string(), FieldValue::Timestamp(self.updated_at));
        doc.insert(fields::USER_ID.to_string(), FieldValue::Text(self.owner_id.clone()));
        doc
    }

    /// Rebuilds a note from a stored document.
    ///
    /// Missing or mistyped text fields read as empty strings and missing
    /// timestamps read as the current time, so a partially written document
    /// still shows up in the list.
    pub fn from_document(id: &str, doc: &Document) -> Self {
        let text = |key: &str| match doc.get(key) {
            Some(FieldValue::Text(s)) => s.clone(),
            _ => String::new(),
        };
        let timestamp = |key: &str| match doc.get(key) {
            Some(FieldValue::Timestamp(t)) => *t,
            _ => Utc::now(),
        };
        Self {
            id: id.to_string(),
            title: text(fields::TITLE),
            content: text(fields::CONTENT),
            created_at: timestamp(fields::CREATED_AT),
            updated_at: timestamp(fields::UPDATED_AT),
            owner_id: text(fields::USER_ID),
        }
    }
}

/// Rejects empty or whitespace-only note content.
pub(crate) fn validate_content(content: &str) -> Result<()> {
    if content.trim().is_empty() {
        return Err(VoiceNotesError::ValidationFailed(
            "Note content cannot be empty".to_string(),
        ));
    }
    Ok(())
}
