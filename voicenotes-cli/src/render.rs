//! Plain-text rendering of the notes screen.

use chrono::{DateTime, Utc};
use voicenotes_core::{format_time_ago, Note, NotesUiState};

/// Longest content preview shown under a note's title.
const PREVIEW_CHARS: usize = 60;

pub fn render_state(state: &NotesUiState, term: &str, now: DateTime<Utc>) -> String {
    match state {
        NotesUiState::Loading => "Loading…".to_string(),
        NotesUiState::Empty => "No notes yet. Add one with `voicenotes add`.".to_string(),
        NotesUiState::EmptySearch => format!("No notes match \"{term}\"."),
        NotesUiState::Success(notes) => notes
            .iter()
            .map(|note| render_row(note, now))
            .collect::<Vec<_>>()
            .join("\n"),
        NotesUiState::Error(message) => format!("Error: {message}"),
    }
}

fn render_row(note: &Note, now: DateTime<Utc>) -> String {
    format!(
        "{}  {}  ({})\n    {}",
        note.id,
        note.display_title(),
        format_time_ago(note.updated_at, now),
        preview(&note.content),
    )
}

/// First line of `content`, cut to [`PREVIEW_CHARS`] characters.
fn preview(content: &str) -> String {
    let first_line = content.lines().next().unwrap_or_default();
    if first_line.chars().count() > PREVIEW_CHARS {
        let cut: String = first_line.chars().take(PREVIEW_CHARS).collect();
        format!("{cut}…")
    } else {
        first_line.to_string()
    }
}

pub fn render_note(note: &Note, now: DateTime<Utc>) -> String {
    format!(
        "{}\nid: {}\nupdated: {}\n\n{}",
        note.display_title(),
        note.id,
        format_time_ago(note.updated_at, now),
        note.content,
    )
}
