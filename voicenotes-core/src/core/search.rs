//! Search term holder and the filter applied to the live notes list.

use crate::{Note, Result, Subscription};
use std::sync::Arc;
use tokio::sync::watch;

/// A blank term (empty or whitespace-only) disables filtering.
pub fn is_blank(term: &str) -> bool {
    term.trim().is_empty()
}

/// Keeps the notes whose title or content contains `term`, ignoring case.
///
/// A blank term returns every note unchanged. A non-blank term is matched as
/// typed; surrounding whitespace is significant.
pub fn filter_notes(notes: &[Note], term: &str) -> Vec<Note> {
    if is_blank(term) {
        return notes.to_vec();
    }
    notes.iter().filter(|note| note.matches(term)).cloned().collect()
}

/// One emission of the filtered view, tagged with the term that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredNotes {
    pub notes: Vec<Note>,
    pub term: String,
}

/// The current search term. Clones share the same value.
#[derive(Debug, Clone)]
pub struct SearchTerm {
    sender: Arc<watch::Sender<String>>,
}

impl SearchTerm {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(String::new());
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn set(&self, term: impl Into<String>) {
        self.sender.send_replace(term.into());
    }

    pub fn get(&self) -> String {
        self.sender.borrow().clone()
    }

    /// Receiver that is notified on every later [`set`](Self::set).
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.sender.subscribe()
    }
}

impl Default for SearchTerm {
    fn default() -> Self {
        Self::new()
    }
}

/// Re-filters the latest notes list by the latest term whenever either changes.
///
/// Nothing is emitted until the first notes snapshot arrives. Upstream errors
/// are forwarded as-is and do not clear the last good list, so a later term
/// change still filters it. The output ends when `notes` ends.
pub fn combine_latest(
    mut notes: Subscription<Result<Vec<Note>>>,
    mut terms: watch::Receiver<String>,
) -> Subscription<Result<FilteredNotes>> {
    Subscription::spawn(move |emitter| async move {
        let mut latest: Option<Vec<Note>> = None;
        let mut terms_open = true;

        loop {
            tokio::select! {
                item = notes.next() => match item {
                    Some(Ok(list)) => latest = Some(list),
                    Some(Err(e)) => {
                        log::debug!("forwarding notes failure: {e}");
                        if !emitter.emit(Err(e)).await {
                            return;
                        }
                        continue;
                    }
                    None => return,
                },
                changed = terms.changed(), if terms_open => {
                    if changed.is_err() {
                        // Term holder dropped; keep filtering by the last term.
                        terms_open = false;
                        continue;
                    }
                }
            }

            let Some(list) = &latest else { continue };
            let term = terms.borrow_and_update().clone();
            let filtered = FilteredNotes {
                notes: filter_notes(list, &term),
                term,
            };
            if !emitter.emit(Ok(filtered)).await {
                return;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VoiceNotesError;
    use chrono::{TimeZone, Utc};
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn note(title: &str, content: &str) -> Note {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap();
        let mut note = Note::new(title, content);
        note.id = format!("id-{title}");
        note.created_at = at;
        note.updated_at = at;
        note
    }

    fn sample_notes() -> Vec<Note> {
        vec![
            note("Groceries", "milk,eggs"),
            note("Standup", "Discuss the EGG timer bug"),
            note("", "call mom"),
        ]
    }

    fn notes_feed() -> (mpsc::Sender<Result<Vec<Note>>>, Subscription<Result<Vec<Note>>>) {
        let (tx, mut rx) = mpsc::channel(8);
        let sub = Subscription::spawn(move |emitter| async move {
            while let Some(item) = rx.recv().await {
                if !emitter.emit(item).await {
                    return;
                }
            }
        });
        (tx, sub)
    }

    async fn next<T: Send + 'static>(sub: &mut Subscription<T>) -> T {
        tokio::time::timeout(Duration::from_secs(5), sub.next())
            .await
            .expect("timed out waiting for emission")
            .expect("subscription ended")
    }

    #[test]
    fn test_blank_term_is_passthrough() {
        let notes = sample_notes();
        assert_eq!(filter_notes(&notes, ""), notes);
        assert_eq!(filter_notes(&notes, "   "), notes);
    }

    #[test]
    fn test_filtered_is_subset_and_every_element_matches() {
        let notes = sample_notes();
        for term in ["egg", "EGG", "mom", "standup", "zzz", ","] {
            let filtered = filter_notes(&notes, term);
            assert!(filtered.iter().all(|n| notes.contains(n)));
            assert!(filtered.iter().all(|n| {
                n.title.to_lowercase().contains(&term.to_lowercase())
                    || n.content.to_lowercase().contains(&term.to_lowercase())
            }));
        }
    }

    #[test]
    fn test_case_insensitive_on_title_or_content() {
        let notes = sample_notes();
        let titles: Vec<String> = filter_notes(&notes, "egg")
            .into_iter()
            .map(|n| n.title)
            .collect();
        assert_eq!(titles, vec!["Groceries".to_string(), "Standup".to_string()]);
    }

    #[test]
    fn test_groceries_scenario() {
        let notes = vec![note("Groceries", "milk,eggs")];
        assert_eq!(filter_notes(&notes, "egg"), notes);
        assert!(filter_notes(&notes, "xyz").is_empty());
    }

    #[test]
    fn test_search_term_clones_share_value() {
        let term = SearchTerm::new();
        let other = term.clone();
        other.set("milk");
        assert_eq!(term.get(), "milk");
    }

    #[tokio::test]
    async fn test_combine_latest_waits_for_notes_then_follows_both_inputs() {
        let term = SearchTerm::new();
        term.set("egg");
        let (feed, notes) = notes_feed();
        let mut filtered = combine_latest(notes, term.subscribe());

        feed.send(Ok(vec![note("Groceries", "milk,eggs")])).await.unwrap();
        let first = next(&mut filtered).await.unwrap();
        assert_eq!(first.term, "egg");
        assert_eq!(first.notes.len(), 1);

        term.set("xyz");
        let second = next(&mut filtered).await.unwrap();
        assert_eq!(second.term, "xyz");
        assert!(second.notes.is_empty());

        let all = sample_notes();
        feed.send(Ok(all.clone())).await.unwrap();
        let third = next(&mut filtered).await.unwrap();
        assert_eq!(third.term, "xyz");
        assert!(third.notes.is_empty());

        term.set("");
        let fourth = next(&mut filtered).await.unwrap();
        assert_eq!(fourth.notes, all);
    }

    #[tokio::test]
    async fn test_combine_latest_forwards_errors_and_keeps_last_list() {
        let term = SearchTerm::new();
        let (feed, notes) = notes_feed();
        let mut filtered = combine_latest(notes, term.subscribe());

        feed.send(Ok(sample_notes())).await.unwrap();
        assert_eq!(next(&mut filtered).await.unwrap().notes.len(), 3);

        feed.send(Err(VoiceNotesError::Transport("offline".to_string())))
            .await
            .unwrap();
        assert!(matches!(
            next(&mut filtered).await,
            Err(VoiceNotesError::Transport(_))
        ));

        term.set("mom");
        let recovered = next(&mut filtered).await.unwrap();
        assert_eq!(recovered.notes.len(), 1);
        assert_eq!(recovered.notes[0].content, "call mom");
    }

    #[tokio::test]
    async fn test_combine_latest_ends_with_notes() {
        let term = SearchTerm::new();
        let (feed, notes) = notes_feed();
        let mut filtered = combine_latest(notes, term.subscribe());

        drop(feed);
        let end = tokio::time::timeout(Duration::from_secs(5), filtered.next())
            .await
            .unwrap();
        assert!(end.is_none());
    }
}
