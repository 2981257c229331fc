//! Presentation state for a notes list screen.
//!
//! [`NotesViewModel`] owns the search term, observes the live notes list
//! while its screen is visible and publishes one [`NotesUiState`] per
//! emission on a watch channel. Observation runs as a task on the caller's
//! tokio runtime; [`pause`](NotesViewModel::pause) or dropping the view model
//! cancels it, [`resume`](NotesViewModel::resume) starts it again.

use crate::core::note::validate_content;
use crate::core::search::{combine_latest, is_blank, FilteredNotes};
use crate::{Note, NotesRepository, Result, SearchTerm};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// What the notes screen should render.
#[derive(Debug, Clone, PartialEq)]
pub enum NotesUiState {
    /// Waiting for the first snapshot.
    Loading,
    /// No notes at all.
    Empty,
    /// Notes exist but none match the search term.
    EmptySearch,
    /// Notes to show, newest first.
    Success(Vec<Note>),
    /// The list could not be loaded; the message is meant for the user.
    Error(String),
}

impl NotesUiState {
    /// Maps one emission of the filtered sequence to exactly one state.
    pub fn from_filtered(emission: Result<FilteredNotes>) -> Self {
        match emission {
            Ok(filtered) if !filtered.notes.is_empty() => Self::Success(filtered.notes),
            Ok(filtered) if is_blank(&filtered.term) => Self::Empty,
            Ok(_) => Self::EmptySearch,
            Err(e) => Self::Error(e.user_message()),
        }
    }
}

pub struct NotesViewModel {
    repository: Arc<NotesRepository>,
    search: SearchTerm,
    state: Arc<watch::Sender<NotesUiState>>,
    observer: Option<JoinHandle<()>>,
}

impl NotesViewModel {
    /// Creates a paused view model in the `Loading` state.
    pub fn new(repository: Arc<NotesRepository>) -> Self {
        let (state, _) = watch::channel(NotesUiState::Loading);
        Self {
            repository,
            search: SearchTerm::new(),
            state: Arc::new(state),
            observer: None,
        }
    }

    /// Starts observing the notes list. Does nothing if already observing.
    ///
    /// Must be called from within a tokio runtime. If no principal is signed
    /// in the state becomes [`NotesUiState::Error`].
    pub fn resume(&mut self) {
        if self.is_observing() {
            return;
        }
        match self.repository.list() {
            Ok(notes) => {
                let mut filtered = combine_latest(notes, self.search.subscribe());
                let state = Arc::clone(&self.state);
                self.observer = Some(tokio::spawn(async move {
                    while let Some(emission) = filtered.next().await {
                        state.send_replace(NotesUiState::from_filtered(emission));
                    }
                }));
            }
            Err(e) => {
                log::warn!("cannot observe notes: {e}");
                self.state.send_replace(NotesUiState::Error(e.user_message()));
            }
        }
    }

    /// Stops observing. The last published state stays visible.
    pub fn pause(&mut self) {
        if let Some(observer) = self.observer.take() {
            observer.abort();
        }
    }

    /// Drops the current observation, shows `Loading` and subscribes afresh.
    pub fn refresh(&mut self) {
        self.pause();
        self.state.send_replace(NotesUiState::Loading);
        self.resume();
    }

    pub fn is_observing(&self) -> bool {
        self.observer.as_ref().is_some_and(|observer| !observer.is_finished())
    }

    /// Receiver notified on every state change.
    pub fn state(&self) -> watch::Receiver<NotesUiState> {
        self.state.subscribe()
    }

    pub fn current_state(&self) -> NotesUiState {
        self.state.borrow().clone()
    }

    pub fn search_query(&self) -> String {
        self.search.get()
    }

    pub fn on_search_query_changed(&self, query: impl Into<String>) {
        self.search.set(query);
    }

    /// Saves a new note built from dialog input (both fields trimmed).
    ///
    /// # Errors
    ///
    /// Blank content is rejected with
    /// [`VoiceNotesError::ValidationFailed`](crate::VoiceNotesError::ValidationFailed)
    /// without reaching the repository; other errors come from
    /// [`NotesRepository::save`].
    pub async fn save_note(&self, title: &str, content: &str) -> Result<String> {
        validate_content(content)?;
        self.repository
            .save(Note::new(title.trim(), content.trim()))
            .await
    }

    /// Saves an edited note in place.
    pub async fn update_note(&self, note: Note) -> Result<String> {
        self.repository.save(note).await
    }

    pub async fn delete_note(&self, note_id: &str) -> Result<()> {
        self.repository.delete(note_id).await
    }
}

impl Drop for NotesViewModel {
    fn drop(&mut self) {
        self.pause();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorKind, Session, SqliteDocumentStore, VoiceNotesError};
    use std::time::Duration;
    use tempfile::NamedTempFile;

    struct Fixture {
        _temp: NamedTempFile,
        session: Arc<Session>,
        vm: NotesViewModel,
    }

    fn fixture() -> Fixture {
        let temp = NamedTempFile::new().unwrap();
        let store = Arc::new(SqliteDocumentStore::open(temp.path()).unwrap());
        let session = Arc::new(Session::signed_in("alice"));
        let repository = Arc::new(NotesRepository::new(store, session.clone()));
        Fixture {
            _temp: temp,
            session,
            vm: NotesViewModel::new(repository),
        }
    }

    async fn wait_for(
        rx: &mut watch::Receiver<NotesUiState>,
        accept: impl Fn(&NotesUiState) -> bool,
    ) -> NotesUiState {
        tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| accept(s)))
            .await
            .expect("timed out waiting for state")
            .expect("state channel closed")
            .clone()
    }

    fn titles(state: &NotesUiState) -> Vec<String> {
        match state {
            NotesUiState::Success(notes) => notes.iter().map(|n| n.title.clone()).collect(),
            _ => vec![],
        }
    }

    #[test]
    fn test_state_mapping() {
        let filtered = |notes: Vec<Note>, term: &str| {
            Ok(FilteredNotes { notes, term: term.to_string() })
        };
        assert_eq!(NotesUiState::from_filtered(filtered(vec![], "")), NotesUiState::Empty);
        assert_eq!(NotesUiState::from_filtered(filtered(vec![], "  ")), NotesUiState::Empty);
        assert_eq!(
            NotesUiState::from_filtered(filtered(vec![], "xyz")),
            NotesUiState::EmptySearch
        );
        let note = Note::new("t", "c");
        assert_eq!(
            NotesUiState::from_filtered(filtered(vec![note.clone()], "c")),
            NotesUiState::Success(vec![note])
        );
        assert_eq!(
            NotesUiState::from_filtered(Err(VoiceNotesError::Transport("down".to_string()))),
            NotesUiState::Error("Could not reach notes store: down".to_string())
        );
    }

    #[tokio::test]
    async fn test_starts_loading_until_first_emission() {
        let mut f = fixture();
        let mut rx = f.vm.state();
        assert_eq!(f.vm.current_state(), NotesUiState::Loading);

        f.vm.resume();
        let state = wait_for(&mut rx, |s| *s != NotesUiState::Loading).await;
        assert_eq!(state, NotesUiState::Empty);
    }

    #[tokio::test]
    async fn test_groceries_scenario() {
        let mut f = fixture();
        let mut rx = f.vm.state();
        f.vm.resume();
        wait_for(&mut rx, |s| *s == NotesUiState::Empty).await;

        f.vm.save_note("Groceries", "milk,eggs").await.unwrap();
        let state = wait_for(&mut rx, |s| matches!(s, NotesUiState::Success(_))).await;
        assert_eq!(titles(&state), vec!["Groceries".to_string()]);

        f.vm.on_search_query_changed("egg");
        assert_eq!(f.vm.search_query(), "egg");
        let state = wait_for(&mut rx, |s| matches!(s, NotesUiState::Success(_))).await;
        assert_eq!(titles(&state), vec!["Groceries".to_string()]);

        f.vm.on_search_query_changed("xyz");
        wait_for(&mut rx, |s| *s == NotesUiState::EmptySearch).await;

        f.vm.on_search_query_changed("");
        wait_for(&mut rx, |s| matches!(s, NotesUiState::Success(_))).await;
    }

    #[tokio::test]
    async fn test_deleting_last_note_shows_empty() {
        let mut f = fixture();
        let mut rx = f.vm.state();
        let id = f.vm.save_note("", "only one").await.unwrap();
        f.vm.resume();
        wait_for(&mut rx, |s| matches!(s, NotesUiState::Success(_))).await;

        f.vm.delete_note(&id).await.unwrap();
        wait_for(&mut rx, |s| *s == NotesUiState::Empty).await;

        // Deleting again is not an error and leaves the state alone.
        f.vm.delete_note(&id).await.unwrap();
        assert_eq!(f.vm.current_state(), NotesUiState::Empty);
    }

    #[tokio::test]
    async fn test_update_note_replaces_content() {
        let mut f = fixture();
        let mut rx = f.vm.state();
        f.vm.save_note("Plan", "draft").await.unwrap();
        f.vm.resume();
        let state = wait_for(&mut rx, |s| matches!(s, NotesUiState::Success(_))).await;

        let NotesUiState::Success(notes) = state else { unreachable!() };
        let mut note = notes[0].clone();
        note.content = "final".to_string();
        f.vm.update_note(note).await.unwrap();

        let state = wait_for(&mut rx, |s| match s {
            NotesUiState::Success(notes) => notes[0].content == "final",
            _ => false,
        })
        .await;
        let NotesUiState::Success(notes) = state else { unreachable!() };
        assert_eq!(notes.len(), 1);
    }

    #[tokio::test]
    async fn test_blank_content_is_rejected_locally() {
        let f = fixture();
        let err = f.vm.save_note("title", "   ").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.user_message(), "Note content cannot be empty");
        assert_eq!(f.vm.current_state(), NotesUiState::Loading);
    }

    #[tokio::test]
    async fn test_save_note_trims_input() {
        let mut f = fixture();
        let mut rx = f.vm.state();
        f.vm.save_note("  Title  ", "\n body \n").await.unwrap();
        f.vm.resume();
        let state = wait_for(&mut rx, |s| matches!(s, NotesUiState::Success(_))).await;
        let NotesUiState::Success(notes) = state else { unreachable!() };
        assert_eq!(notes[0].title, "Title");
        assert_eq!(notes[0].content, "body");
    }

    #[tokio::test]
    async fn test_resume_without_principal_shows_error() {
        let mut f = fixture();
        f.session.sign_out();
        f.vm.resume();
        assert!(!f.vm.is_observing());
        assert_eq!(
            f.vm.current_state(),
            NotesUiState::Error("Please sign in first".to_string())
        );
    }

    #[tokio::test]
    async fn test_pause_stops_updates_and_resume_restarts() {
        let mut f = fixture();
        let mut rx = f.vm.state();
        f.vm.resume();
        wait_for(&mut rx, |s| *s == NotesUiState::Empty).await;

        f.vm.pause();
        assert!(!f.vm.is_observing());
        f.vm.save_note("", "written while paused").await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(f.vm.current_state(), NotesUiState::Empty);

        f.vm.resume();
        assert!(f.vm.is_observing());
        wait_for(&mut rx, |s| matches!(s, NotesUiState::Success(_))).await;
    }

    #[tokio::test]
    async fn test_refresh_resets_to_loading_then_reloads() {
        let mut f = fixture();
        let mut rx = f.vm.state();
        f.vm.save_note("", "kept").await.unwrap();
        f.vm.resume();
        wait_for(&mut rx, |s| matches!(s, NotesUiState::Success(_))).await;

        f.vm.refresh();
        assert_eq!(f.vm.current_state(), NotesUiState::Loading);
        wait_for(&mut rx, |s| matches!(s, NotesUiState::Success(_))).await;
    }
}
