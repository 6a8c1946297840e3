use crate::core::tag::{IntervalStore, Language, TagError};
use std::collections::BTreeSet;
use tokio::sync::broadcast;

/// Application-level events. Consumers subscribe to the session bus instead
/// of polling shared state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    SourceLoaded,
    BackendReady,
    PlaybackStateChanged,
    IntervalCommitted,
    SessionCleared,
}

/// In-memory state for one tagging pass over one media source. Exactly one
/// session is active; it is replaced wholesale on clear or load.
pub struct Session {
    pub video_source: String,
    pub vid: String,
    pub store: IntervalStore,
    session_languages: BTreeSet<Language>,
    pending_labels: Vec<String>,
    dirty: bool,
    events: broadcast::Sender<SessionEvent>,
}

impl Session {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Session {
            video_source: String::new(),
            vid: String::new(),
            store: IntervalStore::new(),
            session_languages: BTreeSet::new(),
            pending_labels: Vec::new(),
            dirty: false,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn emit(&self, event: SessionEvent) {
        // A send error just means nobody is listening right now.
        let _ = self.events.send(event);
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    pub fn has_vid(&self) -> bool {
        !self.vid.trim().is_empty()
    }

    pub fn session_languages(&self) -> &BTreeSet<Language> {
        &self.session_languages
    }

    pub fn toggle_language(&mut self, language: Language) {
        if !self.session_languages.remove(&language) {
            self.session_languages.insert(language);
        }
        self.mark_dirty();
    }

    /// Preset labels selected for the next commit. Kept across commits so a
    /// run of similar intervals can reuse the same selection.
    pub fn pending_labels(&self) -> &[String] {
        &self.pending_labels
    }

    pub fn set_pending_labels(&mut self, labels: Vec<String>) {
        self.pending_labels = crate::core::tag::normalize_labels(labels);
    }

    /// Records a start mark. Tagging requires a session id and a ready
    /// backend; both failures surface to the user.
    pub fn start_interval(&mut self, current_time: f64, backend_ready: bool) -> Result<(), TagError> {
        if !self.has_vid() {
            return Err(TagError::MissingSessionId);
        }
        if !backend_ready {
            return Err(TagError::NoBackendReady);
        }
        self.store.begin(current_time);
        Ok(())
    }

    /// Closes the open interval using the session's pending labels and
    /// language selection.
    pub fn commit_interval(&mut self, current_time: f64, remarks: String) -> Result<(), TagError> {
        let labels = self.pending_labels.clone();
        let languages = self.session_languages.clone();
        self.store.commit(current_time, labels, languages, remarks)?;
        self.mark_dirty();
        self.emit(SessionEvent::IntervalCommitted);
        Ok(())
    }

    /// Session-clear: drops all tags and the open interval, forgets the
    /// source and language selection. The session id survives so a reload of
    /// a new source does not force re-entry.
    pub fn clear(&mut self) {
        self.video_source.clear();
        self.store = IntervalStore::new();
        self.session_languages.clear();
        self.pending_labels.clear();
        self.dirty = false;
        self.emit(SessionEvent::SessionCleared);
        log::info!("Session cleared");
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_requires_vid_and_backend() {
        let mut session = Session::new();
        assert_eq!(
            session.start_interval(1.0, true).unwrap_err(),
            TagError::MissingSessionId
        );
        session.vid = "S1".to_string();
        assert_eq!(
            session.start_interval(1.0, false).unwrap_err(),
            TagError::NoBackendReady
        );
        assert!(session.start_interval(1.0, true).is_ok());
        assert_eq!(session.store.pending().unwrap().start, 1.0);
    }

    #[test]
    fn test_commit_uses_session_selection_and_marks_dirty() {
        let mut session = Session::new();
        session.vid = "S1".to_string();
        session.set_pending_labels(vec!["Greeting".to_string()]);
        session.toggle_language(Language::English);
        session.mark_saved();

        session.start_interval(12.34, true).unwrap();
        session.commit_interval(45.01, String::new()).unwrap();

        assert!(session.is_dirty());
        let tag = &session.store.tags()[0];
        assert_eq!(tag.labels, vec!["Greeting"]);
        assert!(tag.languages.contains(&Language::English));
    }

    #[test]
    fn test_commit_emits_event() {
        let mut session = Session::new();
        session.vid = "S1".to_string();
        let mut rx = session.subscribe();
        session.start_interval(0.0, true).unwrap();
        session.commit_interval(1.0, String::new()).unwrap();
        assert_eq!(rx.try_recv().unwrap(), SessionEvent::IntervalCommitted);
    }

    #[test]
    fn test_clear_keeps_vid() {
        let mut session = Session::new();
        session.vid = "S1".to_string();
        session.video_source = "clip.mp4".to_string();
        session.start_interval(0.0, true).unwrap();
        session.commit_interval(1.0, String::new()).unwrap();

        session.clear();
        assert!(session.store.is_empty());
        assert!(session.store.pending().is_none());
        assert!(session.video_source.is_empty());
        assert!(!session.is_dirty());
        assert_eq!(session.vid, "S1");
    }

    #[test]
    fn test_language_toggle() {
        let mut session = Session::new();
        session.toggle_language(Language::Cantonese);
        assert!(session.session_languages().contains(&Language::Cantonese));
        session.toggle_language(Language::Cantonese);
        assert!(session.session_languages().is_empty());
    }
}
