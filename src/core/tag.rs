use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Sentinel used by the export formats when a tag carries no labels or
/// remarks. Never stored inside a [`Tag`]; it only appears at the
/// serialization boundary.
pub const EMPTY_SENTINEL: &str = "9999";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Language {
    Cantonese,
    English,
    Mandarin,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::Cantonese, Language::English, Language::Mandarin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Cantonese => "Cantonese",
            Language::English => "English",
            Language::Mandarin => "Mandarin",
        }
    }

}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub start: f64,
    pub end: f64,
    pub labels: Vec<String>,
    pub languages: BTreeSet<Language>,
    pub remarks: String,
}

impl Tag {
    pub fn new(
        start: f64,
        end: f64,
        labels: Vec<String>,
        languages: BTreeSet<Language>,
        remarks: String,
    ) -> Self {
        Tag {
            id: uuid::Uuid::new_v4().to_string(),
            start,
            end,
            labels: normalize_labels(labels),
            languages,
            remarks: remarks.trim().to_string(),
        }
    }

    /// A tag is renderable only when it lies inside the active media.
    pub fn is_valid_for(&self, duration: f64) -> bool {
        self.start >= 0.0 && self.end >= self.start && self.end <= duration
    }
}

/// Canonical label model: an ordered set of non-empty strings. Trims
/// whitespace, drops blanks and the legacy sentinel, de-duplicates while
/// preserving first-seen order.
pub fn normalize_labels<I>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = BTreeSet::new();
    let mut labels = Vec::new();
    for label in raw {
        let trimmed = label.trim();
        if trimmed.is_empty() || trimmed == EMPTY_SENTINEL {
            continue;
        }
        if seen.insert(trimmed.to_string()) {
            labels.push(trimmed.to_string());
        }
    }
    labels
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TagError {
    #[error("Please enter a session id before tagging.")]
    MissingSessionId,
    #[error("No media is loaded.")]
    NoBackendReady,
    #[error("No tag is in progress.")]
    NoPendingInterval,
    #[error("End time cannot be before start time.")]
    EndBeforeStart,
}

/// An open interval awaiting its end mark.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingInterval {
    pub start: f64,
}

/// Ordered collection of tag records. Insertion order is the storage order;
/// every display/export path goes through [`IntervalStore::sorted_by_start`],
/// which is computed per call rather than maintained.
#[derive(Debug, Default)]
pub struct IntervalStore {
    tags: Vec<Tag>,
    pending: Option<PendingInterval>,
}

impl IntervalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn get(&self, id: &str) -> Option<&Tag> {
        self.tags.iter().find(|tag| tag.id == id)
    }

    pub fn pending(&self) -> Option<PendingInterval> {
        self.pending
    }

    /// Records the start mark of a new interval. Replaces any interval that
    /// was already open.
    pub fn begin(&mut self, current_time: f64) {
        if self.pending.is_some() {
            log::debug!("Replacing open interval with new start at {:.3}s", current_time);
        }
        self.pending = Some(PendingInterval { start: current_time });
    }

    pub fn cancel_pending(&mut self) {
        self.pending = None;
    }

    /// Closes the open interval at `end`. An end mark before the start mark
    /// is a hard validation error: the pending interval is discarded and no
    /// record is created.
    pub fn commit(
        &mut self,
        end: f64,
        labels: Vec<String>,
        languages: BTreeSet<Language>,
        remarks: String,
    ) -> Result<&Tag, TagError> {
        let pending = self.pending.ok_or(TagError::NoPendingInterval)?;
        if end < pending.start {
            log::warn!(
                "End mark {:.3}s is before start mark {:.3}s, discarding tag",
                end,
                pending.start
            );
            self.pending = None;
            return Err(TagError::EndBeforeStart);
        }
        self.pending = None;
        let tag = Tag::new(pending.start, end, labels, languages, remarks);
        self.tags.push(tag);
        Ok(self.tags.last().unwrap())
    }

    /// Removes a tag by identity. The confirmation step is a UI contract and
    /// happens before this call.
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|tag| tag.id != id);
        before != self.tags.len()
    }

    pub fn update_labels(&mut self, id: &str, labels: Vec<String>) -> bool {
        match self.tags.iter_mut().find(|tag| tag.id == id) {
            Some(tag) => {
                tag.labels = normalize_labels(labels);
                true
            }
            None => false,
        }
    }

    pub fn update_remarks(&mut self, id: &str, remarks: &str) -> bool {
        match self.tags.iter_mut().find(|tag| tag.id == id) {
            Some(tag) => {
                tag.remarks = remarks.trim().to_string();
                true
            }
            None => false,
        }
    }

    pub fn update_languages(&mut self, id: &str, languages: BTreeSet<Language>) -> bool {
        match self.tags.iter_mut().find(|tag| tag.id == id) {
            Some(tag) => {
                tag.languages = languages;
                true
            }
            None => false,
        }
    }

    /// Stable ascending view by start time; ties keep insertion order.
    pub fn sorted_by_start(&self) -> Vec<&Tag> {
        let mut sorted: Vec<&Tag> = self.tags.iter().collect();
        sorted.sort_by(|a, b| a.start.partial_cmp(&b.start).unwrap_or(std::cmp::Ordering::Equal));
        sorted
    }

    /// Wholesale replacement, used by session load.
    pub fn replace_all(&mut self, tags: Vec<Tag>) {
        self.pending = None;
        self.tags = tags;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn languages(langs: &[Language]) -> BTreeSet<Language> {
        langs.iter().copied().collect()
    }

    #[test]
    fn test_commit_creates_record() {
        let mut store = IntervalStore::new();
        store.begin(12.34);
        let tag = store
            .commit(
                45.01,
                vec!["Greeting".to_string()],
                languages(&[Language::English]),
                String::new(),
            )
            .unwrap();
        assert_eq!(tag.start, 12.34);
        assert_eq!(tag.end, 45.01);
        assert_eq!(tag.labels, vec!["Greeting"]);
        assert!(tag.languages.contains(&Language::English));
        assert_eq!(store.len(), 1);
        assert!(store.pending().is_none());
    }

    #[test]
    fn test_end_before_start_discards_pending() {
        let mut store = IntervalStore::new();
        store.begin(20.0);
        let result = store.commit(10.0, Vec::new(), BTreeSet::new(), String::new());
        assert_eq!(result.unwrap_err(), TagError::EndBeforeStart);
        assert!(store.is_empty());
        assert!(store.pending().is_none());
    }

    #[test]
    fn test_commit_without_pending_fails() {
        let mut store = IntervalStore::new();
        let result = store.commit(5.0, Vec::new(), BTreeSet::new(), String::new());
        assert_eq!(result.unwrap_err(), TagError::NoPendingInterval);
    }

    #[test]
    fn test_zero_length_interval_is_allowed() {
        let mut store = IntervalStore::new();
        store.begin(7.5);
        let tag = store
            .commit(7.5, Vec::new(), BTreeSet::new(), String::new())
            .unwrap();
        assert_eq!(tag.start, tag.end);
    }

    #[test]
    fn test_sorted_by_start_is_stable() {
        let mut store = IntervalStore::new();
        for (start, label) in [(5.0, "a"), (2.0, "first"), (2.0, "second")] {
            store.begin(start);
            store
                .commit(start + 1.0, vec![label.to_string()], BTreeSet::new(), String::new())
                .unwrap();
        }
        let sorted = store.sorted_by_start();
        assert_eq!(sorted[0].labels, vec!["first"]);
        assert_eq!(sorted[1].labels, vec!["second"]);
        assert_eq!(sorted[2].labels, vec!["a"]);
    }

    #[test]
    fn test_normalize_labels_dedups_and_drops_sentinel() {
        let labels = normalize_labels(vec![
            " Greeting ".to_string(),
            "9999".to_string(),
            "Greeting".to_string(),
            String::new(),
            "Farewell".to_string(),
        ]);
        assert_eq!(labels, vec!["Greeting", "Farewell"]);
    }

    #[test]
    fn test_delete_by_identity() {
        let mut store = IntervalStore::new();
        store.begin(0.0);
        store.commit(1.0, Vec::new(), BTreeSet::new(), String::new()).unwrap();
        let id = store.tags()[0].id.clone();
        assert!(store.delete(&id));
        assert!(!store.delete(&id));
        assert!(store.is_empty());
    }

    #[test]
    fn test_update_operations() {
        let mut store = IntervalStore::new();
        store.begin(0.0);
        store.commit(1.0, Vec::new(), BTreeSet::new(), String::new()).unwrap();
        let id = store.tags()[0].id.clone();

        assert!(store.update_labels(&id, vec!["Song".to_string(), "Song".to_string()]));
        assert_eq!(store.get(&id).unwrap().labels, vec!["Song"]);

        assert!(store.update_remarks(&id, "  noisy segment  "));
        assert_eq!(store.get(&id).unwrap().remarks, "noisy segment");

        assert!(store.update_languages(&id, [Language::Mandarin].into_iter().collect()));
        assert!(store.get(&id).unwrap().languages.contains(&Language::Mandarin));

        assert!(!store.update_remarks("missing", "x"));
    }

    #[test]
    fn test_validity_window() {
        let tag = Tag::new(5.0, 10.0, Vec::new(), BTreeSet::new(), String::new());
        assert!(tag.is_valid_for(20.0));
        assert!(!tag.is_valid_for(8.0));
        let negative = Tag {
            start: -1.0,
            ..Tag::new(0.0, 1.0, Vec::new(), BTreeSet::new(), String::new())
        };
        assert!(!negative.is_valid_for(20.0));
    }
}
