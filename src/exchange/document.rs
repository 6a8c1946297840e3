use crate::core::session::Session;
use crate::core::tag::{normalize_labels, Language, Tag, EMPTY_SENTINEL};
use crate::exchange::ExchangeError;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;

/// On-disk session document. `label` stayed `string|array` across legacy
/// files, so both shapes are accepted on load; saving always writes the
/// canonical list form (or the sentinel when empty).
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionDocument {
    #[serde(rename = "videoSource", default)]
    pub video_source: String,
    #[serde(default)]
    pub vid: String,
    pub tags: Vec<TagRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TagRecord {
    #[serde(default, deserialize_with = "lenient_seconds")]
    pub start: f64,
    #[serde(default, deserialize_with = "lenient_seconds")]
    pub end: f64,
    #[serde(default = "LabelField::sentinel")]
    pub label: LabelField,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub remarks: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LabelField {
    One(String),
    Many(Vec<String>),
}

impl LabelField {
    fn sentinel() -> Self {
        LabelField::One(EMPTY_SENTINEL.to_string())
    }

    /// Legacy single-string labels may hold several values joined by `;`.
    fn into_labels(self) -> Vec<String> {
        match self {
            LabelField::One(value) => normalize_labels(value.split(';').map(str::to_string)),
            LabelField::Many(values) => normalize_labels(values),
        }
    }
}

/// Non-numeric start/end values in hand-edited files collapse to 0 instead
/// of failing the whole load.
fn lenient_seconds<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_f64().unwrap_or(0.0))
}

/// Serializes the session to the JSON document format.
pub fn save_session(session: &Session) -> Result<String, ExchangeError> {
    let vid = session.vid.trim();
    if vid.is_empty() {
        return Err(ExchangeError::MissingVidForSave);
    }

    let tags = session
        .store
        .tags()
        .iter()
        .map(|tag| TagRecord {
            start: tag.start,
            end: tag.end,
            label: if tag.labels.is_empty() {
                LabelField::sentinel()
            } else {
                LabelField::Many(tag.labels.clone())
            },
            languages: tag.languages.iter().map(|l| l.as_str().to_string()).collect(),
            remarks: tag.remarks.clone(),
        })
        .collect();

    let document = SessionDocument {
        video_source: session.video_source.clone(),
        vid: vid.to_string(),
        tags,
    };
    serde_json::to_string_pretty(&document)
        .map_err(|e| ExchangeError::InvalidDocument(e.to_string()))
}

/// Parses and validates a session document. Current state is only mutated
/// by [`SessionDocument::apply_to`] after parsing succeeded, so a malformed
/// file leaves everything untouched.
pub fn load_session(json: &str) -> Result<SessionDocument, ExchangeError> {
    serde_json::from_str::<SessionDocument>(json)
        .map_err(|e| ExchangeError::InvalidDocument(e.to_string()))
}

impl SessionDocument {
    /// Replaces the session contents with the document's. Language entries
    /// outside the fixed enumeration are silently dropped.
    pub fn apply_to(self, session: &mut Session) {
        let tags = self
            .tags
            .into_iter()
            .map(|record| {
                let languages: BTreeSet<Language> = record
                    .languages
                    .iter()
                    .filter_map(|name| {
                        Language::ALL.iter().copied().find(|l| l.as_str() == name)
                    })
                    .collect();
                Tag::new(
                    record.start,
                    record.end,
                    record.label.into_labels(),
                    languages,
                    record.remarks,
                )
            })
            .collect();

        session.store.replace_all(tags);
        session.video_source = self.video_source;
        session.vid = self.vid.trim().to_string();
        session.mark_saved();
        log::info!("Session loaded ({} tags)", session.store.len());
    }
}
