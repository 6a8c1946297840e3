use crate::core::tag::{IntervalStore, EMPTY_SENTINEL};
use std::collections::HashMap;

pub const UNSPECIFIED_LANGUAGE: &str = "Unspecified";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SummaryMode {
    #[default]
    Label,
    Language,
}

/// Frequency table over the store, used by the summary side panel. Rows are
/// ordered by count descending, then label ascending.
pub fn build_summary(store: &IntervalStore, mode: SummaryMode) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();

    for tag in store.tags() {
        match mode {
            SummaryMode::Language => {
                if tag.languages.is_empty() {
                    *counts.entry(UNSPECIFIED_LANGUAGE.to_string()).or_default() += 1;
                } else {
                    for language in &tag.languages {
                        *counts.entry(language.as_str().to_string()).or_default() += 1;
                    }
                }
            }
            SummaryMode::Label => {
                if tag.labels.is_empty() {
                    *counts.entry(EMPTY_SENTINEL.to_string()).or_default() += 1;
                } else {
                    for label in &tag.labels {
                        *counts.entry(label.clone()).or_default() += 1;
                    }
                }
            }
        }
    }

    let mut rows: Vec<(String, usize)> = counts.into_iter().collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tag::Language;
    use std::collections::BTreeSet;

    fn store_with(entries: &[(&[&str], &[Language])]) -> IntervalStore {
        let mut store = IntervalStore::new();
        for (i, (labels, langs)) in entries.iter().enumerate() {
            store.begin(i as f64);
            store
                .commit(
                    i as f64 + 1.0,
                    labels.iter().map(|l| l.to_string()).collect(),
                    langs.iter().copied().collect::<BTreeSet<_>>(),
                    String::new(),
                )
                .unwrap();
        }
        store
    }

    #[test]
    fn test_label_summary_counts_and_order() {
        let store = store_with(&[
            (&["Greeting"], &[]),
            (&["Greeting", "Song"], &[]),
            (&[], &[]),
        ]);
        let rows = build_summary(&store, SummaryMode::Label);
        assert_eq!(
            rows,
            vec![
                ("Greeting".to_string(), 2),
                ("9999".to_string(), 1),
                ("Song".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_language_summary_with_unspecified() {
        let store = store_with(&[
            (&[], &[Language::English, Language::Mandarin]),
            (&[], &[Language::English]),
            (&[], &[]),
        ]);
        let rows = build_summary(&store, SummaryMode::Language);
        assert_eq!(rows[0], ("English".to_string(), 2));
        assert!(rows.contains(&("Mandarin".to_string(), 1)));
        assert!(rows.contains(&(UNSPECIFIED_LANGUAGE.to_string(), 1)));
    }
}
