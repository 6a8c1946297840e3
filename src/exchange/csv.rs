use crate::core::session::Session;
use crate::core::tag::{Language, EMPTY_SENTINEL};
use crate::core::timefmt::format_hms;
use crate::exchange::ExchangeError;
use std::collections::BTreeSet;

/// Byte-order-mark prefix for spreadsheet compatibility.
const BOM: &str = "\u{FEFF}";

#[derive(Debug)]
pub struct CsvExport {
    pub filename: String,
    pub content: String,
}

/// Builds the CSV export: fixed columns, one 1/0 presence column per
/// language, one 1/0 presence column per distinct label seen across the
/// session (sorted alphabetically), then remarks.
pub fn export_csv(session: &Session) -> Result<CsvExport, ExchangeError> {
    if session.store.is_empty() {
        return Err(ExchangeError::NoTags);
    }
    let vid = session.vid.trim();
    if vid.is_empty() {
        return Err(ExchangeError::MissingVidForExport);
    }

    let distinct_labels: BTreeSet<&str> = session
        .store
        .tags()
        .iter()
        .flat_map(|tag| tag.labels.iter().map(String::as_str))
        .collect();

    let mut csv = String::from(BOM);
    csv.push_str("Video Source,VID,Start (s),End (s),Start (HH:MM:SS.mmm),End (HH:MM:SS.mmm)");
    for language in Language::ALL {
        csv.push(',');
        csv.push_str(language.as_str());
    }
    for label in &distinct_labels {
        csv.push(',');
        csv.push_str(&quote(label));
    }
    csv.push_str(",Remarks\n");

    for tag in session.store.sorted_by_start() {
        csv.push_str(&quote(&session.video_source));
        csv.push(',');
        csv.push_str(&quote(vid));
        csv.push_str(&format!(",{:.3},{:.3}", tag.start, tag.end));
        csv.push_str(&format!(",{},{}", format_hms(tag.start, true), format_hms(tag.end, true)));
        for language in Language::ALL {
            csv.push_str(if tag.languages.contains(&language) { ",1" } else { ",0" });
        }
        for label in &distinct_labels {
            csv.push_str(if tag.labels.iter().any(|l| l == label) { ",1" } else { ",0" });
        }
        let remarks = if tag.remarks.is_empty() { EMPTY_SENTINEL } else { tag.remarks.as_str() };
        csv.push(',');
        csv.push_str(&quote(remarks));
        csv.push('\n');
    }

    let filename = format!("{}_{}.csv", chrono::Local::now().format("%Y%m%d"), vid);
    log::info!("Built CSV export {} ({} tags)", filename, session.store.len());
    Ok(CsvExport { filename, content: csv })
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tag::Language;

    fn session_with_tags() -> Session {
        let mut session = Session::new();
        session.vid = "S1".to_string();
        session.video_source = "clip.mp4".to_string();
        session.set_pending_labels(vec!["Greeting".to_string()]);
        session.toggle_language(Language::English);
        session.start_interval(12.340, true).unwrap();
        session.commit_interval(45.010, String::new()).unwrap();
        session
    }

    #[test]
    fn test_export_scenario_row() {
        let session = session_with_tags();
        let export = export_csv(&session).unwrap();

        assert!(export.content.starts_with('\u{FEFF}'));
        let body = export.content.trim_start_matches('\u{FEFF}');
        let mut lines = body.lines();
        let header = lines.next().unwrap();
        assert_eq!(
            header,
            "Video Source,VID,Start (s),End (s),Start (HH:MM:SS.mmm),End (HH:MM:SS.mmm),Cantonese,English,Mandarin,\"Greeting\",Remarks"
        );
        let row = lines.next().unwrap();
        assert_eq!(
            row,
            "\"clip.mp4\",\"S1\",12.340,45.010,00:00:12.340,00:00:45.010,0,1,0,1,\"9999\""
        );
        assert!(export.filename.ends_with("_S1.csv"));
    }

    #[test]
    fn test_export_requires_tags() {
        let mut session = Session::new();
        session.vid = "S1".to_string();
        assert_eq!(export_csv(&session).unwrap_err(), ExchangeError::NoTags);
    }

    #[test]
    fn test_export_requires_vid() {
        let mut session = session_with_tags();
        session.vid = "  ".to_string();
        assert_eq!(export_csv(&session).unwrap_err(), ExchangeError::MissingVidForExport);
    }

    #[test]
    fn test_label_matrix_is_sorted_and_per_row() {
        let mut session = session_with_tags();
        session.set_pending_labels(vec!["Applause".to_string()]);
        session.start_interval(50.0, true).unwrap();
        session.commit_interval(60.0, String::new()).unwrap();

        let export = export_csv(&session).unwrap();
        let body = export.content.trim_start_matches('\u{FEFF}');
        let header = body.lines().next().unwrap();
        // Alphabetical: Applause before Greeting.
        assert!(header.contains("\"Applause\",\"Greeting\""));

        let rows: Vec<&str> = body.lines().skip(1).collect();
        assert!(rows[0].contains(",0,1,0,0,1,")); // Greeting row: English=1, Applause=0, Greeting=1
        assert!(rows[1].contains(",0,1,0,1,0,")); // Applause row
    }

    #[test]
    fn test_rows_sorted_by_start() {
        let mut session = Session::new();
        session.vid = "S1".to_string();
        for start in [30.0, 5.0] {
            session.start_interval(start, true).unwrap();
            session.commit_interval(start + 1.0, String::new()).unwrap();
        }
        let export = export_csv(&session).unwrap();
        let body = export.content.trim_start_matches('\u{FEFF}');
        let rows: Vec<&str> = body.lines().skip(1).collect();
        assert!(rows[0].contains(",5.000,6.000,"));
        assert!(rows[1].contains(",30.000,31.000,"));
    }

    #[test]
    fn test_quotes_are_doubled() {
        let mut session = session_with_tags();
        session.video_source = "my \"clip\".mp4".to_string();
        let export = export_csv(&session).unwrap();
        assert!(export.content.contains("\"my \"\"clip\"\".mp4\""));
    }
}
