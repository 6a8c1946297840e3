pub mod csv;
pub mod document;

/// Validation failures for export/save/load. Surfaced to the user as a
/// blocking dialog; the requested operation aborts with no partial state.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ExchangeError {
    #[error("No tags to export!")]
    NoTags,
    #[error("VID is required before exporting.")]
    MissingVidForExport,
    #[error("VID is required before saving the session.")]
    MissingVidForSave,
    #[error("Failed to load session: {0}")]
    InvalidDocument(String),
}

pub use csv::export_csv;
pub use document::{load_session, save_session};
