use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised by corpus ingestion, querying, evaluation and persistence.
#[derive(Debug, Error)]
pub enum Error {
    /// The corpus location is missing or holds no file matching the filter.
    #[error("no corpus files found in {location}{}", matching(.filter))]
    CorpusNotFound { location: String, filter: Option<String> },

    #[error("question file {name:?} not found in {location}")]
    QuestionFileNotFound { location: String, name: String },

    /// A corpus source produced no documents (no title marker ever seen).
    #[error("corpus source {source_name} yielded no documents: {reason}")]
    DocumentParseAnomaly { source_name: String, reason: String },

    /// The query text normalized to nothing searchable.
    #[error("query {0:?} has no searchable terms")]
    QuerySyntax(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("index at {path} has format version {found}, expected {expected}")]
    IndexVersion { path: PathBuf, found: u32, expected: u32 },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("index encoding error: {0}")]
    Encode(#[from] bincode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn matching(filter: &Option<String>) -> String {
    filter.as_ref().map(|f| format!(" matching {f:?}")).unwrap_or_default()
}
