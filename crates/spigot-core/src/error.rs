//! Typed errors for the extraction engine.

use thiserror::Error;

/// Errors that can occur while extracting from an embedded database source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The database file is unreachable or the path is malformed.
    /// Fatal to the whole run.
    #[error("connection failed for '{path}': {detail}")]
    Connection { path: String, detail: String },

    /// Catalog introspection failed. Aborts the discovery phase; no
    /// partial catalog is emitted.
    #[error("catalog discovery failed: {detail}")]
    Discovery { detail: String },

    /// A qualified table name could not be parsed. Fatal only to the
    /// single resolution call.
    #[error("invalid qualified name '{name}': {detail}")]
    InvalidName { name: String, detail: String },

    /// A row fetch failed mid-stream. Marks the affected stream as
    /// failed; other streams continue.
    #[error("extraction failed for stream '{stream}': {detail}")]
    Extraction { stream: String, detail: String },

    /// Invalid or missing configuration.
    #[error("config error: {detail}")]
    Config { detail: String },
}

impl SourceError {
    pub fn connection(path: impl Into<String>, detail: impl ToString) -> Self {
        SourceError::Connection {
            path: path.into(),
            detail: detail.to_string(),
        }
    }

    pub fn discovery(detail: impl ToString) -> Self {
        SourceError::Discovery {
            detail: detail.to_string(),
        }
    }

    pub fn invalid_name(name: impl Into<String>, detail: impl ToString) -> Self {
        SourceError::InvalidName {
            name: name.into(),
            detail: detail.to_string(),
        }
    }

    pub fn extraction(stream: impl Into<String>, detail: impl ToString) -> Self {
        SourceError::Extraction {
            stream: stream.into(),
            detail: detail.to_string(),
        }
    }

    pub fn config(detail: impl ToString) -> Self {
        SourceError::Config {
            detail: detail.to_string(),
        }
    }
}
