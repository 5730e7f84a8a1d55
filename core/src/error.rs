//! Error types for recipebox-core.
//!
//! Nothing here is fatal to the process. Parse failures are recovered by the
//! caller as "no data", I/O failures leave the in-memory collection untouched,
//! and a missing id is reported as a no-op rather than raised.

use std::path::Path;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Malformed JSON in the primary store or an import artifact.
    #[error("failed to parse recipe data: {0}")]
    Parse(#[from] serde_json::Error),

    /// A filesystem operation failed.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// No record with this id exists.
    #[error("recipe '{id}' not found")]
    NotFound { id: String },

    /// A record failed validation.
    #[error("invalid recipe: {0}")]
    Invalid(String),

    /// A record with this id already exists.
    #[error("a recipe with id '{0}' already exists")]
    DuplicateId(String),

    /// The zip container could not be written or read.
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// `confirm_import` was called with nothing staged.
    #[error("there is no pending import to confirm")]
    NoPendingImport,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    #[must_use]
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Shorthand for the common "failed to <verb> <path>" I/O error.
    #[must_use]
    pub fn io_at(action: &str, path: &Path, source: std::io::Error) -> Self {
        Self::io(format!("failed to {action} {}", path.display()), source)
    }

    #[must_use]
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    #[must_use]
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::Parse(_))
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
