//! Error types for the acquisition pipeline.
//!
//! Batch-level errors ([`Error`]) escalate to the process boundary and end the
//! run. Per-track errors ([`TrackError`]) are caught by the coordinator and
//! recorded as a failed outcome. Tag write errors ([`TagWriteError`]) never
//! change a track's outcome.

use std::path::PathBuf;

/// Result type for batch-level operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort the whole run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input is not a recognized catalog URL.
    #[error("invalid catalog reference: {0}")]
    InvalidReference(String),

    /// The playlist is not public.
    #[error("playlist {0} is private. Change its visibility to public and try again")]
    PrivateCollection(String),

    /// Catalog lookup failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Credentials or settings are missing.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors returned by the catalog provider.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog authentication failed: {0}")]
    Auth(String),

    #[error("catalog network error: {0}")]
    Network(String),

    #[error("catalog record not found: {0}")]
    NotFound(String),

    #[error("catalog request to {url} failed with status {status}")]
    Status { status: u16, url: String },

    /// The record parsed but violates a descriptor invariant.
    #[error("malformed catalog record: {0}")]
    Malformed(String),
}

impl CatalogError {
    /// Whether a collection member with this error can be dropped without
    /// failing the whole collection.
    pub fn is_member_skippable(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Malformed(_))
    }
}

/// Per-track failures. Each one ends that track's pipeline only.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrackError {
    #[error("no match found for \"{query}\"")]
    NoMatchFound { query: String },

    #[error("search failed: {0}")]
    Search(String),

    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("transcode failed: {0}")]
    Transcode(String),
}

/// Tag writing failed after the retry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to write tags to {path}: {message}")]
pub struct TagWriteError {
    pub path: PathBuf,
    pub message: String,
}

impl TagWriteError {
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}
