//! Error taxonomy for the archive engine

use std::path::PathBuf;

use f5500_core::FetchError;
use thiserror::Error;

use crate::version::Version;

/// Every failure the archive engine reports.
///
/// Variants carry the key, version or path involved so callers can log or
/// re-raise without extra bookkeeping. The only non-error "nothing happened"
/// result is [`WriteOutcome::Unchanged`](crate::WriteOutcome::Unchanged).
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Fetch failed (non-2xx status, network failure). Never retried here.
    #[error("failed to fetch {key}: {source}")]
    Transport {
        key: String,
        #[source]
        source: FetchError,
    },

    /// Bytes are not a readable ZIP container.
    #[error("{container}: not a readable zip container: {source}")]
    InvalidContainer {
        container: String,
        #[source]
        source: zip::result::ZipError,
    },

    /// Container holds no data entry.
    #[error("{container}: no .csv entry found in container")]
    NoDataEntry { container: String },

    /// Container holds more than one data entry.
    #[error("{container}: {} .csv entries found, expected exactly one: {}", .entries.len(), .entries.join(", "))]
    AmbiguousDataEntry {
        container: String,
        entries: Vec<String>,
    },

    /// Data entry carries no usable last-modified timestamp.
    #[error("{container}: entry {entry} has no valid last-modified date")]
    InvalidTimestamp { container: String, entry: String },

    /// Caller-supplied version is not `YYYY-MM-DD`.
    #[error("invalid version {input:?}: expected 'latest' or a date in YYYY-MM-DD format")]
    InvalidVersionFormat { input: String },

    /// Artifact key component is empty or unsafe for use in a file name.
    #[error("invalid artifact key: {reason}")]
    InvalidKey { reason: String },

    /// No stored artifact for the key (at the given version, if any).
    #[error("{key} not found in archive{}", .version.as_ref().map(|v| format!(" under {v}")).unwrap_or_default())]
    NotFound {
        key: String,
        version: Option<Version>,
    },

    /// Writing or renaming a stored artifact failed. No partial file is visible.
    #[error("failed to write {}: {source}", .path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Other filesystem failure while scanning, reading or deleting.
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ArchiveError>;

impl ArchiveError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::WriteFailure {
            path: path.into(),
            source,
        }
    }

    /// Whether this is a `NotFound`, which may be transient while a
    /// reconciler pass is deleting the same key.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
