//! Fetch boundary and the fetch → version → store flow

use std::path::PathBuf;

use f5500_core::{FetchError, SharedProgress, fetch_bytes, retry_with_backoff};
use indicatif::ProgressBar;

use crate::container;
use crate::error::{ArchiveError, Result};
use crate::key::ArtifactKey;
use crate::store::{ArchiveStore, WriteOutcome};
use crate::version::Version;

/// EBSA FOIA dataset root.
pub const DEFAULT_BASE_URL: &str = "https://askebsa.dol.gov/FOIA%20Files";

/// Retrieves the raw container bytes for a key.
pub trait Fetcher {
    fn fetch(&self, key: &ArtifactKey) -> std::result::Result<Vec<u8>, FetchError>;
}

impl<F: Fetcher + ?Sized> Fetcher for &F {
    fn fetch(&self, key: &ArtifactKey) -> std::result::Result<Vec<u8>, FetchError> {
        (**self).fetch(key)
    }
}

/// Fetcher for the published FOIA layout:
/// `<base>/<year>/<modality>/F_<schedule>_<year>_<modality>.zip`.
///
/// Transient failures are retried per the global HTTP config.
pub struct HttpFetcher {
    base_url: String,
    progress: Option<SharedProgress>,
}

impl HttpFetcher {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            progress: None,
        }
    }

    /// Show a download bar per fetch.
    pub fn with_progress(mut self, progress: SharedProgress) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn url_for(&self, key: &ArtifactKey) -> String {
        let (schedule, year, modality) = (key.schedule(), key.year(), key.modality());
        format!(
            "{}/{year}/{modality}/F_{schedule}_{year}_{modality}.zip",
            self.base_url.trim_end_matches('/')
        )
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, key: &ArtifactKey) -> std::result::Result<Vec<u8>, FetchError> {
        let url = self.url_for(key);
        let label = key.to_string();
        let pb = match &self.progress {
            Some(progress) => progress.download_bar(&label),
            None => ProgressBar::hidden(),
        };

        log::info!("downloading {label}");
        log::debug!("GET {url}");
        let result = retry_with_backoff(&label, &pb, || {
            pb.set_position(0);
            fetch_bytes(&url, &pb)
        });
        pb.finish_and_clear();
        result
    }
}

/// Outcome of [`download`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Downloaded {
    pub key: ArtifactKey,
    pub version: Version,
    pub outcome: WriteOutcome,
    pub path: PathBuf,
}

/// Fetch `key`, derive its version from the container, and store it.
///
/// Malformed containers are rejected before anything is written. No retry
/// happens here beyond what the fetcher itself does.
pub fn download(
    fetcher: &dyn Fetcher,
    store: &ArchiveStore,
    key: &ArtifactKey,
    overwrite: bool,
) -> Result<Downloaded> {
    let bytes = fetcher
        .fetch(key)
        .map_err(|source| ArchiveError::Transport {
            key: key.to_string(),
            source,
        })?;

    let version = container::extract_version(&bytes, &key.file_name())?;
    log::info!("{key}: date of modification {version}");

    let outcome = store.put(key, version, &bytes, overwrite)?;
    Ok(Downloaded {
        key: key.clone(),
        version,
        outcome,
        path: store.artifact_path(key, version),
    })
}
