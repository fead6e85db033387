//! f5500-archive: date-versioned archive of Form 5500 dataset containers
//!
//! Each fetched ZIP is filed under the calendar date embedded in its single
//! CSV entry, giving one folder per published version:
//!
//! ```text
//! {root}/
//! ├── 2023-01-01/
//! │   ├── 5500_2022_Latest.zip
//! │   └── SCH_A_2022_Latest.zip
//! └── 2023-06-15/
//!     └── 5500_2022_Latest.zip
//! ```
//!
//! Reads resolve "latest" across folders; the reconciler removes stale
//! copies so each key lives under its newest version only.

pub mod container;
pub mod error;
pub mod fetcher;
pub mod hash;
pub mod key;
pub mod reader;
pub mod reconcile;
pub mod resolve;
pub mod store;
pub mod version;

pub use container::{DATA_EXTENSION, extract_version};
pub use error::{ArchiveError, Result};
pub use fetcher::{DEFAULT_BASE_URL, Downloaded, Fetcher, HttpFetcher, download};
pub use key::ArtifactKey;
pub use reader::{DataEntry, Reader};
pub use reconcile::{PlannedRemoval, ReconcilePlan, ReconcileReport, ReconcileStatus, Reconciler};
pub use store::{ArchiveStore, StoreEntry, StoredArtifact, VersionFolder, WriteOutcome};
pub use version::{Version, VersionSpec};
