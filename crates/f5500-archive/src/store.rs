//! Version-keyed archive store
//!
//! Directory layout:
//! ```text
//! {root}/
//! ├── {YYYY-MM-DD}/                      # version folder
//! │   ├── {schedule}_{year}_{modality}.zip
//! │   └── *.zip.tmp                      # in-flight write (never a stored artifact)
//! └── ...
//! ```
//!
//! At most one container per key per version folder (file name uniqueness).
//! Cross-version duplicates are allowed here and removed by the reconciler.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{ArchiveError, Result};
use crate::hash;
use crate::key::{ArtifactKey, CONTAINER_EXTENSION};
use crate::version::Version;

/// Suffix of in-flight writes.
const TMP_SUFFIX: &str = ".tmp";
const TMP_EXTENSION: &str = "tmp";

/// Result of [`ArchiveStore::put`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteOutcome {
    /// No container existed for this key and version; written.
    Created,
    /// A container existed and overwrite was off; nothing written.
    Unchanged,
    /// A container existed and was atomically replaced.
    Overwritten,
}

impl fmt::Display for WriteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Created => "created",
            Self::Unchanged => "unchanged",
            Self::Overwritten => "overwritten",
        })
    }
}

/// A container persisted for one key under one version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    pub key: ArtifactKey,
    pub version: Version,
    pub path: PathBuf,
}

/// A directory under the root whose name parses as a date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionFolder {
    pub version: Version,
    /// Directory name as found on disk.
    pub name: String,
    pub path: PathBuf,
    /// `.zip` file names inside, sorted.
    pub artifacts: Vec<String>,
    /// Anything else inside except `.tmp` leftovers, sorted. Such a folder
    /// is never pruned.
    pub foreign: Vec<String>,
}

impl VersionFolder {
    pub fn contains(&self, file_name: &str) -> bool {
        self.artifacts.iter().any(|a| a == file_name)
    }

    /// Whether the name is the canonical `YYYY-MM-DD` spelling of its date.
    pub fn is_canonical(&self) -> bool {
        self.name == self.version.folder_name()
    }

    /// Total order used for "most recent": date first, then the canonical
    /// spelling, then folder name.
    pub(crate) fn recency(&self) -> (Version, bool, &str) {
        (self.version, self.is_canonical(), &self.name)
    }
}

/// Summary of a stored artifact for listing.
#[derive(Debug, Serialize)]
pub struct StoreEntry {
    pub key: ArtifactKey,
    pub version: Version,
    pub size_bytes: u64,
    pub content_hash: String,
    pub path: PathBuf,
}

/// Date-versioned archive rooted at a directory.
#[derive(Debug, Clone)]
pub struct ArchiveStore {
    root: PathBuf,
}

impl ArchiveStore {
    /// Create a store rooted at `root`, creating the directory if needed.
    pub fn new(root: &Path) -> Result<Self> {
        fs::create_dir_all(root).map_err(|e| ArchiveError::write(root, e))?;
        Ok(Self::open(root))
    }

    /// Store handle without touching the filesystem. A missing root reads as empty.
    pub fn open(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn version_dir(&self, version: Version) -> PathBuf {
        self.root.join(version.folder_name())
    }

    /// `{root}/{version}/{key}.zip`
    pub fn artifact_path(&self, key: &ArtifactKey, version: Version) -> PathBuf {
        self.version_dir(version).join(key.file_name())
    }

    pub fn contains(&self, key: &ArtifactKey, version: Version) -> bool {
        self.artifact_path(key, version).is_file()
    }

    /// Persist `bytes` as the container for `key` under `version`.
    ///
    /// Creates the root and version folder on demand. Existing containers
    /// are left alone unless `overwrite` is set, in which case they are
    /// replaced via write-then-rename so no truncated file is ever visible.
    pub fn put(
        &self,
        key: &ArtifactKey,
        version: Version,
        bytes: &[u8],
        overwrite: bool,
    ) -> Result<WriteOutcome> {
        let dir = self.version_dir(version);
        if !dir.is_dir() {
            log::debug!("creating version folder {}", dir.display());
            fs::create_dir_all(&dir).map_err(|e| ArchiveError::write(&dir, e))?;
        }

        let target = dir.join(key.file_name());
        let outcome = if !target.exists() {
            WriteOutcome::Created
        } else if overwrite {
            WriteOutcome::Overwritten
        } else {
            log::info!("{key}: already archived under {version}, no changes made");
            return Ok(WriteOutcome::Unchanged);
        };

        write_atomic(&target, bytes)?;
        log::info!("{key}: {outcome} under {version} ({} bytes)", bytes.len());
        Ok(outcome)
    }

    /// All version folders, oldest first (ties ordered by folder name).
    ///
    /// Directories whose names are not dates are not version folders and
    /// are skipped, as are plain files at the root.
    pub fn scan(&self) -> Result<Vec<VersionFolder>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ArchiveError::io(&self.root, e)),
        };

        let mut folders = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ArchiveError::io(&self.root, e))?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            let Some(version) = Version::from_folder_name(&name) else {
                log::debug!("skipping non-version folder {name}");
                continue;
            };
            let (artifacts, foreign) = folder_contents(&path)?;
            folders.push(VersionFolder {
                version,
                name,
                path,
                artifacts,
                foreign,
            });
        }

        folders.sort_by(|a, b| a.recency().cmp(&b.recency()));
        Ok(folders)
    }

    /// List every stored artifact, sorted by key then version.
    pub fn list(&self) -> Result<Vec<StoreEntry>> {
        let mut entries = Vec::new();
        for folder in self.scan()? {
            for file_name in &folder.artifacts {
                let key = match ArtifactKey::from_file_name(file_name) {
                    Ok(key) => key,
                    Err(e) => {
                        log::warn!("skipping {}/{file_name}: {e}", folder.name);
                        continue;
                    }
                };
                let path = folder.path.join(file_name);
                let size_bytes = fs::metadata(&path)
                    .map_err(|e| ArchiveError::io(&path, e))?
                    .len();
                let content_hash = hash::hash_file(&path)
                    .map(|h| hash::short_hash(&h))
                    .map_err(|e| ArchiveError::io(&path, e))?;
                entries.push(StoreEntry {
                    key,
                    version: folder.version,
                    size_bytes,
                    content_hash,
                    path,
                });
            }
        }

        entries.sort_by(|a, b| (&a.key, a.version).cmp(&(&b.key, b.version)));
        Ok(entries)
    }

    /// Remove `.tmp` files left by interrupted writes. Returns how many were removed.
    pub fn cleanup_tmp(&self) -> Result<usize> {
        let pattern = self.root.join("*").join(format!("*{TMP_SUFFIX}"));
        let pattern_str = pattern.to_string_lossy();

        let mut count = 0;
        for path in glob::glob(&pattern_str)
            .map_err(|e| ArchiveError::io(&self.root, io::Error::other(e)))?
            .filter_map(|p| p.ok())
            .filter(|p| p.is_file())
        {
            log::info!("removing stale tmp {}", path.display());
            fs::remove_file(&path).map_err(|e| ArchiveError::io(&path, e))?;
            count += 1;
        }
        Ok(count)
    }
}

/// Entries directly inside `dir`, split into `.zip` containers and
/// foreign entries. Stale `.tmp` files belong to neither.
fn folder_contents(dir: &Path) -> Result<(Vec<String>, Vec<String>)> {
    let mut containers = Vec::new();
    let mut foreign = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| ArchiveError::io(dir, e))? {
        let entry = entry.map_err(|e| ArchiveError::io(dir, e))?;
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        let has_ext = |ext: &str| path.is_file() && path.extension().is_some_and(|e| e == ext);

        if has_ext(CONTAINER_EXTENSION) {
            containers.push(name);
        } else if !has_ext(TMP_EXTENSION) {
            foreign.push(name);
        }
    }
    containers.sort();
    foreign.sort();
    Ok((containers, foreign))
}

/// Write to `{target}.tmp`, fsync, then rename over `target`.
fn write_atomic(target: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp_name = target.as_os_str().to_owned();
    tmp_name.push(TMP_SUFFIX);
    let tmp = PathBuf::from(tmp_name);

    let written = fs::File::create(&tmp).and_then(|mut f| {
        f.write_all(bytes)?;
        f.sync_all()
    });
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(ArchiveError::write(&tmp, e));
    }

    fs::rename(&tmp, target).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        ArchiveError::write(target, e)
    })
}
