//! "Latest version" resolution across version folders

use crate::error::{ArchiveError, Result};
use crate::key::ArtifactKey;
use crate::store::{ArchiveStore, StoredArtifact};
use crate::version::{Version, VersionSpec};

impl ArchiveStore {
    /// Most recent version whose folder holds a container for `key`.
    pub fn resolve(&self, key: &ArtifactKey) -> Result<Version> {
        self.locate(key, VersionSpec::Latest).map(|a| a.version)
    }

    /// Find the stored container for `key` at `spec`.
    ///
    /// For `Latest`, folders are tried newest first and every folder is
    /// checked before giving up: a key last fetched under an old version is
    /// still the latest available for that key.
    pub fn locate(&self, key: &ArtifactKey, spec: VersionSpec) -> Result<StoredArtifact> {
        let file_name = key.file_name();

        match spec {
            VersionSpec::Pinned(version) => {
                let path = self.artifact_path(key, version);
                if !path.is_file() {
                    return Err(ArchiveError::NotFound {
                        key: key.to_string(),
                        version: Some(version),
                    });
                }
                Ok(StoredArtifact {
                    key: key.clone(),
                    version,
                    path,
                })
            }
            VersionSpec::Latest => {
                let mut folders = self.scan()?;
                folders.sort_by(|a, b| b.recency().cmp(&a.recency()));
                let newest = folders
                    .into_iter()
                    .find(|f| f.contains(&file_name))
                    .ok_or_else(|| ArchiveError::NotFound {
                        key: key.to_string(),
                        version: None,
                    })?;

                log::debug!("{key}: latest version is {}", newest.name);
                Ok(StoredArtifact {
                    key: key.clone(),
                    version: newest.version,
                    path: newest.path.join(&file_name),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn key(schedule: &str) -> ArtifactKey {
        ArtifactKey::new(schedule, "2021", "Latest").unwrap()
    }

    fn v(s: &str) -> Version {
        s.parse().unwrap()
    }

    #[test]
    fn resolve_picks_most_recent() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArchiveStore::new(dir.path()).unwrap();
        let k = key("5500");
        store.put(&k, v("2023-01-01"), b"old", false).unwrap();
        store.put(&k, v("2023-06-15"), b"new", false).unwrap();

        assert_eq!(store.resolve(&k).unwrap(), v("2023-06-15"));
    }

    #[test]
    fn resolve_falls_back_to_older_folder() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArchiveStore::new(dir.path()).unwrap();
        store.put(&key("SCH_A"), v("2022-03-01"), b"a", false).unwrap();
        // newer folders without SCH_A
        store.put(&key("5500"), v("2023-01-01"), b"b", false).unwrap();
        store.put(&key("SCH_H"), v("2023-06-15"), b"c", false).unwrap();

        assert_eq!(store.resolve(&key("SCH_A")).unwrap(), v("2022-03-01"));
    }

    #[test]
    fn resolve_ignores_non_date_folders() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArchiveStore::new(dir.path()).unwrap();
        let k = key("5500");
        store.put(&k, v("2023-01-01"), b"x", false).unwrap();
        let stray = dir.path().join("zz-manual");
        fs::create_dir_all(&stray).unwrap();
        fs::write(stray.join(k.file_name()), b"y").unwrap();

        assert_eq!(store.resolve(&k).unwrap(), v("2023-01-01"));
    }

    #[test]
    fn same_date_prefers_canonical_folder() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArchiveStore::new(dir.path()).unwrap();
        let k = key("5500");
        store.put(&k, v("2023-06-15"), b"canonical", false).unwrap();
        let odd = dir.path().join("2023-6-15");
        fs::create_dir_all(&odd).unwrap();
        fs::write(odd.join(k.file_name()), b"manual").unwrap();

        let found = store.locate(&k, VersionSpec::Latest).unwrap();
        assert_eq!(fs::read(found.path).unwrap(), b"canonical");
    }

    #[test]
    fn resolve_not_found_anywhere() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArchiveStore::new(dir.path()).unwrap();
        store.put(&key("5500"), v("2023-01-01"), b"x", false).unwrap();

        let err = store.resolve(&key("SCH_C")).unwrap_err();
        assert!(matches!(err, ArchiveError::NotFound { version: None, .. }));
    }

    #[test]
    fn resolve_empty_archive() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArchiveStore::open(&dir.path().join("missing"));
        assert!(store.resolve(&key("5500")).unwrap_err().is_not_found());
    }

    #[test]
    fn locate_pinned() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArchiveStore::new(dir.path()).unwrap();
        let k = key("5500");
        store.put(&k, v("2023-01-01"), b"old", false).unwrap();
        store.put(&k, v("2023-06-15"), b"new", false).unwrap();

        let found = store.locate(&k, VersionSpec::Pinned(v("2023-01-01"))).unwrap();
        assert_eq!(found.version, v("2023-01-01"));
        assert_eq!(fs::read(found.path).unwrap(), b"old");
    }

    #[test]
    fn locate_pinned_missing_version() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArchiveStore::new(dir.path()).unwrap();
        let k = key("5500");
        store.put(&k, v("2023-01-01"), b"x", false).unwrap();

        let err = store
            .locate(&k, VersionSpec::Pinned(v("2020-01-01")))
            .unwrap_err();
        assert!(matches!(
            err,
            ArchiveError::NotFound {
                version: Some(_),
                ..
            }
        ));
    }
}
