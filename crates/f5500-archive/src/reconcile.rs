//! Cross-version deduplication of stored containers
//!
//! Restores "at most one container per key across the whole archive" by
//! keeping each key's copy under its most recent version folder, deleting
//! the others, then pruning version folders left with no containers.
//!
//! Planning is a pure function of a [`ArchiveStore::scan`] snapshot, so the
//! destructive step runs only after an injected confirmation. A pass needs
//! exclusive access to the store: concurrent writes can invalidate the
//! snapshot the plan was made from.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::PathBuf;

use crate::error::{ArchiveError, Result};
use crate::store::{ArchiveStore, VersionFolder};
use crate::version::Version;

/// A stale copy scheduled for deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedRemoval {
    pub file_name: String,
    pub version: Version,
    pub path: PathBuf,
    /// Version of the copy that is kept instead.
    pub superseded_by: Version,
}

/// What a reconciliation pass would do.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    /// Stale copies, ordered by file name then version.
    pub removals: Vec<PlannedRemoval>,
    /// Surviving copy for every key that had duplicates.
    pub kept: BTreeMap<String, PathBuf>,
    /// Keys whose newest date appeared in more than one folder.
    pub ties: Vec<String>,
    /// Version folders that will hold no containers after removal.
    pub empty_folders: Vec<PathBuf>,
    /// Folders that will hold no containers but keep other files, so they
    /// stay. Informational only.
    pub skipped_folders: Vec<PathBuf>,
}

impl ReconcilePlan {
    /// Compute the plan from a snapshot of version folders.
    ///
    /// Copies are grouped by file name regardless of folder. Within a group
    /// the newest date wins. On equal dates the canonically named folder
    /// (`2023-06-15` over `2023-6-15`) wins, then the greatest folder name.
    pub fn from_folders(folders: &[VersionFolder]) -> Self {
        let mut groups: BTreeMap<&str, Vec<&VersionFolder>> = BTreeMap::new();
        for folder in folders {
            for name in &folder.artifacts {
                groups.entry(name.as_str()).or_default().push(folder);
            }
        }

        let mut plan = Self::default();
        let mut removed_per_folder: BTreeMap<&PathBuf, usize> = BTreeMap::new();

        for (file_name, mut holders) in groups {
            if holders.len() < 2 {
                continue;
            }
            holders.sort_by(|a, b| a.recency().cmp(&b.recency()));
            let Some((&winner, stale)) = holders.split_last() else {
                continue;
            };

            if stale.iter().any(|f| f.version == winner.version) {
                log::warn!(
                    "{file_name}: several folders dated {}, keeping {}",
                    winner.version,
                    winner.name
                );
                plan.ties.push(file_name.to_string());
            }

            plan.kept
                .insert(file_name.to_string(), winner.path.join(file_name));
            for &folder in stale {
                plan.removals.push(PlannedRemoval {
                    file_name: file_name.to_string(),
                    version: folder.version,
                    path: folder.path.join(file_name),
                    superseded_by: winner.version,
                });
                *removed_per_folder.entry(&folder.path).or_default() += 1;
            }
        }

        for folder in folders {
            let removed = removed_per_folder.get(&folder.path).copied().unwrap_or(0);
            if folder.artifacts.len() != removed {
                continue;
            }
            if folder.foreign.is_empty() {
                plan.empty_folders.push(folder.path.clone());
            } else {
                plan.skipped_folders.push(folder.path.clone());
            }
        }

        plan
    }

    /// Nothing to delete and nothing to prune. Skipped folders don't count.
    pub fn is_empty(&self) -> bool {
        self.removals.is_empty() && self.empty_folders.is_empty()
    }
}

/// How a reconciliation pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconcileStatus {
    /// Archive already satisfied the invariant; confirmation was not asked.
    #[default]
    Clean,
    /// Confirmation refused; nothing touched.
    Declined,
    /// Plan executed.
    Applied,
}

/// What a reconciliation pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub status: ReconcileStatus,
    pub removed: Vec<PathBuf>,
    pub pruned: Vec<PathBuf>,
    /// Empty-of-containers folders kept because they hold other files.
    pub skipped_folders: Vec<PathBuf>,
}

/// Runs deduplication passes over one store.
pub struct Reconciler<'a> {
    store: &'a ArchiveStore,
}

impl<'a> Reconciler<'a> {
    pub fn new(store: &'a ArchiveStore) -> Self {
        Self { store }
    }

    /// Dry run: what [`apply`](Self::apply) would do right now.
    pub fn plan(&self) -> Result<ReconcilePlan> {
        Ok(ReconcilePlan::from_folders(&self.store.scan()?))
    }

    /// Plan, ask `confirm`, and apply only if it returns `true`.
    pub fn run(&self, confirm: impl FnOnce(&ReconcilePlan) -> bool) -> Result<ReconcileReport> {
        let plan = self.plan()?;
        if plan.is_empty() {
            log::info!("archive already reconciled, nothing to do");
            return Ok(ReconcileReport::default());
        }
        if !confirm(&plan) {
            log::info!("reconciliation declined, no changes made");
            return Ok(ReconcileReport {
                status: ReconcileStatus::Declined,
                ..Default::default()
            });
        }
        self.apply(&plan)
    }

    /// Delete the planned stale copies, then prune every version folder
    /// that no longer holds a container. Irreversible.
    pub fn apply(&self, plan: &ReconcilePlan) -> Result<ReconcileReport> {
        let mut report = ReconcileReport {
            status: ReconcileStatus::Applied,
            ..Default::default()
        };

        for removal in &plan.removals {
            match fs::remove_file(&removal.path) {
                Ok(()) => {
                    log::info!(
                        "removed {} (superseded by {})",
                        removal.path.display(),
                        removal.superseded_by
                    );
                    report.removed.push(removal.path.clone());
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    log::warn!("{} vanished before removal, skipping", removal.path.display());
                }
                Err(e) => return Err(ArchiveError::io(&removal.path, e)),
            }
        }

        // Includes folders that were already empty before this pass.
        for folder in self.store.scan()? {
            if !folder.artifacts.is_empty() {
                continue;
            }
            if prune_folder(&folder)? {
                log::info!("pruned empty version folder {}", folder.name);
                report.pruned.push(folder.path);
            } else {
                log::warn!(
                    "version folder {} holds no containers but has other files, keeping it",
                    folder.name
                );
                report.skipped_folders.push(folder.path);
            }
        }

        Ok(report)
    }
}

/// Remove a container-free folder. Stale `.tmp` files are cleared first;
/// any other file keeps the folder. Returns whether it was removed.
fn prune_folder(folder: &VersionFolder) -> Result<bool> {
    let io_err = |e: io::Error| ArchiveError::io(&folder.path, e);

    let mut foreign = false;
    for entry in fs::read_dir(&folder.path).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        let is_tmp = path.is_file() && path.extension().is_some_and(|ext| ext == "tmp");
        if is_tmp {
            fs::remove_file(&path).map_err(|e| ArchiveError::io(&path, e))?;
        } else {
            foreign = true;
        }
    }
    if foreign {
        return Ok(false);
    }

    fs::remove_dir(&folder.path).map_err(io_err)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::key::ArtifactKey;

    fn key(schedule: &str) -> ArtifactKey {
        ArtifactKey::new(schedule, "2022", "Latest").unwrap()
    }

    fn v(s: &str) -> Version {
        s.parse().unwrap()
    }

    fn folder(name: &str, artifacts: &[&str]) -> VersionFolder {
        VersionFolder {
            version: Version::from_folder_name(name).unwrap(),
            name: name.to_string(),
            path: Path::new("/archive").join(name),
            artifacts: artifacts.iter().map(|a| a.to_string()).collect(),
            foreign: Vec::new(),
        }
    }

    /// Every key at most once, under the newest version that held it.
    fn assert_reconciled(store: &ArchiveStore) {
        let mut seen = std::collections::HashSet::new();
        for folder in store.scan().unwrap() {
            assert!(!folder.artifacts.is_empty(), "{} left empty", folder.name);
            for a in folder.artifacts {
                assert!(seen.insert(a.clone()), "{a} duplicated");
            }
        }
    }

    #[test]
    fn plan_keeps_newest() {
        let folders = vec![
            folder("2023-01-01", &["5500_2022_Latest.zip", "SCH_A_2022_Latest.zip"]),
            folder("2023-06-15", &["5500_2022_Latest.zip"]),
        ];
        let plan = ReconcilePlan::from_folders(&folders);

        assert_eq!(plan.removals.len(), 1);
        assert_eq!(plan.removals[0].version, v("2023-01-01"));
        assert_eq!(plan.removals[0].superseded_by, v("2023-06-15"));
        assert_eq!(
            plan.kept["5500_2022_Latest.zip"],
            Path::new("/archive/2023-06-15/5500_2022_Latest.zip")
        );
        assert!(plan.empty_folders.is_empty());
        assert!(plan.ties.is_empty());
    }

    #[test]
    fn plan_is_order_independent() {
        let a = folder("2023-06-15", &["x_2022_All.zip"]);
        let b = folder("2022-01-01", &["x_2022_All.zip"]);
        let c = folder("2023-01-01", &["x_2022_All.zip"]);
        let forward = ReconcilePlan::from_folders(&[a.clone(), b.clone(), c.clone()]);
        let backward = ReconcilePlan::from_folders(&[c, b, a]);

        assert_eq!(forward.kept, backward.kept);
        assert_eq!(forward.removals.len(), 2);
        assert_eq!(
            forward.kept["x_2022_All.zip"],
            Path::new("/archive/2023-06-15/x_2022_All.zip")
        );
    }

    #[test]
    fn plan_marks_fully_stale_folders_empty() {
        let folders = vec![
            folder("2023-01-01", &["5500_2022_Latest.zip"]),
            folder("2023-06-15", &["5500_2022_Latest.zip"]),
            folder("2023-07-01", &[]),
        ];
        let plan = ReconcilePlan::from_folders(&folders);
        assert_eq!(
            plan.empty_folders,
            vec![
                Path::new("/archive/2023-01-01").to_path_buf(),
                Path::new("/archive/2023-07-01").to_path_buf(),
            ]
        );
    }

    #[test]
    fn tie_keeps_canonical_folder() {
        // same calendar date, different spelling
        let folders = vec![
            folder("2023-06-15", &["5500_2022_Latest.zip"]),
            folder("2023-6-15", &["5500_2022_Latest.zip"]),
        ];
        let plan = ReconcilePlan::from_folders(&folders);

        assert_eq!(plan.ties, vec!["5500_2022_Latest.zip".to_string()]);
        assert_eq!(plan.removals.len(), 1);
        assert_eq!(
            plan.removals[0].path,
            Path::new("/archive/2023-6-15/5500_2022_Latest.zip")
        );
        assert_eq!(
            plan.kept["5500_2022_Latest.zip"],
            Path::new("/archive/2023-06-15/5500_2022_Latest.zip")
        );
        assert_eq!(plan.empty_folders, vec![Path::new("/archive/2023-6-15").to_path_buf()]);
    }

    #[test]
    fn tie_between_non_canonical_folders_keeps_greatest_name() {
        let folders = vec![
            folder("2023-06-5", &["5500_2022_Latest.zip"]),
            folder("2023-6-05", &["5500_2022_Latest.zip"]),
        ];
        let plan = ReconcilePlan::from_folders(&folders);

        assert_eq!(
            plan.kept["5500_2022_Latest.zip"],
            Path::new("/archive/2023-6-05/5500_2022_Latest.zip")
        );
    }

    #[test]
    fn pinned_read_survives_tie_reconcile() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArchiveStore::new(dir.path()).unwrap();
        store.put(&key("5500"), v("2023-06-15"), b"canonical", false).unwrap();
        let odd = dir.path().join("2023-6-15");
        fs::create_dir_all(&odd).unwrap();
        fs::write(odd.join("5500_2022_Latest.zip"), b"manual").unwrap();

        let report = Reconciler::new(&store).run(|_| true).unwrap();

        assert_eq!(report.pruned, vec![odd.clone()]);
        let found = store
            .locate(&key("5500"), crate::VersionSpec::Pinned(v("2023-06-15")))
            .unwrap();
        assert_eq!(fs::read(found.path).unwrap(), b"canonical");
    }

    #[test]
    fn clean_archive_plan_is_empty() {
        let folders = vec![
            folder("2023-01-01", &["SCH_A_2022_Latest.zip"]),
            folder("2023-06-15", &["5500_2022_Latest.zip"]),
        ];
        assert!(ReconcilePlan::from_folders(&folders).is_empty());
    }

    #[test]
    fn run_removes_duplicates_and_prunes() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArchiveStore::new(dir.path()).unwrap();
        store.put(&key("5500"), v("2023-01-01"), b"old", false).unwrap();
        store.put(&key("SCH_A"), v("2023-01-01"), b"a-old", false).unwrap();
        store.put(&key("5500"), v("2023-06-15"), b"new", false).unwrap();
        store.put(&key("SCH_A"), v("2023-03-01"), b"a-mid", false).unwrap();
        store.put(&key("SCH_A"), v("2023-06-15"), b"a-new", false).unwrap();
        store.put(&key("SCH_H"), v("2023-03-01"), b"h", false).unwrap();

        let report = Reconciler::new(&store).run(|_| true).unwrap();

        assert_eq!(report.status, ReconcileStatus::Applied);
        assert_eq!(report.removed.len(), 3);
        assert_eq!(report.pruned, vec![dir.path().join("2023-01-01")]);
        assert_reconciled(&store);
        assert_eq!(
            fs::read(store.artifact_path(&key("5500"), v("2023-06-15"))).unwrap(),
            b"new"
        );
        assert_eq!(
            fs::read(store.artifact_path(&key("SCH_A"), v("2023-06-15"))).unwrap(),
            b"a-new"
        );
        // untouched: only copy, even though its folder is older
        assert!(store.contains(&key("SCH_H"), v("2023-03-01")));
    }

    #[test]
    fn declined_run_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArchiveStore::new(dir.path()).unwrap();
        store.put(&key("5500"), v("2023-01-01"), b"old", false).unwrap();
        store.put(&key("5500"), v("2023-06-15"), b"new", false).unwrap();

        let mut seen = 0;
        let report = Reconciler::new(&store)
            .run(|plan| {
                seen = plan.removals.len();
                false
            })
            .unwrap();

        assert_eq!(seen, 1);
        assert_eq!(report.status, ReconcileStatus::Declined);
        assert!(store.contains(&key("5500"), v("2023-01-01")));
        assert!(store.contains(&key("5500"), v("2023-06-15")));
    }

    #[test]
    fn clean_archive_skips_confirmation() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArchiveStore::new(dir.path()).unwrap();
        store.put(&key("5500"), v("2023-01-01"), b"x", false).unwrap();

        let report = Reconciler::new(&store)
            .run(|_| panic!("confirmation must not be asked"))
            .unwrap();
        assert_eq!(report.status, ReconcileStatus::Clean);
    }

    #[test]
    fn prunes_preexisting_empty_folders() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArchiveStore::new(dir.path()).unwrap();
        store.put(&key("5500"), v("2023-01-01"), b"x", false).unwrap();
        fs::create_dir_all(dir.path().join("2022-12-31")).unwrap();
        let with_tmp = dir.path().join("2022-11-30");
        fs::create_dir_all(&with_tmp).unwrap();
        fs::write(with_tmp.join("5500_2022_Latest.zip.tmp"), b"partial").unwrap();

        let report = Reconciler::new(&store).run(|_| true).unwrap();

        assert_eq!(report.pruned.len(), 2);
        assert!(!dir.path().join("2022-12-31").exists());
        assert!(!with_tmp.exists());
        assert_reconciled(&store);
    }

    #[test]
    fn keeps_folder_with_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArchiveStore::new(dir.path()).unwrap();
        store.put(&key("5500"), v("2023-01-01"), b"old", false).unwrap();
        store.put(&key("5500"), v("2023-06-15"), b"new", false).unwrap();
        fs::write(dir.path().join("2023-01-01").join("notes.txt"), b"mine").unwrap();

        let report = Reconciler::new(&store).run(|_| true).unwrap();

        assert_eq!(report.removed.len(), 1);
        assert!(report.pruned.is_empty());
        assert_eq!(report.skipped_folders, vec![dir.path().join("2023-01-01")]);
        assert!(dir.path().join("2023-01-01").join("notes.txt").exists());
    }

    #[test]
    fn plan_reports_foreign_folders_as_skipped() {
        let mut with_notes = folder("2023-01-01", &["5500_2022_Latest.zip"]);
        with_notes.foreign = vec!["notes.txt".to_string()];
        let folders = vec![with_notes, folder("2023-06-15", &["5500_2022_Latest.zip"])];

        let plan = ReconcilePlan::from_folders(&folders);

        assert_eq!(plan.removals.len(), 1);
        assert!(plan.empty_folders.is_empty());
        assert_eq!(plan.skipped_folders, vec![Path::new("/archive/2023-01-01").to_path_buf()]);
    }

    #[test]
    fn foreign_only_folder_is_clean_on_rerun() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArchiveStore::new(dir.path()).unwrap();
        store.put(&key("5500"), v("2023-06-15"), b"new", false).unwrap();
        let notes = dir.path().join("2023-01-01");
        fs::create_dir_all(&notes).unwrap();
        fs::write(notes.join("notes.txt"), b"mine").unwrap();

        let plan = Reconciler::new(&store).plan().unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.skipped_folders, vec![notes.clone()]);

        for _ in 0..2 {
            let report = Reconciler::new(&store)
                .run(|_| panic!("confirmation must not be asked"))
                .unwrap();
            assert_eq!(report.status, ReconcileStatus::Clean);
        }
        assert!(notes.join("notes.txt").exists());
    }

    #[test]
    fn leaves_non_version_folders_alone() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArchiveStore::new(dir.path()).unwrap();
        store.put(&key("5500"), v("2023-01-01"), b"x", false).unwrap();
        let manual = dir.path().join("manual");
        fs::create_dir_all(&manual).unwrap();
        fs::write(manual.join("5500_2022_Latest.zip"), b"copy").unwrap();

        let report = Reconciler::new(&store).run(|_| true).unwrap();

        assert_eq!(report.status, ReconcileStatus::Clean);
        assert!(manual.join("5500_2022_Latest.zip").exists());
    }

    #[test]
    fn apply_tolerates_vanished_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArchiveStore::new(dir.path()).unwrap();
        store.put(&key("5500"), v("2023-01-01"), b"old", false).unwrap();
        store.put(&key("5500"), v("2023-06-15"), b"new", false).unwrap();

        let reconciler = Reconciler::new(&store);
        let plan = reconciler.plan().unwrap();
        fs::remove_file(store.artifact_path(&key("5500"), v("2023-01-01"))).unwrap();

        let report = reconciler.apply(&plan).unwrap();
        assert!(report.removed.is_empty());
        assert_eq!(report.pruned, vec![dir.path().join("2023-01-01")]);
    }
}
