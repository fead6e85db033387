//! Download against the live EBSA FOIA server
//!
//! These tests require network access and are marked #[ignore] by default.
//! Run with: cargo test -p f5500-archive --test network -- --ignored

use f5500_archive::{
    ArchiveStore, ArtifactKey, HttpFetcher, Reader, VersionSpec, WriteOutcome, download,
};
use tempfile::TempDir;

/// Schedule I is one of the smaller published datasets.
#[test]
#[ignore]
fn download_schedule_i() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = ArchiveStore::new(temp_dir.path()).unwrap();
    let key = ArtifactKey::new("SCH_I", "2021", "Latest").unwrap();

    let got = download(&HttpFetcher::default(), &store, &key, false).expect("download should succeed");
    assert!(got.path.is_file());
    assert_eq!(store.resolve(&key).unwrap(), got.version);

    let (_, header) = Reader::new(&store)
        .read_with(&key, VersionSpec::Latest, |_, r| {
            let mut line = String::new();
            std::io::BufRead::read_line(&mut std::io::BufReader::new(r), &mut line).map(|_| line)
        })
        .unwrap();
    let header = header.unwrap();
    assert!(header.starts_with("ACK_ID"), "unexpected header: {header}");

    let again = download(&HttpFetcher::default(), &store, &key, false).unwrap();
    assert_eq!(again.version, got.version);
    assert_eq!(again.outcome, WriteOutcome::Unchanged);
}
