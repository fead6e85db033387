//! Read access: locate a stored container and hand its data entry to a parser

use std::fs::File;
use std::io::{self, BufReader, Cursor, Read};

use crate::container;
use crate::error::{ArchiveError, Result};
use crate::key::ArtifactKey;
use crate::store::{ArchiveStore, StoredArtifact};
use crate::version::{Version, VersionSpec};

/// The extracted data entry of a stored container, as a byte stream.
#[derive(Debug)]
pub struct DataEntry {
    key: ArtifactKey,
    version: Version,
    name: String,
    data: Cursor<Vec<u8>>,
}

impl DataEntry {
    pub fn key(&self) -> &ArtifactKey {
        &self.key
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// Entry name inside the container.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.data.get_ref().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.get_ref().is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data.into_inner()
    }
}

impl Read for DataEntry {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.data.read(buf)
    }
}

/// Opens stored containers for a tabular parser.
///
/// Safe to use alongside writers to other keys. A reconciler pass deleting
/// the same key can surface as a transient `NotFound`.
pub struct Reader<'a> {
    store: &'a ArchiveStore,
}

impl<'a> Reader<'a> {
    pub fn new(store: &'a ArchiveStore) -> Self {
        Self { store }
    }

    /// Extract the data entry of `key` at `spec` into memory.
    pub fn open(&self, key: &ArtifactKey, spec: VersionSpec) -> Result<DataEntry> {
        let artifact = self.store.locate(key, spec)?;
        let extracted = read_artifact(&artifact, |name, entry| {
            let mut data = Vec::new();
            entry.read_to_end(&mut data).map(|_| (name.to_string(), data))
        })?;
        let (name, data) = extracted.map_err(|e| ArchiveError::io(&artifact.path, e))?;
        Ok(DataEntry {
            key: artifact.key,
            version: artifact.version,
            name,
            data: Cursor::new(data),
        })
    }

    /// Stream the data entry of `key` at `spec` straight into `parse`,
    /// along with the entry name. Returns the version read and the parser's output.
    pub fn read_with<T>(
        &self,
        key: &ArtifactKey,
        spec: VersionSpec,
        parse: impl FnOnce(&str, &mut dyn Read) -> T,
    ) -> Result<(Version, T)> {
        let artifact = self.store.locate(key, spec)?;
        let out = read_artifact(&artifact, parse)?;
        Ok((artifact.version, out))
    }
}

fn read_artifact<T>(
    artifact: &StoredArtifact,
    f: impl FnOnce(&str, &mut dyn Read) -> T,
) -> Result<T> {
    let file = File::open(&artifact.path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ArchiveError::NotFound {
            key: artifact.key.to_string(),
            version: Some(artifact.version),
        },
        _ => ArchiveError::io(&artifact.path, e),
    })?;
    let container = artifact.path.display().to_string();
    container::with_data_entry(BufReader::new(file), &container, f)
}
