//! ZIP container inspection: the single-data-entry rule and version extraction

use std::io::{Cursor, Read, Seek};

use zip::ZipArchive;

use crate::error::{ArchiveError, Result};
use crate::version::Version;

/// Extension of the data entry inside each container (matched case-insensitively).
pub const DATA_EXTENSION: &str = ".csv";

fn is_data_entry(name: &str) -> bool {
    !name.ends_with('/') && name.to_ascii_lowercase().ends_with(DATA_EXTENSION)
}

/// Open a ZIP container; `container` names it in errors.
pub(crate) fn open_container<R: Read + Seek>(reader: R, container: &str) -> Result<ZipArchive<R>> {
    ZipArchive::new(reader).map_err(|source| ArchiveError::InvalidContainer {
        container: container.to_string(),
        source,
    })
}

/// Name of the one data entry in `archive`.
///
/// Zero matches is `NoDataEntry`, more than one is `AmbiguousDataEntry`:
/// one stored file must stand for exactly one dataset.
pub fn data_entry_name<R: Read + Seek>(archive: &ZipArchive<R>, container: &str) -> Result<String> {
    let mut entries: Vec<String> = archive
        .file_names()
        .filter(|n| is_data_entry(n))
        .map(str::to_string)
        .collect();

    match entries.len() {
        0 => Err(ArchiveError::NoDataEntry {
            container: container.to_string(),
        }),
        1 => Ok(entries.remove(0)),
        _ => {
            entries.sort();
            Err(ArchiveError::AmbiguousDataEntry {
                container: container.to_string(),
                entries,
            })
        }
    }
}

/// Derive the version of fetched container bytes from the last-modified
/// date of its data entry. No side effects.
pub fn extract_version(bytes: &[u8], container: &str) -> Result<Version> {
    let mut archive = open_container(Cursor::new(bytes), container)?;
    let name = data_entry_name(&archive, container)?;
    let entry = archive
        .by_name(&name)
        .map_err(|source| ArchiveError::InvalidContainer {
            container: container.to_string(),
            source,
        })?;

    let invalid_timestamp = || ArchiveError::InvalidTimestamp {
        container: container.to_string(),
        entry: name.clone(),
    };
    let modified = entry.last_modified().ok_or_else(invalid_timestamp)?;
    let version = Version::from_ymd(
        i32::from(modified.year()),
        u32::from(modified.month()),
        u32::from(modified.day()),
    )
    .ok_or_else(invalid_timestamp)?;

    log::debug!("{container}: data entry {name} modified {version}");
    Ok(version)
}

/// Stream the data entry of a container to `f` without buffering it.
pub fn with_data_entry<R, T>(
    reader: R,
    container: &str,
    f: impl FnOnce(&str, &mut dyn Read) -> T,
) -> Result<T>
where
    R: Read + Seek,
{
    let mut archive = open_container(reader, container)?;
    let name = data_entry_name(&archive, container)?;
    let mut entry = archive
        .by_name(&name)
        .map_err(|source| ArchiveError::InvalidContainer {
            container: container.to_string(),
            source,
        })?;
    Ok(f(&name, &mut entry))
}
