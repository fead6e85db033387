//! Artifact key: the `(schedule, year, modality)` triple naming one dataset

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{ArchiveError, Result};

/// Extension of stored containers.
pub const CONTAINER_EXTENSION: &str = "zip";

/// Identifies one logical dataset across all of its published versions.
///
/// Stored as `<schedule>_<year>_<modality>.zip`. Schedules may contain
/// underscores (`SCH_A`, `5500_SF`); year is numeric and modality has none,
/// which is what lets [`ArtifactKey::from_file_name`] split from the right.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ArtifactKey {
    schedule: String,
    year: String,
    modality: String,
}

impl ArtifactKey {
    pub fn new(
        schedule: impl Into<String>,
        year: impl Into<String>,
        modality: impl Into<String>,
    ) -> Result<Self> {
        let key = Self {
            schedule: schedule.into(),
            year: year.into(),
            modality: modality.into(),
        };
        key.validate()?;
        Ok(key)
    }

    fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("schedule", &self.schedule),
            ("year", &self.year),
            ("modality", &self.modality),
        ] {
            if value.is_empty() {
                return Err(invalid(format!("{field} is empty")));
            }
            if value
                .chars()
                .any(|c| c == '/' || c == '\\' || c == '.' || c.is_whitespace())
            {
                return Err(invalid(format!("{field} {value:?} contains a path character")));
            }
        }
        if !self.year.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid(format!("year {:?} is not numeric", self.year)));
        }
        if self.modality.contains('_') {
            return Err(invalid(format!(
                "modality {:?} must not contain '_'",
                self.modality
            )));
        }
        Ok(())
    }

    pub fn schedule(&self) -> &str {
        &self.schedule
    }

    pub fn year(&self) -> &str {
        &self.year
    }

    pub fn modality(&self) -> &str {
        &self.modality
    }

    /// File name of the stored container: `<schedule>_<year>_<modality>.zip`.
    pub fn file_name(&self) -> String {
        format!("{self}.{CONTAINER_EXTENSION}")
    }

    /// Parse a stored container file name back into its key.
    pub fn from_file_name(name: &str) -> Result<Self> {
        let stem = name
            .strip_suffix(CONTAINER_EXTENSION)
            .and_then(|s| s.strip_suffix('.'))
            .ok_or_else(|| invalid(format!("{name:?} is not a .{CONTAINER_EXTENSION} file")))?;
        stem.parse()
    }
}

fn invalid(reason: String) -> ArchiveError {
    ArchiveError::InvalidKey { reason }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.schedule, self.year, self.modality)
    }
}

impl FromStr for ArtifactKey {
    type Err = ArchiveError;

    /// Parse `<schedule>_<year>_<modality>`.
    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.rsplitn(3, '_');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(modality), Some(year), Some(schedule)) => Self::new(schedule, year, modality),
            _ => Err(invalid(format!(
                "{s:?} is not <schedule>_<year>_<modality>"
            ))),
        }
    }
}
