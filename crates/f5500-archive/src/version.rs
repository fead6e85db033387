//! Calendar-date versions and "latest-or-pinned" version requests

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

use crate::error::ArchiveError;

/// Format of version strings and version folder names.
pub const VERSION_FORMAT: &str = "%Y-%m-%d";

/// Version of a published artifact: the date embedded in the artifact
/// itself, never the fetch time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Version(NaiveDate);

impl Version {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Interpret a directory name as a version folder.
    ///
    /// Lenient about zero padding so hand-made folders still take part in
    /// resolution and reconciliation; `None` means "not a version folder".
    pub fn from_folder_name(name: &str) -> Option<Self> {
        NaiveDate::parse_from_str(name, VERSION_FORMAT).ok().map(Self)
    }

    /// Canonical folder name (`YYYY-MM-DD`).
    pub fn folder_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(VERSION_FORMAT))
    }
}

impl FromStr for Version {
    type Err = ArchiveError;

    /// Strict `YYYY-MM-DD`; anything else is `InvalidVersionFormat`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ArchiveError::InvalidVersionFormat {
            input: s.to_string(),
        };
        let version = NaiveDate::parse_from_str(s, VERSION_FORMAT)
            .map(Self)
            .map_err(|_| invalid())?;
        if version.to_string() != s {
            return Err(invalid());
        }
        Ok(version)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Which version a read should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VersionSpec {
    /// Most recent version folder holding the key.
    #[default]
    Latest,
    /// Exactly this version.
    Pinned(Version),
}

impl FromStr for VersionSpec {
    type Err = ArchiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("latest") {
            Ok(Self::Latest)
        } else {
            s.parse().map(Self::Pinned)
        }
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => f.write_str("latest"),
            Self::Pinned(v) => v.fmt(f),
        }
    }
}
