//! Subcommand implementations

use anyhow::Result;
use clap::Args;
use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

use f5500_archive::{ArchiveStore, ArtifactKey};

use crate::config::Config;

pub mod clean;
pub mod download;
pub mod latest;
pub mod list;
pub mod read;

/// Dataset identity as published by EBSA, e.g. `SCH_A 2022 Latest`.
#[derive(Args, Debug)]
pub struct KeyArgs {
    /// Form or schedule name (5500, SCH_A, ...)
    pub schedule: String,
    /// Plan year
    pub year: String,
    /// Publication flavour (Latest, All, ...)
    pub modality: String,
}

impl KeyArgs {
    pub fn key(&self) -> Result<ArtifactKey> {
        Ok(ArtifactKey::new(
            self.schedule.as_str(),
            self.year.as_str(),
            self.modality.as_str(),
        )?)
    }
}

fn open_store(config: &Config) -> ArchiveStore {
    ArchiveStore::open(&config.archive.root)
}

fn table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(headers.iter().map(|h| Cell::new(h).fg(Color::Cyan)));
    table
}
