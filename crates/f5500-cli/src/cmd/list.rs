//! `f5500 list` - show stored datasets

use anyhow::Result;
use clap::Args;
use comfy_table::Cell;

use f5500_core::fmt_bytes;

use crate::config::Config;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Print JSON to stdout instead of a table
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: ListArgs, config: &Config) -> Result<()> {
    let entries = super::open_store(config).list()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        eprintln!("No datasets in {}.", config.archive.root.display());
        return Ok(());
    }

    let mut table = super::table(&["Schedule", "Year", "Modality", "Version", "Size", "Hash"]);
    for entry in &entries {
        table.add_row(vec![
            Cell::new(entry.key.schedule()),
            Cell::new(entry.key.year()),
            Cell::new(entry.key.modality()),
            Cell::new(entry.version),
            Cell::new(fmt_bytes(entry.size_bytes)),
            Cell::new(&entry.content_hash),
        ]);
    }

    eprintln!("\n{table}");
    eprintln!("{} datasets total", entries.len());
    Ok(())
}
