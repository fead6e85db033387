//! `f5500 download` - fetch a dataset into the archive

use anyhow::Result;
use clap::Args;

use f5500_archive::{HttpFetcher, WriteOutcome};
use f5500_core::SharedProgress;

use super::KeyArgs;
use crate::config::Config;

#[derive(Args, Debug)]
pub struct DownloadArgs {
    #[command(flatten)]
    pub key: KeyArgs,

    /// Replace an existing container for the same version
    #[arg(long)]
    pub overwrite: bool,
}

pub fn run(args: DownloadArgs, config: &Config, progress: &SharedProgress) -> Result<()> {
    let key = args.key.key()?;
    let store = f5500_archive::ArchiveStore::new(&config.archive.root)?;
    let stale = store.cleanup_tmp()?;
    if stale > 0 {
        log::info!("removed {stale} interrupted download(s)");
    }

    let fetcher = HttpFetcher::new(config.source.base_url.as_str()).with_progress(progress.clone());
    let got = f5500_archive::download(&fetcher, &store, &key, args.overwrite)?;

    let note = match got.outcome {
        WriteOutcome::Created => "stored",
        WriteOutcome::Overwritten => "replaced",
        WriteOutcome::Unchanged => "already present, kept existing copy",
    };
    progress.println(format!(
        "{key} @ {}: {note} ({})",
        got.version,
        got.path.display()
    ));
    Ok(())
}
