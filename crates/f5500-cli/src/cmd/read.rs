//! `f5500 read` - stream a stored dataset's CSV

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use f5500_archive::{Reader, VersionSpec};

use super::KeyArgs;
use crate::config::Config;

#[derive(Args, Debug)]
pub struct ReadArgs {
    #[command(flatten)]
    pub key: KeyArgs,

    /// Version to read: `latest` or YYYY-MM-DD
    #[arg(long, default_value = "latest")]
    pub version: VersionSpec,

    /// Output file (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run(args: ReadArgs, config: &Config) -> Result<()> {
    let key = args.key.key()?;
    let store = super::open_store(config);

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };

    let (version, copied) = Reader::new(&store).read_with(&key, args.version, |name, entry| {
        log::debug!("{key}: streaming entry {name}");
        io::copy(entry, &mut out)
    })?;
    let bytes = copied.context("Failed to write CSV")?;
    out.flush()?;

    log::info!("{key} @ {version}: {bytes} bytes");
    Ok(())
}
