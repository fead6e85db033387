//! `f5500 latest` - print the resolved version of a key

use anyhow::Result;

use super::KeyArgs;
use crate::config::Config;

pub fn run(args: KeyArgs, config: &Config) -> Result<()> {
    let key = args.key()?;
    let version = super::open_store(config).resolve(&key)?;
    println!("{version}");
    Ok(())
}
