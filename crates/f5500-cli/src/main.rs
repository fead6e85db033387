//! f5500 - Form 5500 dataset archive
//!
//! Downloads DOL Form 5500 datasets into a date-versioned local archive and
//! serves their CSV content back by key.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod cmd;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "f5500")]
#[command(about = "Date-versioned archive of Form 5500 datasets")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Config file path (default: ./f5500.toml or ~/.config/f5500/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Archive root directory
    #[arg(short, long, global = true)]
    archive: Option<PathBuf>,

    /// Read timeout in seconds for stall detection
    #[arg(long, global = true)]
    read_timeout: Option<u64>,

    /// Maximum retry attempts for transient failures
    #[arg(long, global = true)]
    max_retries: Option<u32>,
}

#[derive(Subcommand)]
enum Command {
    /// Download a dataset into the archive
    Download(cmd::download::DownloadArgs),
    /// Print the most recent stored version of a dataset
    Latest(cmd::KeyArgs),
    /// Write a stored dataset's CSV to stdout or a file
    Read(cmd::read::ReadArgs),
    /// List stored datasets
    List(cmd::list::ListArgs),
    /// Remove superseded copies and empty version folders
    Clean(cmd::clean::CleanArgs),
    /// Show current configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let progress = Arc::new(f5500_core::ProgressContext::new());

    // TTY: warn unless --debug, progress bars show activity.
    // non-TTY: info, logs are the only progress indicator.
    let is_tty = progress.is_tty();
    let multi = if is_tty { Some(progress.multi()) } else { None };
    let quiet = if is_tty { !cli.debug } else { false };
    f5500_core::init_logging(quiet, cli.debug, multi);

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };
    if let Some(root) = cli.archive {
        config.archive.root = root;
    }

    f5500_core::set_http_config(f5500_core::HttpConfig {
        read_timeout: std::time::Duration::from_secs(
            cli.read_timeout.unwrap_or(config.http.read_timeout),
        ),
        max_retries: cli.max_retries.unwrap_or(config.http.max_retries),
    });

    match cli.command {
        Command::Download(args) => cmd::download::run(args, &config, &progress),
        Command::Latest(args) => cmd::latest::run(args, &config),
        Command::Read(args) => cmd::read::run(args, &config),
        Command::List(args) => cmd::list::run(args, &config),
        Command::Clean(args) => cmd::clean::run(args, &config),
        Command::Config => {
            use comfy_table::{
                Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL,
            };

            let http = f5500_core::http_config();
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .apply_modifier(UTF8_ROUND_CORNERS)
                .set_header(vec![
                    Cell::new("Setting").fg(Color::Cyan),
                    Cell::new("Value").fg(Color::Cyan),
                ]);

            table.add_row(vec![
                "Archive root",
                &config.archive.root.display().to_string(),
            ]);
            table.add_row(vec!["Source base URL", &config.source.base_url]);
            table.add_row(vec![
                "Read timeout",
                &format!("{}s", http.read_timeout.as_secs()),
            ]);
            table.add_row(vec!["Max retries", &http.max_retries.to_string()]);

            eprintln!("\n{table}");
            Ok(())
        }
    }
}
