//! `f5500 clean` - reconcile the archive to one copy per dataset

use std::io::{self, BufRead, Write};

use anyhow::Result;
use clap::Args;
use comfy_table::{Cell, Color};

use f5500_archive::{ReconcilePlan, ReconcileStatus, Reconciler};

use crate::config::Config;

#[derive(Args, Debug)]
pub struct CleanArgs {
    /// Show what would be removed without deleting anything
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

pub fn run(args: CleanArgs, config: &Config) -> Result<()> {
    let store = super::open_store(config);
    let report = Reconciler::new(&store).run(|plan| {
        print_plan(plan);
        if args.dry_run {
            eprintln!("Run without --dry-run to apply.");
            false
        } else {
            args.yes || prompt("Proceed with deletion?")
        }
    })?;

    match report.status {
        ReconcileStatus::Clean => eprintln!("Archive is already clean."),
        ReconcileStatus::Declined if args.dry_run => {}
        ReconcileStatus::Declined => eprintln!("Aborted, nothing removed."),
        ReconcileStatus::Applied => {
            eprintln!(
                "Removed {} superseded files, pruned {} folders.",
                report.removed.len(),
                report.pruned.len()
            );
            for path in &report.skipped_folders {
                eprintln!("  kept {} (contains other files)", path.display());
            }
        }
    }
    Ok(())
}

fn print_plan(plan: &ReconcilePlan) {
    if !plan.removals.is_empty() {
        let mut table = super::table(&["Dataset", "Version", "Superseded by"]);
        for removal in &plan.removals {
            table.add_row(vec![
                Cell::new(&removal.file_name),
                Cell::new(removal.version).fg(Color::Red),
                Cell::new(removal.superseded_by).fg(Color::Green),
            ]);
        }
        eprintln!("\nWould remove {} superseded files:", plan.removals.len());
        eprintln!("{table}");
    }

    if !plan.empty_folders.is_empty() {
        eprintln!("Would prune {} version folders:", plan.empty_folders.len());
        for path in &plan.empty_folders {
            eprintln!("  {}", path.display());
        }
    }

    for path in &plan.skipped_folders {
        eprintln!("  kept {} (contains other files)", path.display());
    }

    for name in &plan.ties {
        eprintln!("  note: {name} has several folders with the same date");
    }
}

/// Ask a yes/no question on stderr; anything but y/yes is a no.
fn prompt(question: &str) -> bool {
    eprint!("{question} [y/N] ");
    let _ = io::stderr().flush();

    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => is_yes(&answer),
        Err(e) => {
            log::warn!("could not read confirmation: {e}");
            false
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
