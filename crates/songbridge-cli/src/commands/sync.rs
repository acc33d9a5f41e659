//! Sync command - reconcile the source with the destination and apply.

use std::path::PathBuf;

use colored::Colorize;
use songbridge::{
    CancellationToken, ReconcileOptions, SkippedItem, SyncMode, SyncReport, load_raw_items,
};

use super::{CommandResult, build_engine, decision_line};
use crate::cli::{EngineArgs, TargetArgs};
use crate::snapshot::{DestinationSnapshot, default_report_path, save_report};

#[allow(clippy::too_many_arguments)]
pub fn run(
    source: PathBuf,
    target: TargetArgs,
    engine_args: EngineArgs,
    mode: Option<SyncMode>,
    ai_budget: Option<u32>,
    remove_pending: bool,
    report_path: Option<PathBuf>,
    cancel: &CancellationToken,
    verbose: bool,
) -> CommandResult {
    let items = load_raw_items(&source)?;
    let engine = build_engine(&engine_args, Some(&target.catalog), Some(&source))?;
    let destination = DestinationSnapshot::load_or_empty(&target.destination)?;

    let options = options_for(engine.default_options(), mode, ai_budget, remove_pending);

    println!(
        "{} {} entries into {} ({})",
        "Syncing".cyan().bold(),
        items.len().to_string().white().bold(),
        target.destination.display().to_string().white(),
        options.mode
    );

    let playlist = destination.playlist();
    let report = engine.sync(&items, destination.tracks.clone(), &playlist, &options, cancel);

    DestinationSnapshot::from_playlist(&playlist)?.save(&target.destination)?;
    let report_path = report_path.unwrap_or_else(|| default_report_path(&target.destination));
    save_report(&report_path, &report)?;

    print_report(&report, verbose);

    println!();
    println!(
        "{} {}",
        "Report saved to".green().bold(),
        report_path.display().to_string().white()
    );
    if !report.pending_confirmation.is_empty() {
        println!(
            "Run {} to review pending matches",
            format!("songbridge status {}", report_path.display())
                .cyan()
                .bold()
        );
    }

    Ok(())
}

/// Apply CLI overrides to the engine's default options.
pub fn options_for(
    default: ReconcileOptions,
    mode: Option<SyncMode>,
    ai_budget: Option<u32>,
    remove_pending: bool,
) -> ReconcileOptions {
    let mut options = default.with_protect_pending(!remove_pending);
    if let Some(mode) = mode {
        options.mode = mode;
    }
    if let Some(budget) = ai_budget {
        options = options.with_ai_budget(budget);
    }
    options
}

pub fn print_report(report: &SyncReport, verbose: bool) {
    println!();
    let status = if report.cancelled {
        "Cancelled".yellow().bold()
    } else if report.is_complete() {
        "Complete".green().bold()
    } else if report.is_partial() {
        "Partial".yellow().bold()
    } else {
        "Failed".red().bold()
    };
    println!("{} {}", status, report.summary());

    println!(
        "  {} added, {} removed, {} already present",
        report.added.to_string().green(),
        report.removed.to_string().red(),
        report.already_present
    );

    if !report.logged.is_empty() {
        println!();
        println!("{}", "Added at medium confidence:".cyan().bold());
        for decision in &report.logged {
            println!("  {}", decision_line(decision));
        }
    }

    if !report.pending_confirmation.is_empty() {
        println!();
        println!("{}", "Pending confirmation:".yellow().bold());
        for (i, decision) in report.pending_confirmation.iter().enumerate() {
            println!("  {:>3}. {}", i, decision_line(decision));
        }
    }

    if verbose && !report.skipped.is_empty() {
        println!();
        println!("{}", "Skipped:".dimmed().bold());
        for item in &report.skipped {
            println!("  {} ({})", item.raw_item.raw_label, skip_reason(item).dimmed());
        }
    }

    if !report.failures.is_empty() {
        println!();
        println!("{}", "Failures:".red().bold());
        for failure in &report.failures {
            let subject = failure
                .raw_item
                .as_ref()
                .map(|item| item.raw_label.clone())
                .or_else(|| failure.native_id.clone())
                .unwrap_or_default();
            println!("  [{}] {} - {}", failure.kind.label().red(), subject, failure.message.dimmed());
        }
    }
}

fn skip_reason(item: &SkippedItem) -> String {
    match (item.kind(), item.best_similarity) {
        (Some(kind), _) => kind.label().to_string(),
        (None, Some(similarity)) => format!("best {:.2}", similarity),
        (None, None) => String::new(),
    }
}
