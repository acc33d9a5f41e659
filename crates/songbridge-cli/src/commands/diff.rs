//! Diff command - preview the changes a sync would make.

use std::path::PathBuf;

use colored::Colorize;
use songbridge::{CancellationToken, ErrorKind, SyncMode, load_raw_items};

use super::sync::options_for;
use super::{CommandResult, build_engine, decision_line};
use crate::cli::{EngineArgs, TargetArgs};
use crate::snapshot::DestinationSnapshot;

pub fn run(
    source: PathBuf,
    target: TargetArgs,
    engine_args: EngineArgs,
    mode: Option<SyncMode>,
    ai_budget: Option<u32>,
    remove_pending: bool,
    cancel: &CancellationToken,
) -> CommandResult {
    let items = load_raw_items(&source)?;
    let engine = build_engine(&engine_args, Some(&target.catalog), Some(&source))?;
    let destination = DestinationSnapshot::load_or_empty(&target.destination)?;
    let options = options_for(engine.default_options(), mode, ai_budget, remove_pending);

    let plan = engine.reconcile(&items, destination.tracks, &options, cancel);

    if plan.is_noop() && plan.pending_confirmation.is_empty() {
        println!("{}", "Destination is up to date.".green());
        return Ok(());
    }

    println!(
        "{} {} ({} entries, {} already present)",
        "Previewing".cyan().bold(),
        plan.mode,
        plan.total_processed.to_string().white().bold(),
        plan.already_present
    );
    println!();

    for decision in &plan.to_add {
        println!("  {} {}", "+".green().bold(), decision_line(decision));
    }
    for native_id in &plan.to_remove {
        println!("  {} {}", "-".red().bold(), native_id);
    }
    for decision in &plan.pending_confirmation {
        println!("  {} {}", "?".yellow().bold(), decision_line(decision));
    }
    for failure in &plan.failures {
        let label = failure
            .raw_item
            .as_ref()
            .map(|item| item.raw_label.as_str())
            .unwrap_or_default();
        println!("  {} [{}] {}", "!".red().bold(), failure.kind.label(), label);
    }

    let incomplete = plan.cancelled
        || plan
            .failures
            .iter()
            .any(|f| f.kind != ErrorKind::InvalidInput);
    if plan.mode == SyncMode::Mirror && incomplete {
        println!();
        println!(
            "{}",
            "Removals withheld: some entries could not be evaluated.".yellow()
        );
    }

    println!();
    println!(
        "Run {} to apply these changes.",
        format!("songbridge sync {}", source.display()).cyan().bold()
    );

    Ok(())
}
