//! Confirm and skip commands - resolve pending matches from a sync report.

use std::path::{Path, PathBuf};

use colored::Colorize;
use songbridge::{JsonlFeedbackStore, MatchDecision, Songbridge, SyncReport};

use super::{CommandResult, decision_line};
use crate::snapshot::{DestinationSnapshot, load_report, save_report};

pub fn run_confirm(
    report_path: PathBuf,
    index: usize,
    destination: PathBuf,
    feedback: PathBuf,
) -> CommandResult {
    let mut report = load_report(&report_path)?;
    let decision = pending(&report, index, &report_path)?;

    let engine = Songbridge::new().with_feedback_sink(JsonlFeedbackStore::new(&feedback));
    let snapshot = DestinationSnapshot::load_or_empty(&destination)?;
    let playlist = snapshot.playlist();

    let record = engine.confirm(&decision, &playlist)?;
    DestinationSnapshot::from_playlist(&playlist)?.save(&destination)?;

    report.pending_confirmation.remove(index);
    report.added += 1;
    save_report(&report_path, &report)?;

    println!("{} {}", "Confirmed".green().bold(), decision_line(&decision));
    println!(
        "  Added {} to {}; feedback recorded in {}",
        record.destination_native_id.unwrap_or_default().white().bold(),
        destination.display(),
        feedback.display()
    );
    Ok(())
}

pub fn run_skip(report_path: PathBuf, index: usize, feedback: PathBuf) -> CommandResult {
    let mut report = load_report(&report_path)?;
    let decision = pending(&report, index, &report_path)?;

    let engine = Songbridge::new().with_feedback_sink(JsonlFeedbackStore::new(&feedback));
    engine.skip(&decision)?;

    report.pending_confirmation.remove(index);
    save_report(&report_path, &report)?;

    println!("{} {}", "Skipped".yellow().bold(), decision_line(&decision));
    println!("  Feedback recorded in {}", feedback.display());
    Ok(())
}

fn pending(
    report: &SyncReport,
    index: usize,
    report_path: &Path,
) -> Result<MatchDecision, Box<dyn std::error::Error>> {
    report.pending_confirmation.get(index).cloned().ok_or_else(|| {
        format!(
            "No pending match at index {} in {} ({} pending)",
            index,
            report_path.display(),
            report.pending_confirmation.len()
        )
        .into()
    })
}
