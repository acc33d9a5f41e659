//! Status command - show the outcome of a previous sync.

use std::path::PathBuf;

use colored::Colorize;
use songbridge::ErrorKind;

use super::CommandResult;
use super::sync::print_report;
use crate::snapshot::load_report;

pub fn run(report_path: PathBuf, json_output: bool, verbose: bool) -> CommandResult {
    let report = load_report(&report_path)?;

    if json_output {
        let status = serde_json::json!({
            "mode": report.mode,
            "total_processed": report.total_processed,
            "added": report.added,
            "removed": report.removed,
            "already_present": report.already_present,
            "logged": report.logged.len(),
            "pending_confirmation": report.pending_confirmation.len(),
            "skipped": report.skipped.len(),
            "failures": {
                "total": report.failures.len(),
                "lookup_unavailable": report.failures_of(ErrorKind::LookupUnavailable),
                "quota_exceeded": report.failures_of(ErrorKind::QuotaExceeded),
                "mutation_rejected": report.failures_of(ErrorKind::MutationRejected),
                "invalid_input": report.failures_of(ErrorKind::InvalidInput),
                "cancelled": report.failures_of(ErrorKind::Cancelled),
            },
            "cancelled": report.cancelled,
            "is_complete": report.is_complete(),
            "started_at": report.started_at,
            "finished_at": report.finished_at,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!(
        "{} {}",
        "Sync status for".cyan().bold(),
        report_path.display().to_string().white()
    );
    println!(
        "Finished {} ({} mode, {:.1}s)",
        report.finished_at.format("%Y-%m-%d %H:%M:%S UTC"),
        report.mode,
        (report.finished_at - report.started_at).num_milliseconds() as f64 / 1000.0
    );

    print_report(&report, verbose);

    if !report.pending_confirmation.is_empty() {
        println!();
        println!(
            "Use {} or {} to resolve pending matches.",
            "songbridge confirm <REPORT> <INDEX>".cyan().bold(),
            "songbridge skip <REPORT> <INDEX>".cyan().bold()
        );
    }

    Ok(())
}
