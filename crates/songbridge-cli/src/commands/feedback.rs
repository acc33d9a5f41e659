//! Feedback command - inspect or add user feedback.

use std::path::{Path, PathBuf};

use colored::Colorize;
use songbridge::{FeedbackRecord, FeedbackStore, JsonlFeedbackStore, Platform, RawItem, Songbridge};

use super::CommandResult;
use crate::cli::FeedbackAction;

pub fn run(action: FeedbackAction, feedback: PathBuf) -> CommandResult {
    match action {
        FeedbackAction::Show { label, json } => show(&label, &feedback, json),
        FeedbackAction::Correct {
            label,
            native_id,
            title,
            artist,
        } => correct(label, native_id, &title, &artist, feedback),
    }
}

fn show(label: &str, feedback: &Path, json_output: bool) -> CommandResult {
    let store = JsonlFeedbackStore::new(feedback);
    let records = store
        .lookup_by_raw_label(label)?
        .collect::<songbridge::Result<Vec<FeedbackRecord>>>()?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("{}", "No feedback recorded for this label.".yellow());
        return Ok(());
    }

    println!(
        "{} {} records for {}",
        "Found".cyan().bold(),
        records.len().to_string().white().bold(),
        label.white()
    );
    for record in &records {
        println!(
            "  {} {:12} {} - {} {}",
            record.recorded_at.format("%Y-%m-%d %H:%M"),
            record.feedback_type.label(),
            record.corrected_title,
            if record.corrected_artist.is_empty() { "-" } else { record.corrected_artist.as_str() },
            record
                .destination_native_id
                .as_deref()
                .map(|id| format!("[{}]", id))
                .unwrap_or_default()
                .dimmed()
        );
    }
    Ok(())
}

fn correct(
    label: String,
    native_id: String,
    title: &str,
    artist: &str,
    feedback: PathBuf,
) -> CommandResult {
    let engine = Songbridge::new().with_feedback_sink(JsonlFeedbackStore::new(&feedback));
    let item = RawItem::new(label, Platform::Video, native_id);
    item.validate()?;

    let record = engine.correct(&item, title, artist, 0.0)?;
    println!(
        "{} {} -> {} - {}",
        "Recorded correction".green().bold(),
        record.raw_item.raw_label,
        record.corrected_title,
        record.corrected_artist
    );
    Ok(())
}
