//! Resolve command - show how one label resolves and matches.

use std::path::PathBuf;

use colored::Colorize;
use songbridge::resolve::StageOutcome;
use songbridge::{Platform, QuotaTracker, RawItem};

use super::{CommandResult, band_label, build_engine};
use crate::cli::EngineArgs;

#[allow(clippy::too_many_arguments)]
pub fn run(
    label: String,
    description: Option<String>,
    channel: Option<String>,
    platform: Platform,
    catalog: Option<PathBuf>,
    engine_args: EngineArgs,
    json_output: bool,
    verbose: bool,
) -> CommandResult {
    let mut item = RawItem::new(label, platform, "cli");
    if let Some(description) = description {
        item = item.with_description(description);
    }
    if let Some(channel) = channel {
        item = item.with_channel(channel);
    }

    let engine = build_engine(&engine_args, catalog.as_deref(), None)?;
    let mut quota = QuotaTracker::unlimited();
    let resolution = engine.resolve_with_quota(&item, &mut quota);

    let decision = match catalog {
        Some(_) => {
            let top = engine.match_song(&resolution.song)?.next();
            Some(engine.decide(top, resolution.song.extraction_source))
        }
        None => None,
    };

    if json_output {
        let json = serde_json::json!({
            "resolution": resolution,
            "decision": decision,
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    let song = &resolution.song;
    println!("{} {}", "Resolved".cyan().bold(), item.raw_label.white().bold());
    println!(
        "  {} {}",
        "title: ".dimmed(),
        song.title.white().bold()
    );
    println!(
        "  {} {}",
        "artist:".dimmed(),
        if song.artist.is_empty() { "-" } else { song.artist.as_str() }
    );
    if let Some(album) = &song.album {
        println!("  {} {}", "album: ".dimmed(), album);
    }
    println!(
        "  {} {}",
        "source:".dimmed(),
        song.extraction_source.to_string().cyan()
    );

    println!();
    println!("{}", "Stages:".yellow().bold());
    for attempt in &resolution.trace {
        let outcome = match &attempt.outcome {
            StageOutcome::Hit => "hit".green().to_string(),
            StageOutcome::Miss => "miss".normal().to_string(),
            StageOutcome::Failed { kind, message } => {
                format!("{} ({}) {}", "failed".red(), kind.label(), message.dimmed())
            }
            StageOutcome::Skipped { reason } => format!("skipped: {}", reason).dimmed().to_string(),
        };
        println!("  {:20} {}", attempt.stage.to_string(), outcome);
    }

    if let Some(decision) = decision {
        println!();
        match &decision.candidate {
            Some(c) => {
                println!(
                    "{} {} - {} [{}]",
                    "Match".green().bold(),
                    c.destination_title,
                    c.destination_artist,
                    c.destination_native_id
                );
                println!(
                    "  similarity {:.2} ({}) -> {}",
                    c.similarity,
                    band_label(decision.confidence_band),
                    decision.action.label()
                );
                if verbose {
                    let artist = c
                        .artist_similarity
                        .map(|s| format!("{:.2}", s))
                        .unwrap_or_else(|| "n/a".to_string());
                    println!(
                        "  title {:.2}, artist {}, query {:?}",
                        c.title_similarity, artist, c.query
                    );
                }
            }
            None => println!("{} {}", "No match".red().bold(), decision.describe()),
        }
    }

    Ok(())
}
