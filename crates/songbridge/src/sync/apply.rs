//! Applying a plan to the destination.

use chrono::Utc;
use tracing::{info, warn};

use crate::catalog::DestinationMutator;
use crate::error::SongbridgeError;
use crate::model::{MatchAction, SyncFailure, SyncPlan, SyncReport};

use super::cancel::CancellationToken;

/// Apply every addition and removal in the plan.
///
/// Each mutation stands on its own: a rejected add is recorded in
/// `failures` and the rest of the plan still runs. Once `cancel` fires,
/// the mutations not yet attempted are reported as `Cancelled`; those
/// already applied stay applied.
pub fn apply(
    plan: SyncPlan,
    mutator: &dyn DestinationMutator,
    cancel: &CancellationToken,
) -> SyncReport {
    let mut report = SyncReport {
        mode: plan.mode,
        total_processed: plan.total_processed,
        added: 0,
        removed: 0,
        already_present: plan.already_present,
        logged: Vec::new(),
        pending_confirmation: plan.pending_confirmation,
        skipped: plan.skipped,
        failures: plan.failures,
        cancelled: plan.cancelled,
        started_at: plan.started_at,
        finished_at: plan.started_at,
    };

    for decision in plan.to_add {
        let Some(candidate) = decision.candidate.as_ref() else {
            continue;
        };
        let raw_item = candidate.resolved.raw_item.clone();
        let native_id = candidate.destination_native_id.clone();

        if cancel.is_cancelled() {
            report.cancelled = true;
            report.failures.push(
                SyncFailure::for_item(raw_item, &SongbridgeError::Cancelled).with_native_id(native_id),
            );
            continue;
        }

        match mutator.add(&native_id) {
            Ok(()) => {
                report.added += 1;
                if decision.action == MatchAction::AutoAddLogged {
                    info!(
                        raw_label = %raw_item.raw_label,
                        native_id = %native_id,
                        similarity = candidate.similarity,
                        source = %decision.extraction_source,
                        "added medium-confidence match"
                    );
                    report.logged.push(decision);
                }
            }
            Err(err) => {
                warn!(native_id = %native_id, error = %err, "add rejected");
                report
                    .failures
                    .push(SyncFailure::for_item(raw_item, &err).with_native_id(native_id));
            }
        }
    }

    for native_id in plan.to_remove {
        if cancel.is_cancelled() {
            report.cancelled = true;
            report
                .failures
                .push(SyncFailure::for_track(native_id, &SongbridgeError::Cancelled));
            continue;
        }

        match mutator.remove(&native_id) {
            Ok(()) => report.removed += 1,
            Err(err) => {
                warn!(native_id = %native_id, error = %err, "remove rejected");
                report.failures.push(SyncFailure::for_track(native_id, &err));
            }
        }
    }

    report.finished_at = Utc::now();
    info!(
        mode = %report.mode,
        processed = report.total_processed,
        added = report.added,
        removed = report.removed,
        pending = report.pending_confirmation.len(),
        failures = report.failures.len(),
        cancelled = report.cancelled,
        "sync applied"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::memory::MemoryPlaylist;
    use crate::error::ErrorKind;
    use crate::model::{
        ConfidenceBand, ExtractionSource, MatchCandidate, MatchDecision, Platform, RawItem,
        ResolvedSong, SongGuess, SyncMode,
    };

    fn decision(id: &str, action: MatchAction) -> MatchDecision {
        let item = RawItem::new(format!("label {}", id), Platform::Video, id);
        MatchDecision {
            candidate: Some(MatchCandidate {
                resolved: ResolvedSong::from_guess(
                    SongGuess::new(id, ""),
                    ExtractionSource::RegexCleaning,
                    item,
                ),
                destination_native_id: id.to_string(),
                destination_title: id.to_string(),
                destination_artist: String::new(),
                similarity: 0.96,
                title_similarity: 0.96,
                artist_similarity: None,
                popularity: None,
                query: id.to_string(),
            }),
            confidence_band: ConfidenceBand::High,
            action,
            extraction_source: ExtractionSource::RegexCleaning,
        }
    }

    #[test]
    fn test_apply_adds_and_removes() {
        let playlist = MemoryPlaylist::new(vec!["old".to_string()]);
        let mut plan = SyncPlan::empty(SyncMode::Mirror);
        plan.to_add.push(decision("t1", MatchAction::AutoAdd));
        plan.to_add.push(decision("t2", MatchAction::AutoAddLogged));
        plan.to_remove.insert("old".to_string());

        let report = apply(plan, &playlist, &CancellationToken::new());

        assert_eq!(report.added, 2);
        assert_eq!(report.removed, 1);
        assert_eq!(report.logged.len(), 1);
        assert_eq!(report.logged[0].destination_id(), Some("t2"));
        assert!(report.is_complete());
        assert_eq!(playlist.tracks().unwrap(), vec!["t1".to_string(), "t2".to_string()]);
        assert!(report.finished_at >= report.started_at);
    }

    #[test]
    fn test_rejection_does_not_abort() {
        let playlist = MemoryPlaylist::new(Vec::new()).rejecting("t2");
        let mut plan = SyncPlan::empty(SyncMode::AppendOnly);
        for id in ["t1", "t2", "t3"] {
            plan.to_add.push(decision(id, MatchAction::AutoAdd));
        }

        let report = apply(plan, &playlist, &CancellationToken::new());

        assert_eq!(report.added, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].kind, ErrorKind::MutationRejected);
        assert_eq!(report.failures[0].native_id.as_deref(), Some("t2"));
        assert!(report.is_partial());
    }

    #[test]
    fn test_cancelled_before_apply() {
        let playlist = MemoryPlaylist::new(vec!["old".to_string()]);
        let mut plan = SyncPlan::empty(SyncMode::Mirror);
        plan.to_add.push(decision("t1", MatchAction::AutoAdd));
        plan.to_remove.insert("old".to_string());

        let cancel = CancellationToken::new();
        cancel.cancel();
        let report = apply(plan, &playlist, &cancel);

        assert_eq!(report.added, 0);
        assert_eq!(report.removed, 0);
        assert!(report.cancelled);
        assert_eq!(report.failures_of(ErrorKind::Cancelled), 2);
        assert_eq!(playlist.tracks().unwrap(), vec!["old".to_string()]);
    }
}
