//! Building a sync plan from per-item decisions.

use std::collections::HashSet;

use indexmap::IndexSet;
use tracing::warn;

use crate::error::{ErrorKind, SongbridgeError};
use crate::model::{MatchAction, MatchDecision, RawItem, SkippedItem, SyncFailure, SyncMode, SyncPlan};

/// Accumulates decisions in source order and computes the plan.
///
/// Removals are only planned in mirror mode, and only when every item was
/// evaluated: after a cancellation or a lookup failure the builder cannot
/// tell which destination tracks are still wanted, so it removes nothing.
/// Tracks whose source item is pending confirmation are kept unless
/// `protect_pending(false)` is set; a confirmed track stays pending on the
/// next run and must not be taken back out.
#[derive(Debug)]
pub struct PlanBuilder {
    destination: IndexSet<String>,
    protect_pending: bool,
    accepted: HashSet<String>,
    pending: HashSet<String>,
    planned: HashSet<String>,
    removals_unsafe: bool,
    plan: SyncPlan,
}

impl PlanBuilder {
    /// Start a plan against the destination's current contents.
    pub fn new(mode: SyncMode, destination: impl IntoIterator<Item = String>) -> Self {
        Self {
            destination: destination.into_iter().collect(),
            protect_pending: true,
            accepted: HashSet::new(),
            pending: HashSet::new(),
            planned: HashSet::new(),
            removals_unsafe: false,
            plan: SyncPlan::empty(mode),
        }
    }

    /// Keep destination tracks that are pending confirmation out of
    /// `to_remove` (on by default).
    pub fn protect_pending(mut self, protect: bool) -> Self {
        self.protect_pending = protect;
        self
    }

    /// Record the decision for one evaluated item.
    pub fn record_decision(&mut self, raw_item: RawItem, decision: MatchDecision) {
        self.plan.total_processed += 1;

        let accepted_id = decision
            .destination_id()
            .filter(|_| decision.is_accepted())
            .map(str::to_string);
        if let Some(id) = accepted_id {
            self.accepted.insert(id.clone());
            if self.destination.contains(&id) || !self.planned.insert(id) {
                self.plan.already_present += 1;
            } else {
                self.plan.to_add.push(decision);
            }
            return;
        }

        if decision.action == MatchAction::NeedsConfirmation {
            if let Some(id) = decision.destination_id() {
                self.pending.insert(id.to_string());
            }
            self.plan.pending_confirmation.push(decision);
        } else {
            self.plan
                .skipped
                .push(SkippedItem::from_decision(raw_item, &decision));
        }
    }

    /// Record an item that could not be evaluated.
    pub fn record_failure(&mut self, raw_item: RawItem, error: &SongbridgeError) {
        self.plan.total_processed += 1;
        if error.kind() != ErrorKind::InvalidInput {
            self.removals_unsafe = true;
        }
        self.plan.failures.push(SyncFailure::for_item(raw_item, error));
    }

    /// Record that the run stopped before these items were evaluated.
    pub fn record_cancelled(&mut self, remaining: impl IntoIterator<Item = RawItem>) {
        self.plan.cancelled = true;
        for item in remaining {
            self.plan
                .failures
                .push(SyncFailure::for_item(item, &SongbridgeError::Cancelled));
        }
    }

    /// Compute removals and return the plan.
    pub fn finish(mut self) -> SyncPlan {
        if self.plan.mode == SyncMode::Mirror {
            if self.plan.cancelled || self.removals_unsafe {
                warn!(
                    cancelled = self.plan.cancelled,
                    failures = self.plan.failures.len(),
                    "mirror removals suppressed for an incomplete run"
                );
            } else {
                self.plan.to_remove = self
                    .destination
                    .iter()
                    .filter(|id| !self.accepted.contains(*id))
                    .filter(|id| !(self.protect_pending && self.pending.contains(*id)))
                    .cloned()
                    .collect();
            }
        }
        self.plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConfidenceBand, ExtractionSource, MatchCandidate, Platform, ResolvedSong, SongGuess};

    fn item(label: &str) -> RawItem {
        RawItem::new(label, Platform::Video, label)
    }

    fn decision(label: &str, id: &str, action: MatchAction) -> MatchDecision {
        let resolved = ResolvedSong::from_guess(
            SongGuess::new(label, ""),
            ExtractionSource::RegexCleaning,
            item(label),
        );
        let band = match action {
            MatchAction::AutoAdd => ConfidenceBand::High,
            MatchAction::AutoAddLogged => ConfidenceBand::Medium,
            MatchAction::NeedsConfirmation => ConfidenceBand::Low,
            MatchAction::Skip => ConfidenceBand::Reject,
        };
        MatchDecision {
            candidate: Some(MatchCandidate {
                resolved,
                destination_native_id: id.to_string(),
                destination_title: label.to_string(),
                destination_artist: String::new(),
                similarity: 0.0,
                title_similarity: 0.0,
                artist_similarity: None,
                popularity: None,
                query: label.to_string(),
            }),
            confidence_band: band,
            action,
            extraction_source: ExtractionSource::RegexCleaning,
        }
    }

    fn ids(plan: &SyncPlan) -> Vec<&str> {
        plan.to_add.iter().filter_map(|d| d.destination_id()).collect()
    }

    #[test]
    fn test_append_only_adds_missing() {
        let mut builder = PlanBuilder::new(SyncMode::AppendOnly, vec!["t1".to_string(), "old".to_string()]);
        builder.record_decision(item("a"), decision("a", "t1", MatchAction::AutoAdd));
        builder.record_decision(item("b"), decision("b", "t2", MatchAction::AutoAddLogged));
        builder.record_decision(item("c"), decision("c", "t3", MatchAction::NeedsConfirmation));
        builder.record_decision(item("d"), decision("d", "t4", MatchAction::Skip));
        let plan = builder.finish();

        assert_eq!(ids(&plan), vec!["t2"]);
        assert!(plan.to_remove.is_empty());
        assert_eq!(plan.already_present, 1);
        assert_eq!(plan.pending_confirmation.len(), 1);
        assert_eq!(plan.skipped.len(), 1);
        assert_eq!(plan.total_processed, 4);
    }

    #[test]
    fn test_mirror_removes_unreferenced() {
        let destination = vec!["t1".to_string(), "old".to_string(), "t3".to_string()];
        let mut builder = PlanBuilder::new(SyncMode::Mirror, destination);
        builder.record_decision(item("a"), decision("a", "t1", MatchAction::AutoAdd));
        builder.record_decision(item("c"), decision("c", "t3", MatchAction::NeedsConfirmation));
        let plan = builder.finish();

        assert!(plan.to_add.is_empty());
        let removed: Vec<&str> = plan.to_remove.iter().map(String::as_str).collect();
        assert_eq!(removed, vec!["old"]);
    }

    #[test]
    fn test_mirror_can_remove_pending() {
        let destination = vec!["old".to_string(), "t3".to_string()];
        let mut builder = PlanBuilder::new(SyncMode::Mirror, destination).protect_pending(false);
        builder.record_decision(item("c"), decision("c", "t3", MatchAction::NeedsConfirmation));
        let plan = builder.finish();

        let removed: Vec<&str> = plan.to_remove.iter().map(String::as_str).collect();
        assert_eq!(removed, vec!["old", "t3"]);
    }

    #[test]
    fn test_accepted_without_candidate_is_skipped() {
        let mut builder = PlanBuilder::new(SyncMode::AppendOnly, Vec::<String>::new());
        let mut orphan = decision("a", "t1", MatchAction::AutoAdd);
        orphan.candidate = None;
        builder.record_decision(item("a"), orphan);
        let plan = builder.finish();

        assert!(plan.to_add.is_empty());
        assert_eq!(plan.skipped.len(), 1);
    }

    #[test]
    fn test_duplicate_source_items_add_once() {
        let mut builder = PlanBuilder::new(SyncMode::AppendOnly, Vec::<String>::new());
        builder.record_decision(item("a"), decision("a", "t1", MatchAction::AutoAdd));
        builder.record_decision(item("a2"), decision("a2", "t1", MatchAction::AutoAdd));
        let plan = builder.finish();

        assert_eq!(ids(&plan), vec!["t1"]);
        assert_eq!(plan.already_present, 1);
    }

    #[test]
    fn test_lookup_failure_suppresses_removals() {
        let mut builder = PlanBuilder::new(SyncMode::Mirror, vec!["old".to_string()]);
        builder.record_failure(item("a"), &SongbridgeError::lookup("catalog search", "timeout"));
        let plan = builder.finish();

        assert!(plan.to_remove.is_empty());
        assert_eq!(plan.failures.len(), 1);
        assert_eq!(plan.failures[0].kind, ErrorKind::LookupUnavailable);
    }

    #[test]
    fn test_invalid_input_does_not_block_removals() {
        let mut builder = PlanBuilder::new(SyncMode::Mirror, vec!["old".to_string()]);
        builder.record_failure(item(""), &SongbridgeError::InvalidInput("blank".into()));
        let plan = builder.finish();
        assert!(plan.to_remove.contains("old"));
    }

    #[test]
    fn test_cancelled_items_are_reported() {
        let mut builder = PlanBuilder::new(SyncMode::Mirror, vec!["old".to_string()]);
        builder.record_decision(item("a"), decision("a", "t1", MatchAction::AutoAdd));
        builder.record_cancelled(vec![item("b"), item("c")]);
        let plan = builder.finish();

        assert!(plan.cancelled);
        assert_eq!(plan.total_processed, 1);
        assert_eq!(plan.failures.len(), 2);
        assert!(plan.failures.iter().all(|f| f.kind == ErrorKind::Cancelled));
        assert!(plan.to_remove.is_empty());
        assert_eq!(ids(&plan), vec!["t1"]);
    }
}
