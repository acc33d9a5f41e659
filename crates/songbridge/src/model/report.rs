//! Sync plans and the reports produced by applying them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, Result, SongbridgeError};

use super::decision::MatchDecision;
use super::item::RawItem;
use super::song::ExtractionSource;

/// How the destination playlist is reconciled with the source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncMode {
    /// Destination is made to match the resolved source (adds and removes).
    Mirror,
    /// Only additions; existing destination items are never removed.
    #[default]
    AppendOnly,
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncMode::Mirror => write!(f, "mirror"),
            SyncMode::AppendOnly => write!(f, "append-only"),
        }
    }
}

impl FromStr for SyncMode {
    type Err = SongbridgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "mirror" => Ok(SyncMode::Mirror),
            "append-only" | "append" => Ok(SyncMode::AppendOnly),
            other => Err(SongbridgeError::Config(format!(
                "Unknown sync mode '{}'. Use mirror or append-only.",
                other
            ))),
        }
    }
}

/// A source item that resolved but produced no usable match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedItem {
    /// The source item.
    pub raw_item: RawItem,

    /// Stage that resolved the item.
    pub extraction_source: ExtractionSource,

    /// Similarity of the best candidate, `None` when there was no candidate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_similarity: Option<f64>,
}

impl SkippedItem {
    /// Build from a `Skip` decision and its originating item.
    pub fn from_decision(raw_item: RawItem, decision: &MatchDecision) -> Self {
        Self {
            raw_item,
            extraction_source: decision.extraction_source,
            best_similarity: decision.candidate.as_ref().map(|c| c.similarity),
        }
    }

    /// Error kind to report when no candidate was found at all.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self.best_similarity {
            None => Some(ErrorKind::NoCandidateFound),
            Some(_) => None,
        }
    }
}

/// A per-item failure recorded during reconciliation or apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncFailure {
    /// Source item the failure belongs to (absent for destination-only removals).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_item: Option<RawItem>,

    /// Destination track involved, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_id: Option<String>,

    /// Failure classification.
    pub kind: ErrorKind,

    /// Detail message.
    pub message: String,
}

impl SyncFailure {
    /// Failure tied to a source item.
    pub fn for_item(raw_item: RawItem, error: &SongbridgeError) -> Self {
        Self {
            raw_item: Some(raw_item),
            native_id: None,
            kind: error.kind(),
            message: error.to_string(),
        }
    }

    /// Failure tied to a destination track.
    pub fn for_track(native_id: impl Into<String>, error: &SongbridgeError) -> Self {
        Self {
            raw_item: None,
            native_id: Some(native_id.into()),
            kind: error.kind(),
            message: error.to_string(),
        }
    }

    /// Attach the destination track id.
    pub fn with_native_id(mut self, native_id: impl Into<String>) -> Self {
        self.native_id = Some(native_id.into());
        self
    }
}

/// The changes a reconciliation run intends to make.
///
/// `to_add` and `to_remove` never share a destination id: additions are
/// drawn from ids absent in the destination, removals from ids present in it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncPlan {
    /// Reconciliation mode the plan was computed for.
    pub mode: SyncMode,

    /// Accepted decisions whose destination track is missing, in source order.
    pub to_add: Vec<MatchDecision>,

    /// Destination ids to remove (always empty in append-only mode).
    pub to_remove: IndexSet<String>,

    /// Low-confidence decisions awaiting a user, in source order.
    pub pending_confirmation: Vec<MatchDecision>,

    /// Items whose best match was rejected.
    pub skipped: Vec<SkippedItem>,

    /// Accepted decisions already satisfied by the destination or by an
    /// earlier item of the same run.
    pub already_present: usize,

    /// Items that could not be evaluated (invalid, lookup failure, cancelled).
    pub failures: Vec<SyncFailure>,

    /// Number of source items that were evaluated.
    pub total_processed: usize,

    /// Whether evaluation stopped early on cancellation.
    pub cancelled: bool,

    /// When reconciliation began.
    pub started_at: DateTime<Utc>,
}

impl SyncPlan {
    /// A plan with no work recorded yet.
    pub fn empty(mode: SyncMode) -> Self {
        Self {
            mode,
            to_add: Vec::new(),
            to_remove: IndexSet::new(),
            pending_confirmation: Vec::new(),
            skipped: Vec::new(),
            already_present: 0,
            failures: Vec::new(),
            total_processed: 0,
            cancelled: false,
            started_at: Utc::now(),
        }
    }

    /// Whether applying the plan would change the destination.
    pub fn is_noop(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// The outcome of applying a sync plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    /// Reconciliation mode used.
    pub mode: SyncMode,

    /// Number of source items evaluated.
    pub total_processed: usize,

    /// Tracks added to the destination.
    pub added: usize,

    /// Tracks removed from the destination.
    pub removed: usize,

    /// Accepted matches that were already in the destination.
    #[serde(default)]
    pub already_present: usize,

    /// Medium-confidence additions kept for audit, in source order.
    #[serde(default)]
    pub logged: Vec<MatchDecision>,

    /// Decisions waiting for a user, in source order.
    pub pending_confirmation: Vec<MatchDecision>,

    /// Items that produced no acceptable match.
    #[serde(default)]
    pub skipped: Vec<SkippedItem>,

    /// Per-item failures, in the order they occurred.
    pub failures: Vec<SyncFailure>,

    /// Whether the run was cancelled before completing.
    #[serde(default)]
    pub cancelled: bool,

    /// When reconciliation began.
    pub started_at: DateTime<Utc>,

    /// When apply finished.
    pub finished_at: DateTime<Utc>,
}

impl SyncReport {
    /// True when every planned change went through.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && !self.cancelled
    }

    /// True when some, but not all, work succeeded.
    pub fn is_partial(&self) -> bool {
        !self.is_complete() && (self.added > 0 || self.removed > 0)
    }

    /// Count failures of one kind.
    pub fn failures_of(&self, kind: ErrorKind) -> usize {
        self.failures.iter().filter(|f| f.kind == kind).count()
    }

    /// Short human-readable summary.
    pub fn summary(&self) -> String {
        format!(
            "{} processed, {} added, {} removed, {} pending, {} skipped, {} failed{}",
            self.total_processed,
            self.added,
            self.removed,
            self.pending_confirmation.len(),
            self.skipped.len(),
            self.failures.len(),
            if self.cancelled { " (cancelled)" } else { "" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Platform;

    #[test]
    fn test_sync_mode_parse() {
        assert_eq!("mirror".parse::<SyncMode>().unwrap(), SyncMode::Mirror);
        assert_eq!(
            "append_only".parse::<SyncMode>().unwrap(),
            SyncMode::AppendOnly
        );
        assert!("merge".parse::<SyncMode>().is_err());
        assert_eq!(SyncMode::default(), SyncMode::AppendOnly);
    }

    #[test]
    fn test_failure_constructors() {
        let item = RawItem::new("x", Platform::Video, "v1");
        let f = SyncFailure::for_item(item.clone(), &SongbridgeError::Cancelled)
            .with_native_id("t1");
        assert_eq!(f.kind, ErrorKind::Cancelled);
        assert_eq!(f.raw_item, Some(item));
        assert_eq!(f.native_id.as_deref(), Some("t1"));

        let r = SyncFailure::for_track("t2", &SongbridgeError::rejected("t2", "denied"));
        assert_eq!(r.kind, ErrorKind::MutationRejected);
        assert!(r.raw_item.is_none());
    }

    #[test]
    fn test_empty_plan_is_noop() {
        let plan = SyncPlan::empty(SyncMode::Mirror);
        assert!(plan.is_noop());
        assert_eq!(plan.total_processed, 0);
    }
}
