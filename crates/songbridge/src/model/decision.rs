//! Match candidates and confidence decisions.

use serde::{Deserialize, Serialize};

use super::song::{ExtractionSource, ResolvedSong};

/// A destination track scored against a resolved song.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    /// The song this candidate was found for.
    pub resolved: ResolvedSong,

    /// Track identifier in the destination catalog.
    pub destination_native_id: String,

    /// Track title in the destination catalog.
    pub destination_title: String,

    /// Track artist in the destination catalog.
    pub destination_artist: String,

    /// Combined similarity in `[0, 1]`.
    pub similarity: f64,

    /// Title-only similarity in `[0, 1]`.
    pub title_similarity: f64,

    /// Artist-only similarity, `None` when the resolved artist was empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist_similarity: Option<f64>,

    /// Popularity reported by the catalog search, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popularity: Option<u32>,

    /// Search query that surfaced this track.
    pub query: String,
}

/// Discretized match quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConfidenceBand {
    Reject,
    Low,
    Medium,
    High,
}

impl ConfidenceBand {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            ConfidenceBand::High => "HIGH",
            ConfidenceBand::Medium => "MEDIUM",
            ConfidenceBand::Low => "LOW",
            ConfidenceBand::Reject => "REJECT",
        }
    }
}

/// What the orchestrator does with a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchAction {
    /// Add without further notice.
    AutoAdd,
    /// Add and keep an audit record in the report.
    AutoAddLogged,
    /// Hold until a user confirms.
    NeedsConfirmation,
    /// Do nothing.
    Skip,
}

impl MatchAction {
    /// Whether the candidate is added during `apply`.
    pub fn is_accepted(&self) -> bool {
        matches!(self, MatchAction::AutoAdd | MatchAction::AutoAddLogged)
    }

    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            MatchAction::AutoAdd => "Auto-add",
            MatchAction::AutoAddLogged => "Auto-add (logged)",
            MatchAction::NeedsConfirmation => "Needs confirmation",
            MatchAction::Skip => "Skip",
        }
    }
}

/// The policy's verdict for one raw item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchDecision {
    /// Top-ranked candidate, if the matcher found any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate: Option<MatchCandidate>,

    /// Band the candidate's similarity falls into.
    pub confidence_band: ConfidenceBand,

    /// Resulting action.
    pub action: MatchAction,

    /// Stage that resolved the song, kept for audit and feedback weighting.
    pub extraction_source: ExtractionSource,
}

impl MatchDecision {
    /// Destination id of the candidate, if any.
    pub fn destination_id(&self) -> Option<&str> {
        self.candidate
            .as_ref()
            .map(|c| c.destination_native_id.as_str())
    }

    /// Similarity of the candidate, or 0 when there is none.
    pub fn similarity(&self) -> f64 {
        self.candidate.as_ref().map_or(0.0, |c| c.similarity)
    }

    /// Whether this decision leads to an addition.
    pub fn is_accepted(&self) -> bool {
        self.action.is_accepted() && self.candidate.is_some()
    }

    /// One-line description for logs and terminal output.
    pub fn describe(&self) -> String {
        match &self.candidate {
            Some(c) => format!(
                "'{}' -> '{}' by {} ({:.0}%, {})",
                c.resolved.raw_item.raw_label,
                c.destination_title,
                if c.destination_artist.is_empty() {
                    "unknown artist"
                } else {
                    c.destination_artist.as_str()
                },
                c.similarity * 100.0,
                self.confidence_band.label()
            ),
            None => format!("no candidate ({})", self.confidence_band.label()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_ordering() {
        assert!(ConfidenceBand::High > ConfidenceBand::Medium);
        assert!(ConfidenceBand::Medium > ConfidenceBand::Low);
        assert!(ConfidenceBand::Low > ConfidenceBand::Reject);
    }

    #[test]
    fn test_accepted_actions() {
        assert!(MatchAction::AutoAdd.is_accepted());
        assert!(MatchAction::AutoAddLogged.is_accepted());
        assert!(!MatchAction::NeedsConfirmation.is_accepted());
        assert!(!MatchAction::Skip.is_accepted());
    }

    #[test]
    fn test_decision_without_candidate() {
        let decision = MatchDecision {
            candidate: None,
            confidence_band: ConfidenceBand::Reject,
            action: MatchAction::Skip,
            extraction_source: ExtractionSource::RegexCleaning,
        };
        assert_eq!(decision.destination_id(), None);
        assert_eq!(decision.similarity(), 0.0);
        assert!(!decision.is_accepted());
        assert_eq!(decision.describe(), "no candidate (REJECT)");
    }

    #[test]
    fn test_band_serde() {
        let json = serde_json::to_string(&ConfidenceBand::Medium).unwrap();
        assert_eq!(json, "\"MEDIUM\"");
    }
}
