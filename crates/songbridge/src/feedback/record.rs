//! Feedback records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::model::{MatchDecision, RawItem};
use crate::normalize::collapse_whitespace;

/// What the user said about a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackType {
    /// The user supplied the right title/artist.
    Correction,
    /// The user accepted a proposed match.
    Confirmation,
    /// The user turned a proposed match down.
    Rejection,
}

impl FeedbackType {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            FeedbackType::Correction => "Correction",
            FeedbackType::Confirmation => "Confirmation",
            FeedbackType::Rejection => "Rejection",
        }
    }
}

/// One piece of user feedback. Never modified once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    /// The item the feedback is about.
    pub raw_item: RawItem,

    /// Title the user considers correct.
    pub corrected_title: String,

    /// Artist the user considers correct.
    pub corrected_artist: String,

    /// Kind of feedback.
    pub feedback_type: FeedbackType,

    /// Similarity of the match the user reacted to (0 when there was none).
    pub confidence_score: f64,

    /// Destination track the feedback concerns, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_native_id: Option<String>,

    /// When the feedback was given.
    pub recorded_at: DateTime<Utc>,
}

impl FeedbackRecord {
    /// Create a record timestamped now.
    pub fn new(
        raw_item: RawItem,
        corrected_title: impl Into<String>,
        corrected_artist: impl Into<String>,
        feedback_type: FeedbackType,
        confidence_score: f64,
    ) -> Self {
        Self {
            raw_item,
            corrected_title: corrected_title.into(),
            corrected_artist: corrected_artist.into(),
            feedback_type,
            confidence_score,
            destination_native_id: None,
            recorded_at: Utc::now(),
        }
    }

    /// Record that the user accepted a decision's candidate.
    ///
    /// Returns `None` when the decision has no candidate.
    pub fn confirmation(decision: &MatchDecision) -> Option<Self> {
        let candidate = decision.candidate.as_ref()?;
        Some(
            Self::new(
                candidate.resolved.raw_item.clone(),
                candidate.destination_title.clone(),
                candidate.destination_artist.clone(),
                FeedbackType::Confirmation,
                candidate.similarity,
            )
            .with_destination(candidate.destination_native_id.clone()),
        )
    }

    /// Record that the user turned a decision's candidate down.
    ///
    /// The corrected fields keep the resolved guess, which the user did not
    /// dispute; only the destination track was wrong.
    pub fn rejection(decision: &MatchDecision) -> Option<Self> {
        let candidate = decision.candidate.as_ref()?;
        Some(
            Self::new(
                candidate.resolved.raw_item.clone(),
                candidate.resolved.title.clone(),
                candidate.resolved.artist.clone(),
                FeedbackType::Rejection,
                candidate.similarity,
            )
            .with_destination(candidate.destination_native_id.clone()),
        )
    }

    /// Record a user-supplied correction.
    pub fn correction(
        raw_item: RawItem,
        title: impl Into<String>,
        artist: impl Into<String>,
        confidence_score: f64,
    ) -> Self {
        Self::new(raw_item, title, artist, FeedbackType::Correction, confidence_score)
    }

    /// Attach the destination track.
    pub fn with_destination(mut self, native_id: impl Into<String>) -> Self {
        self.destination_native_id = Some(native_id.into());
        self
    }

    /// Storage key for this record's label.
    pub fn label_key(&self) -> String {
        label_key(&self.raw_item.raw_label)
    }
}

/// Hash of a whitespace-collapsed, lowercased label.
///
/// Two labels that differ only in case or spacing share a key.
pub fn label_key(raw_label: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(collapse_whitespace(raw_label).to_lowercase().as_bytes());
    format!("sha256:{:x}", hasher.finalize())
}
