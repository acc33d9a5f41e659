//! Band thresholds and the decision function.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SongbridgeError};
use crate::matching::same_title;
use crate::model::{ConfidenceBand, ExtractionSource, MatchAction, MatchCandidate, MatchDecision};

/// Similarity thresholds for each band.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Lower bound of `HIGH` (auto-add).
    pub high: f64,

    /// Lower bound of `MEDIUM` (auto-add, logged).
    pub medium: f64,

    /// Lower bound of `LOW` (needs confirmation). Anything below is rejected.
    pub low: f64,

    /// Add `LOW` matches whose titles are identical after normalization.
    pub auto_confirm_exact: bool,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            high: 0.95,
            medium: 0.90,
            low: 0.50,
            auto_confirm_exact: false,
        }
    }
}

impl PolicyConfig {
    /// Thresholds must satisfy `0 <= low <= medium <= high <= 1`.
    pub fn validate(&self) -> Result<()> {
        let ordered = 0.0 <= self.low
            && self.low <= self.medium
            && self.medium <= self.high
            && self.high <= 1.0;
        if !ordered {
            return Err(SongbridgeError::Config(format!(
                "Thresholds must satisfy 0 <= low <= medium <= high <= 1 (got {} / {} / {})",
                self.low, self.medium, self.high
            )));
        }
        Ok(())
    }
}

/// Maps a top candidate to a decision.
#[derive(Debug, Clone, Default)]
pub struct ConfidencePolicy {
    config: PolicyConfig,
}

impl ConfidencePolicy {
    /// Create a policy with the default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a policy with custom thresholds.
    pub fn with_config(config: PolicyConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Get the configuration.
    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// Band for a similarity score. NaN falls into `Reject`.
    pub fn band(&self, similarity: f64) -> ConfidenceBand {
        if similarity >= self.config.high {
            ConfidenceBand::High
        } else if similarity >= self.config.medium {
            ConfidenceBand::Medium
        } else if similarity >= self.config.low {
            ConfidenceBand::Low
        } else {
            ConfidenceBand::Reject
        }
    }

    /// Decide what to do with the top candidate.
    ///
    /// The extraction source never moves a threshold; it is carried through
    /// for audit.
    pub fn decide(
        &self,
        candidate: Option<MatchCandidate>,
        extraction_source: ExtractionSource,
    ) -> MatchDecision {
        let Some(candidate) = candidate else {
            return MatchDecision {
                candidate: None,
                confidence_band: ConfidenceBand::Reject,
                action: MatchAction::Skip,
                extraction_source,
            };
        };

        let band = self.band(candidate.similarity);
        let action = match band {
            ConfidenceBand::High => MatchAction::AutoAdd,
            ConfidenceBand::Medium => MatchAction::AutoAddLogged,
            ConfidenceBand::Low
                if self.config.auto_confirm_exact
                    && same_title(&candidate.resolved.title, &candidate.destination_title) =>
            {
                MatchAction::AutoAddLogged
            }
            ConfidenceBand::Low => MatchAction::NeedsConfirmation,
            ConfidenceBand::Reject => MatchAction::Skip,
        };

        debug!(
            native_id = %candidate.destination_native_id,
            similarity = candidate.similarity,
            band = band.label(),
            action = action.label(),
            "decided"
        );

        MatchDecision {
            candidate: Some(candidate),
            confidence_band: band,
            action,
            extraction_source,
        }
    }
}
