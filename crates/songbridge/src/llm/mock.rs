//! Mock LLM provider for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{Result, SongbridgeError};
use crate::model::SongGuess;
use crate::normalize::{TitleNormalizer, collapse_whitespace};

use super::provider::{LlmConfig, LlmProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Behavior {
    Answer,
    QuotaExceeded,
    Failing,
}

/// Mock LLM provider that returns predictable responses for testing.
///
/// Canned answers registered with [`MockProvider::with_response`] win;
/// other labels are answered with the normalizer's split.
pub struct MockProvider {
    config: LlmConfig,
    name: String,
    behavior: Behavior,
    responses: HashMap<String, SongGuess>,
    normalizer: TitleNormalizer,
    calls: AtomicUsize,
}

impl MockProvider {
    /// Create a new mock provider.
    pub fn new() -> Self {
        Self {
            config: LlmConfig {
                model: "mock".to_string(),
                ..Default::default()
            },
            name: "mock".to_string(),
            behavior: Behavior::Answer,
            responses: HashMap::new(),
            normalizer: TitleNormalizer::new(),
            calls: AtomicUsize::new(0),
        }
    }

    /// A provider whose quota is always spent.
    pub fn quota_exceeded() -> Self {
        Self {
            behavior: Behavior::QuotaExceeded,
            ..Self::new()
        }
    }

    /// A provider that always fails.
    pub fn failing() -> Self {
        Self {
            behavior: Behavior::Failing,
            ..Self::new()
        }
    }

    /// Set the name reported in logs and errors.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Register a canned answer for a label.
    pub fn with_response(mut self, raw_label: &str, guess: SongGuess) -> Self {
        self.responses.insert(key(raw_label), guess);
        self
    }

    /// Number of extraction calls received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn key(label: &str) -> String {
    collapse_whitespace(label).to_lowercase()
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl LlmProvider for MockProvider {
    fn extract_song(
        &self,
        raw_label: &str,
        _description: Option<&str>,
        channel: Option<&str>,
    ) -> Result<SongGuess> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match self.behavior {
            Behavior::QuotaExceeded => {
                return Err(SongbridgeError::QuotaExceeded {
                    provider: self.name.clone(),
                });
            }
            Behavior::Failing => {
                return Err(SongbridgeError::service(&self.name, "mock provider failure"));
            }
            Behavior::Answer => {}
        }

        if let Some(guess) = self.responses.get(&key(raw_label)) {
            return Ok(guess.clone());
        }

        let normalized = self.normalizer.normalize(raw_label, channel);
        if normalized.title.trim().is_empty() {
            return Err(SongbridgeError::service(&self.name, "nothing to extract"));
        }
        Ok(SongGuess::new(normalized.title, normalized.artist))
    }

    fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn name(&self) -> &str {
        &self.name
    }
}
