//! LLM provider trait and shared response handling.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SongbridgeError};
use crate::model::SongGuess;

/// Configuration for LLM providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Model to use (e.g., "claude-sonnet-4-20250514").
    pub model: String,

    /// Maximum tokens in response.
    pub max_tokens: usize,

    /// Temperature for generation (0.0-1.0).
    pub temperature: f64,

    /// HTTP request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 256,
            temperature: 0.0,
            timeout_secs: 60,
        }
    }
}

/// Trait for LLM providers.
///
/// Implementations must be thread-safe (Send + Sync) so a single provider
/// can back every item of a sync run.
pub trait LlmProvider: Send + Sync {
    /// Extract the song named by a raw label.
    ///
    /// # Arguments
    /// * `raw_label` - The free-text label (e.g. a video title)
    /// * `description` - Uploader description, if any
    /// * `channel` - Uploader/channel name, if any
    ///
    /// # Returns
    /// A guess with a non-blank title, or `QuotaExceeded` / `ServiceError`
    fn extract_song(
        &self,
        raw_label: &str,
        description: Option<&str>,
        channel: Option<&str>,
    ) -> Result<SongGuess>;

    /// Get the configuration for this provider.
    fn config(&self) -> &LlmConfig;

    /// Get the name of this provider (for logging/debugging).
    fn name(&self) -> &str;
}

/// JSON shape every provider is asked to answer with.
#[derive(Debug, Deserialize)]
struct ExtractionResponse {
    #[serde(default)]
    title: String,
    #[serde(default)]
    artist: String,
    #[serde(default)]
    album: Option<String>,
}

/// Parse JSON from an LLM response, handling markdown code blocks.
pub(crate) fn parse_json_response<T: for<'de> Deserialize<'de>>(
    provider: &str,
    response: &str,
) -> Result<T> {
    let json_str = if response.contains("```json") {
        response
            .split("```json")
            .nth(1)
            .and_then(|s| s.split("```").next())
            .map(|s| s.trim())
            .unwrap_or(response)
    } else if response.contains("```") {
        response
            .split("```")
            .nth(1)
            .map(|s| s.trim())
            .unwrap_or(response)
    } else {
        response.trim()
    };

    serde_json::from_str(json_str).map_err(|e| {
        SongbridgeError::service(provider, format!("Failed to parse LLM JSON response: {}", e))
    })
}

/// Turn a model answer into a song guess.
pub(crate) fn guess_from_response(provider: &str, response: &str) -> Result<SongGuess> {
    let parsed: ExtractionResponse = parse_json_response(provider, response)?;
    let mut guess = SongGuess::new(parsed.title, parsed.artist);
    if let Some(album) = parsed.album {
        guess = guess.with_album(album);
    }
    let guess = guess.trimmed();

    if !guess.is_usable() {
        return Err(SongbridgeError::service(
            provider,
            "Model returned an empty title",
        ));
    }
    Ok(guess)
}

/// Classify a non-success HTTP response.
///
/// Rate limits and billing-quota errors become `QuotaExceeded` so the
/// resolver moves on to the fallback provider.
pub(crate) fn classify_http_failure(provider: &str, status: u16, body: &str) -> SongbridgeError {
    let lowered = body.to_lowercase();
    if status == 429
        || lowered.contains("insufficient_quota")
        || lowered.contains("quota")
        || lowered.contains("rate limit")
        || lowered.contains("rate_limit")
    {
        return SongbridgeError::QuotaExceeded {
            provider: provider.to_string(),
        };
    }
    SongbridgeError::service(provider, format!("API error ({}): {}", status, body))
}
