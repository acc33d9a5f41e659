//! Ollama local LLM provider implementation.
//!
//! Ollama runs models locally without API keys and never reports quota
//! exhaustion, which makes it a natural fallback provider.
//! Install from: https://ollama.ai

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::json;

use crate::error::{Result, SongbridgeError};
use crate::model::SongGuess;

use super::prompts;
use super::provider::{LlmConfig, LlmProvider, guess_from_response};

/// Default Ollama API endpoint.
const DEFAULT_API_URL: &str = "http://localhost:11434/api/chat";

const PROVIDER: &str = "ollama";

/// Ollama local LLM provider.
pub struct OllamaProvider {
    client: Client,
    api_url: String,
    config: LlmConfig,
}

impl OllamaProvider {
    /// Create a new Ollama provider with default settings.
    ///
    /// Uses llama3.2 model by default. Make sure you've pulled it:
    /// `ollama pull llama3.2`
    pub fn new() -> Result<Self> {
        Self::with_model("llama3.2")
    }

    /// Create with a specific model.
    pub fn with_model(model: impl Into<String>) -> Result<Self> {
        let config = LlmConfig {
            model: model.into(),
            // Local models can be slower
            timeout_secs: 120,
            ..Default::default()
        };
        Self::with_config(config)
    }

    /// Create with custom configuration.
    pub fn with_config(config: LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SongbridgeError::Config(format!("Failed to create HTTP client: {}", e)))?;

        let api_url = std::env::var("OLLAMA_HOST")
            .map(|host| api_url_for(&host))
            .unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        Ok(Self {
            client,
            api_url,
            config,
        })
    }

    /// Build headers for API requests.
    fn build_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    /// Send a message to Ollama.
    fn send_message(&self, user_prompt: &str) -> Result<String> {
        let body = json!({
            "model": self.config.model,
            "stream": false,
            "format": "json",
            "options": {
                "temperature": self.config.temperature,
                "num_predict": self.config.max_tokens
            },
            "messages": [
                {
                    "role": "system",
                    "content": prompts::system_prompt()
                },
                {
                    "role": "user",
                    "content": user_prompt
                }
            ]
        });

        let response = self
            .client
            .post(&self.api_url)
            .headers(self.build_headers())
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    SongbridgeError::service(
                        PROVIDER,
                        "Failed to connect to Ollama. Is it running? Start with: ollama serve",
                    )
                } else {
                    SongbridgeError::service(PROVIDER, format!("Ollama request failed: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().unwrap_or_default();

            if error_text.contains("not found") {
                return Err(SongbridgeError::service(
                    PROVIDER,
                    format!(
                        "Model '{}' not found. Pull it with: ollama pull {}",
                        self.config.model, self.config.model
                    ),
                ));
            }

            return Err(SongbridgeError::service(
                PROVIDER,
                format!("Ollama error ({}): {}", status, error_text),
            ));
        }

        let api_response: OllamaResponse = response.json().map_err(|e| {
            SongbridgeError::service(PROVIDER, format!("Failed to parse Ollama response: {}", e))
        })?;

        Ok(api_response.message.content)
    }
}

fn api_url_for(host: &str) -> String {
    format!("{}/api/chat", host.trim_end_matches('/'))
}

impl LlmProvider for OllamaProvider {
    fn extract_song(
        &self,
        raw_label: &str,
        description: Option<&str>,
        channel: Option<&str>,
    ) -> Result<SongGuess> {
        let prompt = prompts::extraction_prompt(raw_label, description, channel);
        let response = self.send_message(&prompt)?;
        guess_from_response(PROVIDER, &response)
    }

    fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

/// Ollama API response structure.
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: OllamaMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_url_for_host() {
        assert_eq!(
            api_url_for("http://gpu-box:11434/"),
            "http://gpu-box:11434/api/chat"
        );
    }

    #[test]
    fn test_with_model_uses_longer_timeout() {
        let provider = OllamaProvider::with_model("mistral").unwrap();
        assert_eq!(provider.config().model, "mistral");
        assert_eq!(provider.config().timeout_secs, 120);
        assert_eq!(provider.name(), "ollama");
    }
}
