//! Language-model extraction of song identities.
//!
//! The resolver calls into this module only for labels the deterministic
//! stages could not split confidently. Every provider answers the same
//! question: given a raw label (plus description and channel, when present),
//! which song, artist and album does it name?
//!
//! # Supported Providers
//!
//! - **Anthropic** - Claude models via API (requires `ANTHROPIC_API_KEY`)
//! - **OpenAI** - GPT models via API (requires `OPENAI_API_KEY`)
//! - **Ollama** - Local models, no API key needed (honours `OLLAMA_HOST`)
//! - **Mock** - Deterministic answers for tests and offline runs
//!
//! A provider that hits its rate limit or billing quota reports
//! [`SongbridgeError::QuotaExceeded`](crate::SongbridgeError::QuotaExceeded);
//! every other failure is a
//! [`SongbridgeError::ServiceError`](crate::SongbridgeError::ServiceError).
//!
//! # Example
//!
//! ```no_run
//! use songbridge::{OllamaProvider, Songbridge};
//!
//! let engine = Songbridge::new()
//!     .with_llm(OllamaProvider::new().unwrap());
//! ```

mod anthropic;
mod mock;
mod ollama;
mod openai;
mod prompts;
mod provider;

pub use anthropic::AnthropicProvider;
pub use mock::MockProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAIProvider;
pub use provider::{LlmConfig, LlmProvider};
