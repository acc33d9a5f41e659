//! CLI command implementations.

pub mod confirm;
pub mod diff;
pub mod feedback;
pub mod resolve;
pub mod status;
pub mod sync;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use colored::{ColoredString, Colorize};
use songbridge::{
    AnthropicProvider, ConfidenceBand, EngineConfig, JsonlFeedbackStore, LlmConfig, LlmProvider,
    MatchDecision, MockProvider, OllamaProvider, OpenAIProvider, Songbridge,
};

use crate::cli::{EngineArgs, LlmProviderChoice};
use crate::snapshot::CatalogSnapshot;

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// File name looked up next to the source playlist when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "songbridge.config.json";

/// Build the engine from CLI flags and an optional catalog snapshot.
pub fn build_engine(
    args: &EngineArgs,
    catalog: Option<&Path>,
    source: Option<&Path>,
) -> Result<Songbridge, Box<dyn std::error::Error>> {
    let config = match config_path(args, source) {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading engine config");
            EngineConfig::load(&path)?
        }
        None => EngineConfig::default(),
    };
    let mut engine = Songbridge::with_config(config)?;

    if let Some(path) = catalog {
        let (tracks, metadata, structured) = CatalogSnapshot::load(path)?.into_parts();
        engine = engine.with_catalog(tracks);
        if let Some(metadata) = metadata {
            engine = engine.with_metadata_lookup(metadata);
        }
        if let Some(structured) = structured {
            engine = engine.with_structured_catalog(structured);
        }
    }

    if let Some(provider) = build_provider(args.llm, args.model.as_deref())? {
        engine = engine.with_shared_llm(provider);
    }
    if let Some(provider) = build_provider(args.fallback_llm, None)? {
        engine = engine.with_shared_fallback_llm(provider);
    }
    if let Some(path) = &args.feedback {
        engine = engine.with_feedback_sink(JsonlFeedbackStore::new(path));
    }

    Ok(engine)
}

fn config_path(args: &EngineArgs, source: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = &args.config {
        return Some(path.clone());
    }
    let dir = source?.parent()?;
    let candidate = dir.join(DEFAULT_CONFIG_FILE);
    candidate.is_file().then_some(candidate)
}

fn build_provider(
    choice: LlmProviderChoice,
    model: Option<&str>,
) -> Result<Option<Arc<dyn LlmProvider>>, Box<dyn std::error::Error>> {
    let with_model = |default: LlmConfig| match model {
        Some(m) => LlmConfig {
            model: m.to_string(),
            ..default
        },
        None => default,
    };

    let provider: Arc<dyn LlmProvider> = match choice {
        LlmProviderChoice::None => return Ok(None),
        LlmProviderChoice::Mock => Arc::new(MockProvider::new()),
        LlmProviderChoice::Anthropic => match model {
            Some(_) => {
                let key = std::env::var("ANTHROPIC_API_KEY")
                    .map_err(|_| "ANTHROPIC_API_KEY environment variable not set")?;
                Arc::new(AnthropicProvider::with_config(key, with_model(LlmConfig::default()))?)
            }
            None => Arc::new(AnthropicProvider::from_env()?),
        },
        LlmProviderChoice::OpenAI => match model {
            Some(_) => {
                let key = std::env::var("OPENAI_API_KEY")
                    .map_err(|_| "OPENAI_API_KEY environment variable not set")?;
                Arc::new(OpenAIProvider::with_config(key, with_model(LlmConfig::default()))?)
            }
            None => Arc::new(OpenAIProvider::from_env()?),
        },
        LlmProviderChoice::Ollama => match model {
            Some(m) => Arc::new(OllamaProvider::with_model(m)?),
            None => Arc::new(OllamaProvider::new()?),
        },
    };
    Ok(Some(provider))
}

pub fn band_label(band: ConfidenceBand) -> ColoredString {
    match band {
        ConfidenceBand::High => band.label().green(),
        ConfidenceBand::Medium => band.label().cyan(),
        ConfidenceBand::Low => band.label().yellow(),
        ConfidenceBand::Reject => band.label().red(),
    }
}

/// One-line description of a decision for listings.
pub fn decision_line(decision: &MatchDecision) -> String {
    match &decision.candidate {
        Some(c) => format!(
            "{} -> {} - {} [{}] ({:.2}, {})",
            c.resolved.raw_item.raw_label,
            c.destination_title,
            c.destination_artist,
            c.destination_native_id,
            c.similarity,
            decision.extraction_source
        ),
        None => decision.describe(),
    }
}
