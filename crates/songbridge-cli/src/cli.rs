//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use songbridge::{Platform, SyncMode};

/// Songbridge: resolve playlist entries and sync them across catalogs
#[derive(Parser)]
#[command(name = "songbridge")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output (debug logging on stderr)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve one label to (title, artist) and show how each stage did
    Resolve {
        /// Raw label as it appears on the source platform
        #[arg(value_name = "LABEL")]
        label: String,

        /// Uploader description
        #[arg(short, long)]
        description: Option<String>,

        /// Uploader channel name
        #[arg(long)]
        channel: Option<String>,

        /// Platform the label comes from
        #[arg(short, long, default_value = "video")]
        platform: Platform,

        /// Catalog snapshot; when given, also match and decide
        #[arg(short, long)]
        catalog: Option<PathBuf>,

        #[command(flatten)]
        engine: EngineArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Reconcile the source with the destination and apply the changes
    Sync {
        /// Source playlist (JSON, CSV or TSV)
        #[arg(value_name = "SOURCE")]
        source: PathBuf,

        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        engine: EngineArgs,

        /// Reconciliation mode (overrides the config file)
        #[arg(short, long)]
        mode: Option<SyncMode>,

        /// Maximum language-model calls for the run
        #[arg(long)]
        ai_budget: Option<u32>,

        /// Let mirror mode remove tracks whose match is still pending confirmation
        #[arg(long)]
        remove_pending: bool,

        /// Where to write the sync report (default: <destination>.report.json)
        #[arg(short, long)]
        report: Option<PathBuf>,

        /// Print the plan without touching the destination
        #[arg(long)]
        dry_run: bool,
    },

    /// Preview the changes a sync would make without applying them
    Diff {
        /// Source playlist (JSON, CSV or TSV)
        #[arg(value_name = "SOURCE")]
        source: PathBuf,

        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        engine: EngineArgs,

        /// Reconciliation mode (overrides the config file)
        #[arg(short, long)]
        mode: Option<SyncMode>,

        /// Maximum language-model calls for the run
        #[arg(long)]
        ai_budget: Option<u32>,

        /// Let mirror mode remove tracks whose match is still pending confirmation
        #[arg(long)]
        remove_pending: bool,
    },

    /// Show the outcome of a previous sync
    Status {
        /// Sync report written by `songbridge sync`
        #[arg(value_name = "REPORT")]
        report: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Accept a pending match: add it to the destination and record feedback
    Confirm {
        /// Sync report holding the pending match
        #[arg(value_name = "REPORT")]
        report: PathBuf,

        /// Position of the match in the pending list (as shown by `status`)
        #[arg(value_name = "INDEX")]
        index: usize,

        /// Destination playlist snapshot
        #[arg(short, long)]
        destination: PathBuf,

        /// Feedback file (JSON lines)
        #[arg(short, long, default_value = "songbridge.feedback.jsonl")]
        feedback: PathBuf,
    },

    /// Turn a pending match down and record feedback
    Skip {
        /// Sync report holding the pending match
        #[arg(value_name = "REPORT")]
        report: PathBuf,

        /// Position of the match in the pending list (as shown by `status`)
        #[arg(value_name = "INDEX")]
        index: usize,

        /// Feedback file (JSON lines)
        #[arg(short, long, default_value = "songbridge.feedback.jsonl")]
        feedback: PathBuf,
    },

    /// Inspect or add user feedback
    Feedback {
        #[command(subcommand)]
        action: FeedbackAction,

        /// Feedback file (JSON lines)
        #[arg(short, long, global = true, default_value = "songbridge.feedback.jsonl")]
        feedback: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum FeedbackAction {
    /// List feedback recorded for a raw label
    Show {
        /// Raw label as it appears on the source platform
        #[arg(value_name = "LABEL")]
        label: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Record the correct title and artist for a source entry
    Correct {
        /// Raw label as it appears on the source platform
        #[arg(value_name = "LABEL")]
        label: String,

        /// Identifier of the entry on the source platform
        #[arg(long)]
        native_id: String,

        /// Correct song title
        #[arg(short, long)]
        title: String,

        /// Correct artist
        #[arg(short, long, default_value = "")]
        artist: String,
    },
}

/// Where the destination lives.
#[derive(Args)]
pub struct TargetArgs {
    /// Destination catalog snapshot (tracks plus optional lookup tables)
    #[arg(short, long)]
    pub catalog: PathBuf,

    /// Destination playlist snapshot
    #[arg(short, long)]
    pub destination: PathBuf,
}

/// How the engine is built.
#[derive(Args)]
pub struct EngineArgs {
    /// Engine configuration file (JSON; default: songbridge.config.json
    /// next to the source file, if present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Primary LLM provider for hard labels
    #[arg(long, default_value = "none")]
    pub llm: LlmProviderChoice,

    /// Model to use (provider-specific, e.g., "gpt-4o-mini", "llama3.2")
    #[arg(long)]
    pub model: Option<String>,

    /// Fallback LLM provider, tried when the primary fails
    #[arg(long, default_value = "none")]
    pub fallback_llm: LlmProviderChoice,

    /// Feedback file (JSON lines); confirmations are recorded here
    #[arg(long)]
    pub feedback: Option<PathBuf>,
}

/// LLM provider choice
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LlmProviderChoice {
    /// No LLM - deterministic stages only
    #[default]
    None,
    /// Anthropic Claude API (requires ANTHROPIC_API_KEY)
    Anthropic,
    /// OpenAI GPT API (requires OPENAI_API_KEY)
    OpenAI,
    /// Ollama local models (requires Ollama running)
    Ollama,
    /// Mock provider for testing
    Mock,
}

impl std::str::FromStr for LlmProviderChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(LlmProviderChoice::None),
            "anthropic" | "claude" => Ok(LlmProviderChoice::Anthropic),
            "openai" | "gpt" => Ok(LlmProviderChoice::OpenAI),
            "ollama" | "local" => Ok(LlmProviderChoice::Ollama),
            "mock" | "test" => Ok(LlmProviderChoice::Mock),
            _ => Err(format!(
                "Unknown provider: {}. Use: none, anthropic, openai, ollama, or mock.",
                s
            )),
        }
    }
}

impl std::fmt::Display for LlmProviderChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmProviderChoice::None => write!(f, "none"),
            LlmProviderChoice::Anthropic => write!(f, "anthropic"),
            LlmProviderChoice::OpenAI => write!(f, "openai"),
            LlmProviderChoice::Ollama => write!(f, "ollama"),
            LlmProviderChoice::Mock => write!(f, "mock"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_sync() {
        let cli = Cli::try_parse_from([
            "songbridge",
            "sync",
            "playlist.csv",
            "--catalog",
            "catalog.json",
            "--destination",
            "dest.json",
            "--mode",
            "mirror",
            "--llm",
            "mock",
            "--ai-budget",
            "10",
        ])
        .unwrap();

        match cli.command {
            Commands::Sync {
                mode,
                ai_budget,
                engine,
                ..
            } => {
                assert_eq!(mode, Some(SyncMode::Mirror));
                assert_eq!(ai_budget, Some(10));
                assert_eq!(engine.llm, LlmProviderChoice::Mock);
                assert_eq!(engine.fallback_llm, LlmProviderChoice::None);
            }
            _ => panic!("expected sync"),
        }
    }

    #[test]
    fn test_parse_resolve() {
        let cli = Cli::try_parse_from([
            "songbridge",
            "resolve",
            "Tum Hi Ho | Aashiqui 2",
            "--channel",
            "T-Series",
            "--llm",
            "ollama",
            "--model",
            "llama3.2",
        ])
        .unwrap();

        match cli.command {
            Commands::Resolve {
                label,
                channel,
                platform,
                engine,
                ..
            } => {
                assert_eq!(label, "Tum Hi Ho | Aashiqui 2");
                assert_eq!(channel.as_deref(), Some("T-Series"));
                assert_eq!(platform, Platform::Video);
                assert_eq!(engine.model.as_deref(), Some("llama3.2"));
            }
            _ => panic!("expected resolve"),
        }
    }

    #[test]
    fn test_provider_choice_parse() {
        assert_eq!("Claude".parse::<LlmProviderChoice>().unwrap(), LlmProviderChoice::Anthropic);
        assert!("bard".parse::<LlmProviderChoice>().is_err());
    }
}
