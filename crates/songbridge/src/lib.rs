//! Songbridge: song identity resolution and playlist reconciliation.
//!
//! Songbridge takes playlist entries from one catalog, where songs are often
//! free-text video titles, works out which song each entry names, finds it
//! in another catalog, and keeps the destination playlist in step with the
//! source.
//!
//! # Core Principles
//!
//! - **Cheapest first**: licensed metadata and catalog lookups run before any
//!   language model, and the model only sees labels regex cleaning cannot split
//! - **Never fails an item silently**: every item ends in a decision or a
//!   recorded failure, and one bad item never aborts the run
//! - **Confidence-gated**: low-confidence matches wait for the user
//!
//! # Example
//!
//! ```no_run
//! use songbridge::catalog::memory::{InMemoryCatalog, MemoryPlaylist};
//! use songbridge::{CancellationToken, Platform, RawItem, ReconcileOptions, Songbridge, SyncMode};
//!
//! let engine = Songbridge::new().with_catalog(InMemoryCatalog::default());
//! let items = vec![RawItem::new("Yellow - Coldplay (Official Video)", Platform::Video, "v1")];
//! let playlist = MemoryPlaylist::new(Vec::new());
//!
//! let report = engine.sync(
//!     &items,
//!     playlist.tracks().unwrap(),
//!     &playlist,
//!     &ReconcileOptions::new(SyncMode::AppendOnly),
//!     &CancellationToken::new(),
//! );
//! println!("{}", report.summary());
//! ```

pub mod catalog;
pub mod error;
pub mod feedback;
pub mod import;
pub mod llm;
pub mod matching;
pub mod model;
pub mod normalize;
pub mod policy;
pub mod resolve;
pub mod sync;

mod engine;

pub use crate::engine::{EngineConfig, ReconcileOptions, Songbridge};
pub use catalog::{
    CatalogSearch, CatalogTrack, DestinationMutator, FeedbackSink, MetadataLookup,
    StructuredCatalogSearch,
};
pub use error::{ErrorKind, Result, SongbridgeError};
pub use feedback::{FeedbackRecord, FeedbackStore, FeedbackType, JsonlFeedbackStore};
pub use import::load_raw_items;
pub use llm::{AnthropicProvider, LlmConfig, LlmProvider, MockProvider, OllamaProvider, OpenAIProvider};
pub use model::{
    ConfidenceBand, ExtractionSource, MatchAction, MatchCandidate, MatchDecision, Platform,
    RawItem, ResolvedSong, SkippedItem, SongGuess, SyncFailure, SyncMode, SyncPlan, SyncReport,
};
pub use normalize::{NormalizedTitle, TitleNormalizer};
pub use resolve::{AiTrigger, QuotaTracker, Resolution, Resolver};
pub use sync::CancellationToken;
