//! Main Songbridge struct and public API.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::catalog::{CatalogSearch, DestinationMutator, FeedbackSink, MetadataLookup, StructuredCatalogSearch};
use crate::error::{Result, SongbridgeError};
use crate::feedback::FeedbackRecord;
use crate::llm::LlmProvider;
use crate::matching::{Candidates, CatalogMatcher, MatcherConfig};
use crate::model::{
    ExtractionSource, MatchCandidate, MatchDecision, RawItem, ResolvedSong, SyncMode, SyncPlan,
    SyncReport,
};
use crate::normalize::{NormalizerConfig, TitleNormalizer};
use crate::policy::{ConfidencePolicy, PolicyConfig};
use crate::resolve::{QuotaTracker, Resolution, Resolver, ResolverConfig};
use crate::sync::{CancellationToken, PlanBuilder, apply};

/// Configuration for the whole engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Title normalizer vocabulary.
    pub normalizer: NormalizerConfig,
    /// When the language-model stage runs.
    pub resolver: ResolverConfig,
    /// Catalog search and scoring.
    pub matcher: MatcherConfig,
    /// Confidence thresholds.
    pub policy: PolicyConfig,
    /// Default reconciliation mode.
    pub mode: SyncMode,
}

impl EngineConfig {
    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| SongbridgeError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: EngineConfig = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            SongbridgeError::Config(format!("Failed to parse config '{}': {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check thresholds and weights.
    pub fn validate(&self) -> Result<()> {
        self.matcher.validate()?;
        self.policy.validate()
    }
}

/// Options for one reconciliation run.
#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    /// Mirror or append-only.
    pub mode: SyncMode,
    /// Maximum language-model calls for the run (`None` = unlimited).
    pub ai_budget: Option<u32>,
    /// Keep pending-confirmation tracks out of mirror removals (default on).
    pub protect_pending: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self::new(SyncMode::default())
    }
}

impl ReconcileOptions {
    /// Options for a mode with no AI budget.
    pub fn new(mode: SyncMode) -> Self {
        Self {
            mode,
            ai_budget: None,
            protect_pending: true,
        }
    }

    /// Cap language-model calls for the run.
    pub fn with_ai_budget(mut self, budget: u32) -> Self {
        self.ai_budget = Some(budget);
        self
    }

    /// Keep pending-confirmation tracks out of mirror removals.
    pub fn with_protect_pending(mut self, protect: bool) -> Self {
        self.protect_pending = protect;
        self
    }

    fn quota(&self) -> QuotaTracker {
        match self.ai_budget {
            Some(budget) => QuotaTracker::new(budget),
            None => QuotaTracker::unlimited(),
        }
    }
}

/// The song identity resolution and reconciliation engine.
pub struct Songbridge {
    config: EngineConfig,
    resolver: Resolver,
    matcher: CatalogMatcher,
    policy: ConfidencePolicy,
    catalog: Option<Arc<dyn CatalogSearch>>,
    feedback: Option<Arc<dyn FeedbackSink>>,
}

impl Songbridge {
    /// Create an engine with default configuration.
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            resolver: Resolver::new(),
            matcher: CatalogMatcher::new(),
            policy: ConfidencePolicy::new(),
            catalog: None,
            feedback: None,
        }
    }

    /// Create an engine with custom configuration.
    pub fn with_config(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let normalizer = TitleNormalizer::with_config(config.normalizer.clone())?;
        let resolver = Resolver::new()
            .with_normalizer(normalizer)
            .with_config(config.resolver.clone());
        let matcher = CatalogMatcher::with_config(config.matcher.clone())?;
        let policy = ConfidencePolicy::with_config(config.policy.clone())?;

        Ok(Self {
            config,
            resolver,
            matcher,
            policy,
            catalog: None,
            feedback: None,
        })
    }

    /// Set the destination catalog search.
    pub fn with_catalog(mut self, catalog: impl CatalogSearch + 'static) -> Self {
        self.catalog = Some(Arc::new(catalog));
        self
    }

    /// Set the licensed-metadata source.
    pub fn with_metadata_lookup(mut self, lookup: impl MetadataLookup + 'static) -> Self {
        self.resolver = self.resolver.with_metadata_lookup(Arc::new(lookup));
        self
    }

    /// Set the structured catalog.
    pub fn with_structured_catalog(
        mut self,
        catalog: impl StructuredCatalogSearch + 'static,
    ) -> Self {
        self.resolver = self.resolver.with_structured_catalog(Arc::new(catalog));
        self
    }

    /// Add the primary LLM provider.
    ///
    /// It is only consulted for labels the regex stage cannot split
    /// confidently (see [`AiTrigger`](crate::AiTrigger)).
    pub fn with_llm(self, provider: impl LlmProvider + 'static) -> Self {
        self.with_shared_llm(Arc::new(provider))
    }

    /// Add the primary LLM provider, keeping a handle to it.
    pub fn with_shared_llm(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.resolver = self.resolver.with_primary(provider);
        self
    }

    /// Add the fallback LLM provider, tried when the primary fails.
    pub fn with_fallback_llm(self, provider: impl LlmProvider + 'static) -> Self {
        self.with_shared_fallback_llm(Arc::new(provider))
    }

    /// Add the fallback LLM provider, keeping a handle to it.
    pub fn with_shared_fallback_llm(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.resolver = self.resolver.with_fallback(provider);
        self
    }

    /// Set where feedback is recorded.
    pub fn with_feedback_sink(self, sink: impl FeedbackSink + 'static) -> Self {
        self.with_shared_feedback_sink(Arc::new(sink))
    }

    /// Set where feedback is recorded, keeping a handle to it.
    pub fn with_shared_feedback_sink(mut self, sink: Arc<dyn FeedbackSink>) -> Self {
        self.feedback = Some(sink);
        self
    }

    /// Get the configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Options for a run in the configured mode.
    pub fn default_options(&self) -> ReconcileOptions {
        ReconcileOptions::new(self.config.mode)
    }

    /// Resolve an item with no AI budget limit. Never fails.
    pub fn resolve(&self, item: &RawItem) -> ResolvedSong {
        self.resolver.resolve(item, &mut QuotaTracker::unlimited())
    }

    /// Resolve an item against a shared budget and return the stage trace.
    pub fn resolve_with_quota(&self, item: &RawItem, quota: &mut QuotaTracker) -> Resolution {
        self.resolver.resolve_traced(item, quota)
    }

    /// Search the destination catalog for a resolved song.
    pub fn match_song(&self, song: &ResolvedSong) -> Result<Candidates> {
        let catalog = self
            .catalog
            .as_deref()
            .ok_or_else(|| SongbridgeError::Config("No destination catalog configured".to_string()))?;
        self.matcher.match_song(song, catalog)
    }

    /// Apply the confidence policy to a top candidate.
    pub fn decide(
        &self,
        candidate: Option<MatchCandidate>,
        extraction_source: ExtractionSource,
    ) -> MatchDecision {
        self.policy.decide(candidate, extraction_source)
    }

    /// Resolve, match and decide one item.
    pub fn evaluate(&self, item: &RawItem, quota: &mut QuotaTracker) -> Result<MatchDecision> {
        item.validate()?;
        let song = self.resolver.resolve(item, quota);
        let source = song.extraction_source;
        let top = self.match_song(&song)?.next();
        Ok(self.decide(top, source))
    }

    /// Evaluate every source item and plan the destination changes.
    ///
    /// Items are processed in source order; `cancel` is checked before each
    /// one. A failing item is recorded and the run continues.
    pub fn reconcile(
        &self,
        items: &[RawItem],
        destination: impl IntoIterator<Item = String>,
        options: &ReconcileOptions,
        cancel: &CancellationToken,
    ) -> SyncPlan {
        let mut builder =
            PlanBuilder::new(options.mode, destination).protect_pending(options.protect_pending);
        let mut quota = options.quota();

        for (index, item) in items.iter().enumerate() {
            if cancel.is_cancelled() {
                info!(remaining = items.len() - index, "reconciliation cancelled");
                builder.record_cancelled(items[index..].iter().cloned());
                break;
            }

            match self.evaluate(item, &mut quota) {
                Ok(decision) => {
                    debug!(
                        raw_label = %item.raw_label,
                        decision = %decision.describe(),
                        action = decision.action.label(),
                        "item decided"
                    );
                    builder.record_decision(item.clone(), decision);
                }
                Err(err) => {
                    warn!(raw_label = %item.raw_label, error = %err, "item failed");
                    builder.record_failure(item.clone(), &err);
                }
            }
        }

        let plan = builder.finish();
        info!(
            mode = %plan.mode,
            processed = plan.total_processed,
            to_add = plan.to_add.len(),
            to_remove = plan.to_remove.len(),
            pending = plan.pending_confirmation.len(),
            ai_calls = quota.used(),
            ai_budget_exhausted = quota.is_exhausted(),
            "reconciliation planned"
        );
        plan
    }

    /// Apply a plan to the destination.
    pub fn apply(
        &self,
        plan: SyncPlan,
        mutator: &dyn DestinationMutator,
        cancel: &CancellationToken,
    ) -> SyncReport {
        apply(plan, mutator, cancel)
    }

    /// Reconcile and apply in one call.
    pub fn sync(
        &self,
        items: &[RawItem],
        destination: impl IntoIterator<Item = String>,
        mutator: &dyn DestinationMutator,
        options: &ReconcileOptions,
        cancel: &CancellationToken,
    ) -> SyncReport {
        let plan = self.reconcile(items, destination, options, cancel);
        self.apply(plan, mutator, cancel)
    }

    /// Append a feedback record to the configured sink.
    pub fn record_feedback(&self, record: &FeedbackRecord) -> Result<()> {
        let sink = self
            .feedback
            .as_ref()
            .ok_or_else(|| SongbridgeError::Config("No feedback sink configured".to_string()))?;
        sink.append(record)
    }

    /// Add a pending candidate and record the confirmation.
    ///
    /// The track is added first; feedback is only recorded once the
    /// destination accepted it. Without a feedback sink the record is
    /// returned but not stored.
    pub fn confirm(
        &self,
        decision: &MatchDecision,
        mutator: &dyn DestinationMutator,
    ) -> Result<FeedbackRecord> {
        let record = FeedbackRecord::confirmation(decision).ok_or_else(|| {
            SongbridgeError::InvalidInput("Decision has no candidate to confirm".to_string())
        })?;
        if let Some(native_id) = decision.destination_id() {
            mutator.add(native_id)?;
        }
        self.store_if_configured(&record)?;
        Ok(record)
    }

    /// Record that the user turned a pending candidate down.
    pub fn skip(&self, decision: &MatchDecision) -> Result<FeedbackRecord> {
        let record = FeedbackRecord::rejection(decision).ok_or_else(|| {
            SongbridgeError::InvalidInput("Decision has no candidate to skip".to_string())
        })?;
        self.store_if_configured(&record)?;
        Ok(record)
    }

    /// Record the user's own title and artist for an item.
    pub fn correct(
        &self,
        raw_item: &RawItem,
        title: &str,
        artist: &str,
        confidence_score: f64,
    ) -> Result<FeedbackRecord> {
        if title.trim().is_empty() {
            return Err(SongbridgeError::InvalidInput(
                "Corrected title must not be empty".to_string(),
            ));
        }
        let record =
            FeedbackRecord::correction(raw_item.clone(), title.trim(), artist.trim(), confidence_score);
        self.store_if_configured(&record)?;
        Ok(record)
    }

    fn store_if_configured(&self, record: &FeedbackRecord) -> Result<()> {
        match &self.feedback {
            Some(sink) => sink.append(record),
            None => {
                debug!(raw_label = %record.raw_item.raw_label, "no feedback sink; record not stored");
                Ok(())
            }
        }
    }
}

impl Default for Songbridge {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogTrack;
    use crate::catalog::memory::{InMemoryCatalog, MemoryPlaylist};
    use crate::feedback::{FeedbackStore, FeedbackType, MemoryFeedbackStore};
    use crate::model::{MatchAction, Platform};

    fn engine() -> Songbridge {
        Songbridge::new().with_catalog(
            InMemoryCatalog::default()
                .with_track(CatalogTrack::new("yellow", "Yellow", "Coldplay"))
                .with_track(CatalogTrack::new("perfect", "Perfect", "Ed Sheeran")),
        )
    }

    #[test]
    fn test_evaluate_exact_match() {
        let item = RawItem::new("Perfect - Ed Sheeran (Official Video)", Platform::Video, "v1");
        let decision = engine().evaluate(&item, &mut QuotaTracker::unlimited()).unwrap();
        assert_eq!(decision.action, MatchAction::AutoAdd);
        assert_eq!(decision.destination_id(), Some("perfect"));
    }

    #[test]
    fn test_evaluate_invalid_item() {
        let item = RawItem::new("  ", Platform::Video, "v1");
        let err = engine().evaluate(&item, &mut QuotaTracker::unlimited()).unwrap_err();
        assert!(matches!(err, SongbridgeError::InvalidInput(_)));
    }

    #[test]
    fn test_match_without_catalog_is_config_error() {
        let song = Songbridge::new().resolve(&RawItem::new("Yellow", Platform::Video, "v1"));
        assert!(matches!(
            Songbridge::new().match_song(&song),
            Err(SongbridgeError::Config(_))
        ));
    }

    #[test]
    fn test_confirm_adds_and_records() {
        let store = Arc::new(MemoryFeedbackStore::new());
        let engine = engine().with_shared_feedback_sink(store.clone());
        let playlist = MemoryPlaylist::new(Vec::new());

        let item = RawItem::new("Yellow", Platform::Video, "v1");
        let song = engine.resolve(&item);
        let top = engine.match_song(&song).unwrap().next();
        let decision = engine.decide(top, song.extraction_source);

        let record = engine.confirm(&decision, &playlist).unwrap();
        assert_eq!(record.feedback_type, FeedbackType::Confirmation);
        assert_eq!(playlist.tracks().unwrap(), vec!["yellow".to_string()]);
        assert_eq!(store.lookup_by_raw_label("yellow").unwrap().count(), 1);
    }

    #[test]
    fn test_record_feedback_requires_sink() {
        let record = FeedbackRecord::correction(
            RawItem::new("x", Platform::Video, "v1"),
            "X",
            "",
            0.0,
        );
        assert!(Songbridge::new().record_feedback(&record).is_err());
    }

    #[test]
    fn test_config_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("songbridge.config.json");
        std::fs::write(&path, r#"{"mode": "mirror", "policy": {"high": 0.97}}"#).unwrap();

        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.mode, SyncMode::Mirror);
        assert_eq!(config.policy.high, 0.97);
        assert_eq!(config.policy.medium, 0.90);
        assert_eq!(config.matcher.search_limit, 5);

        std::fs::write(&path, r#"{"policy": {"low": 0.99}}"#).unwrap();
        assert!(EngineConfig::load(&path).is_err());
    }
}
