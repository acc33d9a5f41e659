//! The resolver and its per-stage trace.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalog::{MetadataLookup, StructuredCatalogSearch};
use crate::error::{ErrorKind, Result, SongbridgeError};
use crate::llm::LlmProvider;
use crate::model::{ExtractionSource, RawItem, ResolvedSong, SongGuess};
use crate::normalize::{NormalizedTitle, TitleNormalizer};

use super::quota::QuotaTracker;

/// When the language-model stage runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiTrigger {
    /// When the cleaned artist is empty or a single token, or the label
    /// split into more than two segments. The orientation hint is not
    /// consulted: a three-segment label is ambiguous even when a comma in
    /// one segment picked the artist side.
    #[default]
    Auto,
    /// For every item that reaches the stage.
    Always,
    /// Never; regex cleaning is final.
    Never,
}

impl AiTrigger {
    /// Whether the normalizer's output needs a language model.
    pub fn fires(&self, normalized: &NormalizedTitle) -> bool {
        match self {
            AiTrigger::Auto => normalized.artist_tokens() <= 1 || normalized.is_ambiguous(),
            AiTrigger::Always => true,
            AiTrigger::Never => false,
        }
    }
}

/// Resolver configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// When to call the language-model stage.
    pub ai_trigger: AiTrigger,
}

/// What happened at one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StageOutcome {
    /// The stage produced the value carried forward (or the baseline).
    Hit,
    /// The stage answered but had nothing usable.
    Miss,
    /// The stage errored; resolution moved on.
    Failed { kind: ErrorKind, message: String },
    /// The stage was not attempted.
    Skipped { reason: String },
}

/// One entry of the resolution trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageAttempt {
    /// The stage.
    pub stage: ExtractionSource,
    /// Its outcome.
    #[serde(flatten)]
    pub outcome: StageOutcome,
}

/// A resolved song together with how it was obtained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    /// The final answer.
    pub song: ResolvedSong,
    /// Every stage in the order it was considered.
    pub trace: Vec<StageAttempt>,
}

impl Resolution {
    /// Whether a stage's collaborator was actually called.
    pub fn attempted(&self, stage: ExtractionSource) -> bool {
        self.trace
            .iter()
            .any(|a| a.stage == stage && !matches!(a.outcome, StageOutcome::Skipped { .. }))
    }

    /// Stages that failed, in order.
    pub fn failures(&self) -> impl Iterator<Item = &StageAttempt> {
        self.trace
            .iter()
            .filter(|a| matches!(a.outcome, StageOutcome::Failed { .. }))
    }
}

/// Turns raw items into resolved songs.
#[derive(Clone, Default)]
pub struct Resolver {
    normalizer: TitleNormalizer,
    config: ResolverConfig,
    metadata: Option<Arc<dyn MetadataLookup>>,
    structured: Option<Arc<dyn StructuredCatalogSearch>>,
    primary: Option<Arc<dyn LlmProvider>>,
    fallback: Option<Arc<dyn LlmProvider>>,
}

impl Resolver {
    /// A resolver with only the regex stage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom normalizer.
    pub fn with_normalizer(mut self, normalizer: TitleNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Use a custom configuration.
    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    /// Attach the licensed-metadata source.
    pub fn with_metadata_lookup(mut self, lookup: Arc<dyn MetadataLookup>) -> Self {
        self.metadata = Some(lookup);
        self
    }

    /// Attach the structured catalog.
    pub fn with_structured_catalog(mut self, catalog: Arc<dyn StructuredCatalogSearch>) -> Self {
        self.structured = Some(catalog);
        self
    }

    /// Attach the primary language model.
    pub fn with_primary(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.primary = Some(provider);
        self
    }

    /// Attach the fallback language model.
    pub fn with_fallback(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.fallback = Some(provider);
        self
    }

    /// The normalizer used for the regex stage.
    pub fn normalizer(&self) -> &TitleNormalizer {
        &self.normalizer
    }

    /// The resolver configuration.
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve an item. Never fails.
    pub fn resolve(&self, item: &RawItem, quota: &mut QuotaTracker) -> ResolvedSong {
        self.resolve_traced(item, quota).song
    }

    /// Resolve an item and report what each stage did.
    pub fn resolve_traced(&self, item: &RawItem, quota: &mut QuotaTracker) -> Resolution {
        let mut trace = Vec::new();

        let metadata = self
            .metadata
            .as_ref()
            .map(|lookup| lookup.fetch(item));
        if let Some(guess) = record(&mut trace, item, ExtractionSource::LicensedMetadata, metadata) {
            return finish(item, guess, ExtractionSource::LicensedMetadata, trace);
        }

        let structured = self
            .structured
            .as_ref()
            .map(|catalog| catalog.search(&item.raw_label));
        if let Some(guess) = record(&mut trace, item, ExtractionSource::StructuredCatalog, structured) {
            return finish(item, guess, ExtractionSource::StructuredCatalog, trace);
        }

        let normalized = self.normalizer.normalize(&item.raw_label, item.channel());
        let baseline = if normalized.title.is_empty() {
            SongGuess::new(item.raw_label.clone(), "")
        } else {
            SongGuess::new(normalized.title.clone(), normalized.artist.clone())
        };
        debug!(
            raw_label = %item.raw_label,
            title = %baseline.title,
            artist = %baseline.artist,
            segments = normalized.segments,
            "regex cleaning"
        );
        trace.push(StageAttempt {
            stage: ExtractionSource::RegexCleaning,
            outcome: StageOutcome::Hit,
        });

        if item.raw_label.trim().is_empty() {
            skip_ai(&mut trace, "empty label");
            return finish(item, baseline, ExtractionSource::RegexCleaning, trace);
        }
        if !self.config.ai_trigger.fires(&normalized) {
            skip_ai(&mut trace, "regex split is confident");
            return finish(item, baseline, ExtractionSource::RegexCleaning, trace);
        }

        let providers = [
            (ExtractionSource::AiPrimary, self.primary.as_ref()),
            (ExtractionSource::AiFallback, self.fallback.as_ref()),
        ];
        for (stage, provider) in providers {
            let result = provider.map(|provider| {
                if !quota.try_consume() {
                    return Err(SongbridgeError::QuotaExceeded {
                        provider: format!("{} (run budget)", provider.name()),
                    });
                }
                provider.extract_song(&item.raw_label, item.description(), item.channel())
            });
            let result = result.map(|r| r.map(Some));
            if let Some(guess) = record(&mut trace, item, stage, result) {
                return finish(item, guess, stage, trace);
            }
        }

        finish(item, baseline, ExtractionSource::RegexCleaning, trace)
    }
}

/// Record a stage result; return the guess if it is usable.
fn record(
    trace: &mut Vec<StageAttempt>,
    item: &RawItem,
    stage: ExtractionSource,
    result: Option<Result<Option<SongGuess>>>,
) -> Option<SongGuess> {
    let outcome = match result {
        None => StageOutcome::Skipped {
            reason: "not configured".to_string(),
        },
        Some(Ok(Some(guess))) if guess.is_usable() => {
            debug!(raw_label = %item.raw_label, stage = %stage, "stage hit");
            trace.push(StageAttempt {
                stage,
                outcome: StageOutcome::Hit,
            });
            return Some(guess.trimmed());
        }
        Some(Ok(_)) => {
            debug!(raw_label = %item.raw_label, stage = %stage, "stage miss");
            StageOutcome::Miss
        }
        Some(Err(err)) => {
            warn!(raw_label = %item.raw_label, stage = %stage, error = %err, "stage failed");
            StageOutcome::Failed {
                kind: err.kind(),
                message: err.to_string(),
            }
        }
    };
    trace.push(StageAttempt { stage, outcome });
    None
}

fn skip_ai(trace: &mut Vec<StageAttempt>, reason: &str) {
    for stage in [ExtractionSource::AiPrimary, ExtractionSource::AiFallback] {
        trace.push(StageAttempt {
            stage,
            outcome: StageOutcome::Skipped {
                reason: reason.to_string(),
            },
        });
    }
}

fn finish(
    item: &RawItem,
    guess: SongGuess,
    source: ExtractionSource,
    trace: Vec<StageAttempt>,
) -> Resolution {
    Resolution {
        song: ResolvedSong::from_guess(guess, source, item.clone()),
        trace,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::memory::StaticLookup;
    use crate::llm::MockProvider;
    use crate::model::Platform;
    use crate::normalize::SplitForm;

    struct DownLookup;

    impl MetadataLookup for DownLookup {
        fn fetch(&self, _item: &RawItem) -> Result<Option<SongGuess>> {
            Err(SongbridgeError::lookup("licensed metadata", "timed out"))
        }
    }

    fn item(label: &str) -> RawItem {
        RawItem::new(label, Platform::Video, "v1")
    }

    #[test]
    fn test_regex_only() {
        let resolver = Resolver::new();
        let res = resolver.resolve_traced(
            &item("Perfect - Ed Sheeran (Official Video)"),
            &mut QuotaTracker::unlimited(),
        );
        assert_eq!(res.song.title, "Perfect");
        assert_eq!(res.song.artist, "Ed Sheeran");
        assert_eq!(res.song.extraction_source, ExtractionSource::RegexCleaning);
        assert!(!res.attempted(ExtractionSource::LicensedMetadata));
    }

    #[test]
    fn test_metadata_hit_short_circuits() {
        let lookup = StaticLookup::new().with_entry("weird label", SongGuess::new("Song", "Band"));
        let primary = Arc::new(MockProvider::new());
        let resolver = Resolver::new()
            .with_metadata_lookup(Arc::new(lookup.clone()))
            .with_structured_catalog(Arc::new(lookup))
            .with_primary(primary.clone());

        let res = resolver.resolve_traced(&item("weird label"), &mut QuotaTracker::unlimited());
        assert_eq!(res.song.extraction_source, ExtractionSource::LicensedMetadata);
        assert_eq!(res.trace.len(), 1);
        assert!(!res.attempted(ExtractionSource::StructuredCatalog));
        assert_eq!(primary.calls(), 0);
    }

    #[test]
    fn test_failed_lookup_advances() {
        let structured = StaticLookup::new().with_entry("weird label", SongGuess::new("Song", "Band"));
        let resolver = Resolver::new()
            .with_metadata_lookup(Arc::new(DownLookup))
            .with_structured_catalog(Arc::new(structured));

        let res = resolver.resolve_traced(&item("weird label"), &mut QuotaTracker::unlimited());
        assert_eq!(res.song.extraction_source, ExtractionSource::StructuredCatalog);
        let failed: Vec<_> = res.failures().collect();
        assert_eq!(failed.len(), 1);
        assert!(matches!(
            failed[0].outcome,
            StageOutcome::Failed { kind: ErrorKind::LookupUnavailable, .. }
        ));
    }

    #[test]
    fn test_unusable_metadata_is_a_miss() {
        let lookup = StaticLookup::new().with_entry("Yellow - Coldplay", SongGuess::new(" ", "Coldplay"));
        let resolver = Resolver::new().with_metadata_lookup(Arc::new(lookup));
        let res = resolver.resolve_traced(&item("Yellow - Coldplay"), &mut QuotaTracker::unlimited());
        assert_eq!(res.trace[0].outcome, StageOutcome::Miss);
        assert_eq!(res.song.extraction_source, ExtractionSource::RegexCleaning);
    }

    #[test]
    fn test_ai_not_called_for_confident_split() {
        let primary = Arc::new(MockProvider::new());
        let resolver = Resolver::new().with_primary(primary.clone());
        let res = resolver.resolve(&item("Perfect - Ed Sheeran"), &mut QuotaTracker::unlimited());
        assert_eq!(res.extraction_source, ExtractionSource::RegexCleaning);
        assert_eq!(primary.calls(), 0);
    }

    #[test]
    fn test_quota_exceeded_uses_fallback() {
        let primary = Arc::new(MockProvider::quota_exceeded().named("primary"));
        let fallback = Arc::new(MockProvider::new().named("fallback"));
        let resolver = Resolver::new()
            .with_primary(primary.clone())
            .with_fallback(fallback.clone());

        let res = resolver.resolve_traced(&item("Tum Hi Ho"), &mut QuotaTracker::unlimited());
        assert_eq!(res.song.extraction_source, ExtractionSource::AiFallback);
        assert_eq!(primary.calls(), 1);
        assert_eq!(fallback.calls(), 1);
    }

    #[test]
    fn test_both_providers_fail_keeps_baseline() {
        let resolver = Resolver::new()
            .with_primary(Arc::new(MockProvider::failing()))
            .with_fallback(Arc::new(MockProvider::quota_exceeded()));

        let res = resolver.resolve_traced(&item("Tum Hi Ho"), &mut QuotaTracker::unlimited());
        assert_eq!(res.song.extraction_source, ExtractionSource::RegexCleaning);
        assert_eq!(res.song.title, "Tum Hi Ho");
        assert_eq!(res.song.artist, "");
        assert_eq!(res.failures().count(), 2);
    }

    #[test]
    fn test_run_budget_limits_calls() {
        let primary = Arc::new(MockProvider::new());
        let resolver = Resolver::new().with_primary(primary.clone());
        let mut quota = QuotaTracker::new(1);

        let first = resolver.resolve(&item("Tum Hi Ho"), &mut quota);
        let second = resolver.resolve(&item("Kesariya"), &mut quota);
        assert_eq!(first.extraction_source, ExtractionSource::AiPrimary);
        assert_eq!(second.extraction_source, ExtractionSource::RegexCleaning);
        assert_eq!(primary.calls(), 1);
    }

    #[test]
    fn test_empty_label_never_fails() {
        let primary = Arc::new(MockProvider::new());
        let resolver = Resolver::new().with_primary(primary.clone());
        let res = resolver.resolve(&item("   "), &mut QuotaTracker::unlimited());
        assert_eq!(res.title, "   ");
        assert_eq!(res.artist, "");
        assert_eq!(res.extraction_source, ExtractionSource::RegexCleaning);
        assert_eq!(primary.calls(), 0);
    }

    #[test]
    fn test_never_trigger() {
        let primary = Arc::new(MockProvider::new());
        let resolver = Resolver::new()
            .with_config(ResolverConfig {
                ai_trigger: AiTrigger::Never,
            })
            .with_primary(primary.clone());
        resolver.resolve(&item("Tum Hi Ho"), &mut QuotaTracker::unlimited());
        assert_eq!(primary.calls(), 0);
    }

    #[test]
    fn test_auto_trigger_ignores_orientation() {
        let normalized = |artist: &str, segments: usize, form: Option<SplitForm>| NormalizedTitle {
            title: "Badhulu".to_string(),
            artist: artist.to_string(),
            segments,
            form,
            artist_from_channel: false,
        };

        let trigger = AiTrigger::Auto;
        assert!(trigger.fires(&normalized("Sid Sriram, Chinmayi", 3, Some(SplitForm::ArtistTitle))));
        assert!(trigger.fires(&normalized("Sid Sriram, Chinmayi", 3, Some(SplitForm::TitleArtist))));
        assert!(trigger.fires(&normalized("Anirudh", 2, Some(SplitForm::TitleArtist))));
        assert!(!trigger.fires(&normalized("Ed Sheeran", 2, Some(SplitForm::TitleArtist))));
        assert!(!AiTrigger::Never.fires(&normalized("", 1, None)));
    }
}
