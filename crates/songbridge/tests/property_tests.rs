//! Property-based tests for the normalizer, similarity, and policy.
//!
//! # Running Property Tests
//!
//! ```bash
//! cargo test -p songbridge --test property_tests
//!
//! # More cases
//! PROPTEST_CASES=10000 cargo test -p songbridge --test property_tests
//! ```

use proptest::prelude::*;

use songbridge::matching::token_set_ratio;
use songbridge::policy::ConfidencePolicy;
use songbridge::{
    ConfidenceBand, ExtractionSource, MatchAction, Platform, QuotaTracker, RawItem, Resolver,
    TitleNormalizer,
};

// =============================================================================
// Test Strategies
// =============================================================================

/// Labels shaped like real video titles.
fn label_like() -> impl Strategy<Value = String> {
    prop_oneof![
        "[A-Za-z ]{1,30}",
        "[A-Za-z ]{1,20} - [A-Za-z ]{1,20}",
        "[A-Za-z ]{1,20} \\| [A-Za-z ]{1,20} \\| [A-Za-z ]{1,20}",
        "[A-Za-z ]{1,20} \\((Official Video|Lyrics|HD|Remix)\\)",
        "[A-Za-z ]{1,15} ft\\. [A-Za-z ]{1,15} - [A-Za-z ]{1,15}",
    ]
}

/// Anything at all, including punctuation-only and non-Latin text.
fn any_text() -> impl Strategy<Value = String> {
    ".{0,120}"
}

fn band_rank(band: ConfidenceBand) -> u8 {
    match band {
        ConfidenceBand::Reject => 0,
        ConfidenceBand::Low => 1,
        ConfidenceBand::Medium => 2,
        ConfidenceBand::High => 3,
    }
}

// =============================================================================
// Normalizer
// =============================================================================

proptest! {
    #[test]
    fn normalizer_never_panics(label in any_text(), channel in proptest::option::of(any_text())) {
        let normalizer = TitleNormalizer::new();
        let _ = normalizer.normalize(&label, channel.as_deref());
    }

    #[test]
    fn normalizer_is_deterministic(label in label_like()) {
        let normalizer = TitleNormalizer::new();
        let first = normalizer.normalize(&label, None);
        let second = normalizer.normalize(&label, None);
        prop_assert_eq!(first.title, second.title);
        prop_assert_eq!(first.artist, second.artist);
    }

    #[test]
    fn normalized_fields_are_trimmed(label in label_like()) {
        let n = TitleNormalizer::new().normalize(&label, None);
        prop_assert_eq!(n.title.trim(), n.title.as_str());
        prop_assert_eq!(n.artist.trim(), n.artist.as_str());
    }

    #[test]
    fn resolution_keeps_a_title(label in any_text()) {
        prop_assume!(!label.trim().is_empty());
        let item = RawItem::new(label, Platform::Video, "v1");
        let song = Resolver::new().resolve(&item, &mut QuotaTracker::unlimited());
        prop_assert!(!song.title.trim().is_empty());
        prop_assert_eq!(song.extraction_source, ExtractionSource::RegexCleaning);
    }
}

// =============================================================================
// Similarity
// =============================================================================

proptest! {
    #[test]
    fn similarity_in_unit_range(a in any_text(), b in any_text()) {
        let score = token_set_ratio(&a, &b);
        prop_assert!((0.0..=1.0).contains(&score), "score {} out of range", score);
    }

    #[test]
    fn similarity_is_symmetric(a in label_like(), b in label_like()) {
        prop_assert_eq!(token_set_ratio(&a, &b), token_set_ratio(&b, &a));
    }

    #[test]
    fn similarity_of_self_is_one(a in label_like()) {
        prop_assume!(a.chars().any(char::is_alphanumeric));
        prop_assert_eq!(token_set_ratio(&a, &a), 1.0);
    }
}

// =============================================================================
// Confidence policy
// =============================================================================

proptest! {
    #[test]
    fn bands_are_monotonic(a in 0.0f64..=1.0, b in 0.0f64..=1.0) {
        let policy = ConfidencePolicy::new();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(band_rank(policy.band(lo)) <= band_rank(policy.band(hi)));
    }

    #[test]
    fn band_matches_thresholds(s in 0.0f64..=1.0) {
        let band = ConfidencePolicy::new().band(s);
        let expected = if s >= 0.95 {
            ConfidenceBand::High
        } else if s >= 0.90 {
            ConfidenceBand::Medium
        } else if s >= 0.50 {
            ConfidenceBand::Low
        } else {
            ConfidenceBand::Reject
        };
        prop_assert_eq!(band, expected);
    }

    #[test]
    fn no_candidate_always_skips(source_index in 0usize..6) {
        let sources = [
            ExtractionSource::LicensedMetadata,
            ExtractionSource::StructuredCatalog,
            ExtractionSource::RegexCleaning,
            ExtractionSource::AiPrimary,
            ExtractionSource::AiFallback,
            ExtractionSource::RegexCleaning,
        ];
        let decision = ConfidencePolicy::new().decide(None, sources[source_index]);
        prop_assert_eq!(decision.action, MatchAction::Skip);
        prop_assert_eq!(decision.confidence_band, ConfidenceBand::Reject);
    }
}
