//! Deterministic cleaning of free-text labels into (title, artist) pairs.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::error::Result;

// Patterns that do not depend on configuration, compiled once on first use.

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

static BRACKET_GROUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\(\[\{【]([^\(\)\[\]\{\}【】]*)[\)\]\}】]").unwrap());

static CHANNEL_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:\s*-\s*topic|vevo|\s+official)\s*$").unwrap());

static ARTIST_HINT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:\bft\.?\s|\bfeat\.?\s|\s&\s|,|\sx\s)").unwrap());

static EDGE_PUNCTUATION: &[char] = &['-', '–', '—', '|', ':', ',', '.', '~', '/', ' '];

static DEFAULT_PATTERNS: Lazy<Patterns> =
    Lazy::new(|| Patterns::compile(&NormalizerConfig::default()).unwrap());

/// Which side of a delimiter split holds the title when nothing else decides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitForm {
    /// `Title - Artist`.
    #[default]
    TitleArtist,
    /// `Artist - Title`.
    ArtistTitle,
}

/// Normalizer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Descriptors stripped inside brackets and at the end of a segment.
    pub descriptors: Vec<String>,

    /// Descriptors stripped only when they appear inside brackets.
    ///
    /// Words like "song" or "live" are legitimate title words, so they are
    /// only removed when an uploader fenced them off.
    pub bracket_only_descriptors: Vec<String>,

    /// Delimiters separating artist from title.
    pub delimiters: Vec<String>,

    /// Artists longer than this (in characters) are cut at the first comma.
    pub max_artist_len: usize,

    /// Orientation used when neither side looks like an artist.
    pub default_form: SplitForm,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        let strings = |items: &[&str]| -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        };
        Self {
            descriptors: strings(&[
                "official music video",
                "official lyric video",
                "official lyrical video",
                "official video",
                "official audio",
                "lyrical video",
                "lyric video",
                "lyrics video",
                "lyrics",
                "full video songs",
                "full video song",
                "video songs",
                "video song",
                "full audio song",
                "full video",
                "full song",
                "complete song",
                "song with lyrics",
                "with lyrics",
                "music video",
                "4k",
                "hd",
                "hq",
                "mv",
            ]),
            bracket_only_descriptors: strings(&[
                "audio",
                "song",
                "songs",
                "lyrical",
                "visualizer",
                "live",
                "remix",
                "cover",
                "acoustic",
                "extended",
                "studio version",
            ]),
            delimiters: strings(&[" - ", " – ", " — ", " || ", " | ", ": "]),
            max_artist_len: 50,
            default_form: SplitForm::TitleArtist,
        }
    }
}

/// Compiled matchers derived from a configuration.
#[derive(Debug, Clone)]
struct Patterns {
    /// Any descriptor (both lists) as a whole phrase.
    any_descriptor: Option<Regex>,
    /// A trailing run of strippable descriptors.
    trailing_descriptor: Option<Regex>,
    /// Any delimiter.
    delimiter: Option<Regex>,
}

impl Patterns {
    fn compile(config: &NormalizerConfig) -> Result<Self> {
        let all: Vec<&String> = config
            .descriptors
            .iter()
            .chain(config.bracket_only_descriptors.iter())
            .collect();

        let any_descriptor = if all.is_empty() {
            None
        } else {
            Some(Regex::new(&format!(
                r"(?i)\b(?:{})\b",
                alternation(all.into_iter())
            ))?)
        };

        let trailing_descriptor = if config.descriptors.is_empty() {
            None
        } else {
            Some(Regex::new(&format!(
                r"(?i)[\s,.:]*\b(?:{})[\s,.:]*$",
                alternation(config.descriptors.iter())
            ))?)
        };

        let mut delimiters: Vec<&String> =
            config.delimiters.iter().filter(|d| !d.is_empty()).collect();
        delimiters.sort_by_key(|d| std::cmp::Reverse(d.chars().count()));
        let delimiter = if delimiters.is_empty() {
            None
        } else {
            let alt = delimiters
                .iter()
                .map(|d| regex::escape(d))
                .collect::<Vec<_>>()
                .join("|");
            Some(Regex::new(&alt)?)
        };

        Ok(Self {
            any_descriptor,
            trailing_descriptor,
            delimiter,
        })
    }
}

/// Longest-first, escaped alternation with flexible inner whitespace.
fn alternation<'a>(phrases: impl Iterator<Item = &'a String>) -> String {
    let mut phrases: Vec<&String> = phrases.filter(|p| !p.trim().is_empty()).collect();
    phrases.sort_by_key(|p| std::cmp::Reverse(p.chars().count()));
    phrases
        .iter()
        .map(|p| {
            p.split_whitespace()
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s+")
        })
        .collect::<Vec<_>>()
        .join("|")
}

/// Best-effort (title, artist) pair extracted from a label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedTitle {
    /// Cleaned title.
    pub title: String,

    /// Artist guess; empty when no split was found and no channel was given.
    pub artist: String,

    /// Number of non-empty delimiter segments after cleaning.
    pub segments: usize,

    /// Orientation of the split, if the label was split.
    pub form: Option<SplitForm>,

    /// Whether the artist came from the uploader channel rather than the label.
    pub artist_from_channel: bool,
}

impl NormalizedTitle {
    /// Number of whitespace tokens in the artist guess.
    pub fn artist_tokens(&self) -> usize {
        self.artist.split_whitespace().count()
    }

    /// More than two segments means the artist/title boundary was a guess.
    pub fn is_ambiguous(&self) -> bool {
        self.segments > 2
    }
}

/// Cleans raw labels using configured vocabularies. Never fails.
#[derive(Debug, Clone)]
pub struct TitleNormalizer {
    config: NormalizerConfig,
    patterns: Patterns,
}

impl TitleNormalizer {
    /// Create a normalizer with the default vocabulary.
    pub fn new() -> Self {
        Self {
            config: NormalizerConfig::default(),
            patterns: DEFAULT_PATTERNS.clone(),
        }
    }

    /// Create a normalizer with a custom vocabulary.
    pub fn with_config(config: NormalizerConfig) -> Result<Self> {
        let patterns = Patterns::compile(&config)?;
        Ok(Self { config, patterns })
    }

    /// Get the configuration.
    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Clean a label into a (title, artist) pair.
    ///
    /// `channel` is the uploader name; it becomes the artist guess when the
    /// label itself has no delimiter split.
    pub fn normalize(&self, raw_label: &str, channel: Option<&str>) -> NormalizedTitle {
        let collapsed = collapse_whitespace(raw_label);
        let channel_artist = channel.map(clean_channel).filter(|c| !c.is_empty());

        if collapsed.is_empty() {
            return NormalizedTitle {
                title: String::new(),
                artist: String::new(),
                segments: 0,
                form: None,
                artist_from_channel: false,
            };
        }

        let unbracketed = self.strip_bracket_descriptors(&collapsed);
        let segments = self.segments(&unbracketed);

        let (title, artist, form, from_channel) = match segments.len() {
            0 => {
                // Label was nothing but descriptors; keep what we have.
                let fallback = trim_edges(&unbracketed);
                let title = if fallback.is_empty() {
                    collapsed.clone()
                } else {
                    fallback
                };
                let from_channel = channel_artist.is_some();
                (title, channel_artist.unwrap_or_default(), None, from_channel)
            }
            1 => {
                let from_channel = channel_artist.is_some();
                (
                    segments[0].clone(),
                    channel_artist.unwrap_or_default(),
                    None,
                    from_channel,
                )
            }
            _ => {
                let (left, right) = balanced_split(&segments);
                let form = self.orientation(&left, &right, channel_artist.as_deref());
                let (title, artist) = match form {
                    SplitForm::TitleArtist => (left, right),
                    SplitForm::ArtistTitle => (right, left),
                };
                (title, artist, Some(form), false)
            }
        };

        NormalizedTitle {
            title,
            artist: self.limit_artist(artist),
            segments: segments.len(),
            form,
            artist_from_channel: from_channel,
        }
    }

    /// Remove bracket groups whose content is a known descriptor.
    fn strip_bracket_descriptors(&self, label: &str) -> String {
        let Some(any_descriptor) = &self.patterns.any_descriptor else {
            return label.to_string();
        };
        let stripped = BRACKET_GROUP.replace_all(label, |caps: &Captures| {
            if any_descriptor.is_match(&caps[1]) {
                " ".to_string()
            } else {
                caps[0].to_string()
            }
        });
        collapse_whitespace(&stripped)
    }

    /// Split on delimiters and strip trailing descriptors from each piece.
    fn segments(&self, label: &str) -> Vec<String> {
        let pieces: Vec<&str> = match &self.patterns.delimiter {
            Some(delimiter) => delimiter.split(label).collect(),
            None => vec![label],
        };

        pieces
            .into_iter()
            .map(|piece| self.strip_trailing_descriptors(piece))
            .filter(|piece| !piece.is_empty())
            .collect()
    }

    fn strip_trailing_descriptors(&self, segment: &str) -> String {
        let mut current = trim_edges(segment);
        if let Some(trailing) = &self.patterns.trailing_descriptor {
            loop {
                let next = trim_edges(&trailing.replace(&current, ""));
                if next == current {
                    break;
                }
                current = next;
            }
        }
        current
    }

    /// Decide which side of a split is the artist.
    fn orientation(&self, left: &str, right: &str, channel: Option<&str>) -> SplitForm {
        if let Some(channel) = channel {
            let channel = fold(channel);
            let on_left = same_name(&channel, &fold(left));
            let on_right = same_name(&channel, &fold(right));
            if on_left && !on_right {
                return SplitForm::ArtistTitle;
            }
            if on_right && !on_left {
                return SplitForm::TitleArtist;
            }
        }

        let left_hint = ARTIST_HINT.is_match(left);
        let right_hint = ARTIST_HINT.is_match(right);
        if left_hint && !right_hint {
            return SplitForm::ArtistTitle;
        }
        if right_hint && !left_hint {
            return SplitForm::TitleArtist;
        }

        self.config.default_form
    }

    fn limit_artist(&self, artist: String) -> String {
        if artist.chars().count() <= self.config.max_artist_len {
            return artist;
        }
        match artist.split(',').next() {
            Some(first) => first.trim().to_string(),
            None => artist,
        }
    }
}

impl Default for TitleNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Pick the split point whose sides have the most even token counts.
///
/// Ties go to the earliest split point.
fn balanced_split(segments: &[String]) -> (String, String) {
    let tokens: Vec<usize> = segments
        .iter()
        .map(|s| s.split_whitespace().count())
        .collect();

    let mut best = 1;
    let mut best_balance = -1.0_f64;
    for k in 1..segments.len() {
        let left: usize = tokens[..k].iter().sum();
        let right: usize = tokens[k..].iter().sum();
        let balance = left.min(right) as f64 / left.max(right).max(1) as f64;
        if balance > best_balance {
            best_balance = balance;
            best = k;
        }
    }

    (segments[..best].join(" - "), segments[best..].join(" - "))
}

/// Collapse runs of whitespace to single spaces and trim.
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE.replace_all(s.trim(), " ").into_owned()
}

fn trim_edges(s: &str) -> String {
    collapse_whitespace(s.trim_matches(EDGE_PUNCTUATION))
}

/// Strip platform suffixes (`- Topic`, `VEVO`) from an uploader name.
pub fn clean_channel(channel: &str) -> String {
    let mut current = collapse_whitespace(channel);
    loop {
        let next = collapse_whitespace(&CHANNEL_SUFFIX.replace(&current, ""));
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Lowercase alphanumerics only, for loose name comparison.
fn fold(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn same_name(a: &str, b: &str) -> bool {
    !a.is_empty() && !b.is_empty() && (a == b || a.contains(b) || b.contains(a))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(label: &str) -> NormalizedTitle {
        TitleNormalizer::new().normalize(label, None)
    }

    #[test]
    fn test_simple_split() {
        let n = norm("Tum Hi Ho - Arijit Singh");
        assert_eq!(n.title, "Tum Hi Ho");
        assert_eq!(n.artist, "Arijit Singh");
        assert_eq!(n.segments, 2);
        assert_eq!(n.form, Some(SplitForm::TitleArtist));
    }

    #[test]
    fn test_strips_bracketed_descriptors() {
        let n = norm("Shape of You (Official Music Video) [4K]");
        assert_eq!(n.title, "Shape of You");
        assert_eq!(n.artist, "");
        assert_eq!(n.form, None);
    }

    #[test]
    fn test_keeps_meaningful_brackets() {
        let n = norm("Kesariya (From \"Brahmastra\")");
        assert_eq!(n.title, "Kesariya (From \"Brahmastra\")");
    }

    #[test]
    fn test_bracket_only_words_survive_outside_brackets() {
        let n = norm("Love Song (Audio)");
        assert_eq!(n.title, "Love Song");
    }

    #[test]
    fn test_trailing_descriptor_segment_is_dropped() {
        let n = norm("Perfect - Ed Sheeran - Official Video");
        assert_eq!(n.title, "Perfect");
        assert_eq!(n.artist, "Ed Sheeran");
        assert_eq!(n.segments, 2);
    }

    #[test]
    fn test_strips_song_with_lyrics() {
        let n = norm(
            "Badhulu Thochanai Song With Lyrics - Mr. Perfect Songs - Prabhas, Kajal Aggarwal, DSP",
        );
        assert!(n.title.starts_with("Badhulu Thochanai"));
        assert!(!n.title.to_lowercase().contains("lyrics"));
        assert_eq!(n.segments, 3);
        assert!(n.is_ambiguous());
    }

    #[test]
    fn test_artist_hint_flips_orientation() {
        let n = norm("Arijit Singh & Shreya Ghoshal - Tum Hi Ho");
        assert_eq!(n.title, "Tum Hi Ho");
        assert_eq!(n.artist, "Arijit Singh & Shreya Ghoshal");
        assert_eq!(n.form, Some(SplitForm::ArtistTitle));
    }

    #[test]
    fn test_channel_decides_orientation() {
        let n = TitleNormalizer::new().normalize("Coldplay - Yellow", Some("ColdplayVEVO"));
        assert_eq!(n.title, "Yellow");
        assert_eq!(n.artist, "Coldplay");
    }

    #[test]
    fn test_channel_used_when_no_split() {
        let n = TitleNormalizer::new().normalize("Yellow", Some("Coldplay - Topic"));
        assert_eq!(n.title, "Yellow");
        assert_eq!(n.artist, "Coldplay");
        assert!(n.artist_from_channel);
    }

    #[test]
    fn test_no_split_yields_label_and_empty_artist() {
        let n = norm("just some words");
        assert_eq!(n.title, "just some words");
        assert_eq!(n.artist, "");
    }

    #[test]
    fn test_empty_and_descriptor_only_labels() {
        let empty = norm("   ");
        assert_eq!(empty.title, "");
        assert_eq!(empty.artist, "");

        let only = norm("Official Video");
        assert_eq!(only.title, "Official Video");
    }

    #[test]
    fn test_long_artist_cut_at_comma() {
        let n = norm(
            "Song Name - Singer One, Singer Two, Music Director Three, Lyricist Four, Actor Five",
        );
        assert_eq!(n.artist, "Singer One");
    }

    #[test]
    fn test_balanced_split_prefers_even_sides() {
        let segments = vec![
            "a b".to_string(),
            "c d e".to_string(),
            "f g h i".to_string(),
        ];
        let (left, right) = balanced_split(&segments);
        assert_eq!(left, "a b - c d e");
        assert_eq!(right, "f g h i");
    }

    #[test]
    fn test_custom_config() {
        let config = NormalizerConfig {
            descriptors: vec!["remastered".to_string()],
            bracket_only_descriptors: vec![],
            delimiters: vec![" / ".to_string()],
            max_artist_len: 50,
            default_form: SplitForm::ArtistTitle,
        };
        let normalizer = TitleNormalizer::with_config(config).unwrap();
        let n = normalizer.normalize("Queen / Bohemian Rhapsody Remastered", None);
        assert_eq!(n.title, "Bohemian Rhapsody");
        assert_eq!(n.artist, "Queen");
    }

    #[test]
    fn test_clean_channel() {
        assert_eq!(clean_channel("Arijit Singh - Topic"), "Arijit Singh");
        assert_eq!(clean_channel("TaylorSwiftVEVO"), "TaylorSwift");
        assert_eq!(clean_channel("T-Series"), "T-Series");
    }
}
