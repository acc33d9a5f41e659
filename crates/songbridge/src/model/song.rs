//! Resolved (title, artist) identities.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::item::RawItem;

/// Which resolver stage produced a song identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionSource {
    /// Publisher-supplied metadata attached to the source item.
    LicensedMetadata,
    /// A music-specific index searched by raw label.
    StructuredCatalog,
    /// Deterministic title cleaning.
    RegexCleaning,
    /// Primary language-model provider.
    AiPrimary,
    /// Fallback language-model provider.
    AiFallback,
}

impl ExtractionSource {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            ExtractionSource::LicensedMetadata => "Licensed metadata",
            ExtractionSource::StructuredCatalog => "Structured catalog",
            ExtractionSource::RegexCleaning => "Regex cleaning",
            ExtractionSource::AiPrimary => "AI (primary)",
            ExtractionSource::AiFallback => "AI (fallback)",
        }
    }

    /// Whether a language model produced the identity.
    pub fn is_ai(&self) -> bool {
        matches!(self, ExtractionSource::AiPrimary | ExtractionSource::AiFallback)
    }
}

impl fmt::Display for ExtractionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A (title, artist) guess returned by any extraction source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongGuess {
    /// Song title.
    pub title: String,

    /// Performing artist (may be empty).
    #[serde(default)]
    pub artist: String,

    /// Album or film the song belongs to, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
}

impl SongGuess {
    /// Create a guess without album information.
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            album: None,
        }
    }

    /// Attach an album hint.
    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        let album = album.into();
        self.album = if album.trim().is_empty() {
            None
        } else {
            Some(album)
        };
        self
    }

    /// A guess is usable when it has a non-blank title.
    pub fn is_usable(&self) -> bool {
        !self.title.trim().is_empty()
    }

    /// Trim surrounding whitespace from every field.
    pub fn trimmed(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            artist: self.artist.trim().to_string(),
            album: self
                .album
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty()),
        }
    }
}

/// The resolver's final answer for one raw item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSong {
    /// Canonical title guess.
    pub title: String,

    /// Canonical artist guess (may be empty).
    pub artist: String,

    /// Album hint, if any stage supplied one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,

    /// Stage that produced this identity.
    pub extraction_source: ExtractionSource,

    /// The item this identity was derived from.
    pub raw_item: RawItem,
}

impl ResolvedSong {
    /// Build a resolved song from a guess.
    pub fn from_guess(guess: SongGuess, source: ExtractionSource, raw_item: RawItem) -> Self {
        Self {
            title: guess.title,
            artist: guess.artist,
            album: guess.album,
            extraction_source: source,
            raw_item,
        }
    }

    /// Search query for the destination catalog.
    pub fn query(&self) -> String {
        format!("{} {}", self.title, self.artist).trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Platform;

    #[test]
    fn test_guess_usable() {
        assert!(SongGuess::new("Song", "").is_usable());
        assert!(!SongGuess::new("  ", "Artist").is_usable());
    }

    #[test]
    fn test_guess_trimmed_drops_blank_album() {
        let guess = SongGuess::new(" A ", " B ").with_album("Film");
        let mut blank = guess.clone();
        blank.album = Some("   ".into());

        assert_eq!(guess.trimmed().album, Some("Film".to_string()));
        let blank = blank.trimmed();
        assert_eq!(blank.title, "A");
        assert_eq!(blank.artist, "B");
        assert_eq!(blank.album, None);
    }

    #[test]
    fn test_query_without_artist() {
        let item = RawItem::new("x", Platform::Video, "1");
        let song = ResolvedSong::from_guess(
            SongGuess::new("Tum Hi Ho", ""),
            ExtractionSource::RegexCleaning,
            item,
        );
        assert_eq!(song.query(), "Tum Hi Ho");
    }

    #[test]
    fn test_source_serde_names() {
        let json = serde_json::to_string(&ExtractionSource::AiFallback).unwrap();
        assert_eq!(json, "\"ai_fallback\"");
        assert!(ExtractionSource::AiPrimary.is_ai());
        assert!(!ExtractionSource::RegexCleaning.is_ai());
    }
}
