//! Interfaces to the external services the engine consumes.
//!
//! The engine owns no transport: metadata sources, catalog search, and
//! playlist mutation are reached through these traits, and the surrounding
//! application decides how they talk to the outside world (HTTP clients,
//! database tables, local snapshots). Each implementation is responsible
//! for bounding its own calls with a timeout and reporting expiry as
//! [`SongbridgeError::LookupUnavailable`](crate::SongbridgeError::LookupUnavailable).
//!
//! In-memory implementations live in [`memory`] and back both the tests and
//! the CLI's snapshot files.

pub mod memory;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::feedback::FeedbackRecord;
use crate::model::{RawItem, SongGuess};

/// A track returned by a destination catalog search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogTrack {
    /// Track identifier in the destination catalog.
    pub native_id: String,

    /// Track title.
    pub title: String,

    /// Primary artist (or comma-joined artists).
    #[serde(default)]
    pub artist: String,

    /// Catalog-reported popularity, higher is more popular.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popularity: Option<u32>,
}

impl CatalogTrack {
    /// Create a track without popularity information.
    pub fn new(
        native_id: impl Into<String>,
        title: impl Into<String>,
        artist: impl Into<String>,
    ) -> Self {
        Self {
            native_id: native_id.into(),
            title: title.into(),
            artist: artist.into(),
            popularity: None,
        }
    }

    /// Set the popularity score.
    pub fn with_popularity(mut self, popularity: u32) -> Self {
        self.popularity = Some(popularity);
        self
    }
}

/// Publisher-supplied metadata attached to a source item.
pub trait MetadataLookup: Send + Sync {
    /// Fetch the authoritative (title, artist) for an item, if the publisher
    /// supplied one.
    fn fetch(&self, item: &RawItem) -> Result<Option<SongGuess>>;
}

/// A secondary, music-specific index searched by raw label.
pub trait StructuredCatalogSearch: Send + Sync {
    /// Return the first exact structural match for the label, if any.
    fn search(&self, raw_label: &str) -> Result<Option<SongGuess>>;
}

/// Free-text search against the destination catalog.
pub trait CatalogSearch: Send + Sync {
    /// Search for tracks, returning at most `limit` results in the catalog's
    /// own relevance order.
    fn search(&self, query: &str, limit: usize) -> Result<Vec<CatalogTrack>>;
}

/// Mutations against the destination playlist.
pub trait DestinationMutator: Send + Sync {
    /// Add a track to the playlist.
    fn add(&self, native_id: &str) -> Result<()>;

    /// Remove a track from the playlist.
    fn remove(&self, native_id: &str) -> Result<()>;
}

/// Append-only sink for user feedback.
pub trait FeedbackSink: Send + Sync {
    /// Append one record. Either the whole record is stored or nothing is.
    fn append(&self, record: &FeedbackRecord) -> Result<()>;
}
