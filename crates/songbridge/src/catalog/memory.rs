//! In-memory collaborators.
//!
//! These are deterministic stand-ins for the real services: fixed lookup
//! tables, a token-overlap catalog search, and a playlist held in a mutex.
//! They deserialize from JSON so the CLI can drive the engine from snapshot
//! files.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SongbridgeError};
use crate::matching::tokenize;
use crate::model::{RawItem, SongGuess};
use crate::normalize::collapse_whitespace;

use super::{CatalogSearch, CatalogTrack, DestinationMutator, MetadataLookup, StructuredCatalogSearch};

/// Lookup key for labels: whitespace-collapsed and lowercased.
fn label_key(label: &str) -> String {
    collapse_whitespace(label).to_lowercase()
}

/// A fixed table of label -> (title, artist).
///
/// Serves as both a licensed-metadata source and a structured catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticLookup {
    entries: HashMap<String, SongGuess>,
}

impl StaticLookup {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry.
    pub fn with_entry(mut self, label: &str, guess: SongGuess) -> Self {
        self.insert(label, guess);
        self
    }

    /// Add an entry in place.
    pub fn insert(&mut self, label: &str, guess: SongGuess) {
        self.entries.insert(label_key(label), guess);
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn get(&self, label: &str) -> Option<SongGuess> {
        // Snapshot files keep their original casing; normalize on first use.
        self.entries.get(&label_key(label)).cloned().or_else(|| {
            self.entries
                .iter()
                .find(|(k, _)| label_key(k) == label_key(label))
                .map(|(_, v)| v.clone())
        })
    }
}

impl MetadataLookup for StaticLookup {
    fn fetch(&self, item: &RawItem) -> Result<Option<SongGuess>> {
        Ok(self.get(&item.raw_label))
    }
}

impl StructuredCatalogSearch for StaticLookup {
    fn search(&self, raw_label: &str) -> Result<Option<SongGuess>> {
        Ok(self.get(raw_label))
    }
}

/// A destination catalog held in memory.
///
/// Search returns tracks sharing at least one token with the query, ordered
/// by shared-token count and then popularity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryCatalog {
    /// All tracks in the catalog.
    pub tracks: Vec<CatalogTrack>,
}

impl InMemoryCatalog {
    /// Create a catalog from tracks.
    pub fn new(tracks: Vec<CatalogTrack>) -> Self {
        Self { tracks }
    }

    /// Add a track.
    pub fn with_track(mut self, track: CatalogTrack) -> Self {
        self.tracks.push(track);
        self
    }
}

impl CatalogSearch for InMemoryCatalog {
    fn search(&self, query: &str, limit: usize) -> Result<Vec<CatalogTrack>> {
        let query_tokens = tokenize(query);
        if query_tokens.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, &CatalogTrack)> = self
            .tracks
            .iter()
            .filter_map(|track| {
                let track_tokens = tokenize(&format!("{} {}", track.title, track.artist));
                let shared = query_tokens.intersection(&track_tokens).count();
                (shared > 0).then_some((shared, track))
            })
            .collect();

        scored.sort_by(|(a_shared, a), (b_shared, b)| {
            b_shared
                .cmp(a_shared)
                .then_with(|| b.popularity.unwrap_or(0).cmp(&a.popularity.unwrap_or(0)))
        });

        Ok(scored
            .into_iter()
            .take(limit)
            .map(|(_, track)| track.clone())
            .collect())
    }
}

/// A destination playlist held in memory.
#[derive(Debug, Default)]
pub struct MemoryPlaylist {
    tracks: Mutex<IndexSet<String>>,
    rejected: HashSet<String>,
}

impl MemoryPlaylist {
    /// Create a playlist with initial contents.
    pub fn new(tracks: impl IntoIterator<Item = String>) -> Self {
        Self {
            tracks: Mutex::new(tracks.into_iter().collect()),
            rejected: HashSet::new(),
        }
    }

    /// Make every mutation of `native_id` fail.
    pub fn rejecting(mut self, native_id: impl Into<String>) -> Self {
        self.rejected.insert(native_id.into());
        self
    }

    /// Current contents in insertion order.
    pub fn tracks(&self) -> Result<Vec<String>> {
        let tracks = self
            .tracks
            .lock()
            .map_err(|_| SongbridgeError::Persistence("playlist lock poisoned".to_string()))?;
        Ok(tracks.iter().cloned().collect())
    }

    fn check(&self, native_id: &str, action: &str) -> Result<()> {
        if self.rejected.contains(native_id) {
            return Err(SongbridgeError::rejected(
                native_id,
                format!("{} refused by destination", action),
            ));
        }
        Ok(())
    }
}

impl DestinationMutator for MemoryPlaylist {
    fn add(&self, native_id: &str) -> Result<()> {
        self.check(native_id, "add")?;
        let mut tracks = self
            .tracks
            .lock()
            .map_err(|_| SongbridgeError::Persistence("playlist lock poisoned".to_string()))?;
        tracks.insert(native_id.to_string());
        Ok(())
    }

    fn remove(&self, native_id: &str) -> Result<()> {
        self.check(native_id, "remove")?;
        let mut tracks = self
            .tracks
            .lock()
            .map_err(|_| SongbridgeError::Persistence("playlist lock poisoned".to_string()))?;
        tracks.shift_remove(native_id);
        Ok(())
    }
}
