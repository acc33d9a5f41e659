//! Catalog matcher: search the destination and rank what comes back.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{CatalogSearch, CatalogTrack};
use crate::error::{Result, SongbridgeError};
use crate::model::{MatchCandidate, ResolvedSong};

use super::similarity::token_set_ratio;

/// Configuration for catalog matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Maximum results requested per search.
    pub search_limit: usize,

    /// Weight of the title similarity.
    pub title_weight: f64,

    /// Weight of the artist similarity (ignored when the artist is unknown).
    pub artist_weight: f64,

    /// Retry with the bare title when the qualified searches find nothing.
    pub title_only_fallback: bool,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            search_limit: 5,
            title_weight: 0.7,
            artist_weight: 0.3,
            title_only_fallback: true,
        }
    }
}

impl MatcherConfig {
    /// Check the weights and limit.
    pub fn validate(&self) -> Result<()> {
        if self.search_limit == 0 {
            return Err(SongbridgeError::Config(
                "search_limit must be at least 1".to_string(),
            ));
        }
        let weights_ok = self.title_weight.is_finite()
            && self.artist_weight.is_finite()
            && self.title_weight > 0.0
            && self.artist_weight >= 0.0;
        if !weights_ok {
            return Err(SongbridgeError::Config(format!(
                "Invalid matcher weights: title {} / artist {}",
                self.title_weight, self.artist_weight
            )));
        }
        Ok(())
    }
}

/// Ranked candidates for one resolved song.
///
/// Consumed once; the matcher has already run the search, so iterating
/// performs no further I/O.
#[derive(Debug)]
pub struct Candidates {
    inner: std::vec::IntoIter<MatchCandidate>,
}

impl Candidates {
    fn new(candidates: Vec<MatchCandidate>) -> Self {
        Self {
            inner: candidates.into_iter(),
        }
    }

    /// An empty sequence.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }
}

impl Iterator for Candidates {
    type Item = MatchCandidate;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Candidates {}

/// Scores destination tracks against resolved songs.
#[derive(Debug, Clone, Default)]
pub struct CatalogMatcher {
    config: MatcherConfig,
}

impl CatalogMatcher {
    /// Create a matcher with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a matcher with custom configuration.
    pub fn with_config(config: MatcherConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Get the configuration.
    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Queries to try, most specific first, without duplicates.
    pub fn queries(&self, song: &ResolvedSong) -> Vec<String> {
        let title = song.title.trim();
        if title.is_empty() {
            return Vec::new();
        }

        let mut queries = vec![song.query()];
        if let Some(album) = song.album.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
            queries.push(format!("{} {}", title, album));
        }
        if self.config.title_only_fallback {
            queries.push(title.to_string());
        }

        let mut seen = HashSet::new();
        queries.retain(|q| seen.insert(q.to_lowercase()));
        queries
    }

    /// Search the destination catalog and rank the results.
    ///
    /// Queries are tried in order until one returns tracks. A failing search
    /// is returned as an error; an empty result is not.
    pub fn match_song(&self, song: &ResolvedSong, search: &dyn CatalogSearch) -> Result<Candidates> {
        for query in self.queries(song) {
            let tracks = search.search(&query, self.config.search_limit)?;
            debug!(query = %query, results = tracks.len(), "catalog search");
            if tracks.is_empty() {
                continue;
            }

            let mut seen = HashSet::new();
            let candidates: Vec<MatchCandidate> = tracks
                .into_iter()
                .filter(|t| seen.insert(t.native_id.clone()))
                .map(|t| self.score(song, t, &query))
                .collect();
            return Ok(Candidates::new(rank(candidates)));
        }

        Ok(Candidates::empty())
    }

    /// Score one destination track.
    pub fn score(&self, song: &ResolvedSong, track: CatalogTrack, query: &str) -> MatchCandidate {
        let title_similarity = token_set_ratio(&song.title, &track.title);
        let artist_similarity = if song.artist.trim().is_empty() {
            None
        } else {
            Some(token_set_ratio(&song.artist, &track.artist))
        };

        let similarity = match artist_similarity {
            Some(artist) => {
                let total = self.config.title_weight + self.config.artist_weight;
                (self.config.title_weight * title_similarity + self.config.artist_weight * artist)
                    / total
            }
            None => title_similarity,
        };

        MatchCandidate {
            resolved: song.clone(),
            destination_native_id: track.native_id,
            destination_title: track.title,
            destination_artist: track.artist,
            similarity: similarity.clamp(0.0, 1.0),
            title_similarity,
            artist_similarity,
            popularity: track.popularity,
            query: query.to_string(),
        }
    }
}

/// Sort by similarity descending.
///
/// Ties are broken by popularity when every candidate carries one, and by
/// the catalog's own order otherwise.
fn rank(mut candidates: Vec<MatchCandidate>) -> Vec<MatchCandidate> {
    let by_popularity = candidates.iter().all(|c| c.popularity.is_some());
    candidates.sort_by(|a, b| {
        let order = b.similarity.total_cmp(&a.similarity);
        if by_popularity {
            order.then_with(|| b.popularity.cmp(&a.popularity))
        } else {
            order
        }
    });
    candidates
}
