//! Catalog matching.
//!
//! Given a resolved (title, artist), search the destination catalog and rank
//! the returned tracks by token-set similarity.

mod matcher;
mod similarity;

pub use matcher::{Candidates, CatalogMatcher, MatcherConfig};
pub use similarity::{normalize_text, same_title, token_set_ratio, tokenize};
