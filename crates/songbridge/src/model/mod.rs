//! Core data types shared by the resolution, matching, and sync stages.

mod decision;
mod item;
mod report;
mod song;

pub use decision::{ConfidenceBand, MatchAction, MatchCandidate, MatchDecision};
pub use item::{Platform, RawItem};
pub use report::{SkippedItem, SyncFailure, SyncMode, SyncPlan, SyncReport};
pub use song::{ExtractionSource, ResolvedSong, SongGuess};
