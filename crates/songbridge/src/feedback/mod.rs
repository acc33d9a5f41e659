//! User feedback on matches.
//!
//! Records are append-only and keyed by the raw label they concern. The
//! resolver does not read them; they exist for offline threshold tuning and
//! for future consultation through [`FeedbackStore::lookup_by_raw_label`].

mod record;
mod store;

pub use record::{FeedbackRecord, FeedbackType, label_key};
pub use store::{FeedbackIter, FeedbackStore, JsonlFeedbackStore, MemoryFeedbackStore};
