//! Confidence policy: similarity bands and the actions they trigger.

mod confidence;

pub use confidence::{ConfidencePolicy, PolicyConfig};
