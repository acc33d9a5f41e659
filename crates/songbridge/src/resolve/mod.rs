//! Extraction pipeline.
//!
//! Stages run cheapest and most precise first:
//!
//! 1. licensed metadata lookup
//! 2. structured catalog lookup
//! 3. regex cleaning (always computed, used as the baseline)
//! 4. language model, primary then fallback, only for hard labels
//!
//! A stage that errors is recorded in the trace and skipped; resolution
//! itself never fails.

mod pipeline;
mod quota;

pub use pipeline::{AiTrigger, Resolution, Resolver, ResolverConfig, StageAttempt, StageOutcome};
pub use quota::QuotaTracker;
