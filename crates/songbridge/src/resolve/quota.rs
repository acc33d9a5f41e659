//! Per-run budget of language-model calls.

use serde::{Deserialize, Serialize};

/// Counts AI calls against an optional limit.
///
/// Owned by the caller and passed into every resolution so the budget can
/// span a whole sync run (or several) without global state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaTracker {
    limit: Option<u32>,
    used: u32,
}

impl QuotaTracker {
    /// A tracker allowing `limit` calls.
    pub fn new(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            used: 0,
        }
    }

    /// A tracker with no limit.
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Take one unit of budget. Returns false once the limit is reached.
    pub fn try_consume(&mut self) -> bool {
        if self.is_exhausted() {
            return false;
        }
        self.used = self.used.saturating_add(1);
        true
    }

    /// Units left, `None` when unlimited.
    pub fn remaining(&self) -> Option<u32> {
        self.limit.map(|limit| limit.saturating_sub(self.used))
    }

    /// Units consumed so far.
    pub fn used(&self) -> u32 {
        self.used
    }

    /// Whether no budget is left.
    pub fn is_exhausted(&self) -> bool {
        self.remaining() == Some(0)
    }
}
