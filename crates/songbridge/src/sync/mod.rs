//! Reconciliation of a resolved source playlist with a destination playlist.
//!
//! [`PlanBuilder`] turns per-item decisions into a [`SyncPlan`](crate::SyncPlan);
//! [`apply`] pushes the plan through a
//! [`DestinationMutator`](crate::catalog::DestinationMutator), one item at a
//! time, and accounts for every failure instead of stopping at the first.

mod apply;
mod cancel;
mod plan;

pub use apply::apply;
pub use cancel::CancellationToken;
pub use plan::PlanBuilder;
