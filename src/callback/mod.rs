//! Two-phase request/answer plumbing for asynchronous lookups.
//!
//! Stable pools ask an oracle for the rate target and the vault asks the
//! backing token for its balance.  In both cases the component emits a
//! query message, parks the caller's intent in a [`PendingSlot`], and
//! finishes the operation when an answer tagged with the same
//! [`RequestId`] is delivered.

mod message;
mod pending;

pub use message::{BalanceAnswer, BalanceQuery, RateAnswer, RateQuery, RequestId};
pub use pending::PendingSlot;
