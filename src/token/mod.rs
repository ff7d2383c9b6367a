//! Token contracts and the ledger the other components settle against.
//!
//! [`CheckpointedToken`] is a single fungible token with balance history;
//! [`InMemoryLedger`] hosts many of them and implements
//! [`TokenLedger`](crate::traits::TokenLedger).

mod checkpointed;
mod ledger;

pub use checkpointed::{Checkpoint, CheckpointedToken};
pub use ledger::InMemoryLedger;
