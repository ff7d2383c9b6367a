//! Single-sided share vault and the reward manager that feeds it.
//!
//! The [`RewardManager`] streams backing tokens into the [`Vault`] at a
//! fixed rate per block.  The vault flushes the manager before every buy or
//! sell, so share prices always include the rewards accrued so far.

mod exchange;
mod reward_manager;

pub use exchange::{Vault, VaultOrder, VaultSettlement};
pub use reward_manager::RewardManager;
