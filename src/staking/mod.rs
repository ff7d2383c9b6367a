//! Staking with a lazily settled reward index and tiered exit fees.
//!
//! Stakers deposit the stake token in lots; each lot remembers the block
//! it was staked in so that the exit fee can depend on how many cycles it
//! was held.  Rewards accrue through a global reward-per-token index
//! advanced on every entrypoint (see [`StakingPool`]).

mod account;
mod pool;

pub use account::{Account, Lot};
pub use pool::{StakingPool, Unstaked, DECIMAL, MULTIPLIER};

#[cfg(test)]
mod proptest_properties;
