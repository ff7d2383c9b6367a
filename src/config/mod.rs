//! Validated configuration for every component.
//!
//! Each struct is built with `new(..)`, which runs `validate()`.  The
//! builder-style `with_*` methods re-validate.  With the `serde` feature
//! the configs can be loaded from files; call `validate()` after
//! deserialising, or let `FromConfig` do it.

mod stable_swap;
mod staking;
mod vault;
mod volatile;

pub use stable_swap::{StableSwapConfig, DEFAULT_ANSWER_TIMEOUT, DEFAULT_STABLE_FEE_DIVISOR};
pub use staking::{
    StakingConfig, UnstakeFeeSchedule, DEFAULT_BLOCKS_PER_CYCLE, DEFAULT_UNSTAKE_FEE_DIVISOR,
};
pub use vault::{RewardManagerConfig, VaultConfig, DEFAULT_BALANCE_TIMEOUT};
pub use volatile::{
    validate_fee_divisor, validate_swap_limit, VolatilePoolConfig, DEFAULT_LP_FEE_DIVISOR,
    DEFAULT_MAX_SWAP_LIMIT, DEFAULT_SYSTEM_FEE_DIVISOR, MIN_FEE_DIVISOR,
};
