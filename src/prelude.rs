//! Convenience re-exports for common types and traits.
//!
//! ```rust
//! use tidepool::prelude::*;
//! ```
//!
//! Brings the domain value types, the core traits, the error type and the
//! enabled components into scope with one import.

pub use crate::callback::{BalanceAnswer, BalanceQuery, RateAnswer, RateQuery, RequestId};
pub use crate::domain::{
    Address, Amount, BlockHeight, CallContext, Decimals, Deposit, FeeDivisor, Shares, Side,
    SwapOrder, SwapResult, Target, Token, TokenPair, Withdrawal,
};
pub use crate::error::{AmmError, ErrorKind};
pub use crate::math::CheckedArithmetic;
pub use crate::sync::Serialized;
pub use crate::token::{CheckpointedToken, InMemoryLedger};
pub use crate::traits::{
    Administrable, Checkpointable, FromConfig, LedgerOp, LiquidityPool, Pausable, TokenLedger,
};

#[cfg(feature = "constant-product")]
pub use crate::pools::VolatilePool;

#[cfg(feature = "stable-swap")]
pub use crate::pools::StableSwapPool;

#[cfg(feature = "staking")]
pub use crate::staking::StakingPool;

#[cfg(feature = "vault")]
pub use crate::vault::{RewardManager, Vault};
