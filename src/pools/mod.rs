//! Two-asset liquidity pools.
//!
//! Both pool types share the reserve and share bookkeeping in
//! [`liquidity`] and differ only in how a swap is priced.
//!
//! | Feature | Pool | Curve | Settlement |
//! |---------|------|-------|------------|
//! | `constant-product` | [`VolatilePool`] | `x * y = k` | synchronous |
//! | `stable-swap` | [`StableSwapPool`] | flat utility, oracle target | request / answer |

#[cfg(feature = "constant-product")]
pub mod constant_product;
pub mod liquidity;
#[cfg(feature = "stable-swap")]
pub mod stable_swap;

#[cfg(feature = "constant-product")]
pub use constant_product::VolatilePool;
pub use liquidity::{
    bootstrap_shares, proportional_deposit, DepositPlan, WithdrawalPlan, INITIAL_LIQUIDITY_OFFSET,
};
#[cfg(feature = "stable-swap")]
pub use stable_swap::{PendingSwap, StableSwapPool};

#[cfg(test)]
mod proptest_properties;
