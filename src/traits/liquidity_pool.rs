//! Shared surface of the two-asset pools.
//!
//! Both [`VolatilePool`](crate::pools::VolatilePool) and
//! [`StableSwapPool`](crate::pools::StableSwapPool) keep two reserves and
//! a share supply, and deposit/withdraw by the same ratio rules.  Swaps
//! differ (one is synchronous, the other waits for an oracle) and are not
//! part of this trait.

use crate::domain::{Address, Amount, CallContext, Deposit, Shares, TokenPair, Withdrawal};
use crate::error::AmmError;
use crate::traits::TokenLedger;

/// A two-asset pool with fungible shares.
pub trait LiquidityPool {
    /// The pooled assets.
    fn token_pair(&self) -> &TokenPair;

    /// Address of the pool itself (holder of the reserves).
    fn pool_address(&self) -> Address;

    /// Address of the share token the pool mints.
    fn share_token(&self) -> Address;

    /// Current `(reserve_a, reserve_b)`.
    #[must_use]
    fn reserves(&self) -> (Amount, Amount);

    /// Outstanding shares, including the permanently locked anchor.
    #[must_use]
    fn total_shares(&self) -> Shares;

    /// Deposits both assets and mints shares to `deposit.recipient`.
    ///
    /// The first deposit bootstraps the pool; later deposits are trimmed
    /// to the current reserve ratio.
    ///
    /// # Errors
    ///
    /// - [`AmmError::Paused`] if the pool is paused.
    /// - [`AmmError::InvalidRatio`] if the deposit mints nothing or breaks
    ///   the bootstrap ratio.
    /// - [`AmmError::InsufficientAmount`] if fewer than `min_shares` would
    ///   be minted or the caller cannot pay.
    fn add_liquidity<L: TokenLedger>(
        &mut self,
        ctx: &CallContext,
        ledger: &mut L,
        deposit: Deposit,
    ) -> Result<Shares, AmmError>;

    /// Burns shares for a pro-rata cut of both reserves.
    ///
    /// Allowed while paused.
    ///
    /// # Errors
    ///
    /// - [`AmmError::InvalidState`] if the pool is empty.
    /// - [`AmmError::InsufficientAmount`] if `shares` is zero, would drain
    ///   the pool, or yields less than the caller's minimums.
    fn remove_liquidity<L: TokenLedger>(
        &mut self,
        ctx: &CallContext,
        ledger: &mut L,
        withdrawal: Withdrawal,
    ) -> Result<(Amount, Amount), AmmError>;
}
