//! Caller intents for pool entrypoints.

use super::{Address, Amount, Shares};

/// Deposit up to `max_a` / `max_b` at the current pool ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deposit {
    /// Most of token A the caller is willing to provide.
    pub max_a: Amount,
    /// Most of token B the caller is willing to provide.
    pub max_b: Amount,
    /// Fewest shares the caller accepts.
    pub min_shares: Shares,
    /// Receiver of the minted shares.
    pub recipient: Address,
}

/// Burn `shares` for a pro-rata cut of both reserves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Withdrawal {
    /// Shares to burn from the caller.
    pub shares: Shares,
    /// Least token A the caller accepts.
    pub min_a: Amount,
    /// Least token B the caller accepts.
    pub min_b: Amount,
    /// Receiver of both tokens.
    pub recipient: Address,
}

/// Sell `amount_in` of the pool asset that is not `token_out`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapOrder {
    /// Amount of the input asset sold.
    pub amount_in: Amount,
    /// Least output the caller accepts.
    pub min_out: Amount,
    /// Address of the asset the caller wants to receive.
    pub token_out: Address,
    /// Receiver of the output.
    pub recipient: Address,
}
