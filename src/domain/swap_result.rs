//! Outcome of a settled swap.

use super::{Amount, Side};
use crate::error::AmmError;

/// The outcome of a swap: amounts exchanged and fees charged.
///
/// `lp_fee` stays in the pool; `system_fee` is set aside in the protocol
/// fee accumulator of the input asset.  Stable pools charge no system fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SwapResult {
    side_in: Side,
    amount_in: Amount,
    amount_out: Amount,
    lp_fee: Amount,
    system_fee: Amount,
}

impl SwapResult {
    /// Creates a validated swap result.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InsufficientAmount`] if either amount is zero.
    pub const fn new(
        side_in: Side,
        amount_in: Amount,
        amount_out: Amount,
        lp_fee: Amount,
        system_fee: Amount,
    ) -> crate::error::Result<Self> {
        if amount_in.is_zero() {
            return Err(AmmError::InsufficientAmount("amount_in must be positive"));
        }
        if amount_out.is_zero() {
            return Err(AmmError::InsufficientAmount("amount_out must be positive"));
        }
        Ok(Self {
            side_in,
            amount_in,
            amount_out,
            lp_fee,
            system_fee,
        })
    }

    /// The side that was sold into the pool.
    #[must_use]
    pub const fn side_in(&self) -> Side {
        self.side_in
    }

    /// Amount paid in.
    pub const fn amount_in(&self) -> Amount {
        self.amount_in
    }

    /// Amount paid out.
    pub const fn amount_out(&self) -> Amount {
        self.amount_out
    }

    /// Fee left to liquidity providers.
    pub const fn lp_fee(&self) -> Amount {
        self.lp_fee
    }

    /// Fee set aside for the protocol.
    pub const fn system_fee(&self) -> Amount {
        self.system_fee
    }
}
