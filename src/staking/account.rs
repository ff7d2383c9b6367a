//! Per-staker bookkeeping.

use std::collections::BTreeMap;

use crate::domain::{Amount, BlockHeight};
use crate::error::AmmError;

/// One stake deposit, tracked separately for exit-fee tiering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Lot {
    /// Unscaled stake token amount still in the lot.
    pub amount: Amount,
    /// Block the lot was staked in.
    pub deposit_block: BlockHeight,
}

/// State of one staker.
///
/// `balance` is kept in the scaled unit (`amount * MULTIPLIER`); lots hold
/// plain token amounts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Account {
    pub(crate) balance: u128,
    pub(crate) rewards: Amount,
    pub(crate) reward_per_token_paid: u128,
    pub(crate) lots: BTreeMap<u64, Lot>,
    pub(crate) lot_counter: u64,
}

impl Account {
    /// Scaled stake balance.
    #[must_use]
    pub const fn balance(&self) -> u128 {
        self.balance
    }

    /// Rewards settled but not yet claimed.
    #[must_use]
    pub const fn rewards(&self) -> Amount {
        self.rewards
    }

    /// Index value at the last settlement.
    #[must_use]
    pub const fn reward_per_token_paid(&self) -> u128 {
        self.reward_per_token_paid
    }

    /// Open lots by id.
    #[must_use]
    pub const fn lots(&self) -> &BTreeMap<u64, Lot> {
        &self.lots
    }

    /// Records a new lot under the next id and returns that id.
    pub(crate) fn open_lot(&mut self, amount: Amount, block: BlockHeight) -> Result<u64, AmmError> {
        let id = self.lot_counter;
        self.lot_counter = id
            .checked_add(1)
            .ok_or(AmmError::Overflow("lot counter"))?;
        self.lots.insert(
            id,
            Lot {
                amount,
                deposit_block: block,
            },
        );
        Ok(id)
    }

    /// Takes `amount` out of lot `id`, dropping the lot once empty.
    ///
    /// Returns the lot as it was before the withdrawal.
    pub(crate) fn draw_lot(&mut self, id: u64, amount: Amount) -> Result<Lot, AmmError> {
        let lot = *self.lots.get(&id).ok_or(AmmError::LotNotFound(id))?;
        let left = lot
            .amount
            .checked_sub(&amount)
            .ok_or(AmmError::InsufficientAmount("amount exceeds the lot"))?;
        if left.is_zero() {
            self.lots.remove(&id);
        } else {
            self.lots.insert(
                id,
                Lot {
                    amount: left,
                    deposit_block: lot.deposit_block,
                },
            );
        }
        Ok(lot)
    }
}
