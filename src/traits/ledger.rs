//! Token ledger capability consumed by pools, staking and the vault.
//!
//! Components never move tokens themselves.  They describe the movements
//! of one operation as a batch of [`LedgerOp`]s and hand the batch to a
//! [`TokenLedger`], which applies all of it or none of it.

use crate::callback::{BalanceAnswer, BalanceQuery};
use crate::domain::{Address, Amount, BlockHeight};
use crate::error::AmmError;

/// One token movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerOp {
    /// Move `amount` of `token` from `from` to `to`.
    Transfer {
        /// Token contract.
        token: Address,
        /// Debited account.
        from: Address,
        /// Credited account.
        to: Address,
        /// Amount moved.
        amount: Amount,
    },
    /// Create `amount` of `token` for `to`.
    Mint {
        /// Token contract.
        token: Address,
        /// Credited account.
        to: Address,
        /// Amount created.
        amount: Amount,
    },
    /// Destroy `amount` of `token` held by `from`.
    Burn {
        /// Token contract.
        token: Address,
        /// Debited account.
        from: Address,
        /// Amount destroyed.
        amount: Amount,
    },
}

/// Balances of many token contracts plus atomic batch execution.
pub trait TokenLedger {
    /// Balance of `owner` in `token`.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InvalidToken`] if `token` is unknown.
    fn balance_of(&self, token: Address, owner: Address) -> Result<Amount, AmmError>;

    /// Total supply of `token`.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InvalidToken`] if `token` is unknown.
    fn total_supply(&self, token: Address) -> Result<Amount, AmmError>;

    /// Applies `ops` on behalf of `operator` at `block`, all or nothing.
    ///
    /// Transfers need `operator` to be the owner or an approved spender;
    /// mints and burns need `operator` to be the token's minter.
    ///
    /// # Errors
    ///
    /// Returns the first failing op's error; no op of the batch is applied.
    fn execute(
        &mut self,
        operator: Address,
        ops: &[LedgerOp],
        block: BlockHeight,
    ) -> Result<(), AmmError>;

    /// The answer the queried token contract sends for `query`.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InvalidToken`] if the token is unknown.
    fn answer_balance(&self, query: &BalanceQuery) -> Result<BalanceAnswer, AmmError> {
        Ok(BalanceAnswer {
            request_id: query.request_id,
            source: query.token,
            balance: self.balance_of(query.token, query.holder)?,
        })
    }
}
