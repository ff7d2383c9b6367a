//! Historical balance lookups.

use crate::domain::{Address, Amount, BlockHeight};
use crate::error::AmmError;

/// A token that remembers past balances by block height.
pub trait Checkpointable {
    /// Balance of `owner` as of the end of `block`.
    ///
    /// Zero before the owner's first checkpoint.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InvalidState`] if `block >= current`: the balance
    /// of the current block is not final yet.
    fn prior_balance(
        &self,
        owner: Address,
        block: BlockHeight,
        current: BlockHeight,
    ) -> Result<Amount, AmmError>;

    /// Number of checkpoints recorded for `owner`.
    fn checkpoint_count(&self, owner: Address) -> usize;
}
