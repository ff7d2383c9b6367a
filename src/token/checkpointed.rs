//! Fungible token with per-account balance checkpoints.
//!
//! Balances, allowances and a single minter, plus an append-only history
//! of `(from_block, balance)` pairs per account for point-in-time lookups.
//!
//! # Checkpoint rules
//!
//! - the first balance change of an account appends a checkpoint;
//! - a change in the same block as the last checkpoint overwrites it;
//! - a change in a later block appends only if the balance differs.
//!
//! So `from_block` is strictly increasing and there is at most one entry
//! per block.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::domain::{Address, Amount, BlockHeight, CallContext, Token};
use crate::error::AmmError;
use crate::traits::Checkpointable;

/// A recorded balance, valid from `from_block` until the next checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Checkpoint {
    /// First block at which `balance` holds.
    pub from_block: BlockHeight,
    /// Balance at the end of that block.
    pub balance: Amount,
}

/// A fungible token contract with checkpointed balances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointedToken {
    token: Token,
    admin: Address,
    minter: Option<Address>,
    total_supply: Amount,
    balances: BTreeMap<Address, Amount>,
    allowances: BTreeMap<(Address, Address), Amount>,
    checkpoints: BTreeMap<Address, Vec<Checkpoint>>,
}

impl CheckpointedToken {
    /// Creates an empty token administered by `admin`, with no minter yet.
    #[must_use]
    pub fn new(token: Token, admin: Address) -> Self {
        Self {
            token,
            admin,
            minter: None,
            total_supply: Amount::ZERO,
            balances: BTreeMap::new(),
            allowances: BTreeMap::new(),
            checkpoints: BTreeMap::new(),
        }
    }

    /// The token identity.
    #[must_use]
    pub const fn token(&self) -> Token {
        self.token
    }

    /// The address allowed to mint and burn, once set.
    #[must_use]
    pub const fn minter(&self) -> Option<Address> {
        self.minter
    }

    /// Total supply.
    pub const fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Current balance of `owner`; zero for unknown accounts.
    pub fn balance_of(&self, owner: Address) -> Amount {
        self.balances.get(&owner).copied().unwrap_or_default()
    }

    /// How much `spender` may still move out of `owner`'s balance.
    pub fn allowance(&self, owner: Address, spender: Address) -> Amount {
        self.allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or_default()
    }

    /// Checkpoint history of `owner`, oldest first.
    #[must_use]
    pub fn checkpoints(&self, owner: Address) -> &[Checkpoint] {
        self.checkpoints.get(&owner).map(Vec::as_slice).unwrap_or_default()
    }

    /// Sets the minter.  Only the admin may do this, and only once.
    ///
    /// # Errors
    ///
    /// - [`AmmError::Unauthorized`] if the caller is not the admin.
    /// - [`AmmError::InvalidState`] if a minter is already set.
    pub fn set_minter(&mut self, ctx: &CallContext, minter: Address) -> Result<(), AmmError> {
        if ctx.sender() != self.admin {
            return Err(AmmError::Unauthorized("only the token admin sets the minter"));
        }
        if self.minter.is_some() {
            return Err(AmmError::InvalidState("minter already set"));
        }
        info!(token = %self.token.address(), %minter, "minter set");
        self.minter = Some(minter);
        Ok(())
    }

    /// Sets `spender`'s allowance over `owner`'s balance.
    ///
    /// Moving a non-zero allowance straight to another non-zero value is
    /// refused; reset it to zero first.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InvalidState`] on an unsafe allowance change.
    pub fn approve(&mut self, owner: Address, spender: Address, value: Amount) -> Result<(), AmmError> {
        let current = self.allowance(owner, spender);
        if !current.is_zero() && !value.is_zero() {
            return Err(AmmError::InvalidState("unsafe allowance change"));
        }
        if value.is_zero() {
            self.allowances.remove(&(owner, spender));
        } else {
            self.allowances.insert((owner, spender), value);
        }
        Ok(())
    }

    /// Moves `amount` from `from` to `to` on behalf of `operator`.
    ///
    /// # Errors
    ///
    /// - [`AmmError::InsufficientAmount`] if `amount` is zero, the balance is
    ///   too low, or the operator's allowance is too low.
    pub fn transfer(
        &mut self,
        operator: Address,
        from: Address,
        to: Address,
        amount: Amount,
        block: BlockHeight,
    ) -> Result<(), AmmError> {
        if amount.is_zero() {
            return Err(AmmError::InsufficientAmount("zero amount transfer"));
        }
        let allowance = if operator == from {
            None
        } else {
            Some(
                self.allowance(from, operator)
                    .checked_sub(&amount)
                    .ok_or(AmmError::InsufficientAmount("allowance too low"))?,
            )
        };
        let debited = self
            .balance_of(from)
            .checked_sub(&amount)
            .ok_or(AmmError::InsufficientAmount("balance too low"))?;
        let credited = if from == to {
            None
        } else {
            Some(
                self.balance_of(to)
                    .checked_add(&amount)
                    .ok_or(AmmError::Overflow("recipient balance"))?,
            )
        };

        match allowance {
            Some(left) if left.is_zero() => {
                self.allowances.remove(&(from, operator));
            }
            Some(left) => {
                self.allowances.insert((from, operator), left);
            }
            None => {}
        }
        if let Some(credited) = credited {
            self.set_balance(from, debited, block);
            self.set_balance(to, credited, block);
        }
        debug!(token = %self.token.address(), %from, %to, %amount, "transfer");
        Ok(())
    }

    /// Creates `amount` for `to`.
    ///
    /// # Errors
    ///
    /// - [`AmmError::Unauthorized`] if `operator` is not the minter.
    /// - [`AmmError::InsufficientAmount`] if `amount` is zero.
    pub fn mint(
        &mut self,
        operator: Address,
        to: Address,
        amount: Amount,
        block: BlockHeight,
    ) -> Result<(), AmmError> {
        self.ensure_minter(operator)?;
        if amount.is_zero() {
            return Err(AmmError::InsufficientAmount("zero amount mint"));
        }
        let supply = self
            .total_supply
            .checked_add(&amount)
            .ok_or(AmmError::Overflow("total supply"))?;
        let credited = self
            .balance_of(to)
            .checked_add(&amount)
            .ok_or(AmmError::Overflow("recipient balance"))?;
        self.total_supply = supply;
        self.set_balance(to, credited, block);
        Ok(())
    }

    /// Destroys `amount` held by `from`.
    ///
    /// # Errors
    ///
    /// - [`AmmError::Unauthorized`] if `operator` is not the minter.
    /// - [`AmmError::InsufficientAmount`] if `amount` is zero or exceeds the
    ///   balance.
    pub fn burn(
        &mut self,
        operator: Address,
        from: Address,
        amount: Amount,
        block: BlockHeight,
    ) -> Result<(), AmmError> {
        self.ensure_minter(operator)?;
        if amount.is_zero() {
            return Err(AmmError::InsufficientAmount("zero amount burn"));
        }
        let debited = self
            .balance_of(from)
            .checked_sub(&amount)
            .ok_or(AmmError::InsufficientAmount("burn exceeds balance"))?;
        let supply = self
            .total_supply
            .checked_sub(&amount)
            .ok_or(AmmError::Underflow("total supply"))?;
        self.total_supply = supply;
        self.set_balance(from, debited, block);
        Ok(())
    }

    fn ensure_minter(&self, operator: Address) -> Result<(), AmmError> {
        if self.minter != Some(operator) {
            return Err(AmmError::Unauthorized("only the minter can mint or burn"));
        }
        Ok(())
    }

    fn set_balance(&mut self, owner: Address, balance: Amount, block: BlockHeight) {
        self.balances.insert(owner, balance);
        self.write_checkpoint(owner, balance, block);
    }

    fn write_checkpoint(&mut self, owner: Address, balance: Amount, block: BlockHeight) {
        let history = self.checkpoints.entry(owner).or_default();
        match history.last_mut() {
            Some(last) if last.from_block == block => last.balance = balance,
            Some(last) if last.balance == balance => {}
            _ => history.push(Checkpoint {
                from_block: block,
                balance,
            }),
        }
    }
}

impl Checkpointable for CheckpointedToken {
    fn prior_balance(
        &self,
        owner: Address,
        block: BlockHeight,
        current: BlockHeight,
    ) -> Result<Amount, AmmError> {
        if block >= current {
            return Err(AmmError::InvalidState("block is not yet finalised"));
        }
        let history = self.checkpoints(owner);
        let (Some(first), Some(last)) = (history.first(), history.last()) else {
            return Ok(Amount::ZERO);
        };
        if last.from_block <= block {
            return Ok(last.balance);
        }
        if first.from_block > block {
            return Ok(Amount::ZERO);
        }
        // last entry with from_block <= block
        let idx = history.partition_point(|cp| cp.from_block <= block);
        Ok(history
            .get(idx.saturating_sub(1))
            .map_or(Amount::ZERO, |cp| cp.balance))
    }

    fn checkpoint_count(&self, owner: Address) -> usize {
        self.checkpoints(owner).len()
    }
}
