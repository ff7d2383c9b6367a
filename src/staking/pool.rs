//! The reward engine.
//!
//! Rewards stream at `reward_rate` tokens per block until `period_finish`
//! and are split pro rata over the staked supply through a global index:
//!
//! ```text
//! reward_per_token += elapsed * rate * DECIMAL / total_supply
//! earned(user)     += balance * (reward_per_token - paid(user)) / DECIMAL
//! ```
//!
//! The index is advanced lazily on every entrypoint, so no per-block work
//! is ever done over all stakers.  Stake balances are kept multiplied by
//! [`MULTIPLIER`], independently of the [`DECIMAL`] index scale.

use std::collections::BTreeMap;

use tracing::{debug, info};

use super::account::{Account, Lot};
use crate::access::AccessControl;
use crate::config::{StakingConfig, UnstakeFeeSchedule};
use crate::domain::{Address, Amount, BlockHeight, CallContext, FeeDivisor};
use crate::error::AmmError;
use crate::math::{mul_div, CheckedArithmetic};
use crate::traits::{Administrable, FromConfig, LedgerOp, Pausable, TokenLedger};

/// Fixed-point scale of the reward index (18 decimals).
pub const DECIMAL: u128 = 1_000_000_000_000_000_000;

/// Scale applied to staked amounts (12 decimals).
pub const MULTIPLIER: u128 = 1_000_000_000_000;

/// What an unstake paid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unstaked {
    /// Tokens sent to the staker.
    pub payout: Amount,
    /// Exit fee kept by the contract.
    pub fee: Amount,
    /// Cycle the lot was in, counting from 1.
    pub cycle: u64,
}

/// Index state after a lazy update.
#[derive(Debug, Clone, Copy)]
struct IndexUpdate {
    reward_per_token: u128,
    last_update: BlockHeight,
}

/// Staking contract paying a reward token to stakers of a stake token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StakingPool {
    contract: Address,
    stake_token: Address,
    reward_token: Address,
    access: AccessControl,
    schedule: UnstakeFeeSchedule,
    total_supply: u128,
    reward_rate: u128,
    reward_per_token_stored: u128,
    period_finish: BlockHeight,
    last_update: BlockHeight,
    total_fee: Amount,
    accounts: BTreeMap<Address, Account>,
}

impl StakingPool {
    // -- views ----------------------------------------------------------------

    /// Address of the contract.
    #[must_use]
    pub const fn contract(&self) -> Address {
        self.contract
    }

    /// Scaled total stake.
    #[must_use]
    pub const fn total_supply(&self) -> u128 {
        self.total_supply
    }

    /// Reward tokens emitted per block.
    #[must_use]
    pub const fn reward_rate(&self) -> u128 {
        self.reward_rate
    }

    /// Index value at the last update.
    #[must_use]
    pub const fn reward_per_token_stored(&self) -> u128 {
        self.reward_per_token_stored
    }

    /// Last block of the current reward period.
    #[must_use]
    pub const fn period_finish(&self) -> BlockHeight {
        self.period_finish
    }

    /// Exit fees collected and not yet withdrawn.
    #[must_use]
    pub const fn total_fee(&self) -> Amount {
        self.total_fee
    }

    /// Current exit fee schedule.
    #[must_use]
    pub const fn fee_schedule(&self) -> &UnstakeFeeSchedule {
        &self.schedule
    }

    /// Scaled stake of `owner`.
    #[must_use]
    pub fn balance_of(&self, owner: Address) -> u128 {
        self.accounts.get(&owner).map_or(0, Account::balance)
    }

    /// Full account state of `owner`, if it ever staked.
    #[must_use]
    pub fn account(&self, owner: Address) -> Option<&Account> {
        self.accounts.get(&owner)
    }

    /// Open lots of `owner` by id.
    #[must_use]
    pub fn lots(&self, owner: Address) -> Vec<(u64, Lot)> {
        self.accounts
            .get(&owner)
            .map(|a| a.lots().iter().map(|(id, lot)| (*id, *lot)).collect())
            .unwrap_or_default()
    }

    /// Index value as of `now`, without storing it.
    ///
    /// # Errors
    ///
    /// - [`AmmError::InvalidState`] if `now` precedes the last update.
    /// - Arithmetic errors if the index overflows.
    pub fn reward_per_token(&self, now: BlockHeight) -> Result<u128, AmmError> {
        self.advance(now).map(|u| u.reward_per_token)
    }

    /// Rewards `owner` could claim at `now`.
    ///
    /// # Errors
    ///
    /// Same as [`reward_per_token`](Self::reward_per_token).
    pub fn earned(&self, owner: Address, now: BlockHeight) -> Result<Amount, AmmError> {
        let index = self.reward_per_token(now)?;
        self.settled(owner, index).map(|a| a.rewards)
    }

    // -- user entrypoints ------------------------------------------------------

    /// Stakes `amount` as a new lot and returns the lot id.
    ///
    /// # Errors
    ///
    /// - [`AmmError::Paused`] if the contract is paused.
    /// - [`AmmError::InvalidState`] after the reward period has ended.
    /// - [`AmmError::InsufficientAmount`] if `amount` is zero or the caller
    ///   cannot pay.
    pub fn stake<L: TokenLedger>(
        &mut self,
        ctx: &CallContext,
        ledger: &mut L,
        amount: Amount,
    ) -> Result<u64, AmmError> {
        self.access.ensure_active()?;
        if ctx.block() > self.period_finish {
            return Err(AmmError::InvalidState("staking period has finished"));
        }
        if amount.is_zero() {
            return Err(AmmError::InsufficientAmount("cannot stake zero"));
        }
        let update = self.advance(ctx.block())?;
        let mut account = self.settled(ctx.sender(), update.reward_per_token)?;
        let scaled = scale(amount)?;
        account.balance = account
            .balance
            .checked_add(scaled)
            .ok_or(AmmError::Overflow("staker balance"))?;
        let lot_id = account.open_lot(amount, ctx.block())?;
        let total_supply = self
            .total_supply
            .checked_add(scaled)
            .ok_or(AmmError::Overflow("total stake"))?;

        let pull = LedgerOp::Transfer {
            token: self.stake_token,
            from: ctx.sender(),
            to: self.contract,
            amount,
        };
        ledger.execute(self.contract, &[pull], ctx.block())?;

        self.commit_index(update);
        self.accounts.insert(ctx.sender(), account);
        self.total_supply = total_supply;
        info!(staker = %ctx.sender(), %amount, lot_id, "staked");
        Ok(lot_id)
    }

    /// Withdraws `amount` from lot `lot_id`, minus the exit fee of the
    /// cycle the lot is in.
    ///
    /// # Errors
    ///
    /// - [`AmmError::LotNotFound`] if the caller has no such lot.
    /// - [`AmmError::InsufficientAmount`] if `amount` is zero or exceeds
    ///   the lot.
    pub fn unstake<L: TokenLedger>(
        &mut self,
        ctx: &CallContext,
        ledger: &mut L,
        lot_id: u64,
        amount: Amount,
    ) -> Result<Unstaked, AmmError> {
        if amount.is_zero() {
            return Err(AmmError::InsufficientAmount("cannot unstake zero"));
        }
        if !self.accounts.contains_key(&ctx.sender()) {
            return Err(AmmError::LotNotFound(lot_id));
        }
        let update = self.advance(ctx.block())?;
        let mut account = self.settled(ctx.sender(), update.reward_per_token)?;
        let lot = account.draw_lot(lot_id, amount)?;
        let scaled = scale(amount)?;
        account.balance = account
            .balance
            .checked_sub(scaled)
            .ok_or(AmmError::Underflow("staker balance"))?;
        let total_supply = self
            .total_supply
            .checked_sub(scaled)
            .ok_or(AmmError::Underflow("total stake"))?;

        let held = ctx
            .block()
            .blocks_since(lot.deposit_block)
            .ok_or(AmmError::InvalidState("lot is from a future block"))?;
        let cycle = self.schedule.cycles(held);
        let fee = self.schedule.divisor_for(cycle).apply(amount);
        let payout = amount.safe_sub(&fee)?;
        let total_fee = self.total_fee.safe_add(&fee)?;
        debug!(lot_id, held, cycle, %fee, "exit fee computed");

        let push = LedgerOp::Transfer {
            token: self.stake_token,
            from: self.contract,
            to: ctx.sender(),
            amount: payout,
        };
        ledger.execute(self.contract, &[push], ctx.block())?;

        self.commit_index(update);
        self.accounts.insert(ctx.sender(), account);
        self.total_supply = total_supply;
        self.total_fee = total_fee;
        info!(staker = %ctx.sender(), lot_id, %payout, %fee, "unstaked");
        Ok(Unstaked { payout, fee, cycle })
    }

    /// Pays out everything the caller has earned.
    ///
    /// Returns the amount paid, zero if nothing was due.
    ///
    /// # Errors
    ///
    /// - [`AmmError::InvalidState`] if the caller never staked.
    /// - Ledger errors if the contract holds too few reward tokens.
    pub fn get_reward<L: TokenLedger>(
        &mut self,
        ctx: &CallContext,
        ledger: &mut L,
    ) -> Result<Amount, AmmError> {
        if !self.accounts.contains_key(&ctx.sender()) {
            return Err(AmmError::InvalidState("caller has never staked"));
        }
        let update = self.advance(ctx.block())?;
        let mut account = self.settled(ctx.sender(), update.reward_per_token)?;
        let reward = account.rewards;
        if !reward.is_zero() {
            account.rewards = Amount::ZERO;
            let pay = LedgerOp::Transfer {
                token: self.reward_token,
                from: self.contract,
                to: ctx.sender(),
                amount: reward,
            };
            ledger.execute(self.contract, &[pay], ctx.block())?;
        }
        self.commit_index(update);
        self.accounts.insert(ctx.sender(), account);
        info!(staker = %ctx.sender(), %reward, "reward claimed");
        Ok(reward)
    }

    // -- admin entrypoints -----------------------------------------------------

    /// Starts or extends a reward period of `blocks` blocks distributing
    /// `reward` plus whatever the running period had left.
    ///
    /// The contract must hold enough reward tokens to pay out.
    ///
    /// # Errors
    ///
    /// - [`AmmError::Unauthorized`] if the caller is not the admin.
    /// - [`AmmError::DivisionByZero`] if `blocks` is zero.
    pub fn add_reward(&mut self, ctx: &CallContext, reward: Amount, blocks: u64) -> Result<(), AmmError> {
        self.access.ensure_admin(ctx)?;
        if blocks == 0 {
            return Err(AmmError::DivisionByZero("reward period length"));
        }
        let now = ctx.block();
        let update = self.advance(now)?;
        let budget = if now >= self.period_finish {
            reward.get()
        } else {
            let remaining = u128::from(self.period_finish.get() - now.get());
            remaining
                .checked_mul(self.reward_rate)
                .and_then(|left| left.checked_add(reward.get()))
                .ok_or(AmmError::Overflow("reward budget"))?
        };
        let period_finish = now
            .checked_add(blocks)
            .ok_or(AmmError::Overflow("period finish"))?;

        self.reward_per_token_stored = update.reward_per_token;
        self.reward_rate = budget / u128::from(blocks);
        self.last_update = now;
        self.period_finish = period_finish;
        info!(rate = self.reward_rate, %period_finish, "reward period set");
        Ok(())
    }

    /// Sets the divisor of one tier and replaces cycle length and default.
    ///
    /// # Errors
    ///
    /// - [`AmmError::Unauthorized`] if the caller is not the admin.
    /// - [`AmmError::InvalidConfiguration`] if `blocks_per_cycle` is zero.
    pub fn change_unstake_fee(
        &mut self,
        ctx: &CallContext,
        cycle: u64,
        divisor: FeeDivisor,
        blocks_per_cycle: u64,
        default_fee: FeeDivisor,
    ) -> Result<(), AmmError> {
        self.access.ensure_admin(ctx)?;
        self.schedule.update(cycle, divisor, blocks_per_cycle, default_fee)?;
        info!(cycle, %divisor, blocks_per_cycle, %default_fee, "unstake fee changed");
        Ok(())
    }

    /// Sends all collected exit fees to `recipient`.
    ///
    /// # Errors
    ///
    /// - [`AmmError::Unauthorized`] if the caller is not the admin.
    /// - [`AmmError::InsufficientAmount`] if no fee has been collected.
    pub fn withdraw_fees<L: TokenLedger>(
        &mut self,
        ctx: &CallContext,
        ledger: &mut L,
        recipient: Address,
    ) -> Result<Amount, AmmError> {
        self.access.ensure_admin(ctx)?;
        if self.total_fee.is_zero() {
            return Err(AmmError::InsufficientAmount("no fees collected"));
        }
        let op = LedgerOp::Transfer {
            token: self.stake_token,
            from: self.contract,
            to: recipient,
            amount: self.total_fee,
        };
        ledger.execute(self.contract, &[op], ctx.block())?;
        let paid = self.total_fee;
        self.total_fee = Amount::ZERO;
        info!(%recipient, %paid, "exit fees withdrawn");
        Ok(paid)
    }

    /// Moves tokens sent to the contract by mistake.  Never the stake token.
    ///
    /// # Errors
    ///
    /// - [`AmmError::Unauthorized`] if the caller is not the admin.
    /// - [`AmmError::InvalidToken`] for the stake token.
    pub fn recover_excess_token<L: TokenLedger>(
        &mut self,
        ctx: &CallContext,
        ledger: &mut L,
        token: Address,
        recipient: Address,
        amount: Amount,
    ) -> Result<(), AmmError> {
        self.access.ensure_admin(ctx)?;
        if token == self.stake_token {
            return Err(AmmError::InvalidToken("staked tokens cannot be recovered"));
        }
        let op = LedgerOp::Transfer {
            token,
            from: self.contract,
            to: recipient,
            amount,
        };
        ledger.execute(self.contract, &[op], ctx.block())?;
        info!(%token, %recipient, %amount, "excess token recovered");
        Ok(())
    }

    // -- internals -------------------------------------------------------------

    fn advance(&self, now: BlockHeight) -> Result<IndexUpdate, AmmError> {
        let applicable = now.min(self.period_finish);
        let elapsed = applicable
            .blocks_since(self.last_update)
            .ok_or(AmmError::InvalidState("block height went backwards"))?;
        let mut reward_per_token = self.reward_per_token_stored;
        if self.total_supply != 0 && elapsed != 0 {
            let emitted = u128::from(elapsed)
                .checked_mul(self.reward_rate)
                .ok_or(AmmError::Overflow("emitted reward"))?;
            let delta = mul_div(emitted, DECIMAL, self.total_supply)?;
            reward_per_token = reward_per_token
                .checked_add(delta)
                .ok_or(AmmError::Overflow("reward per token"))?;
        }
        Ok(IndexUpdate {
            reward_per_token,
            last_update: applicable,
        })
    }

    /// `owner`'s account with rewards settled up to `index`.
    fn settled(&self, owner: Address, index: u128) -> Result<Account, AmmError> {
        let mut account = self.accounts.get(&owner).cloned().unwrap_or_default();
        let pending = index
            .checked_sub(account.reward_per_token_paid)
            .ok_or(AmmError::Underflow("reward index"))?;
        let accrued = mul_div(account.balance, pending, DECIMAL)?;
        account.rewards = account.rewards.safe_add(&Amount::new(accrued))?;
        account.reward_per_token_paid = index;
        Ok(account)
    }

    fn commit_index(&mut self, update: IndexUpdate) {
        self.reward_per_token_stored = update.reward_per_token;
        self.last_update = update.last_update;
    }
}

fn scale(amount: Amount) -> Result<u128, AmmError> {
    amount
        .get()
        .checked_mul(MULTIPLIER)
        .ok_or(AmmError::Overflow("scaled stake"))
}

impl FromConfig<StakingConfig> for StakingPool {
    /// Creates a contract with no reward period; staking opens with the
    /// first [`add_reward`](StakingPool::add_reward).
    fn from_config(config: &StakingConfig) -> Result<Self, AmmError> {
        config.validate()?;
        Ok(Self {
            contract: config.contract(),
            stake_token: config.stake_token(),
            reward_token: config.reward_token(),
            access: AccessControl::new(config.admin()),
            schedule: config.fee_schedule().clone(),
            total_supply: 0,
            reward_rate: 0,
            reward_per_token_stored: 0,
            period_finish: BlockHeight::ZERO,
            last_update: BlockHeight::ZERO,
            total_fee: Amount::ZERO,
            accounts: BTreeMap::new(),
        })
    }
}

impl Administrable for StakingPool {
    fn access(&self) -> &AccessControl {
        &self.access
    }

    fn access_mut(&mut self) -> &mut AccessControl {
        &mut self.access
    }
}

impl Pausable for StakingPool {}
