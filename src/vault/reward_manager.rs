//! Emission schedule feeding backing tokens into the vault.
//!
//! The manager holds a stock of backing tokens and streams them to the
//! vault at `reward_rate` per block until `period_finish`.  Nothing is
//! pushed on its own: the vault pulls the accrued amount with
//! [`RewardManager::send_reward`] before every share price lookup, so each
//! buy or sell sees the freshest backing balance.
//!
//! The manager tracks its own stock in `balance`.  When tokens arrive
//! outside [`RewardManager::add_reward`], anyone can resynchronise it with
//! the [`request_balance_update`](RewardManager::request_balance_update) /
//! [`settle_balance_update`](RewardManager::settle_balance_update) pair.

use tracing::{debug, info};

use crate::access::AccessControl;
use crate::callback::{BalanceAnswer, BalanceQuery, PendingSlot};
use crate::config::RewardManagerConfig;
use crate::domain::{Address, Amount, BlockHeight, CallContext};
use crate::error::AmmError;
use crate::math::CheckedArithmetic;
use crate::traits::{Administrable, FromConfig, LedgerOp, Pausable, TokenLedger};

/// Streams backing tokens to one vault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardManager {
    address: Address,
    vault: Address,
    backing_token: Address,
    access: AccessControl,
    balance: Amount,
    reward_rate: Amount,
    last_update: BlockHeight,
    period_finish: BlockHeight,
    answer_timeout: u64,
    pending: PendingSlot<()>,
}

impl RewardManager {
    /// Address of the manager.
    #[must_use]
    pub const fn address(&self) -> Address {
        self.address
    }

    /// The vault rewards are streamed to.
    #[must_use]
    pub const fn vault(&self) -> Address {
        self.vault
    }

    /// Backing tokens the manager believes it holds.
    #[must_use]
    pub const fn balance(&self) -> Amount {
        self.balance
    }

    /// Backing tokens released per block.
    #[must_use]
    pub const fn reward_rate(&self) -> Amount {
        self.reward_rate
    }

    /// Block of the last payout.
    #[must_use]
    pub const fn last_update(&self) -> BlockHeight {
        self.last_update
    }

    /// Last block that still earns rewards.
    #[must_use]
    pub const fn period_finish(&self) -> BlockHeight {
        self.period_finish
    }

    /// Amount [`send_reward`](Self::send_reward) would pay at `now`.
    ///
    /// Blocks after `period_finish` earn nothing.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::Overflow`] if the accrual overflows.
    pub fn accrued(&self, now: BlockHeight) -> Result<Amount, AmmError> {
        let end = now.min(self.period_finish);
        let blocks = end.blocks_since(self.last_update).unwrap_or(0);
        self.reward_rate.safe_mul(&Amount::new(u128::from(blocks)))
    }

    /// Pays the accrued rewards to the vault.  Only the vault may call.
    ///
    /// # Errors
    ///
    /// - [`AmmError::Unauthorized`] if the caller is not the vault.
    /// - [`AmmError::Underflow`] if the tracked balance cannot cover the
    ///   payout.
    /// - Ledger errors if the manager holds too few tokens.
    pub fn send_reward<L: TokenLedger>(
        &mut self,
        ctx: &CallContext,
        ledger: &mut L,
    ) -> Result<Amount, AmmError> {
        if ctx.sender() != self.vault {
            return Err(AmmError::Unauthorized("only the vault can pull rewards"));
        }
        self.flush(ctx, ledger)
    }

    /// Starts a new emission of `rate` per block for `blocks` blocks,
    /// after paying out what the old one accrued.  Admin only.
    ///
    /// # Errors
    ///
    /// - [`AmmError::Unauthorized`] if the caller is not the admin.
    /// - [`AmmError::InvalidConfiguration`] if `rate` is zero.
    /// - [`AmmError::InsufficientAmount`] if the balance cannot fund the
    ///   whole emission.
    pub fn change_parameters<L: TokenLedger>(
        &mut self,
        ctx: &CallContext,
        ledger: &mut L,
        rate: Amount,
        blocks: u64,
    ) -> Result<(), AmmError> {
        self.access.ensure_admin(ctx)?;
        if rate.is_zero() {
            return Err(AmmError::InvalidConfiguration("reward rate must be positive"));
        }
        let needed = rate.safe_mul(&Amount::new(u128::from(blocks)))?;
        if self.balance < needed {
            return Err(AmmError::InsufficientAmount("balance cannot fund the emission"));
        }
        let period_finish = ctx
            .block()
            .checked_add(blocks)
            .ok_or(AmmError::Overflow("period finish"))?;
        self.flush(ctx, ledger)?;
        self.reward_rate = rate;
        self.period_finish = period_finish;
        info!(manager = %self.address, %rate, %period_finish, "emission parameters changed");
        Ok(())
    }

    /// Books a top-up of `reward` per block over `blocks` blocks.  Admin
    /// only; the tokens are expected to arrive separately.
    ///
    /// # Errors
    ///
    /// - [`AmmError::Unauthorized`] if the caller is not the admin.
    /// - [`AmmError::Overflow`] if the balance overflows.
    pub fn add_reward(&mut self, ctx: &CallContext, blocks: u64, reward: Amount) -> Result<(), AmmError> {
        self.access.ensure_admin(ctx)?;
        let top_up = reward.safe_mul(&Amount::new(u128::from(blocks)))?;
        self.balance = self.balance.safe_add(&top_up)?;
        info!(manager = %self.address, %top_up, balance = %self.balance, "reward booked");
        Ok(())
    }

    /// Sends `amount` of `token` held by the manager to `recipient`.
    /// Admin only.
    ///
    /// Backing tokens can be taken only from the part of the stock the
    /// current emission does not still owe the vault.
    ///
    /// # Errors
    ///
    /// - [`AmmError::Unauthorized`] if the caller is not the admin.
    /// - [`AmmError::InsufficientAmount`] if recovering backing tokens would
    ///   leave less than `reward_rate * (period_finish - last_update)`.
    /// - Ledger errors if the manager holds too few tokens.
    pub fn recover_excess_token<L: TokenLedger>(
        &mut self,
        ctx: &CallContext,
        ledger: &mut L,
        token: Address,
        recipient: Address,
        amount: Amount,
    ) -> Result<(), AmmError> {
        self.access.ensure_admin(ctx)?;
        let balance = if token == self.backing_token {
            let owed_blocks = self.period_finish.blocks_since(self.last_update).unwrap_or(0);
            let owed = self.reward_rate.safe_mul(&Amount::new(u128::from(owed_blocks)))?;
            let left = self
                .balance
                .checked_sub(&amount)
                .ok_or(AmmError::InsufficientAmount("recovery exceeds the tracked balance"))?;
            if left < owed {
                return Err(AmmError::InsufficientAmount("recovery would underfund the emission"));
            }
            left
        } else {
            self.balance
        };
        let op = LedgerOp::Transfer {
            token,
            from: self.address,
            to: recipient,
            amount,
        };
        ledger.execute(self.address, &[op], ctx.block())?;
        self.balance = balance;
        info!(manager = %self.address, %token, %amount, %recipient, "excess token recovered");
        Ok(())
    }

    /// Asks the backing token for the manager's real balance.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::Locked`] while an earlier request is live.
    pub fn request_balance_update(&mut self, ctx: &CallContext) -> Result<BalanceQuery, AmmError> {
        let request_id = self.pending.begin((), ctx.block(), self.answer_timeout)?;
        debug!(manager = %self.address, %request_id, "balance requested");
        Ok(BalanceQuery {
            request_id,
            requester: self.address,
            token: self.backing_token,
            holder: self.address,
        })
    }

    /// Overwrites the tracked balance with the token's answer.
    ///
    /// # Errors
    ///
    /// - [`AmmError::Unauthorized`] if the answer is not from the backing
    ///   token.
    /// - [`AmmError::InvalidState`] if it does not match a live request.
    pub fn settle_balance_update(&mut self, ctx: &CallContext, answer: BalanceAnswer) -> Result<(), AmmError> {
        if answer.source != self.backing_token {
            return Err(AmmError::Unauthorized("balance answer is not from the backing token"));
        }
        self.pending.peek(answer.request_id, ctx.block())?;
        self.pending.complete(answer.request_id);
        self.balance = answer.balance;
        info!(manager = %self.address, balance = %self.balance, "balance refreshed");
        Ok(())
    }

    fn flush<L: TokenLedger>(&mut self, ctx: &CallContext, ledger: &mut L) -> Result<Amount, AmmError> {
        let reward = self.accrued(ctx.block())?;
        if !reward.is_zero() {
            let balance = self
                .balance
                .checked_sub(&reward)
                .ok_or(AmmError::Underflow("reward manager balance"))?;
            let op = LedgerOp::Transfer {
                token: self.backing_token,
                from: self.address,
                to: self.vault,
                amount: reward,
            };
            ledger.execute(self.address, &[op], ctx.block())?;
            self.balance = balance;
            debug!(manager = %self.address, %reward, "reward sent to vault");
        }
        self.last_update = self.last_update.max(ctx.block());
        Ok(reward)
    }
}

impl FromConfig<RewardManagerConfig> for RewardManager {
    fn from_config(config: &RewardManagerConfig) -> Result<Self, AmmError> {
        config.validate()?;
        Ok(Self {
            address: config.manager(),
            vault: config.vault(),
            backing_token: config.backing_token(),
            access: AccessControl::new(config.admin()),
            balance: Amount::ZERO,
            reward_rate: Amount::ZERO,
            last_update: BlockHeight::ZERO,
            period_finish: BlockHeight::ZERO,
            answer_timeout: config.answer_timeout(),
            pending: PendingSlot::new(),
        })
    }
}

impl Administrable for RewardManager {
    fn access(&self) -> &AccessControl {
        &self.access
    }

    fn access_mut(&mut self) -> &mut AccessControl {
        &mut self.access
    }
}

impl Pausable for RewardManager {}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{Decimals, Token};
    use crate::token::InMemoryLedger;

    const MANAGER: u8 = 1;
    const ADMIN: u8 = 2;
    const VAULT: u8 = 3;
    const BACKING: u8 = 10;
    const ISSUER: u8 = 250;

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 32])
    }

    fn ctx(sender: u8, block: u64) -> CallContext {
        CallContext::new(addr(sender), BlockHeight::new(block))
    }

    fn setup(stock: u128) -> (RewardManager, InMemoryLedger) {
        let Ok(cfg) = RewardManagerConfig::new(addr(MANAGER), addr(ADMIN), addr(VAULT), addr(BACKING)) else {
            panic!("valid config");
        };
        let Ok(manager) = RewardManager::from_config(&cfg) else {
            panic!("manager");
        };
        let mut ledger = InMemoryLedger::new();
        let Ok(()) = ledger.create_token(Token::new(addr(BACKING), Decimals::MAX), addr(ISSUER)) else {
            panic!("token");
        };
        let mint = LedgerOp::Mint {
            token: addr(BACKING),
            to: addr(MANAGER),
            amount: Amount::new(stock),
        };
        let Ok(()) = ledger.execute(addr(ISSUER), &[mint], BlockHeight::ZERO) else {
            panic!("funding");
        };
        (manager, ledger)
    }

    fn funded(stock: u128) -> (RewardManager, InMemoryLedger) {
        let (mut manager, ledger) = setup(stock);
        let Ok(()) = manager.add_reward(&ctx(ADMIN, 1), 1, Amount::new(stock)) else {
            panic!("booked");
        };
        (manager, ledger)
    }

    // -- emission -----------------------------------------------------------

    #[test]
    fn payout_is_capped_at_period_finish() {
        let (mut manager, mut ledger) = funded(10_000);
        let Ok(()) = manager.change_parameters(&ctx(ADMIN, 100), &mut ledger, Amount::new(10), 100) else {
            panic!("parameters");
        };
        assert_eq!(manager.send_reward(&ctx(VAULT, 150), &mut ledger), Ok(Amount::new(500)));
        // only blocks 150..=200 count
        assert_eq!(manager.send_reward(&ctx(VAULT, 400), &mut ledger), Ok(Amount::new(500)));
        assert_eq!(manager.send_reward(&ctx(VAULT, 500), &mut ledger), Ok(Amount::ZERO));
        assert_eq!(ledger.balance_of(addr(BACKING), addr(VAULT)), Ok(Amount::new(1_000)));
        assert_eq!(manager.balance(), Amount::new(9_000));
    }

    #[test]
    fn only_the_vault_pulls() {
        let (mut manager, mut ledger) = funded(10_000);
        assert!(matches!(
            manager.send_reward(&ctx(ADMIN, 5), &mut ledger),
            Err(AmmError::Unauthorized(_))
        ));
    }

    #[test]
    fn parameters_require_rate_and_funding() {
        let (mut manager, mut ledger) = funded(1_000);
        assert!(matches!(
            manager.change_parameters(&ctx(VAULT, 10), &mut ledger, Amount::new(1), 10),
            Err(AmmError::Unauthorized(_))
        ));
        assert!(matches!(
            manager.change_parameters(&ctx(ADMIN, 10), &mut ledger, Amount::ZERO, 10),
            Err(AmmError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            manager.change_parameters(&ctx(ADMIN, 10), &mut ledger, Amount::new(11), 100),
            Err(AmmError::InsufficientAmount(_))
        ));
        assert!(manager.change_parameters(&ctx(ADMIN, 10), &mut ledger, Amount::new(10), 100).is_ok());
    }

    #[test]
    fn changing_parameters_flushes_the_old_rate() {
        let (mut manager, mut ledger) = funded(10_000);
        let Ok(()) = manager.change_parameters(&ctx(ADMIN, 100), &mut ledger, Amount::new(10), 100) else {
            panic!("first");
        };
        let Ok(()) = manager.change_parameters(&ctx(ADMIN, 150), &mut ledger, Amount::new(5), 100) else {
            panic!("second");
        };
        assert_eq!(ledger.balance_of(addr(BACKING), addr(VAULT)), Ok(Amount::new(500)));
        assert_eq!(manager.accrued(BlockHeight::new(160)), Ok(Amount::new(50)));
    }

    // -- recovery -----------------------------------------------------------

    #[test]
    fn recovery_keeps_the_remaining_emission_funded() {
        let (mut manager, mut ledger) = funded(10_000);
        let Ok(()) = manager.change_parameters(&ctx(ADMIN, 100), &mut ledger, Amount::new(10), 100) else {
            panic!("parameters");
        };
        assert!(matches!(
            manager.recover_excess_token(&ctx(VAULT, 100), &mut ledger, addr(BACKING), addr(ADMIN), Amount::new(1)),
            Err(AmmError::Unauthorized(_))
        ));
        // 1_000 is still owed to the vault
        assert!(matches!(
            manager.recover_excess_token(&ctx(ADMIN, 100), &mut ledger, addr(BACKING), addr(ADMIN), Amount::new(9_001)),
            Err(AmmError::InsufficientAmount(_))
        ));
        assert!(matches!(
            manager.recover_excess_token(&ctx(ADMIN, 100), &mut ledger, addr(BACKING), addr(ADMIN), Amount::new(10_001)),
            Err(AmmError::InsufficientAmount(_))
        ));
        assert_eq!(manager.balance(), Amount::new(10_000));

        assert!(manager
            .recover_excess_token(&ctx(ADMIN, 100), &mut ledger, addr(BACKING), addr(ADMIN), Amount::new(9_000))
            .is_ok());
        assert_eq!(manager.balance(), Amount::new(1_000));
        assert_eq!(ledger.balance_of(addr(BACKING), addr(ADMIN)), Ok(Amount::new(9_000)));
        assert_eq!(manager.send_reward(&ctx(VAULT, 200), &mut ledger), Ok(Amount::new(1_000)));
        assert_eq!(manager.balance(), Amount::ZERO);
    }

    #[test]
    fn foreign_tokens_are_recovered_without_touching_the_stock() {
        const STRAY: u8 = 11;
        let (mut manager, mut ledger) = funded(10_000);
        let Ok(()) = manager.change_parameters(&ctx(ADMIN, 100), &mut ledger, Amount::new(100), 100) else {
            panic!("parameters");
        };
        let Ok(()) = ledger.create_token(Token::new(addr(STRAY), Decimals::MAX), addr(ISSUER)) else {
            panic!("token");
        };
        let mint = LedgerOp::Mint {
            token: addr(STRAY),
            to: addr(MANAGER),
            amount: Amount::new(42),
        };
        let Ok(()) = ledger.execute(addr(ISSUER), &[mint], BlockHeight::ZERO) else {
            panic!("stray funding");
        };

        assert!(manager
            .recover_excess_token(&ctx(ADMIN, 101), &mut ledger, addr(STRAY), addr(ADMIN), Amount::new(42))
            .is_ok());
        assert_eq!(ledger.balance_of(addr(STRAY), addr(ADMIN)), Ok(Amount::new(42)));
        assert_eq!(ledger.balance_of(addr(STRAY), addr(MANAGER)), Ok(Amount::ZERO));
        assert_eq!(manager.balance(), Amount::new(10_000));
    }

    // -- balance refresh ----------------------------------------------------

    #[test]
    fn balance_refresh_round_trip() {
        let (mut manager, ledger) = setup(7_777);
        assert_eq!(manager.balance(), Amount::ZERO);
        let Ok(query) = manager.request_balance_update(&ctx(VAULT, 1)) else {
            panic!("request");
        };
        assert!(matches!(manager.request_balance_update(&ctx(VAULT, 1)), Err(AmmError::Locked(_))));

        let forged = BalanceAnswer {
            request_id: query.request_id,
            source: addr(VAULT),
            balance: Amount::new(1),
        };
        assert!(matches!(
            manager.settle_balance_update(&ctx(BACKING, 2), forged),
            Err(AmmError::Unauthorized(_))
        ));

        let Ok(answer) = ledger.answer_balance(&query) else {
            panic!("answer");
        };
        assert!(manager.settle_balance_update(&ctx(BACKING, 2), answer).is_ok());
        assert_eq!(manager.balance(), Amount::new(7_777));
        assert!(manager.settle_balance_update(&ctx(BACKING, 2), answer).is_err());
    }
}
