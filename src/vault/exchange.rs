//! Single-sided share vault over one backing token.
//!
//! Shares are priced against the vault's real backing balance, which grows
//! with rewards streamed in by the [`RewardManager`].  The balance is not
//! tracked locally but read through an asynchronous balance query, so a
//! buy or a sell runs in two hops:
//!
//! 1. [`Vault::buy`] / [`Vault::sell`] pull pending rewards from the
//!    manager, park the order and return a [`BalanceQuery`] for the backing
//!    token.  The vault is locked until the answer arrives.
//! 2. [`Vault::settle`] receives the [`BalanceAnswer`] and mints or burns
//!    shares against it.
//!
//! ```text
//! buy:  minted = amount                        (no shares outstanding)
//!       minted = amount * supply / balance     (otherwise)
//! sell: paid   = shares * balance / supply
//! ```

use tracing::{debug, info};

use super::RewardManager;
use crate::access::AccessControl;
use crate::callback::{BalanceAnswer, BalanceQuery, PendingSlot};
use crate::config::VaultConfig;
use crate::domain::{Address, Amount, BlockHeight, CallContext};
use crate::error::AmmError;
use crate::math::{mul_div, CheckedArithmetic};
use crate::traits::{Administrable, FromConfig, LedgerOp, Pausable, TokenLedger};

/// An order waiting for the backing balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultOrder {
    /// Deposit backing tokens for shares.
    Buy {
        /// Account paying the backing tokens.
        sender: Address,
        /// Backing tokens deposited.
        amount: Amount,
        /// Fewest shares accepted.
        min_shares: Amount,
        /// Account receiving the shares.
        recipient: Address,
    },
    /// Redeem shares for backing tokens.
    Sell {
        /// Account whose shares are burned.
        sender: Address,
        /// Shares redeemed.
        shares: Amount,
        /// Fewest backing tokens accepted.
        min_out: Amount,
        /// Account receiving the backing tokens.
        recipient: Address,
    },
}

impl VaultOrder {
    const fn sender(&self) -> Address {
        match *self {
            Self::Buy { sender, .. } | Self::Sell { sender, .. } => sender,
        }
    }
}

/// Outcome of a settled order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultSettlement {
    /// Shares minted for a buy.
    Bought {
        /// Shares minted.
        minted: Amount,
    },
    /// Backing tokens paid for a sell.
    Sold {
        /// Backing tokens paid.
        paid: Amount,
    },
}

/// The share vault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vault {
    address: Address,
    backing_token: Address,
    share_token: Address,
    reward_manager: Address,
    access: AccessControl,
    total_supply: Amount,
    answer_timeout: u64,
    pending: PendingSlot<VaultOrder>,
}

impl Vault {
    /// Address of the vault.
    #[must_use]
    pub const fn address(&self) -> Address {
        self.address
    }

    /// Shares outstanding.
    #[must_use]
    pub const fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Current reward manager.
    #[must_use]
    pub const fn reward_manager(&self) -> Address {
        self.reward_manager
    }

    /// The order awaiting its balance, if still answerable at `now`.
    #[must_use]
    pub fn pending_order(&self, now: BlockHeight) -> Option<VaultOrder> {
        let id = self.pending.current_id()?;
        self.pending.peek(id, now).ok().copied()
    }

    /// Starts a deposit of `amount` backing tokens.
    ///
    /// # Errors
    ///
    /// - [`AmmError::Paused`] if the vault is paused.
    /// - [`AmmError::InsufficientAmount`] if `amount` is zero.
    /// - [`AmmError::Locked`] while another order is pending.
    /// - Errors of [`RewardManager::send_reward`].
    pub fn buy<L: TokenLedger>(
        &mut self,
        ctx: &CallContext,
        ledger: &mut L,
        manager: &mut RewardManager,
        amount: Amount,
        min_shares: Amount,
        recipient: Address,
    ) -> Result<BalanceQuery, AmmError> {
        self.access.ensure_active()?;
        if amount.is_zero() {
            return Err(AmmError::InsufficientAmount("cannot buy with zero"));
        }
        let order = VaultOrder::Buy {
            sender: ctx.sender(),
            amount,
            min_shares,
            recipient,
        };
        self.open(ctx, ledger, manager, order)
    }

    /// Starts a redemption of `shares`.  Allowed while paused.
    ///
    /// # Errors
    ///
    /// - [`AmmError::InsufficientAmount`] if `shares` is zero.
    /// - [`AmmError::Locked`] while another order is pending.
    /// - Errors of [`RewardManager::send_reward`].
    pub fn sell<L: TokenLedger>(
        &mut self,
        ctx: &CallContext,
        ledger: &mut L,
        manager: &mut RewardManager,
        shares: Amount,
        min_out: Amount,
        recipient: Address,
    ) -> Result<BalanceQuery, AmmError> {
        if shares.is_zero() {
            return Err(AmmError::InsufficientAmount("cannot sell zero shares"));
        }
        let order = VaultOrder::Sell {
            sender: ctx.sender(),
            shares,
            min_out,
            recipient,
        };
        self.open(ctx, ledger, manager, order)
    }

    /// Completes the pending order against the reported backing balance.
    ///
    /// # Errors
    ///
    /// - [`AmmError::Unauthorized`] if the answer is not from the backing
    ///   token.
    /// - [`AmmError::InvalidState`] if it does not match a live order.
    /// - [`AmmError::InsufficientAmount`] if the result is zero or below
    ///   the order minimum, or a party cannot pay.
    /// - [`AmmError::DivisionByZero`] if shares exist but the balance is
    ///   zero.
    pub fn settle<L: TokenLedger>(
        &mut self,
        ctx: &CallContext,
        ledger: &mut L,
        answer: BalanceAnswer,
    ) -> Result<VaultSettlement, AmmError> {
        if answer.source != self.backing_token {
            return Err(AmmError::Unauthorized("balance answer is not from the backing token"));
        }
        let order = *self.pending.peek(answer.request_id, ctx.block())?;
        let balance = answer.balance;

        let (ops, supply, settlement) = match order {
            VaultOrder::Buy {
                sender,
                amount,
                min_shares,
                recipient,
            } => {
                // no shares outstanding: whatever already sits in the vault
                // goes to the first depositor
                let minted = if self.total_supply.is_zero() {
                    amount
                } else if balance.is_zero() {
                    return Err(AmmError::DivisionByZero("backing balance is zero"));
                } else {
                    Amount::new(mul_div(amount.get(), self.total_supply.get(), balance.get())?)
                };
                if minted.is_zero() || minted < min_shares {
                    return Err(AmmError::InsufficientAmount("minted shares below minimum"));
                }
                let ops = [
                    LedgerOp::Transfer {
                        token: self.backing_token,
                        from: sender,
                        to: self.address,
                        amount,
                    },
                    LedgerOp::Mint {
                        token: self.share_token,
                        to: recipient,
                        amount: minted,
                    },
                ];
                (ops, self.total_supply.safe_add(&minted)?, VaultSettlement::Bought { minted })
            }
            VaultOrder::Sell {
                sender,
                shares,
                min_out,
                recipient,
            } => {
                if self.total_supply.is_zero() {
                    return Err(AmmError::InvalidState("vault has no shares outstanding"));
                }
                let paid = Amount::new(mul_div(shares.get(), balance.get(), self.total_supply.get())?);
                if paid.is_zero() || paid < min_out {
                    return Err(AmmError::InsufficientAmount("redemption below minimum"));
                }
                let ops = [
                    LedgerOp::Burn {
                        token: self.share_token,
                        from: sender,
                        amount: shares,
                    },
                    LedgerOp::Transfer {
                        token: self.backing_token,
                        from: self.address,
                        to: recipient,
                        amount: paid,
                    },
                ];
                (ops, self.total_supply.safe_sub(&shares)?, VaultSettlement::Sold { paid })
            }
        };

        ledger.execute(self.address, &ops, ctx.block())?;
        self.total_supply = supply;
        self.pending.complete(answer.request_id);
        info!(vault = %self.address, %balance, ?settlement, supply = %supply, "vault order settled");
        Ok(settlement)
    }

    /// Abandons the pending order.  Allowed for its sender and the admin.
    ///
    /// # Errors
    ///
    /// - [`AmmError::InvalidState`] if nothing is pending.
    /// - [`AmmError::Unauthorized`] for any other caller.
    pub fn cancel(&mut self, ctx: &CallContext) -> Result<VaultOrder, AmmError> {
        let id = self
            .pending
            .current_id()
            .ok_or(AmmError::InvalidState("no order is pending"))?;
        let sender = self.pending.peek(id, ctx.block()).map(VaultOrder::sender).ok();
        if sender != Some(ctx.sender()) && ctx.sender() != self.access.admin() {
            return Err(AmmError::Unauthorized("only the sender or the admin can cancel"));
        }
        self.pending
            .cancel()
            .ok_or(AmmError::InvalidState("no order is pending"))
    }

    /// Points the vault at another reward manager.  Admin only.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::Unauthorized`] if the caller is not the admin.
    pub fn change_reward_manager(&mut self, ctx: &CallContext, manager: Address) -> Result<(), AmmError> {
        self.access.ensure_admin(ctx)?;
        self.reward_manager = manager;
        info!(vault = %self.address, %manager, "reward manager changed");
        Ok(())
    }

    /// Moves tokens sent to the vault by mistake.  Never the backing token.
    ///
    /// # Errors
    ///
    /// - [`AmmError::Unauthorized`] if the caller is not the admin.
    /// - [`AmmError::InvalidToken`] for the backing token.
    pub fn recover_excess_token<L: TokenLedger>(
        &mut self,
        ctx: &CallContext,
        ledger: &mut L,
        token: Address,
        recipient: Address,
        amount: Amount,
    ) -> Result<(), AmmError> {
        self.access.ensure_admin(ctx)?;
        if token == self.backing_token {
            return Err(AmmError::InvalidToken("backing tokens cannot be recovered"));
        }
        let op = LedgerOp::Transfer {
            token,
            from: self.address,
            to: recipient,
            amount,
        };
        ledger.execute(self.address, &[op], ctx.block())
    }

    /// Flushes rewards into the vault and parks `order`.
    fn open<L: TokenLedger>(
        &mut self,
        ctx: &CallContext,
        ledger: &mut L,
        manager: &mut RewardManager,
        order: VaultOrder,
    ) -> Result<BalanceQuery, AmmError> {
        self.pending.ensure_idle(ctx.block())?;
        if manager.address() != self.reward_manager {
            return Err(AmmError::Unauthorized("not the configured reward manager"));
        }
        let as_vault = CallContext::new(self.address, ctx.block());
        let flushed = manager.send_reward(&as_vault, ledger)?;
        let request_id = self.pending.begin(order, ctx.block(), self.answer_timeout)?;
        debug!(vault = %self.address, %request_id, %flushed, "backing balance requested");
        Ok(BalanceQuery {
            request_id,
            requester: self.address,
            token: self.backing_token,
            holder: self.address,
        })
    }
}

impl FromConfig<VaultConfig> for Vault {
    fn from_config(config: &VaultConfig) -> Result<Self, AmmError> {
        config.validate()?;
        Ok(Self {
            address: config.vault(),
            backing_token: config.backing_token(),
            share_token: config.share_token(),
            reward_manager: config.reward_manager(),
            access: AccessControl::new(config.admin()),
            total_supply: Amount::ZERO,
            answer_timeout: config.answer_timeout(),
            pending: PendingSlot::new(),
        })
    }
}

impl Administrable for Vault {
    fn access(&self) -> &AccessControl {
        &self.access
    }

    fn access_mut(&mut self) -> &mut AccessControl {
        &mut self.access
    }
}

impl Pausable for Vault {}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::config::RewardManagerConfig;
    use crate::domain::{Decimals, Token};
    use crate::token::InMemoryLedger;

    const VAULT: u8 = 1;
    const MANAGER: u8 = 2;
    const ADMIN: u8 = 3;
    const BACKING: u8 = 10;
    const SHARES: u8 = 11;
    const ISSUER: u8 = 250;
    const ALICE: u8 = 20;
    const BOB: u8 = 21;

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 32])
    }

    fn ctx(sender: u8, block: u64) -> CallContext {
        CallContext::new(addr(sender), BlockHeight::new(block))
    }

    fn amount(v: u128) -> Amount {
        Amount::new(v)
    }

    fn setup() -> (Vault, RewardManager, InMemoryLedger) {
        let (Ok(vcfg), Ok(mcfg)) = (
            VaultConfig::new(addr(VAULT), addr(ADMIN), addr(BACKING), addr(SHARES), addr(MANAGER)),
            RewardManagerConfig::new(addr(MANAGER), addr(ADMIN), addr(VAULT), addr(BACKING)),
        ) else {
            panic!("valid configs");
        };
        let (Ok(vault), Ok(manager)) = (Vault::from_config(&vcfg), RewardManager::from_config(&mcfg)) else {
            panic!("components");
        };
        let mut ledger = InMemoryLedger::new();
        let (Ok(()), Ok(())) = (
            ledger.create_token(Token::new(addr(BACKING), Decimals::MAX), addr(ISSUER)),
            ledger.create_token(Token::new(addr(SHARES), Decimals::MAX), addr(VAULT)),
        ) else {
            panic!("tokens");
        };
        let mints = [
            LedgerOp::Mint { token: addr(BACKING), to: addr(ALICE), amount: amount(1_000_000) },
            LedgerOp::Mint { token: addr(BACKING), to: addr(BOB), amount: amount(1_000_000) },
            LedgerOp::Mint { token: addr(BACKING), to: addr(MANAGER), amount: amount(10_000) },
        ];
        let Ok(()) = ledger.execute(addr(ISSUER), &mints, BlockHeight::ZERO) else {
            panic!("funding");
        };
        for who in [ALICE, BOB] {
            let Ok(()) = ledger.approve(&ctx(who, 0), addr(BACKING), addr(VAULT), Amount::MAX) else {
                panic!("approve");
            };
        }
        (vault, manager, ledger)
    }

    fn buy(
        vault: &mut Vault,
        manager: &mut RewardManager,
        ledger: &mut InMemoryLedger,
        who: u8,
        value: u128,
        block: u64,
    ) -> Result<VaultSettlement, AmmError> {
        let query = vault.buy(&ctx(who, block), ledger, manager, amount(value), Amount::ZERO, addr(who))?;
        let answer = ledger.answer_balance(&query)?;
        vault.settle(&ctx(BACKING, block), ledger, answer)
    }

    // -- pricing ------------------------------------------------------------

    #[test]
    fn first_buy_is_one_to_one_then_pro_rata() {
        let (mut vault, mut manager, mut ledger) = setup();
        assert_eq!(
            buy(&mut vault, &mut manager, &mut ledger, ALICE, 1_000, 1),
            Ok(VaultSettlement::Bought { minted: amount(1_000) })
        );
        assert_eq!(
            buy(&mut vault, &mut manager, &mut ledger, BOB, 500, 2),
            Ok(VaultSettlement::Bought { minted: amount(500) })
        );
        assert_eq!(vault.total_supply(), amount(1_500));
        assert_eq!(ledger.balance_of(addr(SHARES), addr(BOB)), Ok(amount(500)));
    }

    #[test]
    fn streamed_rewards_raise_the_share_price() {
        let (mut vault, mut manager, mut ledger) = setup();
        let Ok(()) = manager.add_reward(&ctx(ADMIN, 1), 1, amount(10_000)) else {
            panic!("book");
        };
        let Ok(_) = buy(&mut vault, &mut manager, &mut ledger, ALICE, 1_000, 1) else {
            panic!("first buy");
        };
        let Ok(()) = manager.change_parameters(&ctx(ADMIN, 10), &mut ledger, amount(10), 100) else {
            panic!("emission");
        };
        // 100 blocks at 10 per block double the backing balance
        assert_eq!(
            buy(&mut vault, &mut manager, &mut ledger, BOB, 1_000, 110),
            Ok(VaultSettlement::Bought { minted: amount(500) })
        );

        let Ok(query) = vault.sell(&ctx(ALICE, 120), &mut ledger, &mut manager, amount(1_000), Amount::ZERO, addr(ALICE)) else {
            panic!("sell");
        };
        let Ok(answer) = ledger.answer_balance(&query) else {
            panic!("answer");
        };
        assert_eq!(answer.balance, amount(3_000));
        assert_eq!(
            vault.settle(&ctx(BACKING, 120), &mut ledger, answer),
            Ok(VaultSettlement::Sold { paid: amount(2_000) })
        );
        assert_eq!(vault.total_supply(), amount(500));
    }

    fn start_emission(manager: &mut RewardManager, ledger: &mut InMemoryLedger) {
        let Ok(()) = manager.add_reward(&ctx(ADMIN, 1), 1, amount(10_000)) else {
            panic!("book");
        };
        let Ok(()) = manager.change_parameters(&ctx(ADMIN, 1), ledger, amount(10), 100) else {
            panic!("emission");
        };
    }

    #[test]
    fn emission_before_first_buy_still_mints_one_to_one() {
        let (mut vault, mut manager, mut ledger) = setup();
        start_emission(&mut manager, &mut ledger);

        // 90 blocks of rewards land before the answer is read
        assert_eq!(
            buy(&mut vault, &mut manager, &mut ledger, ALICE, 1_000, 10),
            Ok(VaultSettlement::Bought { minted: amount(1_000) })
        );
        assert_eq!(ledger.balance_of(addr(BACKING), addr(VAULT)), Ok(amount(1_090)));
        assert!(vault.pending_order(BlockHeight::new(10)).is_none());

        // 1_000 * 1_000 / 1_190
        assert_eq!(
            buy(&mut vault, &mut manager, &mut ledger, BOB, 1_000, 20),
            Ok(VaultSettlement::Bought { minted: amount(840) })
        );
        assert_eq!(vault.total_supply(), amount(1_840));
    }

    #[test]
    fn buying_after_a_full_exit_restarts_at_one_to_one() {
        let (mut vault, mut manager, mut ledger) = setup();
        start_emission(&mut manager, &mut ledger);
        let Ok(_) = buy(&mut vault, &mut manager, &mut ledger, ALICE, 1_000, 1) else {
            panic!("first buy");
        };

        let Ok(query) = vault.sell(&ctx(ALICE, 20), &mut ledger, &mut manager, amount(1_000), Amount::ZERO, addr(ALICE)) else {
            panic!("sell");
        };
        let Ok(answer) = ledger.answer_balance(&query) else {
            panic!("answer");
        };
        assert_eq!(
            vault.settle(&ctx(BACKING, 20), &mut ledger, answer),
            Ok(VaultSettlement::Sold { paid: amount(1_190) })
        );
        assert_eq!(vault.total_supply(), Amount::ZERO);

        // emission keeps filling the empty vault; the next buyer takes it
        assert_eq!(
            buy(&mut vault, &mut manager, &mut ledger, BOB, 500, 30),
            Ok(VaultSettlement::Bought { minted: amount(500) })
        );
        assert_eq!(ledger.balance_of(addr(BACKING), addr(VAULT)), Ok(amount(600)));
        assert_eq!(ledger.balance_of(addr(SHARES), addr(BOB)), Ok(amount(500)));
    }

    // -- locking and answers ------------------------------------------------

    #[test]
    fn second_order_is_locked_out_until_settlement() {
        let (mut vault, mut manager, mut ledger) = setup();
        let Ok(query) = vault.buy(&ctx(ALICE, 1), &mut ledger, &mut manager, amount(100), Amount::ZERO, addr(ALICE)) else {
            panic!("buy");
        };
        assert!(matches!(
            vault.buy(&ctx(BOB, 1), &mut ledger, &mut manager, amount(100), Amount::ZERO, addr(BOB)),
            Err(AmmError::Locked(_))
        ));
        let forged = BalanceAnswer {
            request_id: query.request_id,
            source: addr(BOB),
            balance: Amount::ZERO,
        };
        assert!(matches!(
            vault.settle(&ctx(BOB, 1), &mut ledger, forged),
            Err(AmmError::Unauthorized(_))
        ));
        assert!(vault.pending_order(BlockHeight::new(1)).is_some());
        assert!(matches!(vault.cancel(&ctx(BOB, 1)), Err(AmmError::Unauthorized(_))));
        assert!(vault.cancel(&ctx(ALICE, 1)).is_ok());
        assert!(vault.pending_order(BlockHeight::new(1)).is_none());
    }

    #[test]
    fn slippage_rejection_leaves_state_untouched() {
        let (mut vault, mut manager, mut ledger) = setup();
        let Ok(query) = vault.buy(&ctx(ALICE, 1), &mut ledger, &mut manager, amount(100), amount(101), addr(ALICE)) else {
            panic!("buy");
        };
        let Ok(answer) = ledger.answer_balance(&query) else {
            panic!("answer");
        };
        assert!(matches!(
            vault.settle(&ctx(BACKING, 1), &mut ledger, answer),
            Err(AmmError::InsufficientAmount(_))
        ));
        assert_eq!(vault.total_supply(), Amount::ZERO);
        assert_eq!(ledger.balance_of(addr(BACKING), addr(ALICE)), Ok(amount(1_000_000)));
    }

    #[test]
    fn paused_vault_still_redeems() {
        let (mut vault, mut manager, mut ledger) = setup();
        let Ok(_) = buy(&mut vault, &mut manager, &mut ledger, ALICE, 1_000, 1) else {
            panic!("buy");
        };
        let Ok(()) = vault.set_paused(&ctx(ADMIN, 2), true) else {
            panic!("pause");
        };
        assert_eq!(
            vault.buy(&ctx(BOB, 2), &mut ledger, &mut manager, amount(10), Amount::ZERO, addr(BOB)),
            Err(AmmError::Paused)
        );
        assert!(vault
            .sell(&ctx(ALICE, 2), &mut ledger, &mut manager, amount(400), Amount::ZERO, addr(ALICE))
            .is_ok());
    }

    #[test]
    fn foreign_manager_rejected() {
        let (mut vault, mut manager, mut ledger) = setup();
        let Ok(()) = vault.change_reward_manager(&ctx(ADMIN, 1), addr(99)) else {
            panic!("change");
        };
        assert!(matches!(
            vault.buy(&ctx(ALICE, 1), &mut ledger, &mut manager, amount(10), Amount::ZERO, addr(ALICE)),
            Err(AmmError::Unauthorized(_))
        ));
        assert!(matches!(
            vault.recover_excess_token(&ctx(ADMIN, 1), &mut ledger, addr(BACKING), addr(ADMIN), amount(1)),
            Err(AmmError::InvalidToken(_))
        ));
    }
}
