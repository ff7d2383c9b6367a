//! Flat-curve pool for assets expected to trade near a moving target rate.
//!
//! Pricing needs the current rate target, which lives in an external
//! oracle.  A swap therefore runs in two phases:
//!
//! 1. [`StableSwapPool::request_swap`] saves the order and returns a
//!    [`RateQuery`] for the oracle.  The pool is now locked: liquidity
//!    changes and further swaps fail with [`AmmError::Locked`].
//! 2. [`StableSwapPool::settle_swap`] receives the [`RateAnswer`], prices
//!    the trade with the flat-curve solver and moves the tokens.
//!
//! A request that is not answered within the configured timeout stops
//! blocking the pool; its answer is then rejected.  The requester or the
//! admin may also abandon it with [`StableSwapPool::cancel_swap`].

use tracing::{debug, info};

use super::liquidity::{deposit_ops, withdrawal_ops, ReserveBook};
use crate::access::AccessControl;
use crate::callback::{PendingSlot, RateAnswer, RateQuery, RequestId};
use crate::config::{validate_fee_divisor, StableSwapConfig};
use crate::domain::{
    Address, Amount, BlockHeight, CallContext, Deposit, FeeDivisor, Shares, Side, SwapOrder, SwapResult,
    TokenPair, Withdrawal,
};
use crate::error::AmmError;
use crate::math::flat_curve::{trade_dx_to_dy, trade_dy_to_dx};
use crate::math::CheckedArithmetic;
use crate::traits::{Administrable, FromConfig, LedgerOp, LiquidityPool, Pausable, TokenLedger};

/// A swap waiting for its rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingSwap {
    /// Account the input is pulled from at settlement.
    pub trader: Address,
    /// Side being sold.
    pub side_in: Side,
    /// The order as submitted.
    pub order: SwapOrder,
}

/// A stable-asset pool priced by the flat-curve solver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StableSwapPool {
    address: Address,
    share_token: Address,
    oracle: Address,
    token_pair: TokenPair,
    access: AccessControl,
    precision_a: u128,
    precision_b: u128,
    lp_fee: FeeDivisor,
    newton_rounds: u32,
    answer_timeout: u64,
    book: ReserveBook,
    pending: PendingSlot<PendingSwap>,
}

impl StableSwapPool {
    /// Rate source whose answers are accepted.
    #[must_use]
    pub const fn oracle(&self) -> Address {
        self.oracle
    }

    /// LP fee divisor applied to the solver output.
    #[must_use]
    pub const fn lp_fee(&self) -> FeeDivisor {
        self.lp_fee
    }

    /// `(precision_a, precision_b)` multipliers.
    #[must_use]
    pub const fn precision_multipliers(&self) -> (u128, u128) {
        (self.precision_a, self.precision_b)
    }

    /// The swap awaiting its rate, if any and still answerable at `now`.
    #[must_use]
    pub fn pending_swap(&self, now: BlockHeight) -> Option<(RequestId, PendingSwap)> {
        let id = self.pending.current_id()?;
        self.pending.peek(id, now).ok().map(|swap| (id, *swap))
    }

    /// Records a swap and asks the oracle for the current rate target.
    ///
    /// No tokens move until [`settle_swap`](Self::settle_swap).
    ///
    /// # Errors
    ///
    /// - [`AmmError::Paused`] if the pool is paused.
    /// - [`AmmError::Locked`] if another swap is pending.
    /// - [`AmmError::InvalidToken`] if `token_out` is not a pool asset.
    /// - [`AmmError::InsufficientAmount`] if `amount_in` is zero.
    /// - [`AmmError::InvalidState`] if the pool has no liquidity.
    pub fn request_swap(&mut self, ctx: &CallContext, order: SwapOrder) -> Result<RateQuery, AmmError> {
        self.access.ensure_active()?;
        self.pending.ensure_idle(ctx.block())?;
        if order.amount_in.is_zero() {
            return Err(AmmError::InsufficientAmount("zero swap amount"));
        }
        if self.book.is_empty() {
            return Err(AmmError::InvalidState("pool has no liquidity"));
        }
        let side_out = self
            .token_pair
            .side_of(order.token_out)
            .ok_or(AmmError::InvalidToken("requested output is not a pool asset"))?;

        let request_id = self.pending.begin(
            PendingSwap {
                trader: ctx.sender(),
                side_in: side_out.opposite(),
                order,
            },
            ctx.block(),
            self.answer_timeout,
        )?;
        debug!(pool = %self.address, %request_id, "rate requested");
        Ok(RateQuery {
            request_id,
            requester: self.address,
            oracle: self.oracle,
        })
    }

    /// Completes the pending swap with the oracle's answer.
    ///
    /// The output is `gross - gross / lp_fee`, where `gross` is the
    /// flat-curve solution; the fee stays in the pool.
    ///
    /// # Errors
    ///
    /// - [`AmmError::Unauthorized`] if the answer is not from the oracle.
    /// - [`AmmError::InvalidState`] if the answer does not match a live
    ///   request.
    /// - [`AmmError::InsufficientAmount`] if the fee rounds to zero, the
    ///   output is below the order minimum or not below the drained
    ///   reserve, or the trader cannot pay.
    /// - [`AmmError::DivisionByZero`] if the solver degenerates.
    ///
    /// On error the request stays pending until it is cancelled or
    /// expires.
    pub fn settle_swap<L: TokenLedger>(
        &mut self,
        ctx: &CallContext,
        ledger: &mut L,
        answer: RateAnswer,
    ) -> Result<SwapResult, AmmError> {
        if answer.source != self.oracle {
            return Err(AmmError::Unauthorized("rate answer is not from the oracle"));
        }
        let swap = *self.pending.peek(answer.request_id, ctx.block())?;
        let order = swap.order;

        let (ra, rb) = (
            self.book.reserve_a.get(),
            self.book.reserve_b.get(),
        );
        let (pool_a, pool_b) = (
            ra.checked_mul(self.precision_a).ok_or(AmmError::Overflow("scaled reserve"))?,
            rb.checked_mul(self.precision_b).ok_or(AmmError::Overflow("scaled reserve"))?,
        );
        let (precision_in, precision_out) = match swap.side_in {
            Side::A => (self.precision_a, self.precision_b),
            Side::B => (self.precision_b, self.precision_a),
        };
        let scaled_in = order
            .amount_in
            .get()
            .checked_mul(precision_in)
            .ok_or(AmmError::Overflow("scaled input"))?;
        let scaled_out = match swap.side_in {
            Side::A => trade_dx_to_dy(pool_a, pool_b, scaled_in, answer.target, self.newton_rounds)?,
            Side::B => trade_dy_to_dx(pool_a, pool_b, scaled_in, answer.target, self.newton_rounds)?,
        };

        let gross = Amount::new(scaled_out / precision_out);
        let fee = self.lp_fee.apply(gross);
        if fee.is_zero() {
            return Err(AmmError::InsufficientAmount("swap too small to pay the fee"));
        }
        let amount_out = gross.safe_sub(&fee)?;
        if amount_out < order.min_out {
            return Err(AmmError::InsufficientAmount("output below minimum"));
        }
        let reserve_out = match swap.side_in {
            Side::A => self.book.reserve_b,
            Side::B => self.book.reserve_a,
        };
        if amount_out >= reserve_out {
            return Err(AmmError::InsufficientAmount("output exceeds the pool reserve"));
        }
        let result = SwapResult::new(swap.side_in, order.amount_in, amount_out, fee, Amount::ZERO)?;

        let mut book = self.book;
        match swap.side_in {
            Side::A => {
                book.reserve_a = book.reserve_a.safe_add(&order.amount_in)?;
                book.reserve_b = book.reserve_b.safe_sub(&amount_out)?;
            }
            Side::B => {
                book.reserve_b = book.reserve_b.safe_add(&order.amount_in)?;
                book.reserve_a = book.reserve_a.safe_sub(&amount_out)?;
            }
        }
        let ops = [
            LedgerOp::Transfer {
                token: self.token_pair.token(swap.side_in).address(),
                from: swap.trader,
                to: self.address,
                amount: order.amount_in,
            },
            LedgerOp::Transfer {
                token: order.token_out,
                from: self.address,
                to: order.recipient,
                amount: amount_out,
            },
        ];
        ledger.execute(self.address, &ops, ctx.block())?;
        self.book = book;
        self.pending.complete(answer.request_id);

        info!(
            pool = %self.address, request_id = %answer.request_id, target = %answer.target,
            amount_in = %order.amount_in, %amount_out, "stable swap settled"
        );
        Ok(result)
    }

    /// Abandons the pending swap.  Allowed for the trader and the admin.
    ///
    /// # Errors
    ///
    /// - [`AmmError::InvalidState`] if nothing is pending.
    /// - [`AmmError::Unauthorized`] for any other caller.
    pub fn cancel_swap(&mut self, ctx: &CallContext) -> Result<PendingSwap, AmmError> {
        let id = self
            .pending
            .current_id()
            .ok_or(AmmError::InvalidState("no swap is pending"))?;
        let trader = self
            .pending
            .peek(id, ctx.block())
            .map(|swap| swap.trader)
            .ok();
        if trader != Some(ctx.sender()) && ctx.sender() != self.access.admin() {
            return Err(AmmError::Unauthorized("only the trader or the admin can cancel"));
        }
        self.pending
            .cancel()
            .ok_or(AmmError::InvalidState("no swap is pending"))
    }

    /// Replaces the LP fee divisor.  Admin only.
    ///
    /// # Errors
    ///
    /// - [`AmmError::Unauthorized`] if the caller is not the admin.
    /// - [`AmmError::InvalidConfiguration`] if the divisor is 50 or less.
    pub fn modify_fee(&mut self, ctx: &CallContext, lp_fee: FeeDivisor) -> Result<(), AmmError> {
        self.access.ensure_admin(ctx)?;
        validate_fee_divisor(lp_fee)?;
        self.lp_fee = lp_fee;
        info!(pool = %self.address, %lp_fee, "stable fee modified");
        Ok(())
    }

    /// First deposits must be worth the same on both sides.
    fn check_bootstrap_ratio(&self, a: Amount, b: Amount) -> Result<(), AmmError> {
        let scaled_a = a.get().checked_mul(self.precision_a);
        let scaled_b = b.get().checked_mul(self.precision_b);
        match (scaled_a, scaled_b) {
            (Some(x), Some(y)) if x == y => Ok(()),
            (Some(_), Some(_)) => Err(AmmError::InvalidRatio(
                "first deposit must be balanced after precision scaling",
            )),
            _ => Err(AmmError::Overflow("scaled deposit")),
        }
    }

    fn asset_addresses(&self) -> (Address, Address) {
        (
            self.token_pair.token_a().address(),
            self.token_pair.token_b().address(),
        )
    }
}

impl FromConfig<StableSwapConfig> for StableSwapPool {
    fn from_config(config: &StableSwapConfig) -> Result<Self, AmmError> {
        config.validate()?;
        let (precision_a, precision_b) = config.precision_multipliers();
        Ok(Self {
            address: config.pool_address(),
            share_token: config.share_token(),
            oracle: config.oracle(),
            token_pair: *config.token_pair(),
            access: AccessControl::new(config.admin()),
            precision_a,
            precision_b,
            lp_fee: config.lp_fee(),
            newton_rounds: config.newton_rounds(),
            answer_timeout: config.answer_timeout(),
            book: ReserveBook::default(),
            pending: PendingSlot::new(),
        })
    }
}

impl Administrable for StableSwapPool {
    fn access(&self) -> &AccessControl {
        &self.access
    }

    fn access_mut(&mut self) -> &mut AccessControl {
        &mut self.access
    }
}

impl Pausable for StableSwapPool {}

impl LiquidityPool for StableSwapPool {
    fn token_pair(&self) -> &TokenPair {
        &self.token_pair
    }

    fn pool_address(&self) -> Address {
        self.address
    }

    fn share_token(&self) -> Address {
        self.share_token
    }

    fn reserves(&self) -> (Amount, Amount) {
        (self.book.reserve_a, self.book.reserve_b)
    }

    fn total_shares(&self) -> Shares {
        self.book.total_shares
    }

    fn add_liquidity<L: TokenLedger>(
        &mut self,
        ctx: &CallContext,
        ledger: &mut L,
        deposit: Deposit,
    ) -> Result<Shares, AmmError> {
        self.access.ensure_active()?;
        self.pending.ensure_idle(ctx.block())?;
        let plan = self
            .book
            .plan_deposit(&deposit, |a, b| self.check_bootstrap_ratio(a, b))?;
        let mut book = self.book;
        book.apply_deposit(&plan)?;
        let ops = deposit_ops(
            self.address,
            self.share_token,
            self.asset_addresses(),
            ctx.sender(),
            deposit.recipient,
            &plan,
        );
        ledger.execute(self.address, &ops, ctx.block())?;
        self.book = book;
        info!(pool = %self.address, minted = %plan.minted, "stable liquidity added");
        Ok(plan.minted)
    }

    fn remove_liquidity<L: TokenLedger>(
        &mut self,
        ctx: &CallContext,
        ledger: &mut L,
        withdrawal: Withdrawal,
    ) -> Result<(Amount, Amount), AmmError> {
        self.pending.ensure_idle(ctx.block())?;
        let plan = self.book.plan_withdrawal(&withdrawal)?;
        let mut book = self.book;
        book.apply_withdrawal(&plan)?;
        let ops = withdrawal_ops(
            self.address,
            self.share_token,
            self.asset_addresses(),
            ctx.sender(),
            withdrawal.recipient,
            &plan,
        );
        ledger.execute(self.address, &ops, ctx.block())?;
        self.book = book;
        info!(pool = %self.address, burned = %plan.burned, "stable liquidity removed");
        Ok((plan.amount_a, plan.amount_b))
    }
}
