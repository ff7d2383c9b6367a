//! Constant-product pool for volatile asset pairs.
//!
//! Swaps are priced by [`quote_exact_in`] (`x * y = k` with a reciprocal
//! LP fee and system fee) and settle synchronously.  The LP fee stays in
//! the reserves; the system fee is parked in a per-asset accumulator the
//! admin can withdraw.
//!
//! # Operation order
//!
//! Every entrypoint validates and prices against a copy of the state,
//! hands the resulting token movements to the ledger as one batch, and
//! only then commits.  A rejected batch leaves the pool untouched.

use tracing::info;

use super::liquidity::{deposit_ops, withdrawal_ops, ReserveBook};
use crate::access::AccessControl;
use crate::config::{validate_fee_divisor, validate_swap_limit, VolatilePoolConfig};
use crate::domain::{
    Address, Amount, CallContext, Deposit, FeeDivisor, Shares, Side, SwapOrder, SwapResult,
    TokenPair, Withdrawal,
};
use crate::error::AmmError;
use crate::math::constant_product::{quote_exact_in, CurveFees};
use crate::math::CheckedArithmetic;
use crate::traits::{Administrable, FromConfig, LedgerOp, LiquidityPool, Pausable, TokenLedger};

/// A constant-product AMM pool (`x * y = k`).
///
/// # Example
///
/// ```rust
/// use tidepool::config::VolatilePoolConfig;
/// use tidepool::domain::{Address, Decimals, Token, TokenPair};
/// use tidepool::pools::VolatilePool;
/// use tidepool::traits::{FromConfig, LiquidityPool};
///
/// let a = |b: u8| Address::from_bytes([b; 32]);
/// let pair = TokenPair::new(
///     Token::new(a(10), Decimals::new(6).expect("ok")),
///     Token::new(a(11), Decimals::new(6).expect("ok")),
/// )
/// .expect("distinct");
/// let cfg = VolatilePoolConfig::new(a(1), a(2), a(3), pair).expect("valid");
/// let pool = VolatilePool::from_config(&cfg).expect("pool");
/// assert!(pool.total_shares().is_zero());
/// assert_eq!(pool.fees().0.get(), 500);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolatilePool {
    address: Address,
    share_token: Address,
    token_pair: TokenPair,
    access: AccessControl,
    lp_fee: FeeDivisor,
    system_fee: FeeDivisor,
    max_swap_limit: u8,
    book: ReserveBook,
    system_fee_a: Amount,
    system_fee_b: Amount,
}

impl VolatilePool {
    /// `(lp_fee, system_fee)` divisors.
    #[must_use]
    pub const fn fees(&self) -> (FeeDivisor, FeeDivisor) {
        (self.lp_fee, self.system_fee)
    }

    /// Largest trade in percent of the input reserve.
    #[must_use]
    pub const fn max_swap_limit(&self) -> u8 {
        self.max_swap_limit
    }

    /// Protocol fees accrued per asset and not yet withdrawn.
    #[must_use]
    pub const fn system_fee_accumulators(&self) -> (Amount, Amount) {
        (self.system_fee_a, self.system_fee_b)
    }

    /// Sells `order.amount_in` of the asset that is not `order.token_out`.
    ///
    /// Pulls the input from the caller (who must have approved the pool)
    /// and pays the output to `order.recipient`.
    ///
    /// # Errors
    ///
    /// - [`AmmError::Paused`] if the pool is paused.
    /// - [`AmmError::InvalidToken`] if `token_out` is not a pool asset.
    /// - [`AmmError::SwapLimitExceeded`] if the trade is too large.
    /// - [`AmmError::InsufficientAmount`] if the system fee rounds to zero,
    ///   the output is below `min_out`, or the caller cannot pay.
    pub fn swap<L: TokenLedger>(
        &mut self,
        ctx: &CallContext,
        ledger: &mut L,
        order: SwapOrder,
    ) -> Result<SwapResult, AmmError> {
        self.access.ensure_active()?;
        let side_out = self
            .token_pair
            .side_of(order.token_out)
            .ok_or(AmmError::InvalidToken("requested output is not a pool asset"))?;
        let side_in = side_out.opposite();
        let (reserve_in, reserve_out) = self.reserves_by_side(side_in);

        let quote = quote_exact_in(
            reserve_in,
            reserve_out,
            order.amount_in,
            CurveFees {
                lp_fee: self.lp_fee,
                system_fee: self.system_fee,
                max_swap_limit: self.max_swap_limit,
            },
        )?;
        if quote.amount_out < order.min_out {
            return Err(AmmError::InsufficientAmount("output below minimum"));
        }
        let result = SwapResult::new(
            side_in,
            order.amount_in,
            quote.amount_out,
            quote.lp_fee,
            quote.system_fee,
        )?;

        let mut next = self.clone();
        match side_in {
            Side::A => {
                next.book.reserve_a = quote.new_reserve_in;
                next.book.reserve_b = quote.new_reserve_out;
                next.system_fee_a = self.system_fee_a.safe_add(&quote.system_fee)?;
            }
            Side::B => {
                next.book.reserve_b = quote.new_reserve_in;
                next.book.reserve_a = quote.new_reserve_out;
                next.system_fee_b = self.system_fee_b.safe_add(&quote.system_fee)?;
            }
        }

        let ops = [
            LedgerOp::Transfer {
                token: self.token_pair.token(side_in).address(),
                from: ctx.sender(),
                to: self.address,
                amount: order.amount_in,
            },
            LedgerOp::Transfer {
                token: order.token_out,
                from: self.address,
                to: order.recipient,
                amount: quote.amount_out,
            },
        ];
        ledger.execute(self.address, &ops, ctx.block())?;
        *self = next;

        info!(
            pool = %self.address, ?side_in, amount_in = %order.amount_in,
            amount_out = %quote.amount_out, "swap settled"
        );
        Ok(result)
    }

    /// Replaces both fee divisors.  Admin only.
    ///
    /// # Errors
    ///
    /// - [`AmmError::Unauthorized`] if the caller is not the admin.
    /// - [`AmmError::InvalidConfiguration`] if a divisor is 50 or less.
    pub fn modify_fees(
        &mut self,
        ctx: &CallContext,
        lp_fee: FeeDivisor,
        system_fee: FeeDivisor,
    ) -> Result<(), AmmError> {
        self.access.ensure_admin(ctx)?;
        validate_fee_divisor(lp_fee)?;
        validate_fee_divisor(system_fee)?;
        self.lp_fee = lp_fee;
        self.system_fee = system_fee;
        info!(pool = %self.address, %lp_fee, %system_fee, "fees modified");
        Ok(())
    }

    /// Replaces the swap size limit.  Admin only.
    ///
    /// # Errors
    ///
    /// - [`AmmError::Unauthorized`] if the caller is not the admin.
    /// - [`AmmError::InvalidConfiguration`] if out of `1..=100`.
    pub fn modify_max_swap_limit(&mut self, ctx: &CallContext, percent: u8) -> Result<(), AmmError> {
        self.access.ensure_admin(ctx)?;
        validate_swap_limit(percent)?;
        self.max_swap_limit = percent;
        Ok(())
    }

    /// Pays both system fee accumulators to `recipient` and resets them.
    /// Admin only.
    ///
    /// # Errors
    ///
    /// - [`AmmError::Unauthorized`] if the caller is not the admin.
    /// - [`AmmError::InsufficientAmount`] if nothing has accrued.
    pub fn withdraw_system_fees<L: TokenLedger>(
        &mut self,
        ctx: &CallContext,
        ledger: &mut L,
        recipient: Address,
    ) -> Result<(Amount, Amount), AmmError> {
        self.access.ensure_admin(ctx)?;
        let accrued = [
            (self.token_pair.token_a().address(), self.system_fee_a),
            (self.token_pair.token_b().address(), self.system_fee_b),
        ];
        let ops: Vec<LedgerOp> = accrued
            .iter()
            .filter(|(_, amount)| !amount.is_zero())
            .map(|&(token, amount)| LedgerOp::Transfer {
                token,
                from: self.address,
                to: recipient,
                amount,
            })
            .collect();
        if ops.is_empty() {
            return Err(AmmError::InsufficientAmount("no system fees to withdraw"));
        }
        ledger.execute(self.address, &ops, ctx.block())?;
        let paid = (self.system_fee_a, self.system_fee_b);
        self.system_fee_a = Amount::ZERO;
        self.system_fee_b = Amount::ZERO;
        info!(pool = %self.address, fee_a = %paid.0, fee_b = %paid.1, "system fees withdrawn");
        Ok(paid)
    }

    fn reserves_by_side(&self, side_in: Side) -> (Amount, Amount) {
        match side_in {
            Side::A => (self.book.reserve_a, self.book.reserve_b),
            Side::B => (self.book.reserve_b, self.book.reserve_a),
        }
    }

    fn asset_addresses(&self) -> (Address, Address) {
        (
            self.token_pair.token_a().address(),
            self.token_pair.token_b().address(),
        )
    }
}

impl FromConfig<VolatilePoolConfig> for VolatilePool {
    /// Creates an empty, active pool.
    fn from_config(config: &VolatilePoolConfig) -> Result<Self, AmmError> {
        config.validate()?;
        Ok(Self {
            address: config.pool_address(),
            share_token: config.share_token(),
            token_pair: *config.token_pair(),
            access: AccessControl::new(config.admin()),
            lp_fee: config.lp_fee(),
            system_fee: config.system_fee(),
            max_swap_limit: config.max_swap_limit(),
            book: ReserveBook::default(),
            system_fee_a: Amount::ZERO,
            system_fee_b: Amount::ZERO,
        })
    }
}

impl Administrable for VolatilePool {
    fn access(&self) -> &AccessControl {
        &self.access
    }

    fn access_mut(&mut self) -> &mut AccessControl {
        &mut self.access
    }
}

impl Pausable for VolatilePool {}

impl LiquidityPool for VolatilePool {
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

    /// Any ratio is accepted on the first deposit.
    fn add_liquidity<L: TokenLedger>(
        &mut self,
        ctx: &CallContext,
        ledger: &mut L,
        deposit: Deposit,
    ) -> Result<Shares, AmmError> {
        self.access.ensure_active()?;
        let plan = self.book.plan_deposit(&deposit, |_, _| Ok(()))?;
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
        info!(pool = %self.address, minted = %plan.minted, total = %book.total_shares, "liquidity added");
        Ok(plan.minted)
    }

    fn remove_liquidity<L: TokenLedger>(
        &mut self,
        ctx: &CallContext,
        ledger: &mut L,
        withdrawal: Withdrawal,
    ) -> Result<(Amount, Amount), AmmError> {
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
        info!(pool = %self.address, burned = %plan.burned, total = %book.total_shares, "liquidity removed");
        Ok((plan.amount_a, plan.amount_b))
    }
}
