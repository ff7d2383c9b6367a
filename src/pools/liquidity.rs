//! Reserve and share bookkeeping shared by both pool types.
//!
//! Operations are split into a pure `plan_*` step that validates and
//! prices the request against the current book, and an `apply_*` step that
//! commits a plan.  Pools move tokens between the two, so a failed
//! transfer leaves the book untouched.

use tracing::debug;

use crate::domain::{Address, Amount, Deposit, Shares, Withdrawal};
use crate::error::AmmError;
use crate::math::{mul_div, sqrt_product, CheckedArithmetic};
use crate::traits::LedgerOp;

/// Shares locked forever by the first deposit.
pub const INITIAL_LIQUIDITY_OFFSET: u128 = 1_000;

/// A priced deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositPlan {
    /// Token A pulled from the caller.
    pub amount_a: Amount,
    /// Token B pulled from the caller.
    pub amount_b: Amount,
    /// Shares minted to the recipient.
    pub minted: Shares,
    /// Shares added to the supply without an owner.
    pub locked: Shares,
}

/// A priced withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithdrawalPlan {
    /// Shares burned from the caller.
    pub burned: Shares,
    /// Token A paid out.
    pub amount_a: Amount,
    /// Token B paid out.
    pub amount_b: Amount,
}

/// Two reserves and the share supply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ReserveBook {
    pub(crate) reserve_a: Amount,
    pub(crate) reserve_b: Amount,
    pub(crate) total_shares: Shares,
}

impl ReserveBook {
    pub(crate) fn is_empty(&self) -> bool {
        self.total_shares.is_zero()
    }

    /// Prices a deposit.  `bootstrap_ratio` vets the amounts of a first
    /// deposit; later deposits follow the reserve ratio.
    pub(crate) fn plan_deposit(
        &self,
        deposit: &Deposit,
        bootstrap_ratio: impl FnOnce(Amount, Amount) -> Result<(), AmmError>,
    ) -> Result<DepositPlan, AmmError> {
        if deposit.max_a.is_zero() || deposit.max_b.is_zero() {
            return Err(AmmError::InvalidRatio("both deposit amounts must be positive"));
        }

        let plan = if self.is_empty() {
            bootstrap_ratio(deposit.max_a, deposit.max_b)?;
            DepositPlan {
                amount_a: deposit.max_a,
                amount_b: deposit.max_b,
                minted: bootstrap_shares(deposit.max_a, deposit.max_b)?,
                locked: Shares::new(INITIAL_LIQUIDITY_OFFSET),
            }
        } else {
            let (amount_a, amount_b) = proportional_deposit(
                deposit.max_a,
                deposit.max_b,
                self.reserve_a,
                self.reserve_b,
            )?;
            let minted = self.shares_for(amount_a, amount_b)?;
            if minted.is_zero() {
                return Err(AmmError::InvalidRatio("deposit mints no shares"));
            }
            DepositPlan {
                amount_a,
                amount_b,
                minted,
                locked: Shares::ZERO,
            }
        };

        if plan.minted < deposit.min_shares {
            return Err(AmmError::InsufficientAmount("minted shares below minimum"));
        }
        debug!(
            amount_a = %plan.amount_a, amount_b = %plan.amount_b, minted = %plan.minted,
            "deposit planned"
        );
        Ok(plan)
    }

    pub(crate) fn apply_deposit(&mut self, plan: &DepositPlan) -> Result<(), AmmError> {
        let next = Self {
            reserve_a: self.reserve_a.safe_add(&plan.amount_a)?,
            reserve_b: self.reserve_b.safe_add(&plan.amount_b)?,
            total_shares: self
                .total_shares
                .safe_add(&plan.minted)?
                .safe_add(&plan.locked)?,
        };
        *self = next;
        Ok(())
    }

    /// Prices a pro-rata withdrawal.
    pub(crate) fn plan_withdrawal(&self, withdrawal: &Withdrawal) -> Result<WithdrawalPlan, AmmError> {
        if self.is_empty() {
            return Err(AmmError::InvalidState("pool has no liquidity"));
        }
        if withdrawal.shares.is_zero() {
            return Err(AmmError::InsufficientAmount("no shares to burn"));
        }
        if withdrawal.shares >= self.total_shares {
            return Err(AmmError::InsufficientAmount(
                "withdrawal would drain the pool",
            ));
        }
        let total = self.total_shares.get();
        let amount_a = Amount::new(mul_div(withdrawal.shares.get(), self.reserve_a.get(), total)?);
        let amount_b = Amount::new(mul_div(withdrawal.shares.get(), self.reserve_b.get(), total)?);
        if amount_a.is_zero() || amount_b.is_zero() {
            return Err(AmmError::InsufficientAmount("withdrawal rounds to zero"));
        }
        if amount_a < withdrawal.min_a || amount_b < withdrawal.min_b {
            return Err(AmmError::InsufficientAmount("withdrawal below minimum"));
        }
        Ok(WithdrawalPlan {
            burned: withdrawal.shares,
            amount_a,
            amount_b,
        })
    }

    pub(crate) fn apply_withdrawal(&mut self, plan: &WithdrawalPlan) -> Result<(), AmmError> {
        let next = Self {
            reserve_a: self.reserve_a.safe_sub(&plan.amount_a)?,
            reserve_b: self.reserve_b.safe_sub(&plan.amount_b)?,
            total_shares: self.total_shares.safe_sub(&plan.burned)?,
        };
        *self = next;
        Ok(())
    }

    /// `min(a * total / reserve_a, b * total / reserve_b)`.
    fn shares_for(&self, amount_a: Amount, amount_b: Amount) -> Result<Shares, AmmError> {
        let total = self.total_shares.get();
        let by_a = mul_div(amount_a.get(), total, self.reserve_a.get())?;
        let by_b = mul_div(amount_b.get(), total, self.reserve_b.get())?;
        Ok(Shares::new(by_a.min(by_b)))
    }
}

/// Shares minted by the first deposit: `floor(sqrt(a * b)) - 1000`.
///
/// # Errors
///
/// Returns [`AmmError::InvalidRatio`] if the root does not exceed the
/// locked offset.
pub fn bootstrap_shares(amount_a: Amount, amount_b: Amount) -> Result<Shares, AmmError> {
    let root = sqrt_product(amount_a.get(), amount_b.get())?;
    if root <= INITIAL_LIQUIDITY_OFFSET {
        return Err(AmmError::InvalidRatio(
            "first deposit too small to cover the locked shares",
        ));
    }
    Ok(Shares::new(root - INITIAL_LIQUIDITY_OFFSET))
}

/// Largest `(a, b)` within `(max_a, max_b)` at the ratio `reserve_a : reserve_b`.
///
/// Both anchorings are computed: `b` fitted to `max_a`, and `a` fitted to
/// `max_b`.  Candidates exceeding a cap or containing a zero are dropped;
/// of the rest, the larger deposit wins, ties going to the `max_a` anchor.
///
/// # Errors
///
/// - [`AmmError::InvalidState`] if a reserve is empty.
/// - [`AmmError::InvalidRatio`] if no candidate survives.
pub fn proportional_deposit(
    max_a: Amount,
    max_b: Amount,
    reserve_a: Amount,
    reserve_b: Amount,
) -> Result<(Amount, Amount), AmmError> {
    if reserve_a.is_zero() || reserve_b.is_zero() {
        return Err(AmmError::InvalidState("pool has no liquidity"));
    }
    let fit_b = Amount::new(mul_div(max_a.get(), reserve_b.get(), reserve_a.get())?);
    let fit_a = Amount::new(mul_div(max_b.get(), reserve_a.get(), reserve_b.get())?);

    let anchored_on_a = (fit_b <= max_b).then_some((max_a, fit_b));
    let anchored_on_b = (fit_a <= max_a).then_some((fit_a, max_b));
    [anchored_on_a, anchored_on_b]
        .into_iter()
        .flatten()
        .filter(|(a, b)| !a.is_zero() && !b.is_zero())
        .reduce(|best, next| if next.0 > best.0 { next } else { best })
        .ok_or(AmmError::InvalidRatio("deposit too small for the pool ratio"))
}

/// Ledger ops of a deposit: pull both assets into the pool, mint shares.
pub(crate) fn deposit_ops(
    pool: Address,
    share_token: Address,
    tokens: (Address, Address),
    payer: Address,
    recipient: Address,
    plan: &DepositPlan,
) -> [LedgerOp; 3] {
    [
        LedgerOp::Transfer {
            token: tokens.0,
            from: payer,
            to: pool,
            amount: plan.amount_a,
        },
        LedgerOp::Transfer {
            token: tokens.1,
            from: payer,
            to: pool,
            amount: plan.amount_b,
        },
        LedgerOp::Mint {
            token: share_token,
            to: recipient,
            amount: Amount::new(plan.minted.get()),
        },
    ]
}

/// Ledger ops of a withdrawal: burn shares, push both assets out.
pub(crate) fn withdrawal_ops(
    pool: Address,
    share_token: Address,
    tokens: (Address, Address),
    holder: Address,
    recipient: Address,
    plan: &WithdrawalPlan,
) -> [LedgerOp; 3] {
    [
        LedgerOp::Burn {
            token: share_token,
            from: holder,
            amount: Amount::new(plan.burned.get()),
        },
        LedgerOp::Transfer {
            token: tokens.0,
            from: pool,
            to: recipient,
            amount: plan.amount_a,
        },
        LedgerOp::Transfer {
            token: tokens.1,
            from: pool,
            to: recipient,
            amount: plan.amount_b,
        },
    ]
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn deposit(a: u128, b: u128) -> Deposit {
        Deposit {
            max_a: Amount::new(a),
            max_b: Amount::new(b),
            min_shares: Shares::ZERO,
            recipient: Address::ZERO,
        }
    }

    fn no_ratio_check(_: Amount, _: Amount) -> Result<(), AmmError> {
        Ok(())
    }

    fn seeded(a: u128, b: u128) -> ReserveBook {
        let mut book = ReserveBook::default();
        let Ok(plan) = book.plan_deposit(&deposit(a, b), no_ratio_check) else {
            panic!("bootstrap");
        };
        let Ok(()) = book.apply_deposit(&plan) else {
            panic!("apply");
        };
        book
    }

    // -- bootstrap ----------------------------------------------------------

    #[test]
    fn bootstrap_locks_offset() {
        assert_eq!(
            bootstrap_shares(Amount::new(1_000_000), Amount::new(1_000_000)),
            Ok(Shares::new(999_000))
        );
        let book = seeded(1_000_000, 1_000_000);
        assert_eq!(book.total_shares, Shares::new(1_000_000));
    }

    #[test]
    fn bootstrap_at_or_below_offset_fails() {
        assert!(matches!(
            bootstrap_shares(Amount::new(1_000), Amount::new(1_000)),
            Err(AmmError::InvalidRatio(_))
        ));
        assert!(bootstrap_shares(Amount::new(1_001), Amount::new(1_001)).is_ok());
    }

    // -- proportional deposits ----------------------------------------------

    #[test]
    fn anchored_on_the_binding_cap() {
        let r = (Amount::new(1_000_000), Amount::new(2_000_000));
        // max_b binds
        assert_eq!(
            proportional_deposit(Amount::new(500), Amount::new(600), r.0, r.1),
            Ok((Amount::new(300), Amount::new(600)))
        );
        // max_a binds
        assert_eq!(
            proportional_deposit(Amount::new(100), Amount::new(600), r.0, r.1),
            Ok((Amount::new(100), Amount::new(200)))
        );
    }

    #[test]
    fn dust_deposit_rejected() {
        let r = (Amount::new(1_000_000), Amount::new(1));
        assert!(matches!(
            proportional_deposit(Amount::new(10), Amount::new(10), r.0, r.1),
            Err(AmmError::InvalidRatio(_))
        ));
    }

    #[test]
    fn second_deposit_mints_pro_rata() {
        let book = seeded(1_000_000, 4_000_000);
        let Ok(plan) = book.plan_deposit(&deposit(1_000, 10_000), no_ratio_check) else {
            panic!("expected Ok");
        };
        assert_eq!(plan.amount_a, Amount::new(1_000));
        assert_eq!(plan.amount_b, Amount::new(4_000));
        // total 2_000_000 shares, 0.1% of the pool
        assert_eq!(plan.minted, Shares::new(2_000));
        assert_eq!(plan.locked, Shares::ZERO);
    }

    #[test]
    fn min_shares_enforced() {
        let book = seeded(1_000_000, 1_000_000);
        let mut d = deposit(1_000, 1_000);
        d.min_shares = Shares::new(1_001);
        assert!(matches!(
            book.plan_deposit(&d, no_ratio_check),
            Err(AmmError::InsufficientAmount(_))
        ));
    }

    #[test]
    fn bootstrap_ratio_hook_runs_only_on_first_deposit() {
        let reject = |_: Amount, _: Amount| -> Result<(), AmmError> { Err(AmmError::InvalidRatio("nope")) };
        assert!(ReserveBook::default().plan_deposit(&deposit(5_000, 5_000), reject).is_err());
        assert!(seeded(5_000, 5_000).plan_deposit(&deposit(5, 5), reject).is_ok());
    }

    // -- withdrawals --------------------------------------------------------

    #[test]
    fn withdrawal_is_pro_rata_and_cannot_drain() {
        let book = seeded(1_000_000, 4_000_000);
        let total = book.total_shares;
        let w = |s: u128| Withdrawal {
            shares: Shares::new(s),
            min_a: Amount::ZERO,
            min_b: Amount::ZERO,
            recipient: Address::ZERO,
        };
        let Ok(plan) = book.plan_withdrawal(&w(total.get() / 10)) else {
            panic!("expected Ok");
        };
        assert_eq!(plan.amount_a, Amount::new(100_000));
        assert_eq!(plan.amount_b, Amount::new(400_000));
        assert!(book.plan_withdrawal(&w(total.get())).is_err());
        assert!(book.plan_withdrawal(&w(0)).is_err());
    }

    #[test]
    fn apply_withdrawal_reduces_supply_exactly() {
        let mut book = seeded(1_000_000, 1_000_000);
        let before = book.total_shares;
        let Ok(plan) = book.plan_withdrawal(&Withdrawal {
            shares: Shares::new(12_345),
            min_a: Amount::ZERO,
            min_b: Amount::ZERO,
            recipient: Address::ZERO,
        }) else {
            panic!("expected Ok");
        };
        let Ok(()) = book.apply_withdrawal(&plan) else {
            panic!("apply");
        };
        assert_eq!(before.get() - book.total_shares.get(), 12_345);
    }
}
