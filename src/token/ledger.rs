//! In-memory multi-token ledger with atomic batches.

use std::collections::BTreeMap;

use tracing::debug;

use super::CheckpointedToken;
use crate::domain::{Address, Amount, BlockHeight, CallContext, Token};
use crate::error::AmmError;
use crate::traits::{LedgerOp, TokenLedger};

/// A registry of [`CheckpointedToken`] contracts keyed by address.
///
/// [`execute`](TokenLedger::execute) stages every touched token on a copy
/// and only writes the copies back once the whole batch succeeded.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    tokens: BTreeMap<Address, CheckpointedToken>,
}

impl InMemoryLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a token contract.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InvalidToken`] if the address is taken.
    pub fn register(&mut self, contract: CheckpointedToken) -> Result<(), AmmError> {
        let address = contract.token().address();
        if self.tokens.contains_key(&address) {
            return Err(AmmError::InvalidToken("token already registered"));
        }
        self.tokens.insert(address, contract);
        Ok(())
    }

    /// Registers a new token whose admin and minter is `minter`.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InvalidToken`] if the address is taken.
    pub fn create_token(&mut self, token: Token, minter: Address) -> Result<(), AmmError> {
        let mut contract = CheckpointedToken::new(token, minter);
        contract.set_minter(&CallContext::new(minter, BlockHeight::ZERO), minter)?;
        self.register(contract)
    }

    /// Borrows a token contract.
    #[must_use]
    pub fn token(&self, address: Address) -> Option<&CheckpointedToken> {
        self.tokens.get(&address)
    }

    /// Sets `spender`'s allowance over the caller's balance of `token`.
    ///
    /// # Errors
    ///
    /// - [`AmmError::InvalidToken`] if `token` is unknown.
    /// - [`AmmError::InvalidState`] on an unsafe allowance change.
    pub fn approve(
        &mut self,
        ctx: &CallContext,
        token: Address,
        spender: Address,
        value: Amount,
    ) -> Result<(), AmmError> {
        self.tokens
            .get_mut(&token)
            .ok_or(AmmError::InvalidToken("unknown token"))?
            .approve(ctx.sender(), spender, value)
    }

    /// Moves the caller's own tokens.
    ///
    /// # Errors
    ///
    /// See [`CheckpointedToken::transfer`].
    pub fn transfer(
        &mut self,
        ctx: &CallContext,
        token: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), AmmError> {
        let op = LedgerOp::Transfer {
            token,
            from: ctx.sender(),
            to,
            amount,
        };
        self.execute(ctx.sender(), &[op], ctx.block())
    }
}

impl TokenLedger for InMemoryLedger {
    fn balance_of(&self, token: Address, owner: Address) -> Result<Amount, AmmError> {
        self.token(token)
            .map(|t| t.balance_of(owner))
            .ok_or(AmmError::InvalidToken("unknown token"))
    }

    fn total_supply(&self, token: Address) -> Result<Amount, AmmError> {
        self.token(token)
            .map(CheckpointedToken::total_supply)
            .ok_or(AmmError::InvalidToken("unknown token"))
    }

    fn execute(
        &mut self,
        operator: Address,
        ops: &[LedgerOp],
        block: BlockHeight,
    ) -> Result<(), AmmError> {
        let mut staged: BTreeMap<Address, CheckpointedToken> = BTreeMap::new();
        for op in ops {
            let token = match *op {
                LedgerOp::Transfer { token, .. }
                | LedgerOp::Mint { token, .. }
                | LedgerOp::Burn { token, .. } => token,
            };
            if !staged.contains_key(&token) {
                let original = self
                    .tokens
                    .get(&token)
                    .ok_or(AmmError::InvalidToken("unknown token"))?;
                staged.insert(token, original.clone());
            }
            let contract = staged
                .get_mut(&token)
                .ok_or(AmmError::InvalidToken("unknown token"))?;
            match *op {
                LedgerOp::Transfer {
                    from, to, amount, ..
                } => contract.transfer(operator, from, to, amount, block)?,
                LedgerOp::Mint { to, amount, .. } => contract.mint(operator, to, amount, block)?,
                LedgerOp::Burn { from, amount, .. } => {
                    contract.burn(operator, from, amount, block)?;
                }
            }
        }
        debug!(%operator, ops = ops.len(), %block, "ledger batch committed");
        self.tokens.extend(staged);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::callback::{BalanceQuery, RequestId};
    use crate::domain::Decimals;

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 32])
    }

    fn funded() -> InMemoryLedger {
        let mut ledger = InMemoryLedger::new();
        for t in [10u8, 11] {
            let Ok(()) = ledger.create_token(Token::new(addr(t), Decimals::MAX), addr(1)) else {
                panic!("token created");
            };
        }
        let ops = [
            LedgerOp::Mint { token: addr(10), to: addr(2), amount: Amount::new(100) },
            LedgerOp::Mint { token: addr(11), to: addr(2), amount: Amount::new(100) },
        ];
        let Ok(()) = ledger.execute(addr(1), &ops, BlockHeight::new(1)) else {
            panic!("funding");
        };
        ledger
    }

    #[test]
    fn batch_is_all_or_nothing() {
        let mut ledger = funded();
        let ops = [
            LedgerOp::Transfer { token: addr(10), from: addr(2), to: addr(3), amount: Amount::new(60) },
            LedgerOp::Transfer { token: addr(11), from: addr(2), to: addr(3), amount: Amount::new(101) },
        ];
        assert!(ledger.execute(addr(2), &ops, BlockHeight::new(2)).is_err());
        assert_eq!(ledger.balance_of(addr(10), addr(2)), Ok(Amount::new(100)));
        assert_eq!(ledger.balance_of(addr(10), addr(3)), Ok(Amount::ZERO));
    }

    #[test]
    fn later_ops_see_earlier_ones() {
        let mut ledger = funded();
        let ops = [
            LedgerOp::Transfer { token: addr(10), from: addr(2), to: addr(3), amount: Amount::new(60) },
            LedgerOp::Transfer { token: addr(10), from: addr(3), to: addr(4), amount: Amount::new(60) },
        ];
        // addr(2) may not move addr(3)'s tokens
        assert!(ledger.execute(addr(2), &ops, BlockHeight::new(2)).is_err());
        let ctx = CallContext::new(addr(3), BlockHeight::new(2));
        let Ok(()) = ledger.approve(&ctx, addr(10), addr(2), Amount::new(60)) else {
            panic!("approve");
        };
        let Ok(()) = ledger.execute(addr(2), &ops, BlockHeight::new(2)) else {
            panic!("chained transfer");
        };
        assert_eq!(ledger.balance_of(addr(10), addr(4)), Ok(Amount::new(60)));
    }

    #[test]
    fn unknown_token_rejected() {
        let mut ledger = funded();
        assert!(matches!(ledger.balance_of(addr(99), addr(2)), Err(AmmError::InvalidToken(_))));
        let op = LedgerOp::Mint { token: addr(99), to: addr(2), amount: Amount::new(1) };
        assert!(ledger.execute(addr(1), &[op], BlockHeight::new(2)).is_err());
    }

    #[test]
    fn duplicate_registration_rejected() {
        let mut ledger = funded();
        assert!(ledger
            .create_token(Token::new(addr(10), Decimals::MAX), addr(1))
            .is_err());
    }

    #[test]
    fn balance_answer_echoes_the_query() {
        let ledger = funded();
        let query = BalanceQuery {
            request_id: RequestId::new(4),
            requester: addr(7),
            token: addr(10),
            holder: addr(2),
        };
        let Ok(answer) = ledger.answer_balance(&query) else {
            panic!("answer");
        };
        assert_eq!(answer.request_id, RequestId::new(4));
        assert_eq!(answer.source, addr(10));
        assert_eq!(answer.balance, Amount::new(100));
    }
}
