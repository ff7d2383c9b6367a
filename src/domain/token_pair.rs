//! The two assets of a pool.

use super::Token;
use crate::error::AmmError;

/// One side of a two-asset pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Side {
    /// The first asset.
    A,
    /// The second asset.
    B,
}

impl Side {
    /// Returns the other side.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

/// An ordered pair of distinct tokens.
///
/// Unlike a canonically sorted pair, the order given at construction is
/// kept: token A is the pool's base asset.  Stable pools quote their rate
/// target as "A per B", so swapping the order changes meaning.
///
/// # Examples
///
/// ```
/// use tidepool::domain::{Address, Decimals, Side, Token, TokenPair};
///
/// let a = Token::new(Address::from_bytes([9u8; 32]), Decimals::new(6).expect("valid"));
/// let b = Token::new(Address::from_bytes([1u8; 32]), Decimals::new(6).expect("valid"));
/// let pair = TokenPair::new(a, b).expect("distinct");
/// assert_eq!(pair.token_a(), a);
/// assert_eq!(pair.side_of(b.address()), Some(Side::B));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TokenPair {
    token_a: Token,
    token_b: Token,
}

impl TokenPair {
    /// Creates a pair from two tokens with distinct addresses.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InvalidToken`] if both tokens share an address.
    pub fn new(token_a: Token, token_b: Token) -> Result<Self, AmmError> {
        if token_a.address() == token_b.address() {
            return Err(AmmError::InvalidToken(
                "token pair requires two distinct addresses",
            ));
        }
        Ok(Self { token_a, token_b })
    }

    /// Returns token A.
    #[must_use]
    pub const fn token_a(&self) -> Token {
        self.token_a
    }

    /// Returns token B.
    #[must_use]
    pub const fn token_b(&self) -> Token {
        self.token_b
    }

    /// Returns the token on the given side.
    #[must_use]
    pub const fn token(&self, side: Side) -> Token {
        match side {
            Side::A => self.token_a,
            Side::B => self.token_b,
        }
    }

    /// Returns which side a token address belongs to, if any.
    #[must_use]
    pub fn side_of(&self, address: super::Address) -> Option<Side> {
        if address == self.token_a.address() {
            Some(Side::A)
        } else if address == self.token_b.address() {
            Some(Side::B)
        } else {
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{Address, Decimals};

    fn tok(byte: u8) -> Token {
        Token::new(Address::from_bytes([byte; 32]), Decimals::MAX)
    }

    #[test]
    fn keeps_construction_order() {
        let Ok(pair) = TokenPair::new(tok(2), tok(1)) else {
            panic!("expected Ok");
        };
        assert_eq!(pair.token_a(), tok(2));
        assert_eq!(pair.token(Side::B), tok(1));
    }

    #[test]
    fn same_address_rejected() {
        assert!(matches!(
            TokenPair::new(tok(1), tok(1)),
            Err(AmmError::InvalidToken(_))
        ));
    }

    #[test]
    fn side_lookup() {
        let Ok(pair) = TokenPair::new(tok(1), tok(2)) else {
            panic!("expected Ok");
        };
        assert_eq!(pair.side_of(tok(1).address()), Some(Side::A));
        assert_eq!(pair.side_of(tok(3).address()), None);
        assert_eq!(Side::A.opposite(), Side::B);
    }
}
