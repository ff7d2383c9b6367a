//! Token identity type.

use super::{Address, Decimals};

/// A token contract: its address plus its decimal precision.
///
/// # Examples
///
/// ```
/// use tidepool::domain::{Address, Decimals, Token};
///
/// let tok = Token::new(Address::from_bytes([1u8; 32]), Decimals::new(6).expect("valid"));
/// assert_eq!(tok.decimals().get(), 6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Token {
    address: Address,
    decimals: Decimals,
}

impl Token {
    /// Creates a new `Token`.
    #[must_use]
    pub const fn new(address: Address, decimals: Decimals) -> Self {
        Self { address, decimals }
    }

    /// Returns the token contract address.
    #[must_use]
    pub const fn address(&self) -> Address {
        self.address
    }

    /// Returns the token decimals.
    #[must_use]
    pub const fn decimals(&self) -> Decimals {
        self.decimals
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn equality_needs_address_and_decimals() {
        let Ok(d6) = Decimals::new(6) else {
            panic!("valid decimals");
        };
        let addr = Address::from_bytes([1u8; 32]);
        assert_eq!(Token::new(addr, d6), Token::new(addr, d6));
        assert_ne!(Token::new(addr, d6), Token::new(addr, Decimals::MAX));
    }
}
