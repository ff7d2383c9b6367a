//! Account and contract addresses.

use core::fmt;

/// A chain-agnostic 32-byte address.
///
/// Used for users, pools, token contracts and oracles alike.  All byte
/// sequences are valid, so construction is infallible.
///
/// # Examples
///
/// ```
/// use tidepool::domain::Address;
///
/// let alice = Address::from_bytes([1u8; 32]);
/// assert_eq!(alice.as_bytes(), [1u8; 32]);
/// assert_ne!(alice, Address::ZERO);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Address([u8; 32]);

impl Address {
    /// The all-zero address.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Creates an `Address` from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the underlying 32-byte representation.
    #[must_use]
    pub const fn as_bytes(&self) -> [u8; 32] {
        self.0
    }
}

impl fmt::Display for Address {
    /// Prints the first four bytes as hex, e.g. `0x01010101..`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for byte in &self.0[..4] {
            write!(f, "{byte:02x}")?;
        }
        write!(f, "..")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_and_zero() {
        let addr = Address::from_bytes([42u8; 32]);
        assert_eq!(addr.as_bytes(), [42u8; 32]);
        assert_eq!(Address::ZERO.as_bytes(), [0u8; 32]);
        assert_eq!(Address::default(), Address::ZERO);
    }

    #[test]
    fn display_is_abbreviated_hex() {
        assert_eq!(Address::from_bytes([0xab; 32]).to_string(), "0xabababab..");
    }
}
