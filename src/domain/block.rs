//! Block heights and the per-call execution context.

use core::fmt;

use super::Address;

/// A block height (the ledger's notion of time).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockHeight(u64);

impl BlockHeight {
    /// Genesis.
    pub const ZERO: Self = Self(0);

    /// Creates a block height.
    #[must_use]
    pub const fn new(height: u64) -> Self {
        Self(height)
    }

    /// Returns the raw height.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }

    /// Returns the height `blocks` later, or `None` on overflow.
    #[must_use]
    pub const fn checked_add(&self, blocks: u64) -> Option<Self> {
        match self.0.checked_add(blocks) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Number of blocks from `earlier` to `self`, or `None` if `earlier`
    /// is in the future.
    #[must_use]
    pub const fn blocks_since(&self, earlier: Self) -> Option<u64> {
        self.0.checked_sub(earlier.0)
    }
}

impl fmt::Display for BlockHeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Who is calling, and at which block.
///
/// Every state-changing entrypoint takes a `CallContext`; nothing reads a
/// global clock or sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    sender: Address,
    block: BlockHeight,
}

impl CallContext {
    /// Creates a context for `sender` executing at `block`.
    #[must_use]
    pub const fn new(sender: Address, block: BlockHeight) -> Self {
        Self { sender, block }
    }

    /// The calling address.
    #[must_use]
    pub const fn sender(&self) -> Address {
        self.sender
    }

    /// The current block.
    #[must_use]
    pub const fn block(&self) -> BlockHeight {
        self.block
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_since() {
        let a = BlockHeight::new(100);
        let b = BlockHeight::new(350);
        assert_eq!(b.blocks_since(a), Some(250));
        assert_eq!(a.blocks_since(b), None);
        assert_eq!(a.checked_add(5), Some(BlockHeight::new(105)));
        assert_eq!(BlockHeight::new(u64::MAX).checked_add(1), None);
    }
}
