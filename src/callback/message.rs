//! Request and answer messages exchanged with external collaborators.

use core::fmt;

use crate::domain::{Address, Amount, Target};

/// Identifier of an outstanding request, unique per requester.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RequestId(u64);

impl RequestId {
    /// Wraps a raw id.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// A stable pool asking its oracle for the current rate target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateQuery {
    /// Id to echo back in the answer.
    pub request_id: RequestId,
    /// The pool waiting for the answer.
    pub requester: Address,
    /// The oracle expected to answer.
    pub oracle: Address,
}

impl RateQuery {
    /// Builds the answer an oracle at `source` sends for this query.
    #[must_use]
    pub const fn answer(&self, source: Address, target: Target) -> RateAnswer {
        RateAnswer {
            request_id: self.request_id,
            source,
            target,
        }
    }
}

/// The oracle's reply to a [`RateQuery`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateAnswer {
    /// Id of the query being answered.
    pub request_id: RequestId,
    /// Who sent the answer.
    pub source: Address,
    /// Price of one unit of token B in token A.
    pub target: Target,
}

/// A request for `holder`'s balance of `token`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceQuery {
    /// Id to echo back in the answer.
    pub request_id: RequestId,
    /// The component waiting for the answer.
    pub requester: Address,
    /// The token contract that must answer.
    pub token: Address,
    /// Whose balance is requested.
    pub holder: Address,
}

/// A token contract's reply to a [`BalanceQuery`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceAnswer {
    /// Id of the query being answered.
    pub request_id: RequestId,
    /// Who sent the answer.
    pub source: Address,
    /// Balance of the queried holder.
    pub balance: Amount,
}
