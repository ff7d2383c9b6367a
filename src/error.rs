//! Unified error types for the tidepool library.
//!
//! Every fallible operation in the crate returns [`AmmError`].  A failed
//! operation never leaves partial state behind: pools, the staking engine,
//! the vault and the ledger only commit after every check has passed, so
//! callers can simply resubmit with corrected parameters.
//!
//! The variants are fine-grained for diagnostics; [`AmmError::kind`]
//! collapses them into the five externally visible [`ErrorKind`]
//! categories.

use thiserror::Error;

/// Coarse error category surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The caller is not the admin or the authorised party.
    Unauthorized,
    /// Paused, locked by a pending request, or not initialised.
    InvalidState,
    /// Slippage limit, zero amount, or a balance that is too small.
    InsufficientAmount,
    /// A deposit violates the pool ratio or mints no shares.
    InvalidRatio,
    /// Division by zero, overflow or underflow.
    Arithmetic,
}

/// The error type for all tidepool operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmmError {
    /// The caller is not allowed to perform this operation.
    #[error("unauthorized: {0}")]
    Unauthorized(&'static str),

    /// The component is paused.
    #[error("operation rejected while paused")]
    Paused,

    /// A request is already pending on this resource.
    #[error("locked: {0}")]
    Locked(&'static str),

    /// The component is not in a state that allows the operation.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    /// An amount is zero, below the caller's minimum, or exceeds a balance.
    #[error("insufficient amount: {0}")]
    InsufficientAmount(&'static str),

    /// A trade exceeds the configured maximum swap size.
    #[error("swap exceeds the maximum allowed size")]
    SwapLimitExceeded,

    /// A liquidity deposit does not respect the pool ratio.
    #[error("invalid ratio: {0}")]
    InvalidRatio(&'static str),

    /// A token is not part of the pool or not registered in the ledger.
    #[error("invalid token: {0}")]
    InvalidToken(&'static str),

    /// A configuration parameter is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(&'static str),

    /// No staking lot exists under the given id.
    #[error("staking lot {0} not found")]
    LotNotFound(u64),

    /// Arithmetic overflow.
    #[error("arithmetic overflow: {0}")]
    Overflow(&'static str),

    /// Arithmetic underflow.
    #[error("arithmetic underflow: {0}")]
    Underflow(&'static str),

    /// Division by zero.
    #[error("division by zero: {0}")]
    DivisionByZero(&'static str),
}

impl AmmError {
    /// Returns the coarse category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::Paused | Self::Locked(_) | Self::InvalidState(_) => ErrorKind::InvalidState,
            Self::InsufficientAmount(_) | Self::SwapLimitExceeded | Self::LotNotFound(_) => {
                ErrorKind::InsufficientAmount
            }
            Self::InvalidRatio(_) => ErrorKind::InvalidRatio,
            Self::InvalidToken(_) | Self::InvalidConfiguration(_) => ErrorKind::InvalidState,
            Self::Overflow(_) | Self::Underflow(_) | Self::DivisionByZero(_) => {
                ErrorKind::Arithmetic
            }
        }
    }
}

/// A specialized `Result` type for tidepool operations.
pub type Result<T> = core::result::Result<T, AmmError>;
