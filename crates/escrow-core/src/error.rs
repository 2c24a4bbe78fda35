//! # Error Types
//!
//! Errors raised while constructing core primitives from untrusted input
//! (command-line arguments, config files, persisted records).

use thiserror::Error;

/// Error constructing a core primitive.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A party identity string could not be parsed.
    #[error("invalid party identity {input:?}: {reason}")]
    InvalidParty {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// An amount string could not be parsed.
    #[error("invalid amount {input:?}: {reason}")]
    InvalidAmount {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Arithmetic on amounts overflowed or underflowed.
    #[error("amount arithmetic {op} overflowed: {lhs} {op} {rhs}")]
    AmountOverflow {
        /// The operation attempted (`+` or `-`).
        op: &'static str,
        /// Left operand.
        lhs: u64,
        /// Right operand.
        rhs: u64,
    },
}
