//! # Escrow Errors
//!
//! Every error here is a rejection of the requested operation with no
//! partial effect. The engine never retries; the caller decides.
//!
//! State machine errors name the caller, the role that was required, or
//! the recipient involved, so a rejected call can be diagnosed from the
//! error alone.

use escrow_core::{Amount, CoreError, PartyId};
use thiserror::Error;

use crate::escrow::{Resolution, Role};

/// Rejection of an escrow operation.
#[derive(Error, Debug)]
pub enum EscrowError {
    /// Construction with a null beneficiary or arbiter.
    #[error("{role} must not be the null identity")]
    InvalidParty {
        /// The role that was given the null identity.
        role: Role,
    },

    /// Caller does not hold the role the operation requires.
    #[error("caller {caller} is not the {required}")]
    Unauthorized {
        /// Who called.
        caller: PartyId,
        /// The role the operation is restricted to.
        required: Role,
    },

    /// Deposit attempted after the escrow was already funded once.
    #[error("escrow has already been funded")]
    AlreadyFunded,

    /// Deposit attempted with a zero value.
    #[error("deposit value must be greater than zero")]
    ZeroValue,

    /// Release or refund attempted while the escrow holds nothing.
    #[error("escrow is not funded")]
    NotFunded,

    /// The outbound transfer did not succeed; all state was rolled back.
    #[error("transfer of {amount} to {to} failed: {source}")]
    TransferFailed {
        /// Intended recipient.
        to: PartyId,
        /// Value that was to be transferred.
        amount: Amount,
        /// Why the recipient or transfer mechanism refused.
        #[source]
        source: TransferError,
    },

    /// A release or refund was invoked while one is already on the call stack.
    #[error("reentrant {attempted} rejected while {active} is in progress")]
    ReentrantCall {
        /// The operation that tried to enter.
        attempted: Resolution,
        /// The operation holding the latch.
        active: Resolution,
    },

    /// Internal ledger arithmetic failed. Unreachable while the ledger
    /// invariants hold.
    #[error("ledger arithmetic failed: {0}")]
    Ledger(#[from] CoreError),
}

/// Fieldless discriminant of [`EscrowError`], for matching in callers and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EscrowErrorKind {
    InvalidParty,
    Unauthorized,
    AlreadyFunded,
    ZeroValue,
    NotFunded,
    TransferFailed,
    ReentrantCall,
    Ledger,
}

impl EscrowError {
    /// The kind of this error without its context.
    pub fn kind(&self) -> EscrowErrorKind {
        match self {
            Self::InvalidParty { .. } => EscrowErrorKind::InvalidParty,
            Self::Unauthorized { .. } => EscrowErrorKind::Unauthorized,
            Self::AlreadyFunded => EscrowErrorKind::AlreadyFunded,
            Self::ZeroValue => EscrowErrorKind::ZeroValue,
            Self::NotFunded => EscrowErrorKind::NotFunded,
            Self::TransferFailed { .. } => EscrowErrorKind::TransferFailed,
            Self::ReentrantCall { .. } => EscrowErrorKind::ReentrantCall,
            Self::Ledger(_) => EscrowErrorKind::Ledger,
        }
    }
}

/// Failure reported by a payable recipient or the transfer mechanism.
#[derive(Error, Debug)]
pub enum TransferError {
    /// The recipient refused the payment.
    #[error("recipient {to} rejected the payment: {reason}")]
    Rejected {
        /// The refusing recipient.
        to: PartyId,
        /// Recipient-supplied reason.
        reason: String,
    },

    /// A payer does not hold enough value to cover a debit.
    #[error("{party} holds {balance}, cannot pay {requested}")]
    InsufficientFunds {
        /// The party being debited.
        party: PartyId,
        /// Its current balance.
        balance: Amount,
        /// The amount requested.
        requested: Amount,
    },

    /// The recipient attempted to re-enter the escrow and propagated the
    /// rejection it received.
    #[error("recipient propagated a failed reentrant call: {0}")]
    Reentered(#[source] Box<EscrowError>),

    /// The transfer mechanism itself failed.
    #[error("transfer mechanism unavailable: {0}")]
    Unavailable(String),
}

/// A persisted escrow record violates the engine's invariants.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// A role that must be a real party holds the null identity.
    #[error("record assigns the null identity to the {role}")]
    NullParty {
        /// The offending role.
        role: Role,
    },

    /// `funded` is set but nothing is earmarked.
    #[error("record is funded but holds a zero amount")]
    FundedWithoutAmount,

    /// An amount is earmarked while the escrow is not funded.
    #[error("record is not funded but earmarks {amount}")]
    AmountWithoutFunding {
        /// The stray amount.
        amount: Amount,
    },

    /// `funded` and `withdrawn` are both set.
    #[error("record is both funded and withdrawn")]
    FundedAfterWithdrawal,

    /// Custody balance differs from the earmarked amount.
    #[error("record holds {held} in custody but earmarks {amount}")]
    HeldMismatch {
        /// Custody balance.
        held: Amount,
        /// Earmarked amount.
        amount: Amount,
    },
}
