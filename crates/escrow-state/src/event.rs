//! # Escrow Notifications and Audit Trail
//!
//! `EscrowEvent` is the observable notification emitted by a successful
//! deposit, release, or refund. `EscrowTransitionRecord` is the audit entry
//! appended on every lifecycle transition.
//!
//! Both logs are journaled with the rest of the escrow state: entries
//! appended during an operation that later fails are discarded together
//! with its state mutations.

use escrow_core::{Amount, PartyId, Timestamp};
use serde::{Deserialize, Serialize};

use crate::escrow::EscrowState;

/// A notification emitted by the escrow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EscrowEvent {
    /// The depositor funded the escrow.
    Deposited {
        /// The depositor.
        from: PartyId,
        /// Value placed in escrow.
        amount: Amount,
    },
    /// The arbiter released the funds to the beneficiary.
    Released {
        /// The beneficiary.
        to: PartyId,
        /// Value paid out.
        amount: Amount,
    },
    /// The arbiter returned the funds to the depositor.
    Refunded {
        /// The depositor.
        to: PartyId,
        /// Value paid out.
        amount: Amount,
    },
}

impl EscrowEvent {
    /// Event name as used in logs and CLI output.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Deposited { .. } => "Deposited",
            Self::Released { .. } => "Released",
            Self::Refunded { .. } => "Refunded",
        }
    }

    /// The value carried by the event.
    pub fn amount(&self) -> Amount {
        match self {
            Self::Deposited { amount, .. }
            | Self::Released { amount, .. }
            | Self::Refunded { amount, .. } => *amount,
        }
    }
}

impl std::fmt::Display for EscrowEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Deposited { from, amount } => write!(f, "Deposited(from={from}, amount={amount})"),
            Self::Released { to, amount } => write!(f, "Released(to={to}, amount={amount})"),
            Self::Refunded { to, amount } => write!(f, "Refunded(to={to}, amount={amount})"),
        }
    }
}

/// Record of an escrow lifecycle transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowTransitionRecord {
    /// State before the transition.
    pub from_state: EscrowState,
    /// State after the transition.
    pub to_state: EscrowState,
    /// The caller that caused the transition.
    pub actor: PartyId,
    /// When the transition occurred.
    pub timestamp: Timestamp,
}
