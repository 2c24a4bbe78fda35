//! # Persisted Escrow Record
//!
//! The instance state that outlives a single process: the three fixed roles,
//! the earmarked amount, the custody balance, and the two lifecycle flags.
//! The reentrancy latch is never persisted; a record always describes an
//! escrow at rest.

use escrow_core::{Amount, EscrowId, PartyId};
use serde::{Deserialize, Serialize};

use crate::error::RecordError;
use crate::escrow::{EscrowState, Role};

/// Serializable snapshot of one escrow instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowRecord {
    /// Instance identifier.
    pub id: EscrowId,
    /// Creator and funder.
    pub depositor: PartyId,
    /// Payee on release.
    pub beneficiary: PartyId,
    /// Decision maker.
    pub arbiter: PartyId,
    /// Value earmarked for transfer.
    pub amount: Amount,
    /// Value in custody.
    pub held: Amount,
    /// Between deposit and resolution.
    pub funded: bool,
    /// Resolution has happened.
    pub withdrawn: bool,
}

impl EscrowRecord {
    /// Check the engine invariants.
    ///
    /// - beneficiary and arbiter are not the null identity;
    /// - `funded` implies a non-zero amount and not `withdrawn`;
    /// - not `funded` implies a zero amount;
    /// - custody equals the earmarked amount.
    pub fn validate(&self) -> Result<(), RecordError> {
        if self.beneficiary.is_null() {
            return Err(RecordError::NullParty {
                role: Role::Beneficiary,
            });
        }
        if self.arbiter.is_null() {
            return Err(RecordError::NullParty {
                role: Role::Arbiter,
            });
        }
        if self.funded && self.withdrawn {
            return Err(RecordError::FundedAfterWithdrawal);
        }
        if self.funded && self.amount.is_zero() {
            return Err(RecordError::FundedWithoutAmount);
        }
        if !self.funded && !self.amount.is_zero() {
            return Err(RecordError::AmountWithoutFunding {
                amount: self.amount,
            });
        }
        if self.held != self.amount {
            return Err(RecordError::HeldMismatch {
                held: self.held,
                amount: self.amount,
            });
        }
        Ok(())
    }

    /// Lifecycle state described by the flags.
    pub fn state(&self) -> EscrowState {
        EscrowState::from_flags(self.funded, self.withdrawn)
    }
}
