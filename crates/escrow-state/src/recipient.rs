//! # Payable Recipients
//!
//! The engine never moves value itself. Every payout is handed to a
//! [`PayableRecipient`], which stands for the transfer mechanism together
//! with whatever logic the receiving party runs on acceptance. Its result
//! is observable: `Ok(())` means the value arrived, any error means it did
//! not and the engine rolls back.
//!
//! The recipient is passed the escrow itself, so an implementation can call
//! back into the engine synchronously while the payout is in flight. The
//! engine must stay correct under that reentrancy.
//!
//! [`AccountBook`] is the in-memory host used by the CLI and the test suite:
//! a balance per party plus a configurable set of parties that refuse
//! payments.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use escrow_core::{Amount, EscrowId, PartyId};
use serde::{Deserialize, Serialize};

use crate::error::TransferError;
use crate::escrow::{Escrow, Resolution};

/// One outbound value transfer from an escrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// The paying escrow.
    pub escrow: EscrowId,
    /// The receiving party.
    pub to: PartyId,
    /// Value transferred.
    pub amount: Amount,
    /// Which resolution triggered the payout.
    pub resolution: Resolution,
}

/// A party (or transfer rail) able to receive value from an escrow.
pub trait PayableRecipient {
    /// Accept `payment`, or report why it could not be accepted.
    ///
    /// `escrow` is the paying instance. Implementations may call its
    /// operations; the engine rejects any state change attempted this way.
    fn receive(&self, escrow: &Escrow, payment: &Payment) -> Result<(), TransferError>;
}

impl<T: PayableRecipient + ?Sized> PayableRecipient for Rc<T> {
    fn receive(&self, escrow: &Escrow, payment: &Payment) -> Result<(), TransferError> {
        (**self).receive(escrow, payment)
    }
}

/// In-memory balances for every party, acting as the host ledger.
#[derive(Debug, Default)]
pub struct AccountBook {
    balances: RefCell<BTreeMap<PartyId, Amount>>,
    rejecting: RefCell<BTreeSet<PartyId>>,
}

impl AccountBook {
    /// Create an empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a book seeded with opening balances.
    pub fn with_balances(balances: impl IntoIterator<Item = (PartyId, Amount)>) -> Self {
        Self {
            balances: RefCell::new(balances.into_iter().collect()),
            rejecting: RefCell::new(BTreeSet::new()),
        }
    }

    /// Current balance of `party` (zero if never seen).
    pub fn balance_of(&self, party: &PartyId) -> Amount {
        self.balances
            .borrow()
            .get(party)
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    /// Snapshot of every non-default balance.
    pub fn balances(&self) -> BTreeMap<PartyId, Amount> {
        self.balances.borrow().clone()
    }

    /// Add `amount` to `party`.
    pub fn credit(&self, party: PartyId, amount: Amount) -> Result<(), TransferError> {
        let mut balances = self.balances.borrow_mut();
        let entry = balances.entry(party).or_insert(Amount::ZERO);
        *entry = entry
            .checked_add(amount)
            .map_err(|e| TransferError::Unavailable(e.to_string()))?;
        Ok(())
    }

    /// Remove `amount` from `party`.
    ///
    /// # Errors
    ///
    /// `InsufficientFunds` if the balance is smaller than `amount`; the
    /// balance is left untouched.
    pub fn debit(&self, party: PartyId, amount: Amount) -> Result<(), TransferError> {
        let mut balances = self.balances.borrow_mut();
        let balance = balances.get(&party).copied().unwrap_or(Amount::ZERO);
        let remaining = balance
            .checked_sub(amount)
            .map_err(|_| TransferError::InsufficientFunds {
                party,
                balance,
                requested: amount,
            })?;
        balances.insert(party, remaining);
        Ok(())
    }

    /// Make `party` refuse every future payment.
    pub fn reject_payments_to(&self, party: PartyId) {
        self.rejecting.borrow_mut().insert(party);
    }

    /// Make `party` accept payments again.
    pub fn accept_payments_to(&self, party: &PartyId) {
        self.rejecting.borrow_mut().remove(party);
    }

    /// Whether `party` currently refuses payments.
    pub fn is_rejecting(&self, party: &PartyId) -> bool {
        self.rejecting.borrow().contains(party)
    }

    /// Sum of all balances, saturating at the maximum amount.
    pub fn total(&self) -> Amount {
        Amount::new(
            self.balances
                .borrow()
                .values()
                .fold(0u64, |acc, a| acc.saturating_add(a.units())),
        )
    }
}

impl PayableRecipient for AccountBook {
    fn receive(&self, _escrow: &Escrow, payment: &Payment) -> Result<(), TransferError> {
        if self.is_rejecting(&payment.to) {
            return Err(TransferError::Rejected {
                to: payment.to,
                reason: "recipient does not accept payments".to_string(),
            });
        }
        self.credit(payment.to, payment.amount)
    }
}
