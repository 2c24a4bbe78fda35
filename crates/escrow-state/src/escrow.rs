//! # Escrow Engine
//!
//! A single-use, three-party escrow: the depositor funds it once, the
//! arbiter resolves it once, either releasing the value to the beneficiary
//! or refunding it to the depositor.
//!
//! ## States
//!
//! ```text
//! Created ──deposit──▶ Funded ──release──▶ Resolved (terminal)
//!                         │
//!                         └─────refund────▶ Resolved (terminal)
//! ```
//!
//! The lifecycle state is derived from the ledger flags: `withdrawn` means
//! Resolved, otherwise `funded` means Funded, otherwise Created. There is no
//! path back from Resolved and no second funding cycle.
//!
//! ## Transfer Discipline
//!
//! `release()` and `refund()` follow a fixed order:
//!
//! 1. acquire the reentrancy latch (`ReentrancyGuard`);
//! 2. check caller and funding preconditions;
//! 3. snapshot the ledger, then write the terminal state (`withdrawn`,
//!    `!funded`, zero amount) **before** any value leaves;
//! 4. hand the payout to the [`PayableRecipient`];
//! 5. on failure restore the snapshot and truncate the event and transition
//!    logs to their pre-call length, then return `TransferFailed`. The
//!    restore runs from a drop guard, so a panicking recipient is rolled
//!    back too.
//!
//! A recipient that calls back into the engine during step 4 observes the
//! terminal state and the held latch, so nothing it attempts can succeed.
//!
//! ## Design Decision
//!
//! State is derived from flags rather than encoded as typestate. Recipients
//! re-enter through `&Escrow` while a payout is in flight, so every
//! operation takes `&self` and the mutable ledger lives in a `Cell`. No
//! `RefCell` borrow is held across the recipient call.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use escrow_core::{Amount, EscrowId, PartyId, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::{EscrowError, RecordError};
use crate::event::{EscrowEvent, EscrowTransitionRecord};
use crate::guard::ReentrancyGuard;
use crate::recipient::{PayableRecipient, Payment};
use crate::record::EscrowRecord;

// ─── Roles and Resolutions ───────────────────────────────────────────

/// A party role fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Funds the escrow; receives the value back on refund.
    Depositor,
    /// Receives the value on release.
    Beneficiary,
    /// Decides between release and refund.
    Arbiter,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Depositor => "depositor",
            Self::Beneficiary => "beneficiary",
            Self::Arbiter => "arbiter",
        };
        f.write_str(s)
    }
}

/// The two ways an arbiter can resolve a funded escrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Pay the beneficiary.
    Release,
    /// Pay the depositor back.
    Refund,
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Release => f.write_str("release"),
            Self::Refund => f.write_str("refund"),
        }
    }
}

// ─── Lifecycle State ─────────────────────────────────────────────────

/// The lifecycle state of an escrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EscrowState {
    /// Constructed, not yet funded.
    Created,
    /// Holding value awaiting the arbiter's decision.
    Funded,
    /// Paid out by release or refund (terminal).
    Resolved,
}

impl EscrowState {
    /// Derive the state from the ledger flags. `withdrawn` wins over `funded`.
    pub fn from_flags(funded: bool, withdrawn: bool) -> Self {
        if withdrawn {
            Self::Resolved
        } else if funded {
            Self::Funded
        } else {
            Self::Created
        }
    }

    /// Whether this state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved)
    }
}

impl std::fmt::Display for EscrowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Created => "CREATED",
            Self::Funded => "FUNDED",
            Self::Resolved => "RESOLVED",
        };
        f.write_str(s)
    }
}

// ─── Ledger ──────────────────────────────────────────────────────────

/// The mutable part of an escrow. `Copy` so a whole-ledger snapshot is a
/// plain value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Ledger {
    amount: Amount,
    held: Amount,
    funded: bool,
    withdrawn: bool,
}

impl Ledger {
    const EMPTY: Ledger = Ledger {
        amount: Amount::ZERO,
        held: Amount::ZERO,
        funded: false,
        withdrawn: false,
    };

    fn state(&self) -> EscrowState {
        EscrowState::from_flags(self.funded, self.withdrawn)
    }
}

// ─── Rollback ────────────────────────────────────────────────────────

/// Pre-payout snapshot of an escrow. Restores the ledger and truncates both
/// logs when dropped, unless disarmed after the payout succeeded. Dropping
/// covers the error return and unwinding out of a panicking recipient.
struct Rollback<'a> {
    escrow: &'a Escrow,
    snapshot: Ledger,
    events_mark: usize,
    transitions_mark: usize,
    armed: bool,
}

impl<'a> Rollback<'a> {
    fn arm(escrow: &'a Escrow, snapshot: Ledger) -> Self {
        Self {
            escrow,
            snapshot,
            events_mark: escrow.events.borrow().len(),
            transitions_mark: escrow.transitions.borrow().len(),
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for Rollback<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        self.escrow.ledger.set(self.snapshot);
        if let Ok(mut events) = self.escrow.events.try_borrow_mut() {
            events.truncate(self.events_mark);
        }
        if let Ok(mut transitions) = self.escrow.transitions.try_borrow_mut() {
            transitions.truncate(self.transitions_mark);
        }
    }
}

// ─── Escrow ──────────────────────────────────────────────────────────

/// One escrow instance with fixed roles and its own ledger.
pub struct Escrow {
    id: EscrowId,
    depositor: PartyId,
    beneficiary: PartyId,
    arbiter: PartyId,
    ledger: Cell<Ledger>,
    guard: ReentrancyGuard,
    events: RefCell<Vec<EscrowEvent>>,
    transitions: RefCell<Vec<EscrowTransitionRecord>>,
    recipient: Rc<dyn PayableRecipient>,
}

impl std::fmt::Debug for Escrow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Escrow")
            .field("id", &self.id)
            .field("depositor", &self.depositor)
            .field("beneficiary", &self.beneficiary)
            .field("arbiter", &self.arbiter)
            .field("ledger", &self.ledger.get())
            .field("guard", &self.guard)
            .finish_non_exhaustive()
    }
}

impl Escrow {
    /// Construct an escrow. The caller becomes the depositor.
    ///
    /// # Errors
    ///
    /// `InvalidParty` if `beneficiary` or `arbiter` is the null identity.
    pub fn new(
        caller: PartyId,
        beneficiary: PartyId,
        arbiter: PartyId,
        recipient: Rc<dyn PayableRecipient>,
    ) -> Result<Self, EscrowError> {
        if beneficiary.is_null() {
            return Err(EscrowError::InvalidParty {
                role: Role::Beneficiary,
            });
        }
        if arbiter.is_null() {
            return Err(EscrowError::InvalidParty {
                role: Role::Arbiter,
            });
        }

        let escrow = Self::assemble(
            EscrowId::new(),
            caller,
            beneficiary,
            arbiter,
            Ledger::EMPTY,
            recipient,
        );
        tracing::info!(
            escrow = %escrow.id,
            depositor = %caller,
            beneficiary = %beneficiary,
            arbiter = %arbiter,
            "escrow constructed"
        );
        Ok(escrow)
    }

    /// Rebuild an escrow from a persisted record.
    ///
    /// The event and transition logs start empty; they are not part of the
    /// persisted instance state.
    ///
    /// # Errors
    ///
    /// Any [`RecordError`] reported by [`EscrowRecord::validate`].
    pub fn from_record(
        record: &EscrowRecord,
        recipient: Rc<dyn PayableRecipient>,
    ) -> Result<Self, RecordError> {
        record.validate()?;
        let ledger = Ledger {
            amount: record.amount,
            held: record.held,
            funded: record.funded,
            withdrawn: record.withdrawn,
        };
        Ok(Self::assemble(
            record.id,
            record.depositor,
            record.beneficiary,
            record.arbiter,
            ledger,
            recipient,
        ))
    }

    fn assemble(
        id: EscrowId,
        depositor: PartyId,
        beneficiary: PartyId,
        arbiter: PartyId,
        ledger: Ledger,
        recipient: Rc<dyn PayableRecipient>,
    ) -> Self {
        Self {
            id,
            depositor,
            beneficiary,
            arbiter,
            ledger: Cell::new(ledger),
            guard: ReentrancyGuard::new(),
            events: RefCell::new(Vec::new()),
            transitions: RefCell::new(Vec::new()),
            recipient,
        }
    }

    // ── Operations ───────────────────────────────────────────────────

    /// Fund the escrow (CREATED → FUNDED).
    ///
    /// Checks, in order: the caller is the depositor; the escrow has never
    /// been funded; `value` is non-zero.
    pub fn deposit(&self, caller: PartyId, value: Amount) -> Result<(), EscrowError> {
        tracing::debug!(escrow = %self.id, %caller, %value, "deposit requested");

        if caller != self.depositor {
            return Err(EscrowError::Unauthorized {
                caller,
                required: Role::Depositor,
            });
        }
        let ledger = self.ledger.get();
        if ledger.funded || ledger.withdrawn {
            return Err(EscrowError::AlreadyFunded);
        }
        if value.is_zero() {
            return Err(EscrowError::ZeroValue);
        }

        self.ledger.set(Ledger {
            amount: value,
            held: value,
            funded: true,
            withdrawn: false,
        });
        self.emit(EscrowEvent::Deposited {
            from: caller,
            amount: value,
        });
        self.record_transition(EscrowState::Created, EscrowState::Funded, caller);

        tracing::info!(escrow = %self.id, from = %caller, amount = %value, "escrow funded");
        Ok(())
    }

    /// Pay the held value to the beneficiary (FUNDED → RESOLVED).
    ///
    /// Returns the amount paid.
    pub fn release(&self, caller: PartyId) -> Result<Amount, EscrowError> {
        self.resolve(caller, Resolution::Release)
    }

    /// Pay the held value back to the depositor (FUNDED → RESOLVED).
    ///
    /// Returns the amount paid.
    pub fn refund(&self, caller: PartyId) -> Result<Amount, EscrowError> {
        self.resolve(caller, Resolution::Refund)
    }

    /// Value currently held in custody by this escrow.
    pub fn view_balance(&self) -> Amount {
        self.ledger.get().held
    }

    fn resolve(&self, caller: PartyId, resolution: Resolution) -> Result<Amount, EscrowError> {
        let _latch = match self.guard.enter(resolution) {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(escrow = %self.id, %caller, error = %e, "reentrant call rejected");
                return Err(e);
            }
        };
        tracing::debug!(escrow = %self.id, %caller, %resolution, "resolution requested");

        if caller != self.arbiter {
            return Err(EscrowError::Unauthorized {
                caller,
                required: Role::Arbiter,
            });
        }
        let snapshot = self.ledger.get();
        if !snapshot.funded {
            return Err(EscrowError::NotFunded);
        }
        if snapshot.withdrawn {
            return Err(EscrowError::NotFunded);
        }

        let payee = self.payee(resolution);
        let payout = snapshot.amount;
        let held = snapshot.held.checked_sub(payout)?;
        let rollback = Rollback::arm(self, snapshot);

        // Terminal state is committed before the recipient runs.
        self.ledger.set(Ledger {
            amount: Amount::ZERO,
            held,
            funded: false,
            withdrawn: true,
        });

        let payment = Payment {
            escrow: self.id,
            to: payee,
            amount: payout,
            resolution,
        };
        if let Err(source) = self.recipient.receive(self, &payment) {
            drop(rollback);
            tracing::warn!(
                escrow = %self.id,
                to = %payee,
                amount = %payout,
                %resolution,
                error = %source,
                "transfer failed, escrow rolled back"
            );
            return Err(EscrowError::TransferFailed {
                to: payee,
                amount: payout,
                source,
            });
        }

        self.emit(match resolution {
            Resolution::Release => EscrowEvent::Released {
                to: payee,
                amount: payout,
            },
            Resolution::Refund => EscrowEvent::Refunded {
                to: payee,
                amount: payout,
            },
        });
        self.record_transition(EscrowState::Funded, EscrowState::Resolved, caller);
        rollback.disarm();

        tracing::info!(escrow = %self.id, to = %payee, amount = %payout, %resolution, "escrow resolved");
        Ok(payout)
    }

    fn payee(&self, resolution: Resolution) -> PartyId {
        match resolution {
            Resolution::Release => self.beneficiary,
            Resolution::Refund => self.depositor,
        }
    }

    fn emit(&self, event: EscrowEvent) {
        tracing::debug!(escrow = %self.id, %event, "event emitted");
        self.events.borrow_mut().push(event);
    }

    fn record_transition(&self, from: EscrowState, to: EscrowState, actor: PartyId) {
        self.transitions.borrow_mut().push(EscrowTransitionRecord {
            from_state: from,
            to_state: to,
            actor,
            timestamp: Timestamp::now(),
        });
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn id(&self) -> EscrowId {
        self.id
    }

    pub fn depositor(&self) -> PartyId {
        self.depositor
    }

    pub fn beneficiary(&self) -> PartyId {
        self.beneficiary
    }

    pub fn arbiter(&self) -> PartyId {
        self.arbiter
    }

    /// Value earmarked for transfer; zero unless funded.
    pub fn amount(&self) -> Amount {
        self.ledger.get().amount
    }

    pub fn is_funded(&self) -> bool {
        self.ledger.get().funded
    }

    pub fn is_withdrawn(&self) -> bool {
        self.ledger.get().withdrawn
    }

    /// Current lifecycle state.
    pub fn state(&self) -> EscrowState {
        self.ledger.get().state()
    }

    /// Whether a release or refund is currently on the call stack.
    pub fn is_resolving(&self) -> bool {
        self.guard.is_entered()
    }

    /// Events emitted since construction (or since rebuilding from a record).
    pub fn events(&self) -> Vec<EscrowEvent> {
        self.events.borrow().clone()
    }

    /// Transition log since construction (or since rebuilding from a record).
    pub fn transitions(&self) -> Vec<EscrowTransitionRecord> {
        self.transitions.borrow().clone()
    }

    /// Persistable snapshot of the instance state.
    pub fn record(&self) -> EscrowRecord {
        let ledger = self.ledger.get();
        EscrowRecord {
            id: self.id,
            depositor: self.depositor,
            beneficiary: self.beneficiary,
            arbiter: self.arbiter,
            amount: ledger.amount,
            held: ledger.held,
            funded: ledger.funded,
            withdrawn: ledger.withdrawn,
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EscrowErrorKind, TransferError};
    use crate::recipient::AccountBook;

    struct Parties {
        depositor: PartyId,
        beneficiary: PartyId,
        arbiter: PartyId,
    }

    fn parties() -> Parties {
        Parties {
            depositor: PartyId::new(),
            beneficiary: PartyId::new(),
            arbiter: PartyId::new(),
        }
    }

    fn make_escrow() -> (Escrow, Parties, Rc<AccountBook>) {
        let p = parties();
        let book = Rc::new(AccountBook::new());
        let escrow = Escrow::new(p.depositor, p.beneficiary, p.arbiter, book.clone()).unwrap();
        (escrow, p, book)
    }

    fn make_funded_escrow(value: u64) -> (Escrow, Parties, Rc<AccountBook>) {
        let (escrow, p, book) = make_escrow();
        escrow.deposit(p.depositor, Amount::new(value)).unwrap();
        (escrow, p, book)
    }

    // ── Construction ─────────────────────────────────────────────────

    #[test]
    fn test_new_escrow_is_created() {
        let (e, p, _) = make_escrow();
        assert_eq!(e.state(), EscrowState::Created);
        assert_eq!(e.depositor(), p.depositor);
        assert_eq!(e.beneficiary(), p.beneficiary);
        assert_eq!(e.arbiter(), p.arbiter);
        assert_eq!(e.amount(), Amount::ZERO);
        assert_eq!(e.view_balance(), Amount::ZERO);
        assert!(!e.is_funded());
        assert!(!e.is_withdrawn());
        assert!(e.events().is_empty());
    }

    #[test]
    fn test_null_beneficiary_rejected() {
        let p = parties();
        let err = Escrow::new(p.depositor, PartyId::NULL, p.arbiter, Rc::new(AccountBook::new()))
            .unwrap_err();
        match err {
            EscrowError::InvalidParty { role } => assert_eq!(role, Role::Beneficiary),
            other => panic!("Expected InvalidParty, got: {other:?}"),
        }
    }

    #[test]
    fn test_null_arbiter_rejected() {
        let p = parties();
        let err = Escrow::new(p.depositor, p.beneficiary, PartyId::NULL, Rc::new(AccountBook::new()))
            .unwrap_err();
        match err {
            EscrowError::InvalidParty { role } => assert_eq!(role, Role::Arbiter),
            other => panic!("Expected InvalidParty, got: {other:?}"),
        }
    }

    // ── Deposit ──────────────────────────────────────────────────────

    #[test]
    fn test_deposit_funds_escrow() {
        let (e, p, _) = make_escrow();
        e.deposit(p.depositor, Amount::new(100)).unwrap();
        assert_eq!(e.state(), EscrowState::Funded);
        assert_eq!(e.amount(), Amount::new(100));
        assert_eq!(e.view_balance(), Amount::new(100));
        assert!(e.is_funded());
        assert_eq!(
            e.events(),
            vec![EscrowEvent::Deposited {
                from: p.depositor,
                amount: Amount::new(100)
            }]
        );
    }

    #[test]
    fn test_deposit_by_non_depositor_rejected() {
        let (e, p, _) = make_escrow();
        for caller in [p.beneficiary, p.arbiter, PartyId::new()] {
            let err = e.deposit(caller, Amount::new(1)).unwrap_err();
            assert_eq!(err.kind(), EscrowErrorKind::Unauthorized);
        }
        assert_eq!(e.state(), EscrowState::Created);
    }

    #[test]
    fn test_zero_deposit_rejected_and_state_unchanged() {
        let (e, p, _) = make_escrow();
        let err = e.deposit(p.depositor, Amount::ZERO).unwrap_err();
        assert_eq!(err.kind(), EscrowErrorKind::ZeroValue);
        assert!(!e.is_funded());
        assert_eq!(e.amount(), Amount::ZERO);
        assert!(e.events().is_empty());
    }

    #[test]
    fn test_second_deposit_rejected_regardless_of_value() {
        let (e, p, _) = make_funded_escrow(100);
        for value in [0, 1, 100, 5_000] {
            let err = e.deposit(p.depositor, Amount::new(value)).unwrap_err();
            assert_eq!(err.kind(), EscrowErrorKind::AlreadyFunded);
        }
        assert_eq!(e.amount(), Amount::new(100));
    }

    #[test]
    fn test_deposit_after_resolution_rejected() {
        let (e, p, _) = make_funded_escrow(100);
        e.refund(p.arbiter).unwrap();
        let err = e.deposit(p.depositor, Amount::new(50)).unwrap_err();
        assert_eq!(err.kind(), EscrowErrorKind::AlreadyFunded);
        assert_eq!(e.state(), EscrowState::Resolved);
    }

    // ── Release / refund ─────────────────────────────────────────────

    #[test]
    fn test_release_pays_beneficiary() {
        let (e, p, book) = make_funded_escrow(100);
        let paid = e.release(p.arbiter).unwrap();
        assert_eq!(paid, Amount::new(100));
        assert_eq!(e.state(), EscrowState::Resolved);
        assert_eq!(e.amount(), Amount::ZERO);
        assert_eq!(e.view_balance(), Amount::ZERO);
        assert!(!e.is_funded());
        assert!(e.is_withdrawn());
        assert_eq!(book.balance_of(&p.beneficiary), Amount::new(100));
        assert_eq!(book.balance_of(&p.depositor), Amount::ZERO);
        assert_eq!(
            e.events().last(),
            Some(&EscrowEvent::Released {
                to: p.beneficiary,
                amount: Amount::new(100)
            })
        );
    }

    #[test]
    fn test_refund_pays_depositor() {
        let (e, p, book) = make_funded_escrow(70);
        e.refund(p.arbiter).unwrap();
        assert_eq!(book.balance_of(&p.depositor), Amount::new(70));
        assert_eq!(book.balance_of(&p.beneficiary), Amount::ZERO);
        assert_eq!(
            e.events().last(),
            Some(&EscrowEvent::Refunded {
                to: p.depositor,
                amount: Amount::new(70)
            })
        );
    }

    #[test]
    fn test_release_by_non_arbiter_rejected() {
        let (e, p, _) = make_funded_escrow(100);
        for caller in [p.depositor, p.beneficiary] {
            assert_eq!(
                e.release(caller).unwrap_err().kind(),
                EscrowErrorKind::Unauthorized
            );
            assert_eq!(
                e.refund(caller).unwrap_err().kind(),
                EscrowErrorKind::Unauthorized
            );
        }
        assert_eq!(e.state(), EscrowState::Funded);
    }

    #[test]
    fn test_release_before_deposit_not_funded() {
        let (e, p, _) = make_escrow();
        assert_eq!(e.release(p.arbiter).unwrap_err().kind(), EscrowErrorKind::NotFunded);
        assert_eq!(e.refund(p.arbiter).unwrap_err().kind(), EscrowErrorKind::NotFunded);
    }

    #[test]
    fn test_second_release_not_funded() {
        let (e, p, book) = make_funded_escrow(100);
        e.release(p.arbiter).unwrap();
        assert_eq!(e.release(p.arbiter).unwrap_err().kind(), EscrowErrorKind::NotFunded);
        assert_eq!(book.balance_of(&p.beneficiary), Amount::new(100));
    }

    #[test]
    fn test_refund_after_release_not_funded() {
        let (e, p, book) = make_funded_escrow(100);
        e.release(p.arbiter).unwrap();
        assert_eq!(e.refund(p.arbiter).unwrap_err().kind(), EscrowErrorKind::NotFunded);
        assert_eq!(book.balance_of(&p.depositor), Amount::ZERO);
    }

    #[test]
    fn test_latch_free_after_each_call() {
        let (e, p, _) = make_funded_escrow(100);
        assert!(e.release(p.depositor).is_err());
        assert!(!e.is_resolving());
        e.release(p.arbiter).unwrap();
        assert!(!e.is_resolving());
    }

    // ── Rollback ─────────────────────────────────────────────────────

    #[test]
    fn test_rejected_transfer_rolls_back() {
        let (e, p, book) = make_funded_escrow(100);
        book.reject_payments_to(p.beneficiary);
        let before = e.record();
        let events_before = e.events();

        let err = e.release(p.arbiter).unwrap_err();
        match err {
            EscrowError::TransferFailed { to, amount, source } => {
                assert_eq!(to, p.beneficiary);
                assert_eq!(amount, Amount::new(100));
                assert!(matches!(source, TransferError::Rejected { .. }));
            }
            other => panic!("Expected TransferFailed, got: {other:?}"),
        }
        assert_eq!(e.record(), before);
        assert_eq!(e.events(), events_before);
        assert_eq!(e.transitions().len(), 1);
        assert!(!e.is_resolving());

        // Still usable: the other resolution succeeds.
        e.refund(p.arbiter).unwrap();
        assert_eq!(book.balance_of(&p.depositor), Amount::new(100));
    }

    /// Panics instead of accepting or refusing the payment.
    struct PanickingRecipient;

    impl PayableRecipient for PanickingRecipient {
        fn receive(&self, _escrow: &Escrow, _payment: &Payment) -> Result<(), TransferError> {
            panic!("recipient aborted");
        }
    }

    #[test]
    fn test_panicking_recipient_rolls_back() {
        let p = parties();
        let e = Escrow::new(p.depositor, p.beneficiary, p.arbiter, Rc::new(PanickingRecipient))
            .unwrap();
        e.deposit(p.depositor, Amount::new(100)).unwrap();
        let before = e.record();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| e.release(p.arbiter)));
        assert!(result.is_err());

        assert_eq!(e.record(), before);
        assert_eq!(e.state(), EscrowState::Funded);
        assert_eq!(e.view_balance(), Amount::new(100));
        assert_eq!(e.events().len(), 1);
        assert_eq!(e.transitions().len(), 1);
        assert!(!e.is_resolving());
    }

    // ── Transition log ───────────────────────────────────────────────

    #[test]
    fn test_transition_log_records_lifecycle() {
        let (e, p, _) = make_funded_escrow(10);
        e.release(p.arbiter).unwrap();
        let log = e.transitions();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].from_state, EscrowState::Created);
        assert_eq!(log[0].to_state, EscrowState::Funded);
        assert_eq!(log[0].actor, p.depositor);
        assert_eq!(log[1].from_state, EscrowState::Funded);
        assert_eq!(log[1].to_state, EscrowState::Resolved);
        assert_eq!(log[1].actor, p.arbiter);
    }

    // ── Records ──────────────────────────────────────────────────────

    #[test]
    fn test_from_record_restores_state() {
        let (e, p, book) = make_funded_escrow(42);
        let record = e.record();
        let rebuilt = Escrow::from_record(&record, book.clone()).unwrap();
        assert_eq!(rebuilt.id(), e.id());
        assert_eq!(rebuilt.state(), EscrowState::Funded);
        assert_eq!(rebuilt.view_balance(), Amount::new(42));
        rebuilt.release(p.arbiter).unwrap();
        assert_eq!(book.balance_of(&p.beneficiary), Amount::new(42));
    }

    // ── Display ──────────────────────────────────────────────────────

    #[test]
    fn test_state_display() {
        assert_eq!(EscrowState::Created.to_string(), "CREATED");
        assert_eq!(EscrowState::Funded.to_string(), "FUNDED");
        assert_eq!(EscrowState::Resolved.to_string(), "RESOLVED");
        assert!(EscrowState::Resolved.is_terminal());
        assert!(!EscrowState::Funded.is_terminal());
    }

    #[test]
    fn test_error_display_names_role() {
        let (e, p, _) = make_funded_escrow(1);
        let err = e.release(p.beneficiary).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("caller {} is not the arbiter", p.beneficiary)
        );
    }
}
