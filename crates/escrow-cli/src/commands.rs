//! # Escrow Subcommands
//!
//! One handler per engine operation. Each handler works on a single state
//! file:
//!
//! - `deploy` — Construct a new escrow (caller becomes the depositor).
//! - `deposit` — Fund it from the depositor's host balance.
//! - `release` — Arbiter pays the beneficiary.
//! - `refund` — Arbiter pays the depositor back.
//! - `balance` — Value currently held.
//! - `status` — Roles, flags, logs, and host balances.
//!
//! A failed operation leaves the state file untouched.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::Serialize;

use escrow_core::{Amount, EscrowId, PartyId};
use escrow_state::{
    AccountBook, Escrow, EscrowEvent, EscrowState, EscrowTransitionRecord, Resolution,
};

use crate::config::EscrowConfig;
use crate::state::StateFile;

/// Resolved inputs shared by every subcommand.
#[derive(Debug, Clone)]
pub struct CliContext {
    /// Effective configuration.
    pub config: EscrowConfig,
    /// State file operated on.
    pub state_file: PathBuf,
}

impl CliContext {
    /// Combine a loaded config with an optional `--state` override.
    pub fn new(config: EscrowConfig, state_override: Option<&Path>) -> Self {
        let state_file = config.state_file(state_override);
        Self { config, state_file }
    }
}

/// Arguments for `escrow deploy`.
#[derive(Args, Debug)]
pub struct DeployArgs {
    /// Creator of the escrow; becomes the depositor.
    #[arg(long = "from")]
    pub depositor: PartyId,
    /// Party paid on release.
    #[arg(long)]
    pub beneficiary: PartyId,
    /// Party allowed to release or refund.
    #[arg(long)]
    pub arbiter: PartyId,
}

/// Arguments for `escrow deposit`.
#[derive(Args, Debug)]
pub struct DepositArgs {
    /// Calling party.
    #[arg(long = "from")]
    pub caller: PartyId,
    /// Value to place in escrow.
    #[arg(long)]
    pub value: Amount,
}

/// Arguments for `escrow release` and `escrow refund`.
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Calling party.
    #[arg(long = "from")]
    pub caller: PartyId,
}

/// Arguments for `escrow status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

/// Construct a new escrow and persist it.
pub fn cmd_deploy(ctx: &CliContext, args: &DeployArgs) -> Result<u8> {
    if ctx.state_file.exists() {
        bail!("escrow already deployed at {}", ctx.state_file.display());
    }

    let book = Rc::new(AccountBook::with_balances(
        ctx.config.opening_balances.clone(),
    ));
    let escrow = Escrow::new(args.depositor, args.beneficiary, args.arbiter, book.clone())
        .context("deploy failed")?;

    StateFile::deployed(&escrow, &book).save(&ctx.state_file)?;

    println!("OK: deployed escrow {} in {} state", escrow.id(), escrow.state());
    Ok(0)
}

/// Fund the escrow from the caller's host balance.
pub fn cmd_deposit(ctx: &CliContext, args: &DepositArgs) -> Result<u8> {
    let mut state = StateFile::load(&ctx.state_file)?;
    let book = state.book(&ctx.config.rejecting_parties);
    let escrow = state.engine(book.clone())?;

    // Engine preconditions take precedence over the host balance check.
    escrow
        .deposit(args.caller, args.value)
        .context("deposit failed")?;
    book.debit(args.caller, args.value)
        .context("deposit failed")?;

    state.absorb(&escrow, &book);
    state.save(&ctx.state_file)?;

    println!("OK: escrow {} funded with {}", escrow.id(), args.value);
    Ok(0)
}

/// Resolve the escrow by release or refund.
pub fn cmd_resolve(ctx: &CliContext, args: &ResolveArgs, resolution: Resolution) -> Result<u8> {
    let mut state = StateFile::load(&ctx.state_file)?;
    let book = state.book(&ctx.config.rejecting_parties);
    let escrow = state.engine(book.clone())?;

    let (paid, payee) = match resolution {
        Resolution::Release => (escrow.release(args.caller), escrow.beneficiary()),
        Resolution::Refund => (escrow.refund(args.caller), escrow.depositor()),
    };
    let paid = paid.with_context(|| format!("{resolution} failed"))?;

    state.absorb(&escrow, &book);
    state.save(&ctx.state_file)?;

    println!("OK: escrow {} paid {paid} to {payee} ({resolution})", escrow.id());
    Ok(0)
}

/// Print the value currently held.
pub fn cmd_balance(ctx: &CliContext) -> Result<u8> {
    let state = StateFile::load(&ctx.state_file)?;
    let escrow = state.engine(state.book(&[]))?;
    println!("{}", escrow.view_balance());
    Ok(0)
}

/// Machine-readable view of one escrow.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub id: EscrowId,
    pub state: EscrowState,
    pub depositor: PartyId,
    pub beneficiary: PartyId,
    pub arbiter: PartyId,
    pub amount: Amount,
    pub balance: Amount,
    pub funded: bool,
    pub withdrawn: bool,
    pub events: Vec<EscrowEvent>,
    pub transitions: Vec<EscrowTransitionRecord>,
    pub host_balances: BTreeMap<PartyId, Amount>,
}

impl StatusReport {
    fn from_state(state: &StateFile, escrow: &Escrow) -> Self {
        Self {
            id: escrow.id(),
            state: escrow.state(),
            depositor: escrow.depositor(),
            beneficiary: escrow.beneficiary(),
            arbiter: escrow.arbiter(),
            amount: escrow.amount(),
            balance: escrow.view_balance(),
            funded: escrow.is_funded(),
            withdrawn: escrow.is_withdrawn(),
            events: state.events.clone(),
            transitions: state.transitions.clone(),
            host_balances: state.balances.clone(),
        }
    }
}

/// Show the escrow's roles, flags, and history.
pub fn cmd_status(ctx: &CliContext, args: &StatusArgs) -> Result<u8> {
    let state = StateFile::load(&ctx.state_file)?;
    let escrow = state.engine(state.book(&[]))?;
    let report = StatusReport::from_state(&state, &escrow);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(0);
    }

    println!("Escrow: {}", report.id);
    println!("  State: {}", report.state);
    println!("  Depositor: {}", report.depositor);
    println!("  Beneficiary: {}", report.beneficiary);
    println!("  Arbiter: {}", report.arbiter);
    println!("  Amount: {}", report.amount);
    println!("  Balance: {}", report.balance);
    println!("  Funded: {}  Withdrawn: {}", report.funded, report.withdrawn);
    println!("  Created: {}", state.created_at);
    println!("  Updated: {}", state.updated_at);
    println!("  Events: {}", report.events.len());
    for (i, e) in report.events.iter().enumerate() {
        println!("    [{i}] {e}");
    }
    println!("  Transitions: {}", report.transitions.len());
    for (i, t) in report.transitions.iter().enumerate() {
        println!(
            "    [{i}] {} → {} by {} at {}",
            t.from_state, t.to_state, t.actor, t.timestamp
        );
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Parties {
        depositor: PartyId,
        beneficiary: PartyId,
        arbiter: PartyId,
    }

    fn setup(dir: &Path, opening: u64) -> (CliContext, Parties) {
        let parties = Parties {
            depositor: PartyId::new(),
            beneficiary: PartyId::new(),
            arbiter: PartyId::new(),
        };
        let mut config = EscrowConfig::default();
        config
            .opening_balances
            .insert(parties.depositor, Amount::new(opening));
        let ctx = CliContext::new(config, Some(&dir.join("escrow.json")));
        let code = cmd_deploy(
            &ctx,
            &DeployArgs {
                depositor: parties.depositor,
                beneficiary: parties.beneficiary,
                arbiter: parties.arbiter,
            },
        )
        .unwrap();
        assert_eq!(code, 0);
        (ctx, parties)
    }

    fn deposit(ctx: &CliContext, caller: PartyId, value: u64) -> Result<u8> {
        cmd_deposit(
            ctx,
            &DepositArgs {
                caller,
                value: Amount::new(value),
            },
        )
    }

    fn load(ctx: &CliContext) -> StateFile {
        StateFile::load(&ctx.state_file).unwrap()
    }

    // ── Deploy ───────────────────────────────────────────────────────

    #[test]
    fn test_deploy_writes_created_escrow() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, p) = setup(dir.path(), 100);
        let state = load(&ctx);
        assert_eq!(state.record.state(), EscrowState::Created);
        assert_eq!(state.record.depositor, p.depositor);
        assert_eq!(state.balances.get(&p.depositor), Some(&Amount::new(100)));
        assert!(state.events.is_empty());
    }

    #[test]
    fn test_deploy_twice_fails() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, p) = setup(dir.path(), 0);
        let err = cmd_deploy(
            &ctx,
            &DeployArgs {
                depositor: p.depositor,
                beneficiary: p.beneficiary,
                arbiter: p.arbiter,
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("already deployed"));
    }

    #[test]
    fn test_deploy_null_arbiter_fails_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = CliContext::new(EscrowConfig::default(), Some(&dir.path().join("e.json")));
        let err = cmd_deploy(
            &ctx,
            &DeployArgs {
                depositor: PartyId::new(),
                beneficiary: PartyId::new(),
                arbiter: PartyId::NULL,
            },
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("deploy failed"));
        assert!(!ctx.state_file.exists());
    }

    // ── Deposit ──────────────────────────────────────────────────────

    #[test]
    fn test_deposit_moves_host_funds_into_escrow() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, p) = setup(dir.path(), 100);
        deposit(&ctx, p.depositor, 60).unwrap();

        let state = load(&ctx);
        assert_eq!(state.record.amount, Amount::new(60));
        assert!(state.record.funded);
        assert_eq!(state.balances.get(&p.depositor), Some(&Amount::new(40)));
        assert_eq!(state.events.len(), 1);
        assert_eq!(state.transitions.len(), 1);
    }

    #[test]
    fn test_deposit_insufficient_host_funds_leaves_file() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, p) = setup(dir.path(), 10);
        let before = std::fs::read_to_string(&ctx.state_file).unwrap();

        assert!(deposit(&ctx, p.depositor, 11).is_err());
        assert_eq!(std::fs::read_to_string(&ctx.state_file).unwrap(), before);
    }

    #[test]
    fn test_deposit_rejected_by_engine_keeps_host_balance() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, p) = setup(dir.path(), 100);
        deposit(&ctx, p.depositor, 30).unwrap();

        let err = deposit(&ctx, p.depositor, 30).unwrap_err();
        assert!(format!("{err:#}").contains("already been funded"));
        let state = load(&ctx);
        assert_eq!(state.balances.get(&p.depositor), Some(&Amount::new(70)));
        assert_eq!(state.record.amount, Amount::new(30));
    }

    #[test]
    fn test_deposit_by_stranger_unauthorized_before_funds_check() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, _) = setup(dir.path(), 100);
        let before = std::fs::read_to_string(&ctx.state_file).unwrap();

        let err = deposit(&ctx, PartyId::new(), 5).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("is not the depositor"), "got: {message}");
        assert_eq!(std::fs::read_to_string(&ctx.state_file).unwrap(), before);
    }

    #[test]
    fn test_redeposit_with_empty_balance_reports_already_funded() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, p) = setup(dir.path(), 40);
        deposit(&ctx, p.depositor, 40).unwrap();

        let err = deposit(&ctx, p.depositor, 10).unwrap_err();
        assert!(format!("{err:#}").contains("already been funded"));
    }

    // ── Release / Refund ─────────────────────────────────────────────

    #[test]
    fn test_release_pays_beneficiary() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, p) = setup(dir.path(), 100);
        deposit(&ctx, p.depositor, 100).unwrap();
        cmd_resolve(&ctx, &ResolveArgs { caller: p.arbiter }, Resolution::Release).unwrap();

        let state = load(&ctx);
        assert_eq!(state.record.state(), EscrowState::Resolved);
        assert_eq!(state.balances.get(&p.beneficiary), Some(&Amount::new(100)));
        assert_eq!(state.balances.get(&p.depositor), Some(&Amount::ZERO));
        assert_eq!(state.events.len(), 2);
        assert_eq!(state.transitions.len(), 2);

        let err = cmd_resolve(&ctx, &ResolveArgs { caller: p.arbiter }, Resolution::Refund)
            .unwrap_err();
        assert!(format!("{err:#}").contains("refund failed"));
    }

    #[test]
    fn test_refund_pays_depositor() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, p) = setup(dir.path(), 100);
        deposit(&ctx, p.depositor, 25).unwrap();
        cmd_resolve(&ctx, &ResolveArgs { caller: p.arbiter }, Resolution::Refund).unwrap();

        let state = load(&ctx);
        assert_eq!(state.balances.get(&p.depositor), Some(&Amount::new(100)));
        assert!(state.record.withdrawn);
    }

    #[test]
    fn test_unauthorized_release_leaves_file() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, p) = setup(dir.path(), 100);
        deposit(&ctx, p.depositor, 100).unwrap();
        let before = std::fs::read_to_string(&ctx.state_file).unwrap();

        let err = cmd_resolve(
            &ctx,
            &ResolveArgs {
                caller: p.beneficiary,
            },
            Resolution::Release,
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("release failed"));
        assert_eq!(std::fs::read_to_string(&ctx.state_file).unwrap(), before);
    }

    #[test]
    fn test_rejecting_beneficiary_then_refund() {
        let dir = tempfile::tempdir().unwrap();
        let (mut ctx, p) = setup(dir.path(), 100);
        deposit(&ctx, p.depositor, 100).unwrap();
        ctx.config.rejecting_parties.push(p.beneficiary);

        assert!(cmd_resolve(&ctx, &ResolveArgs { caller: p.arbiter }, Resolution::Release).is_err());
        assert_eq!(load(&ctx).record.state(), EscrowState::Funded);

        cmd_resolve(&ctx, &ResolveArgs { caller: p.arbiter }, Resolution::Refund).unwrap();
        let state = load(&ctx);
        assert_eq!(state.balances.get(&p.depositor), Some(&Amount::new(100)));
        assert_eq!(state.balances.get(&p.beneficiary), None);
    }

    // ── Read-only ────────────────────────────────────────────────────

    #[test]
    fn test_balance_and_status_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, p) = setup(dir.path(), 100);
        deposit(&ctx, p.depositor, 5).unwrap();
        assert_eq!(cmd_balance(&ctx).unwrap(), 0);
        assert_eq!(cmd_status(&ctx, &StatusArgs { json: false }).unwrap(), 0);
        assert_eq!(cmd_status(&ctx, &StatusArgs { json: true }).unwrap(), 0);
    }

    #[test]
    fn test_status_report_json_shape() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, p) = setup(dir.path(), 100);
        deposit(&ctx, p.depositor, 5).unwrap();

        let state = load(&ctx);
        let escrow = state.engine(state.book(&[])).unwrap();
        let json = serde_json::to_value(StatusReport::from_state(&state, &escrow)).unwrap();
        assert_eq!(json["state"], "Funded");
        assert_eq!(json["balance"], 5);
        assert_eq!(json["events"][0]["event"], "deposited");
    }

    #[test]
    fn test_commands_without_deploy_fail() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = CliContext::new(EscrowConfig::default(), Some(&dir.path().join("none.json")));
        assert!(cmd_balance(&ctx).is_err());
        assert!(deposit(&ctx, PartyId::new(), 1).is_err());
    }
}
