//! # Staking Migration End-to-End
//!
//! Drives the escrow through the legacy staking system the way a stake
//! owner would: stake, migrate in batches, wait out the cooldown, recover.
//! Covers both deployment configurations (explicit staking address and
//! deployer-bound source).

use std::sync::Arc;

use smc_core::{Address, Amount, Clock, ManualClock, Timestamp};
use smc_escrow::{
    CooldownDuration, DeployContext, EscrowConfig, EscrowError, EscrowEvent, EscrowPhase,
    InMemoryToken, LegacyStaking, MigrationEscrow, SourceBinding, StakingError, TokenCustody,
};

const DAY: u64 = 86_400;
const START: i64 = 1_700_000_000;

fn addr(byte: u8) -> Address {
    Address::from_bytes([byte; 20])
}

fn token_addr() -> Address {
    addr(0x70)
}
fn owner() -> Address {
    addr(0x01)
}
fn dest() -> Address {
    addr(0x02)
}
fn staking_addr() -> Address {
    addr(0x03)
}
fn deployer() -> Address {
    addr(0x04)
}
fn manager() -> Address {
    addr(0x05)
}

fn e18(n: u128) -> Amount {
    format!("{n}e18").parse().unwrap()
}

struct Deployment {
    clock: Arc<ManualClock>,
    token: InMemoryToken,
    staking: LegacyStaking,
    escrow: MigrationEscrow<Arc<ManualClock>>,
}

impl Deployment {
    /// Deploy an escrow, a staking system at the escrow's authorized source,
    /// and stake 100e18 for the owner.
    fn new(binding: SourceBinding) -> Self {
        let clock = Arc::new(ManualClock::new(Timestamp::from_unix_seconds(START).unwrap()));
        let config = EscrowConfig::new(
            token_addr(),
            owner(),
            dest(),
            binding,
            CooldownDuration::from_days(14),
        );
        let escrow =
            MigrationEscrow::deploy(&config, DeployContext::new(deployer(), 0), clock.clone())
                .unwrap();

        let mut token = InMemoryToken::new(token_addr());
        token.mint(&owner(), e18(100)).unwrap();
        let mut staking = LegacyStaking::new(escrow.authorized_source(), manager());
        staking.stake(&owner(), e18(100), &mut token).unwrap();
        staking
            .add_migration_destination(&manager(), &escrow.custody_address())
            .unwrap();

        Self {
            clock,
            token,
            staking,
            escrow,
        }
    }

    fn migrate(&mut self, amount: Amount) -> Result<EscrowEvent, StakingError> {
        self.staking
            .migrate_staked_tokens(&owner(), &mut self.escrow, amount, &mut self.token)
    }

    fn recover(&mut self, caller: &Address) -> Result<EscrowEvent, EscrowError> {
        self.escrow.recover_tokens(caller, &mut self.token)
    }

    fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Two 10e18 batches, one hour apart.
    fn two_batches(&mut self) -> (Timestamp, Timestamp) {
        self.migrate(e18(10)).unwrap();
        let first_expiry = self.escrow.cooldown_expiry().unwrap();
        self.clock.advance(3_600);
        self.migrate(e18(10)).unwrap();
        let second_expiry = self.escrow.cooldown_expiry().unwrap();
        (first_expiry, second_expiry)
    }
}

// ── Scenario 1: two batches accumulate and re-arm the cooldown ──────

#[test]
fn two_batches_accumulate_and_rearm() {
    let mut d = Deployment::new(SourceBinding::Explicit(staking_addr()));

    let first = d.migrate(e18(10)).unwrap();
    assert_eq!(
        first,
        EscrowEvent::AcceptedMigration {
            source_owner: owner(),
            amount: e18(10),
            total: e18(10),
        }
    );
    assert_eq!(d.escrow.total_accumulated(), e18(10));
    let first_expiry = d.escrow.cooldown_expiry().unwrap();

    d.clock.advance(60);
    let second = d.migrate(e18(10)).unwrap();
    assert_eq!(
        second,
        EscrowEvent::AcceptedMigration {
            source_owner: owner(),
            amount: e18(10),
            total: e18(20),
        }
    );
    assert_eq!(d.escrow.total_accumulated(), e18(20));
    let second_expiry = d.escrow.cooldown_expiry().unwrap();
    assert!(second_expiry > first_expiry);
    assert_eq!(
        second_expiry.unix_seconds(),
        START + 60 + (14 * DAY) as i64
    );
    assert_eq!(d.token.balance_of(&d.escrow.custody_address()), e18(20));
    assert_eq!(d.staking.stake_balance_of(&owner()), e18(80));
}

// ── Scenario 2: recovery before the cooldown elapses ────────────────

#[test]
fn recover_before_cooldown_fails() {
    let mut d = Deployment::new(SourceBinding::Explicit(staking_addr()));
    let (_, expiry) = d.two_batches();

    d.clock.advance(14 * DAY - 3_600 - 1);
    let err = d.recover(&owner()).unwrap_err();
    assert_eq!(
        err,
        EscrowError::CooldownNotElapsed {
            now: d.now(),
            expiry,
        }
    );
    assert_eq!(d.escrow.total_accumulated(), e18(20));
    assert_eq!(d.escrow.phase(), EscrowPhase::Accumulating);
}

// ── Scenario 3: recovery after the cooldown elapses ─────────────────

#[test]
fn recover_after_cooldown_releases_everything() {
    let mut d = Deployment::new(SourceBinding::Explicit(staking_addr()));
    d.two_batches();
    let dest_before = d.token.balance_of(&dest());

    d.clock.advance(14 * DAY);
    assert_eq!(d.escrow.phase(), EscrowPhase::Ready);
    let event = d.recover(&owner()).unwrap();
    assert_eq!(
        event,
        EscrowEvent::TokensRecovered {
            caller: owner(),
            dest: dest(),
            amount: e18(20),
        }
    );
    assert_eq!(d.escrow.total_accumulated(), Amount::ZERO);
    assert_eq!(d.token.balance_of(&dest()), dest_before.checked_add(e18(20)).unwrap());
    assert_eq!(d.token.balance_of(&d.escrow.custody_address()), Amount::ZERO);
    assert_eq!(d.escrow.phase(), EscrowPhase::Empty);

    // A second recovery in immediate succession has nothing left to move.
    assert_eq!(d.recover(&owner()).unwrap_err(), EscrowError::NothingToRecover);
}

#[test]
fn recover_exactly_at_expiry_succeeds() {
    let mut d = Deployment::new(SourceBinding::Explicit(staking_addr()));
    let (_, expiry) = d.two_batches();
    d.clock.set(expiry);
    assert!(d.recover(&owner()).is_ok());
}

// ── Scenario 4: nothing to recover on a fresh escrow ────────────────

#[test]
fn fresh_escrow_has_nothing_to_recover() {
    let mut d = Deployment::new(SourceBinding::Explicit(staking_addr()));
    d.clock.advance(365 * DAY);
    assert_eq!(d.recover(&owner()).unwrap_err(), EscrowError::NothingToRecover);
    assert!(d.escrow.events().is_empty());
}

// ── Scenario 5: only the authorized source may credit ───────────────

#[test]
fn direct_accept_from_other_identity_is_unauthorized() {
    let mut d = Deployment::new(SourceBinding::Explicit(staking_addr()));
    d.migrate(e18(10)).unwrap();
    let snapshot = d.escrow.snapshot();

    for caller in [owner(), dest(), deployer(), manager()] {
        let err = d
            .escrow
            .accept_migration(&caller, &owner(), e18(10))
            .unwrap_err();
        assert!(matches!(err, EscrowError::Unauthorized { .. }));
    }
    assert_eq!(d.escrow.snapshot(), snapshot);
}

#[test]
fn recover_by_anyone_but_owner_is_unauthorized() {
    let mut d = Deployment::new(SourceBinding::Explicit(staking_addr()));
    d.two_batches();
    d.clock.advance(14 * DAY);
    let err = d.recover(&dest()).unwrap_err();
    assert!(matches!(err, EscrowError::Unauthorized { .. }));
    assert_eq!(d.escrow.total_accumulated(), e18(20));
}

// ── Deployer-bound configuration ────────────────────────────────────

#[test]
fn deployer_bound_escrow_accepts_from_deployer() {
    let mut d = Deployment::new(SourceBinding::Deployer);
    assert_eq!(d.escrow.authorized_source(), deployer());
    assert_eq!(d.staking.address(), deployer());

    d.two_batches();
    assert_eq!(d.escrow.total_accumulated(), e18(20));

    let err = d
        .escrow
        .accept_migration(&staking_addr(), &owner(), e18(1))
        .unwrap_err();
    assert!(matches!(err, EscrowError::Unauthorized { .. }));
}

// ── Collaborator failures propagate unchanged ───────────────────────

#[test]
fn staking_failures_surface_to_caller() {
    let mut d = Deployment::new(SourceBinding::Explicit(staking_addr()));

    let err = d.migrate(e18(101)).unwrap_err();
    assert!(err.to_string().contains("exceeds staked token balance"));

    let err = d
        .staking
        .migrate_staked_tokens(&dest(), &mut d.escrow, e18(1), &mut d.token)
        .unwrap_err();
    assert!(err.to_string().contains("no staked tokens"));

    let err = d.migrate(Amount::ZERO).unwrap_err();
    assert!(matches!(
        err,
        StakingError::Escrow(EscrowError::InvalidAmount { .. })
    ));
    assert_eq!(d.escrow.total_accumulated(), Amount::ZERO);
    assert_eq!(d.staking.stake_balance_of(&owner()), e18(100));
}

#[test]
fn migrating_full_stake_then_more_fails() {
    let mut d = Deployment::new(SourceBinding::Explicit(staking_addr()));
    d.migrate(e18(100)).unwrap();
    let err = d.migrate(e18(1)).unwrap_err();
    assert_eq!(err, StakingError::NoStakedTokens { owner: owner() });
}

#[test]
fn cycle_repeats_after_recovery() {
    let mut d = Deployment::new(SourceBinding::Explicit(staking_addr()));
    d.two_batches();
    d.clock.advance(14 * DAY);
    d.recover(&owner()).unwrap();

    d.migrate(e18(5)).unwrap();
    assert_eq!(d.escrow.total_accumulated(), e18(5));
    assert_eq!(d.escrow.phase(), EscrowPhase::Accumulating);
    d.clock.advance(14 * DAY);
    d.recover(&owner()).unwrap();
    assert_eq!(d.token.balance_of(&dest()), e18(25));
    assert_eq!(d.escrow.events().len(), 5);
}
