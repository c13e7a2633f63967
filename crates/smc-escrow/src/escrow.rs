//! # Migration Escrow
//!
//! Holds migrated stake on behalf of a stake owner until a cooldown has
//! passed, then releases it to the destination.
//!
//! ## Phases
//!
//! The phase is derived from the accumulated total and the cooldown expiry,
//! never stored:
//!
//! ```text
//!          accept_migration            accept_migration (re-arms)
//!  EMPTY ────────────────────▶ ACCUMULATING ◀──────┐
//!    ▲                              │  └────────────┘
//!    │                     clock passes expiry
//!    │                              ▼
//!    └──── recover_tokens ─────── READY
//! ```
//!
//! ## Security Invariant
//!
//! Every operation reads the clock once, then checks authorization, then
//! validates, and only then mutates. A rejected call leaves every field as
//! it was. The ledger and cooldown timer are private to this crate, so
//! there is no way to credit the escrow except through the authorized
//! `accept_migration` path.

use serde::{Deserialize, Serialize};

use smc_core::{Address, Amount, Clock, Timestamp};

use crate::config::{ConfigError, DeployContext, EscrowConfig};
use crate::cooldown::{CooldownDuration, CooldownTimer};
use crate::custody::TokenCustody;
use crate::error::{EscrowError, Operation};
use crate::event::{EscrowEvent, EventRecord};
use crate::guard::require_caller;
use crate::ledger::AccumulatorLedger;

/// The derived lifecycle phase of an escrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EscrowPhase {
    /// Nothing accumulated.
    Empty,
    /// Funds accumulated, cooldown still running.
    Accumulating,
    /// Funds accumulated, cooldown elapsed.
    Ready,
}

impl EscrowPhase {
    /// The canonical phase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "EMPTY",
            Self::Accumulating => "ACCUMULATING",
            Self::Ready => "READY",
        }
    }
}

impl std::fmt::Display for EscrowPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The persisted form of an escrow account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EscrowSnapshot {
    /// The migrated token.
    pub token: Address,
    /// Identity allowed to accept migrations.
    pub authorized_source: Address,
    /// Identity allowed to recover, and the beneficiary.
    pub stake_owner: Address,
    /// Receiver of recovered tokens.
    pub dest_address: Address,
    /// Configured cooldown.
    pub cooldown_seconds: CooldownDuration,
    /// The escrow's own holder address in the token ledger.
    pub custody_address: Address,
    /// Credited but not yet recovered.
    pub total_accumulated: Amount,
    /// Set by the most recent accepted migration.
    pub cooldown_expiry: Option<Timestamp>,
    /// Every event emitted so far.
    #[serde(default)]
    pub events: Vec<EventRecord>,
}

/// A staking migration escrow account.
#[derive(Debug)]
pub struct MigrationEscrow<C: Clock> {
    token: Address,
    authorized_source: Address,
    stake_owner: Address,
    dest_address: Address,
    custody_address: Address,
    ledger: AccumulatorLedger,
    timer: CooldownTimer,
    events: Vec<EventRecord>,
    clock: C,
}

impl<C: Clock> MigrationEscrow<C> {
    /// Deploy a new escrow.
    ///
    /// The authorized source is resolved against `context.deployer`, and the
    /// custody address is derived from the deployment context.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the configuration does not validate.
    pub fn deploy(
        config: &EscrowConfig,
        context: DeployContext,
        clock: C,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let cooldown = config.cooldown()?;
        let authorized_source = config.source_binding().resolve(&context.deployer);
        let escrow = Self {
            token: config.token,
            authorized_source,
            stake_owner: config.stake_owner,
            dest_address: config.dest_address,
            custody_address: context.custody_address(),
            ledger: AccumulatorLedger::new(),
            timer: CooldownTimer::new(cooldown),
            events: Vec::new(),
            clock,
        };
        tracing::info!(
            custody = %escrow.custody_address,
            token = %escrow.token,
            authorized_source = %escrow.authorized_source,
            stake_owner = %escrow.stake_owner,
            dest = %escrow.dest_address,
            cooldown = %cooldown,
            "migration escrow deployed"
        );
        Ok(escrow)
    }

    /// Rebuild an escrow from its persisted form.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSnapshot`] if a non-zero total has no
    /// cooldown expiry, or the event log is out of sequence.
    pub fn restore(snapshot: EscrowSnapshot, clock: C) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidSnapshot {
            reason: reason.to_string(),
        };
        if !snapshot.total_accumulated.is_zero() && snapshot.cooldown_expiry.is_none() {
            return Err(invalid("non-zero total without a cooldown expiry"));
        }
        let in_sequence = snapshot
            .events
            .iter()
            .enumerate()
            .all(|(i, record)| record.sequence == i as u64);
        if !in_sequence {
            return Err(invalid("event log sequence numbers are not contiguous"));
        }
        Ok(Self {
            token: snapshot.token,
            authorized_source: snapshot.authorized_source,
            stake_owner: snapshot.stake_owner,
            dest_address: snapshot.dest_address,
            custody_address: snapshot.custody_address,
            ledger: AccumulatorLedger::restore(snapshot.total_accumulated),
            timer: CooldownTimer::restore(snapshot.cooldown_seconds, snapshot.cooldown_expiry),
            events: snapshot.events,
            clock,
        })
    }

    /// Capture the persisted form.
    pub fn snapshot(&self) -> EscrowSnapshot {
        EscrowSnapshot {
            token: self.token,
            authorized_source: self.authorized_source,
            stake_owner: self.stake_owner,
            dest_address: self.dest_address,
            cooldown_seconds: self.timer.duration(),
            custody_address: self.custody_address,
            total_accumulated: self.ledger.total(),
            cooldown_expiry: self.timer.expiry(),
            events: self.events.clone(),
        }
    }

    // ── Operations ──────────────────────────────────────────────────

    /// Credit a migrated batch for `source_owner`.
    ///
    /// Only the authorized source (the legacy staking system) may call
    /// this, and only after it has placed `amount` tokens in escrow
    /// custody. Re-arms the cooldown from the current clock reading on
    /// every call.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowError::Unauthorized`] for any other caller and
    /// [`EscrowError::InvalidAmount`] for a zero or overflowing amount.
    pub fn accept_migration(
        &mut self,
        caller: &Address,
        source_owner: &Address,
        amount: Amount,
    ) -> Result<EscrowEvent, EscrowError> {
        let now = self.clock.now();
        let result = require_caller(caller, &self.authorized_source, Operation::AcceptMigration)
            .and_then(|()| self.ledger.credit(amount));
        let total = match result {
            Ok(total) => total,
            Err(e) => return Err(self.rejected(Operation::AcceptMigration, caller, e)),
        };
        let expiry = self.timer.arm(now);

        let event = EscrowEvent::AcceptedMigration {
            source_owner: *source_owner,
            amount,
            total,
        };
        self.emit(now, event.clone());
        tracing::info!(
            custody = %self.custody_address,
            source_owner = %source_owner,
            %amount,
            %total,
            cooldown_expiry = %expiry,
            "accepted migration"
        );
        Ok(event)
    }

    /// Release the accumulated total to the destination.
    ///
    /// Only the stake owner may call this, only when something has been
    /// accumulated, and only once the cooldown has elapsed. The transfer is
    /// issued through `custody` before the ledger is drained, so a custody
    /// failure leaves the escrow untouched.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowError::Unauthorized`], [`EscrowError::NothingToRecover`],
    /// [`EscrowError::CooldownNotElapsed`], [`EscrowError::TokenMismatch`] if
    /// `custody` manages another token, or [`EscrowError::Custody`].
    pub fn recover_tokens<T: TokenCustody + ?Sized>(
        &mut self,
        caller: &Address,
        custody: &mut T,
    ) -> Result<EscrowEvent, EscrowError> {
        let now = self.clock.now();
        let amount = match self
            .check_recoverable(caller, now)
            .and_then(|amount| self.check_custody(&*custody).map(|()| amount))
        {
            Ok(amount) => amount,
            Err(e) => return Err(self.rejected(Operation::RecoverTokens, caller, e)),
        };
        if let Err(e) = custody.transfer(&self.custody_address, &self.dest_address, amount) {
            return Err(self.rejected(Operation::RecoverTokens, caller, e.into()));
        }
        let drained = self.ledger.drain()?;
        debug_assert_eq!(drained, amount);

        let event = EscrowEvent::TokensRecovered {
            caller: *caller,
            dest: self.dest_address,
            amount: drained,
        };
        self.emit(now, event.clone());
        tracing::info!(
            custody = %self.custody_address,
            dest = %self.dest_address,
            amount = %drained,
            "tokens recovered"
        );
        Ok(event)
    }

    fn check_recoverable(&self, caller: &Address, now: Timestamp) -> Result<Amount, EscrowError> {
        require_caller(caller, &self.stake_owner, Operation::RecoverTokens)?;
        if self.ledger.is_empty() {
            return Err(EscrowError::NothingToRecover);
        }
        if !self.timer.has_elapsed(now) {
            return Err(EscrowError::CooldownNotElapsed {
                now,
                expiry: self.timer.expiry().unwrap_or(Timestamp::MAX),
            });
        }
        Ok(self.ledger.total())
    }

    /// Require that `custody` manages the token this escrow was deployed for.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowError::TokenMismatch`] otherwise.
    pub fn check_custody<T: TokenCustody + ?Sized>(&self, custody: &T) -> Result<(), EscrowError> {
        let actual = custody.token();
        if actual != self.token {
            return Err(EscrowError::TokenMismatch {
                expected: self.token,
                actual,
            });
        }
        Ok(())
    }

    fn emit(&mut self, now: Timestamp, event: EscrowEvent) {
        let sequence = self.events.len() as u64;
        self.events.push(EventRecord {
            sequence,
            emitted_at: now,
            event,
        });
    }

    fn rejected(&self, operation: Operation, caller: &Address, error: EscrowError) -> EscrowError {
        tracing::warn!(
            custody = %self.custody_address,
            %operation,
            %caller,
            %error,
            "escrow operation rejected"
        );
        error
    }

    // ── Accessors ───────────────────────────────────────────────────

    /// The migrated token.
    pub fn token(&self) -> Address {
        self.token
    }

    /// The configured cooldown.
    pub fn cooldown(&self) -> CooldownDuration {
        self.timer.duration()
    }

    /// The identity allowed to accept migrations (the legacy staking system).
    #[doc(alias = "staking_contract")]
    pub fn authorized_source(&self) -> Address {
        self.authorized_source
    }

    /// The beneficiary and the only identity allowed to recover.
    #[doc(alias = "src_address")]
    pub fn stake_owner(&self) -> Address {
        self.stake_owner
    }

    /// The receiver of recovered tokens.
    pub fn dest_address(&self) -> Address {
        self.dest_address
    }

    /// The escrow's own holder address in the token ledger.
    pub fn custody_address(&self) -> Address {
        self.custody_address
    }

    /// Tokens credited and not yet recovered.
    #[doc(alias = "total_staked_amount")]
    pub fn total_accumulated(&self) -> Amount {
        self.ledger.total()
    }

    /// The instant recovery becomes possible; `None` before the first
    /// accepted migration.
    pub fn cooldown_expiry(&self) -> Option<Timestamp> {
        self.timer.expiry()
    }

    /// The phase at the current clock reading.
    pub fn phase(&self) -> EscrowPhase {
        self.phase_at(self.clock.now())
    }

    /// The phase at `now`.
    pub fn phase_at(&self, now: Timestamp) -> EscrowPhase {
        if self.ledger.is_empty() {
            EscrowPhase::Empty
        } else if self.timer.has_elapsed(now) {
            EscrowPhase::Ready
        } else {
            EscrowPhase::Accumulating
        }
    }

    /// Every event emitted so far, oldest first.
    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }
}
