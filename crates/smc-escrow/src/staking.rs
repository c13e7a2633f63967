//! # Legacy Staking Collaborator
//!
//! An in-memory stand-in for the legacy staking system that migrates stake
//! into an escrow. It only models what the migration path touches: stake
//! balances held in its own custody, the set of approved migration
//! destinations maintained by a migration manager, and
//! `migrate_staked_tokens`.
//!
//! Escrow rejections raised during a migration surface unchanged through
//! [`StakingError::Escrow`]. A rejected migration is rolled back: stake and
//! custody balances are restored before the error is returned.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use smc_core::{Address, Amount, Clock};

use crate::custody::{CustodyError, TokenCustody};
use crate::error::EscrowError;
use crate::escrow::MigrationEscrow;
use crate::event::EscrowEvent;

/// Errors raised by the legacy staking system.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StakingError {
    /// Only the migration manager may change the destination set.
    #[error("caller {caller} is not the migration manager")]
    NotMigrationManager {
        /// The rejected caller.
        caller: Address,
    },

    /// The escrow is not an approved migration destination.
    #[error("migration destination {destination} is not approved")]
    UnknownDestination {
        /// The escrow's custody address.
        destination: Address,
    },

    /// The destination is already approved.
    #[error("migration destination {destination} already approved")]
    DestinationAlreadyApproved {
        /// The escrow's custody address.
        destination: Address,
    },

    /// The caller has nothing staked.
    #[error("no staked tokens for {owner}")]
    NoStakedTokens {
        /// The caller.
        owner: Address,
    },

    /// The requested amount exceeds the caller's stake.
    #[error("amount {requested} exceeds staked token balance {staked}")]
    AmountExceedsStake {
        /// The requested migration amount.
        requested: Amount,
        /// The caller's stake.
        staked: Amount,
    },

    /// Staking a zero amount.
    #[error("stake amount must be positive")]
    ZeroStake,

    /// A token movement failed.
    #[error(transparent)]
    Custody(#[from] CustodyError),

    /// The escrow rejected the migration.
    #[error(transparent)]
    Escrow(#[from] EscrowError),
}

/// The legacy staking system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyStaking {
    address: Address,
    migration_manager: Address,
    stakes: BTreeMap<Address, Amount>,
    migration_destinations: BTreeSet<Address>,
}

impl LegacyStaking {
    /// Create a staking system at `address` administered by `migration_manager`.
    pub fn new(address: Address, migration_manager: Address) -> Self {
        Self {
            address,
            migration_manager,
            stakes: BTreeMap::new(),
            migration_destinations: BTreeSet::new(),
        }
    }

    /// The staking system's own identity and custody address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// The identity that approves migration destinations.
    pub fn migration_manager(&self) -> Address {
        self.migration_manager
    }

    /// Stake held for `owner`.
    pub fn stake_balance_of(&self, owner: &Address) -> Amount {
        self.stakes.get(owner).copied().unwrap_or_default()
    }

    /// Whether `destination` may receive migrations.
    pub fn is_migration_destination(&self, destination: &Address) -> bool {
        self.migration_destinations.contains(destination)
    }

    /// Move `amount` of `owner`'s tokens into staking custody.
    ///
    /// # Errors
    ///
    /// Returns [`StakingError::ZeroStake`] or a custody error.
    pub fn stake<T: TokenCustody + ?Sized>(
        &mut self,
        owner: &Address,
        amount: Amount,
        custody: &mut T,
    ) -> Result<Amount, StakingError> {
        if amount.is_zero() {
            return Err(StakingError::ZeroStake);
        }
        let staked = self
            .stake_balance_of(owner)
            .checked_add(amount)
            .ok_or(CustodyError::BalanceOverflow { holder: *owner })?;
        custody.transfer(owner, &self.address, amount)?;
        self.stakes.insert(*owner, staked);
        Ok(staked)
    }

    /// Approve an escrow as a migration destination.
    ///
    /// # Errors
    ///
    /// Returns [`StakingError::NotMigrationManager`] or
    /// [`StakingError::DestinationAlreadyApproved`].
    pub fn add_migration_destination(
        &mut self,
        caller: &Address,
        destination: &Address,
    ) -> Result<(), StakingError> {
        self.require_manager(caller)?;
        if !self.migration_destinations.insert(*destination) {
            return Err(StakingError::DestinationAlreadyApproved {
                destination: *destination,
            });
        }
        tracing::info!(staking = %self.address, %destination, "migration destination added");
        Ok(())
    }

    /// Withdraw approval from a migration destination.
    ///
    /// # Errors
    ///
    /// Returns [`StakingError::NotMigrationManager`] or
    /// [`StakingError::UnknownDestination`].
    pub fn remove_migration_destination(
        &mut self,
        caller: &Address,
        destination: &Address,
    ) -> Result<(), StakingError> {
        self.require_manager(caller)?;
        if !self.migration_destinations.remove(destination) {
            return Err(StakingError::UnknownDestination {
                destination: *destination,
            });
        }
        tracing::info!(staking = %self.address, %destination, "migration destination removed");
        Ok(())
    }

    /// Migrate `amount` of the caller's stake into `escrow`.
    ///
    /// Moves the tokens into escrow custody, then calls
    /// `accept_migration` with this staking system as the caller. If the
    /// escrow rejects, the token movement is reversed and the escrow's error
    /// is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`StakingError::UnknownDestination`],
    /// [`StakingError::NoStakedTokens`], [`StakingError::AmountExceedsStake`],
    /// a custody error, or [`StakingError::Escrow`]. A `custody` managing a
    /// different token than the escrow is rejected with
    /// [`EscrowError::TokenMismatch`] before any tokens move.
    pub fn migrate_staked_tokens<C: Clock, T: TokenCustody + ?Sized>(
        &mut self,
        caller: &Address,
        escrow: &mut MigrationEscrow<C>,
        amount: Amount,
        custody: &mut T,
    ) -> Result<EscrowEvent, StakingError> {
        let destination = escrow.custody_address();
        if !self.is_migration_destination(&destination) {
            return Err(StakingError::UnknownDestination { destination });
        }
        let staked = self.stake_balance_of(caller);
        if staked.is_zero() {
            return Err(StakingError::NoStakedTokens { owner: *caller });
        }
        let remaining = staked
            .checked_sub(amount)
            .ok_or(StakingError::AmountExceedsStake {
                requested: amount,
                staked,
            })?;
        escrow.check_custody(&*custody)?;

        custody.transfer(&self.address, &destination, amount)?;
        let event = match escrow.accept_migration(&self.address, caller, amount) {
            Ok(event) => event,
            Err(e) => {
                custody.transfer(&destination, &self.address, amount)?;
                return Err(e.into());
            }
        };
        self.stakes.insert(*caller, remaining);
        tracing::info!(
            staking = %self.address,
            owner = %caller,
            %destination,
            %amount,
            "staked tokens migrated"
        );
        Ok(event)
    }

    fn require_manager(&self, caller: &Address) -> Result<(), StakingError> {
        if *caller != self.migration_manager {
            return Err(StakingError::NotMigrationManager { caller: *caller });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use smc_core::{ManualClock, Timestamp};

    use super::*;
    use crate::config::{DeployContext, EscrowConfig, SourceBinding};
    use crate::cooldown::CooldownDuration;
    use crate::custody::InMemoryToken;

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 20])
    }

    fn owner() -> Address {
        addr(1)
    }
    fn manager() -> Address {
        addr(2)
    }
    fn staking_addr() -> Address {
        addr(3)
    }

    struct World {
        token: InMemoryToken,
        staking: LegacyStaking,
        escrow: MigrationEscrow<Arc<ManualClock>>,
    }

    fn world(binding: SourceBinding) -> World {
        let clock = Arc::new(ManualClock::new(Timestamp::from_unix_seconds(0).unwrap()));
        let config = EscrowConfig::new(
            addr(0x70),
            owner(),
            addr(5),
            binding,
            CooldownDuration::from_days(14),
        );
        let escrow =
            MigrationEscrow::deploy(&config, DeployContext::new(addr(6), 0), clock).unwrap();
        let mut token = InMemoryToken::new(addr(0x70));
        token.mint(&owner(), Amount::new(1_000)).unwrap();
        let mut staking = LegacyStaking::new(staking_addr(), manager());
        staking.stake(&owner(), Amount::new(1_000), &mut token).unwrap();
        World {
            token,
            staking,
            escrow,
        }
    }

    fn approved_world() -> World {
        let mut w = world(SourceBinding::Explicit(staking_addr()));
        let dest = w.escrow.custody_address();
        w.staking.add_migration_destination(&manager(), &dest).unwrap();
        w
    }

    #[test]
    fn stake_moves_tokens_into_staking_custody() {
        let w = world(SourceBinding::Explicit(staking_addr()));
        assert_eq!(w.staking.stake_balance_of(&owner()), Amount::new(1_000));
        assert_eq!(w.token.balance_of(&staking_addr()), Amount::new(1_000));
        assert_eq!(w.token.balance_of(&owner()), Amount::ZERO);
    }

    #[test]
    fn only_manager_adds_destinations() {
        let mut w = world(SourceBinding::Explicit(staking_addr()));
        let dest = w.escrow.custody_address();
        let err = w.staking.add_migration_destination(&owner(), &dest).unwrap_err();
        assert_eq!(err, StakingError::NotMigrationManager { caller: owner() });
        assert!(!w.staking.is_migration_destination(&dest));
    }

    #[test]
    fn duplicate_destination_rejected() {
        let mut w = approved_world();
        let dest = w.escrow.custody_address();
        assert!(w.staking.add_migration_destination(&manager(), &dest).is_err());
        w.staking.remove_migration_destination(&manager(), &dest).unwrap();
        assert!(!w.staking.is_migration_destination(&dest));
    }

    #[test]
    fn migrate_to_unapproved_destination_rejected() {
        let mut w = world(SourceBinding::Explicit(staking_addr()));
        let err = w
            .staking
            .migrate_staked_tokens(&owner(), &mut w.escrow, Amount::new(1), &mut w.token)
            .unwrap_err();
        assert!(matches!(err, StakingError::UnknownDestination { .. }));
    }

    #[test]
    fn migrate_without_stake_rejected() {
        let mut w = approved_world();
        let err = w
            .staking
            .migrate_staked_tokens(&addr(9), &mut w.escrow, Amount::new(1), &mut w.token)
            .unwrap_err();
        assert_eq!(err, StakingError::NoStakedTokens { owner: addr(9) });
        assert!(format!("{err}").contains("no staked tokens"));
    }

    #[test]
    fn migrate_beyond_stake_rejected() {
        let mut w = approved_world();
        let err = w
            .staking
            .migrate_staked_tokens(&owner(), &mut w.escrow, Amount::new(u128::MAX), &mut w.token)
            .unwrap_err();
        assert!(format!("{err}").contains("exceeds staked token balance"));
        assert_eq!(w.escrow.total_accumulated(), Amount::ZERO);
    }

    #[test]
    fn migrate_credits_escrow_and_moves_custody() {
        let mut w = approved_world();
        let event = w
            .staking
            .migrate_staked_tokens(&owner(), &mut w.escrow, Amount::new(400), &mut w.token)
            .unwrap();
        assert_eq!(
            event,
            EscrowEvent::AcceptedMigration {
                source_owner: owner(),
                amount: Amount::new(400),
                total: Amount::new(400),
            }
        );
        assert_eq!(w.staking.stake_balance_of(&owner()), Amount::new(600));
        assert_eq!(
            w.token.balance_of(&w.escrow.custody_address()),
            Amount::new(400)
        );
    }

    #[test]
    fn migrate_through_foreign_token_custody_rejected() {
        let mut w = approved_world();
        let mut foreign = InMemoryToken::new(addr(0x99));
        foreign.mint(&staking_addr(), Amount::new(1_000)).unwrap();
        let err = w
            .staking
            .migrate_staked_tokens(&owner(), &mut w.escrow, Amount::new(400), &mut foreign)
            .unwrap_err();
        assert_eq!(
            err,
            StakingError::Escrow(EscrowError::TokenMismatch {
                expected: addr(0x70),
                actual: addr(0x99),
            })
        );
        assert_eq!(w.staking.stake_balance_of(&owner()), Amount::new(1_000));
        assert_eq!(w.escrow.total_accumulated(), Amount::ZERO);
        assert_eq!(foreign.balance_of(&staking_addr()), Amount::new(1_000));
        assert_eq!(
            foreign.balance_of(&w.escrow.custody_address()),
            Amount::ZERO
        );
    }

    #[test]
    fn escrow_rejection_propagates_unchanged_and_rolls_back() {
        let mut w = approved_world();
        let err = w
            .staking
            .migrate_staked_tokens(&owner(), &mut w.escrow, Amount::ZERO, &mut w.token)
            .unwrap_err();
        assert!(matches!(
            err,
            StakingError::Escrow(EscrowError::InvalidAmount { .. })
        ));
        assert_eq!(w.staking.stake_balance_of(&owner()), Amount::new(1_000));
        assert_eq!(w.token.balance_of(&staking_addr()), Amount::new(1_000));
    }

    #[test]
    fn escrow_bound_to_other_source_rejects_and_rolls_back() {
        let mut w = world(SourceBinding::Deployer);
        let dest = w.escrow.custody_address();
        w.staking.add_migration_destination(&manager(), &dest).unwrap();
        let err = w
            .staking
            .migrate_staked_tokens(&owner(), &mut w.escrow, Amount::new(10), &mut w.token)
            .unwrap_err();
        assert!(matches!(
            err,
            StakingError::Escrow(EscrowError::Unauthorized { .. })
        ));
        assert_eq!(w.token.balance_of(&dest), Amount::ZERO);
        assert_eq!(w.staking.stake_balance_of(&owner()), Amount::new(1_000));
    }

    #[test]
    fn zero_stake_rejected() {
        let mut w = world(SourceBinding::Deployer);
        let err = w
            .staking
            .stake(&owner(), Amount::ZERO, &mut w.token)
            .unwrap_err();
        assert_eq!(err, StakingError::ZeroStake);
    }
}
