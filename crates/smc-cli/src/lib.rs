//! # smc-cli: Staking Migration Escrow Command-Line Interface
//!
//! Operates a local, simulated deployment: one token ledger, one legacy
//! staking system, and one migration escrow, persisted together as JSON in
//! a state directory.
//!
//! ## Subcommands
//!
//! - `init`: Deploy the escrow and its staking system
//! - `mint`: Issue tokens to a holder
//! - `stake`: Stake tokens in the legacy staking system
//! - `approve-destination`: Approve (or revoke) the escrow as a migration destination
//! - `migrate`: Migrate staked tokens into the escrow
//! - `accept`: Call `accept_migration` directly
//! - `recover`: Release the accumulated total to the destination
//! - `status`: Show escrow state, phase, and token holders
//! - `events`: Print the event log as JSON lines
//!
//! ## Crate Policy
//!
//! - Handlers delegate to `smc-escrow`; no escrow rules live here.
//! - State is written only after an operation succeeds, so a rejected
//!   command leaves the state directory unchanged.

pub mod commands;
pub mod deployment;
