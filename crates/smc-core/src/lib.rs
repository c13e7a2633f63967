#![deny(missing_docs)]

//! # smc-core: Foundational Types for the Staking Migration Escrow
//!
//! This crate defines the primitives every other crate in the workspace
//! depends on. It has no internal crate dependencies.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** An [`Address`] is not a
//!    string and an [`Amount`] is not a bare integer. You cannot pass a token
//!    quantity where a timestamp is expected.
//!
//! 2. **Amounts are exact.** [`Amount`] holds base units in a `u128` and
//!    serializes as a decimal string so that 18-decimal token quantities
//!    survive JSON round trips without precision loss.
//!
//! 3. **Time is injected.** Nothing in the workspace reads the wall clock
//!    directly; operations ask a [`Clock`]. Tests drive a [`ManualClock`].
//!
//! 4. **[`ValidationError`] for bad input.** Structured errors with
//!    `thiserror`, no `.unwrap()` outside tests.

pub mod address;
pub mod amount;
pub mod error;
pub mod temporal;

// Re-export primary types at crate root for ergonomic imports.
pub use address::Address;
pub use amount::Amount;
pub use error::ValidationError;
pub use temporal::{Clock, FixedClock, ManualClock, SystemClock, Timestamp};
