//! # Cooldown Timer
//!
//! Holds the single expiry instant before which recovery is refused.
//!
//! ## Reset Semantics
//!
//! Every accepted migration re-arms the timer to `now + duration`,
//! discarding whatever time remained on the previous arming. The expiry is
//! never extended additively and never clamped, except that an expiry past
//! the end of the representable calendar saturates to [`Timestamp::MAX`].
//!
//! An unarmed timer reports "not elapsed".

use serde::{Deserialize, Serialize};

use smc_core::Timestamp;

/// Seconds in one day, for converting day counts at construction time.
pub const SECONDS_PER_DAY: u64 = 86_400;

/// A cooldown length, counted in seconds and applied literally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CooldownDuration(u64);

impl CooldownDuration {
    /// A cooldown of `secs` seconds.
    pub const fn from_seconds(secs: u64) -> Self {
        Self(secs)
    }

    /// A cooldown of `days` whole days. Saturates at `u64::MAX` seconds.
    pub const fn from_days(days: u64) -> Self {
        Self(days.saturating_mul(SECONDS_PER_DAY))
    }

    /// The configured number of seconds.
    pub const fn as_seconds(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for CooldownDuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}s", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CooldownTimer {
    duration: CooldownDuration,
    expiry: Option<Timestamp>,
}

impl CooldownTimer {
    pub(crate) fn new(duration: CooldownDuration) -> Self {
        Self {
            duration,
            expiry: None,
        }
    }

    pub(crate) fn restore(duration: CooldownDuration, expiry: Option<Timestamp>) -> Self {
        Self { duration, expiry }
    }

    pub(crate) fn duration(&self) -> CooldownDuration {
        self.duration
    }

    pub(crate) fn expiry(&self) -> Option<Timestamp> {
        self.expiry
    }

    /// Overwrite the expiry with `now + duration` and return it.
    pub(crate) fn arm(&mut self, now: Timestamp) -> Timestamp {
        let expiry = now.saturating_add_seconds(self.duration.as_seconds());
        self.expiry = Some(expiry);
        tracing::debug!(%now, %expiry, duration = %self.duration, "cooldown armed");
        expiry
    }

    pub(crate) fn has_elapsed(&self, now: Timestamp) -> bool {
        match self.expiry {
            Some(expiry) => now >= expiry,
            None => false,
        }
    }
}
