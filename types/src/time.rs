//! Timestamp type used for stake periods, locktimes and validator windows.
//!
//! Timestamps are Unix epoch seconds (UTC), the resolution every chain uses.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// A Unix timestamp in seconds since epoch (UTC).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The epoch (time zero).
    pub const EPOCH: Self = Self(0);

    pub const fn new(secs: u64) -> Self {
        Self(secs)
    }

    /// Get the current system time as a `Timestamp`.
    pub fn now() -> Self {
        Self::from_system_time(SystemTime::now())
    }

    /// Convert a wall-clock instant to whole seconds, rounding half up.
    /// Instants before the epoch clamp to [`Timestamp::EPOCH`].
    pub fn from_system_time(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(since) => {
                let round_up = since.subsec_millis() >= 500;
                Self(since.as_secs() + u64::from(round_up))
            }
            Err(_) => Self::EPOCH,
        }
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// Seconds from `now` until this timestamp, or 0 if it has passed.
    pub fn secs_until(&self, now: Timestamp) -> u64 {
        self.0.saturating_sub(now.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}
