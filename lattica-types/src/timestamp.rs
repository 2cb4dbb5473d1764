//! Hybrid logical clock used to order last-writer-wins writes.
//!
//! A stamp is the wall clock in milliseconds plus a counter that breaks ties
//! inside one millisecond. Ticking never goes backwards, so a write stamped
//! by ticking another write's stamp sorts after it even if the local wall
//! clock lags.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch; a clock set before the epoch reads as 0.
fn wall_clock_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// A point on the hybrid clock, ordered by `(wall_time, logical)`.
///
/// Pure logical clocks fit too: use `new(n, 0)` and count in `n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HybridTimestamp {
    /// Unix millis. Declared first so the derived order compares it first.
    wall_time: u64,
    logical: u32,
}

impl HybridTimestamp {
    /// The smallest timestamp.
    pub const ZERO: Self = Self::new(0, 0);

    /// Reads the wall clock.
    #[must_use]
    pub fn now() -> Self {
        Self {
            wall_time: wall_clock_millis(),
            logical: 0,
        }
    }

    /// Builds a stamp from raw parts.
    #[must_use]
    pub const fn new(wall_time: u64, logical: u32) -> Self {
        Self { wall_time, logical }
    }

    /// Milliseconds since the Unix epoch.
    #[must_use]
    pub const fn wall_time(&self) -> u64 {
        self.wall_time
    }

    /// Tie-breaking counter within one millisecond.
    #[must_use]
    pub const fn logical(&self) -> u32 {
        self.logical
    }

    /// Generates the next timestamp, strictly greater than `self`.
    ///
    /// Follows the wall clock when it has advanced past `self`, otherwise
    /// bumps the logical counter. When the logical counter is exhausted the
    /// wall component is advanced by one millisecond instead.
    #[must_use]
    pub fn tick(&self) -> Self {
        let now = wall_clock_millis();

        if now > self.wall_time {
            Self {
                wall_time: now,
                logical: 0,
            }
        } else {
            self.successor()
        }
    }

    /// The next timestamp in the total order.
    fn successor(&self) -> Self {
        match self.logical.checked_add(1) {
            Some(logical) => Self {
                wall_time: self.wall_time,
                logical,
            },
            None => Self {
                wall_time: self.wall_time.saturating_add(1),
                logical: 0,
            },
        }
    }
}

impl Default for HybridTimestamp {
    fn default() -> Self {
        Self::now()
    }
}
