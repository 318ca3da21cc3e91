//! Exponential backoff state.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::config::ReconnectPolicy;

// ============================================================================
// Backoff
// ============================================================================

/// Delay to use for the next reconnect.
///
/// Starts at the policy floor, grows by the multiplier after every
/// unsuccessful cycle up to the ceiling, and snaps back to the floor on a
/// successful open.
#[derive(Debug, Clone, PartialEq)]
pub struct Backoff {
    current: Duration,
    failures: u32,
    floor: Duration,
    ceiling: Duration,
    multiplier: f64,
}

impl Backoff {
    /// Creates a backoff at the policy floor.
    #[must_use]
    pub fn new(policy: &ReconnectPolicy) -> Self {
        Self {
            current: policy.floor,
            failures: 0,
            floor: policy.floor,
            ceiling: policy.ceiling,
            multiplier: policy.multiplier,
        }
    }

    /// Delay the next failure will schedule.
    #[inline]
    #[must_use]
    pub fn current(&self) -> Duration {
        self.current
    }

    /// Consecutive failures since the last reset.
    #[inline]
    #[must_use]
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Returns the delay to schedule now, then grows it for next time.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.failures = self.failures.saturating_add(1);
        self.current = Duration::try_from_secs_f64(self.current.as_secs_f64() * self.multiplier)
            .map_or(self.ceiling, |grown| grown.min(self.ceiling));
        delay
    }

    /// Restores the floor.
    pub fn reset(&mut self) {
        self.current = self.floor;
        self.failures = 0;
    }
}

// ============================================================================
// Tests
// ============================================================================
