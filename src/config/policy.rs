//! Reconnect policy.
//!
//! Controls the exponential backoff between reconnect attempts and which
//! remote closure codes end a connection for good.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use rustc_hash::FxHashSet;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Normal closure code (RFC 6455 section 7.4.1).
pub const NORMAL_CLOSURE: u16 = 1000;

/// Default delay before the first reconnect attempt.
pub const DEFAULT_FLOOR: Duration = Duration::from_secs(1);

/// Default upper bound on the reconnect delay.
pub const DEFAULT_CEILING: Duration = Duration::from_secs(15);

/// Default growth factor applied after every unsuccessful cycle.
pub const DEFAULT_MULTIPLIER: f64 = 2.0;

// ============================================================================
// ReconnectPolicy
// ============================================================================

/// Backoff and closure-code policy.
///
/// Retries never stop on their own: only an explicit `disconnect()` or a
/// remote close carrying one of [`terminal_close_codes`](Self::terminal_close_codes)
/// ends the reconnect loop.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectPolicy {
    /// Delay after the first failure, and the value restored on every open.
    pub floor: Duration,

    /// Largest delay ever scheduled.
    pub ceiling: Duration,

    /// Growth factor per unsuccessful cycle.
    pub multiplier: f64,

    /// Remote closure codes that do not trigger a reconnect.
    pub terminal_close_codes: FxHashSet<u16>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        let mut terminal_close_codes = FxHashSet::default();
        terminal_close_codes.insert(NORMAL_CLOSURE);

        Self {
            floor: DEFAULT_FLOOR,
            ceiling: DEFAULT_CEILING,
            multiplier: DEFAULT_MULTIPLIER,
            terminal_close_codes,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl ReconnectPolicy {
    /// Creates the default policy (1s floor, 15s ceiling, doubling, 1000 terminal).
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the floor delay.
    #[inline]
    #[must_use]
    pub fn with_floor(mut self, floor: Duration) -> Self {
        self.floor = floor;
        self
    }

    /// Sets the ceiling delay.
    #[inline]
    #[must_use]
    pub fn with_ceiling(mut self, ceiling: Duration) -> Self {
        self.ceiling = ceiling;
        self
    }

    /// Sets the growth factor.
    #[inline]
    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Marks an additional remote closure code as terminal.
    #[inline]
    #[must_use]
    pub fn with_terminal_close_code(mut self, code: u16) -> Self {
        self.terminal_close_codes.insert(code);
        self
    }

    /// Reconnects after every remote closure, including normal ones.
    #[inline]
    #[must_use]
    pub fn reconnect_on_every_close(mut self) -> Self {
        self.terminal_close_codes.clear();
        self
    }
}

// ============================================================================
// Policy Queries
// ============================================================================

impl ReconnectPolicy {
    /// Returns `true` if a remote closure with `code` should be retried.
    ///
    /// A missing code (abnormal closure, transport error, failed handshake)
    /// is always retried.
    #[inline]
    #[must_use]
    pub fn should_reconnect(&self, code: Option<u16>) -> bool {
        match code {
            Some(code) => !self.terminal_close_codes.contains(&code),
            None => true,
        }
    }

    /// Delay for the `attempt`-th consecutive failure (1-based).
    ///
    /// Equals `min(floor * multiplier^(attempt - 1), ceiling)`.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let factor = self.multiplier.powi(exponent);
        Duration::try_from_secs_f64(self.floor.as_secs_f64() * factor)
            .map_or(self.ceiling, |delay| delay.min(self.ceiling))
    }

    /// Validates the policy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for a zero floor, a ceiling below the floor,
    /// or a multiplier below 1.0.
    pub fn validate(&self) -> Result<()> {
        if self.floor.is_zero() {
            return Err(Error::config("Reconnect floor must be greater than zero"));
        }

        if self.ceiling < self.floor {
            return Err(Error::config(format!(
                "Reconnect ceiling ({}ms) is below the floor ({}ms)",
                self.ceiling.as_millis(),
                self.floor.as_millis()
            )));
        }

        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(Error::config(format!(
                "Reconnect multiplier must be a finite value >= 1.0, got {}",
                self.multiplier
            )));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
