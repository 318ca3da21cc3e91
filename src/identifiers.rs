//! Type-safe identifiers.
//!
//! Newtype wrappers keep connection generations from being confused with
//! attempt counters or other plain integers.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

// ============================================================================
// ConnectionId
// ============================================================================

/// Identifies one connection generation.
///
/// Every `connect()` call allocates a fresh id. Event loop callbacks carry the
/// id they were spawned with, and the manager ignores any callback whose id is
/// no longer current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Returns the raw generation number.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

// ============================================================================
// ConnectionIdGenerator
// ============================================================================

/// Monotonic source of [`ConnectionId`] values.
#[derive(Debug, Default)]
pub(crate) struct ConnectionIdGenerator(AtomicU64);

impl ConnectionIdGenerator {
    /// Allocates the next id. Ids start at 1.
    pub(crate) fn next(&self) -> ConnectionId {
        ConnectionId(self.0.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_monotonic() {
        let generator = ConnectionIdGenerator::default();
        let first = generator.next();
        let second = generator.next();

        assert_eq!(first.as_u64(), 1);
        assert!(second > first);
        assert_ne!(first, second);
    }

    #[test]
    fn test_display() {
        let generator = ConnectionIdGenerator::default();
        assert_eq!(generator.next().to_string(), "conn-1");
    }
}
