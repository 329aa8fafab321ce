//! Clock - Injectable Time Source
//!
//! TigerStyle: Timestamps come from an explicit clock so tests control time.
//!
//! The object store stamps `created_at` and `updated_at` through a [`Clock`].
//! Production uses [`SystemClock`]; tests use [`SimClock`], which only moves
//! when told to.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};

use crate::constants::{SIM_TIME_ADVANCE_MS_MAX, TIME_MS_PER_SEC};

/// Source of the current time.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;

    /// Current instant as a stored timestamp string (RFC 3339, UTC, micros).
    fn timestamp(&self) -> String {
        format_timestamp(self.now())
    }
}

/// Format an instant the way records store it.
#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp back into an instant.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

// =============================================================================
// SystemClock
// =============================================================================

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

// =============================================================================
// SimClock
// =============================================================================

/// A simulated clock for deterministic tests.
///
/// TigerStyle:
/// - Time only moves forward
/// - All time operations are explicit
/// - Clones share the same timeline
#[derive(Debug, Clone)]
pub struct SimClock {
    /// Milliseconds since the Unix epoch
    current_ms: Arc<AtomicU64>,
}

impl SimClock {
    /// Create a clock starting at the Unix epoch.
    #[must_use]
    pub fn new() -> Self {
        Self::at_ms(0)
    }

    /// Create a clock starting at the given time.
    #[must_use]
    pub fn at_ms(start_ms: u64) -> Self {
        Self {
            current_ms: Arc::new(AtomicU64::new(start_ms)),
        }
    }

    /// Get current time in milliseconds.
    #[must_use]
    pub fn now_ms(&self) -> u64 {
        self.current_ms.load(Ordering::SeqCst)
    }

    /// Get current time in seconds (truncated).
    #[must_use]
    pub fn now_secs(&self) -> u64 {
        self.now_ms() / TIME_MS_PER_SEC
    }

    /// Advance time by the given milliseconds, returning the new time.
    ///
    /// # Panics
    /// Panics if ms exceeds `SIM_TIME_ADVANCE_MS_MAX`.
    pub fn advance_ms(&self, ms: u64) -> u64 {
        assert!(
            ms <= SIM_TIME_ADVANCE_MS_MAX,
            "advance_ms({}) exceeds max ({})",
            ms,
            SIM_TIME_ADVANCE_MS_MAX
        );

        let old_time = self.current_ms.fetch_add(ms, Ordering::SeqCst);
        let new_time = old_time.saturating_add(ms);

        assert!(new_time >= old_time, "time must not go backwards");

        new_time
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SimClock {
    fn now(&self) -> DateTime<Utc> {
        let ms = i64::try_from(self.now_ms()).unwrap_or(i64::MAX);
        Utc.timestamp_millis_opt(ms)
            .single()
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_time() {
        let clock = SimClock::new();
        assert_eq!(clock.now_ms(), 0);
        assert_eq!(clock.timestamp(), "1970-01-01T00:00:00.000000Z");
    }

    #[test]
    fn test_advance_shared_between_clones() {
        let clock = SimClock::at_ms(5000);
        let other = clock.clone();

        let new_time = other.advance_ms(1500);

        assert_eq!(new_time, 6500);
        assert_eq!(clock.now_ms(), 6500);
        assert_eq!(clock.now_secs(), 6);
    }

    #[test]
    #[should_panic(expected = "advance_ms")]
    fn test_advance_exceeds_max() {
        let clock = SimClock::new();
        clock.advance_ms(SIM_TIME_ADVANCE_MS_MAX + 1);
    }

    #[test]
    fn test_timestamp_round_trip() {
        let clock = SimClock::at_ms(1_700_000_000_123);
        let stamped = clock.timestamp();

        assert_eq!(parse_timestamp(&stamped), Some(clock.now()));
        assert!(parse_timestamp("not a date").is_none());
    }

    #[test]
    fn test_system_clock_moves_forward() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
