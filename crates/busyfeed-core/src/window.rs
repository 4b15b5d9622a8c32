//! Query window resolution.
//!
//! The run queries each calendar over one absolute interval
//! `[now + start_hours, now + end_hours)` computed at startup.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// The absolute interval a run queries events for.
///
/// Half-open: `[start, end)`. The window may be empty (`end <= start`);
/// downstream processing then simply produces zero intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryWindow {
    /// Start of the window (inclusive).
    pub start: DateTime<Utc>,
    /// End of the window (exclusive).
    pub end: DateTime<Utc>,
}

impl QueryWindow {
    /// Creates a window from explicit bounds. Empty windows are allowed.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Resolves the window from hour offsets relative to now.
    ///
    /// The two bounds are computed from two separate now samples taken in
    /// immediate succession; sub-second skew between them is accepted, even
    /// when it makes a tiny window come out empty. Offsets of any magnitude
    /// are accepted; bounds beyond the representable datetime range saturate
    /// at that range, which can only make the window smaller or empty.
    pub fn resolve(start_hours: i64, end_hours: i64) -> Self {
        let start = offset_from(Utc::now(), start_hours);
        let end = offset_from(Utc::now(), end_hours);
        Self { start, end }
    }

    /// Returns true if the window covers no time at all.
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Returns the covered duration (zero for empty windows).
    pub fn duration(&self) -> Duration {
        if self.is_empty() {
            Duration::zero()
        } else {
            self.end - self.start
        }
    }
}

/// Applies an hour offset to an instant, saturating instead of overflowing.
fn offset_from(instant: DateTime<Utc>, hours: i64) -> DateTime<Utc> {
    Duration::try_hours(hours)
        .and_then(|delta| instant.checked_add_signed(delta))
        .unwrap_or(if hours < 0 {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        })
}
