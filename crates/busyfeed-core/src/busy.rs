//! Busy intervals and the per-run busy set.
//!
//! A [`BusyPeriod`] is a bare occupied span as produced by normalization.
//! The [`BusySetBuilder`] turns periods into [`BusyInterval`]s by attaching
//! the run-wide identity data: a fresh unique identifier, the shared
//! generation timestamp and the operator-configured display label.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An occupied span of time, prior to identity assignment.
///
/// Invariant: `start < end`. Both bounds are absolute UTC instants; all-day
/// dates have already been anchored to the reference zone by normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyPeriod {
    /// Start of the span (inclusive).
    pub start: DateTime<Utc>,
    /// End of the span (exclusive).
    pub end: DateTime<Utc>,
}

impl BusyPeriod {
    /// Creates a period, rejecting empty or inverted spans.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }
}

/// One privacy-stripped busy interval in the output calendar.
///
/// Carries no content from the source event: the summary is the run-wide
/// configured label, and the uid is freshly generated each run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyInterval {
    /// Unique identifier, never reused across runs.
    pub uid: String,
    /// Start instant.
    pub start: DateTime<Utc>,
    /// End instant.
    pub end: DateTime<Utc>,
    /// When this run generated the interval (DTSTAMP).
    pub dtstamp: DateTime<Utc>,
    /// The constant display label.
    pub summary: String,
}

/// The ordered collection of busy intervals accumulated over one run.
///
/// Insertion order reflects resource/calendar processing order and carries no
/// semantic meaning. Overlapping intervals from independent calendars are
/// kept as separate occupancy claims; there is no dedup or merging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusySet {
    intervals: Vec<BusyInterval>,
}

impl BusySet {
    /// Returns the intervals in insertion order.
    pub fn intervals(&self) -> &[BusyInterval] {
        &self.intervals
    }

    /// Number of intervals in the set.
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    /// Returns true if no intervals were accumulated.
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }
}

/// Accumulates normalized periods into a [`BusySet`].
///
/// Owned exclusively by the run; all appends happen on the calling thread.
#[derive(Debug)]
pub struct BusySetBuilder {
    label: String,
    dtstamp: DateTime<Utc>,
    intervals: Vec<BusyInterval>,
}

impl BusySetBuilder {
    /// Creates a builder with the run-wide label and processing timestamp.
    pub fn new(label: impl Into<String>, dtstamp: DateTime<Utc>) -> Self {
        Self {
            label: label.into(),
            dtstamp,
            intervals: Vec::new(),
        }
    }

    /// Appends one period, assigning it a fresh uid and the run dtstamp.
    pub fn push(&mut self, period: BusyPeriod) {
        self.intervals.push(BusyInterval {
            uid: Uuid::new_v4().to_string(),
            start: period.start,
            end: period.end,
            dtstamp: self.dtstamp,
            summary: self.label.clone(),
        });
    }

    /// Appends all periods from an iterator.
    pub fn extend(&mut self, periods: impl IntoIterator<Item = BusyPeriod>) {
        for period in periods {
            self.push(period);
        }
    }

    /// Number of intervals accumulated so far.
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    /// Returns true if nothing has been accumulated yet.
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Finishes accumulation.
    pub fn build(self) -> BusySet {
        BusySet {
            intervals: self.intervals,
        }
    }
}
