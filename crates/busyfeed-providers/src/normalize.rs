//! Raw record to busy period normalization.
//!
//! One raw record yields zero or one busy period:
//!
//! - transparent records yield nothing (they do not block availability)
//! - a missing TRANSP marker counts as busy
//! - date-only boundaries anchor to midnight in the reference zone
//! - malformed records (missing or inverted times) are dropped per record,
//!   never aborting the batch
//!
//! Event content (summary, location, attendees) is never carried over; the
//! display label is applied run-wide by the busy-set builder. This is the
//! privacy contract the whole pipeline exists to enforce.

use busyfeed_core::{BusyPeriod, ReferenceZone};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::warn;

use crate::raw_event::{RawEvent, RawEventTime, Transparency};

/// Why a record was dropped during normalization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// The record has no parseable start time.
    #[error("record '{0}' has no parseable start time")]
    MissingStart(String),
    /// The record has no parseable end time.
    #[error("record '{0}' has no parseable end time")]
    MissingEnd(String),
    /// The record's start is not before its end.
    #[error("record '{0}' has an invalid interval (start >= end)")]
    InvalidInterval(String),
}

/// The successful outcome for one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeOutcome {
    /// The record occupies time.
    Busy(BusyPeriod),
    /// The record is marked transparent and contributes nothing.
    Transparent,
}

/// Normalizes one raw record against the reference zone.
pub fn normalize_record(
    raw: &RawEvent,
    zone: ReferenceZone,
) -> Result<NormalizeOutcome, RecordError> {
    if raw.transparency == Some(Transparency::Transparent) {
        return Ok(NormalizeOutcome::Transparent);
    }

    let start = raw
        .start
        .map(|t| anchor(t, zone))
        .ok_or_else(|| RecordError::MissingStart(raw.id.clone()))?;
    let end = raw
        .end
        .map(|t| anchor(t, zone))
        .ok_or_else(|| RecordError::MissingEnd(raw.id.clone()))?;

    BusyPeriod::new(start, end)
        .map(NormalizeOutcome::Busy)
        .ok_or_else(|| RecordError::InvalidInterval(raw.id.clone()))
}

/// Resolves a raw boundary to an absolute instant.
///
/// Date-only values anchor to midnight in the reference zone, not UTC and
/// not the system zone.
fn anchor(time: RawEventTime, zone: ReferenceZone) -> DateTime<Utc> {
    match time {
        RawEventTime::DateTime(dt) => dt,
        RawEventTime::Date(date) => zone.midnight_utc(date),
    }
}

/// Normalizes a batch of records, logging and counting drops.
///
/// Returns the busy periods in record order plus the number of records
/// dropped as malformed. Transparent records are filtered silently; they are
/// valid input, not errors.
pub fn normalize_records(records: &[RawEvent], zone: ReferenceZone) -> (Vec<BusyPeriod>, usize) {
    let mut periods = Vec::new();
    let mut dropped = 0;

    for record in records {
        match normalize_record(record, zone) {
            Ok(NormalizeOutcome::Busy(period)) => periods.push(period),
            Ok(NormalizeOutcome::Transparent) => {}
            Err(e) => {
                warn!(calendar = %record.calendar_address, error = %e, "Dropping malformed record");
                dropped += 1;
            }
        }
    }

    (periods, dropped)
}
