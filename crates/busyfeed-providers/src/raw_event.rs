//! Raw event records from calendar sources.
//!
//! [`RawEvent`] is the backend-agnostic shape of one event as returned by a
//! range query, before normalization. It deliberately keeps the fields the
//! privacy contract forbids in the output (summary, location) so that tests
//! can prove they are never copied forward.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// The time specification of a raw event boundary.
///
/// Sources return either a full instant or a date-only value (all-day
/// events). Date-only values are anchored to the reference zone during
/// normalization, never here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum RawEventTime {
    /// A specific instant, stored in UTC.
    DateTime(DateTime<Utc>),
    /// An all-day date with no time component.
    Date(NaiveDate),
}

impl RawEventTime {
    /// Returns true for date-only (all-day) values.
    pub fn is_all_day(&self) -> bool {
        matches!(self, Self::Date(_))
    }
}

/// The TRANSP marker of an event.
///
/// Omission conventionally means opaque, so normalization treats a missing
/// marker as [`Transparency::Opaque`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transparency {
    /// The event occupies time.
    Opaque,
    /// The event does not block availability.
    Transparent,
}

impl Transparency {
    /// Parses a TRANSP property value; unknown values read as opaque.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("transparent") {
            Self::Transparent
        } else {
            Self::Opaque
        }
    }
}

/// One event as returned by a source's range query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    /// Identifier of the event within the source.
    pub id: String,

    /// When the event starts, if the source supplied a parseable value.
    pub start: Option<RawEventTime>,

    /// When the event ends, if the source supplied a parseable value.
    pub end: Option<RawEventTime>,

    /// The TRANSP marker, if present.
    pub transparency: Option<Transparency>,

    /// The event title. Never copied into the output.
    pub summary: Option<String>,

    /// The event location. Never copied into the output.
    pub location: Option<String>,

    /// The calendar this event was retrieved from.
    pub calendar_address: String,
}

impl RawEvent {
    /// Creates a raw event with the minimum required fields.
    pub fn new(id: impl Into<String>, calendar_address: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            start: None,
            end: None,
            transparency: None,
            summary: None,
            location: None,
            calendar_address: calendar_address.into(),
        }
    }

    /// Builder method to set the start time.
    pub fn with_start(mut self, start: RawEventTime) -> Self {
        self.start = Some(start);
        self
    }

    /// Builder method to set the end time.
    pub fn with_end(mut self, end: RawEventTime) -> Self {
        self.end = Some(end);
        self
    }

    /// Builder method to set the transparency marker.
    pub fn with_transparency(mut self, transparency: Transparency) -> Self {
        self.transparency = Some(transparency);
        self
    }

    /// Builder method to set the summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Builder method to set the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}
