//! ICS/iCalendar parsing into raw event records.

use chrono::{DateTime, TimeZone, Utc};
use icalendar::{Calendar, CalendarComponent, CalendarDateTime, Component, DatePerhapsTime, Event,
    EventLike};
use tracing::{debug, warn};

use busyfeed_core::ZoneRule;

use crate::raw_event::{RawEvent, RawEventTime, Transparency};

/// Parses ICS content and extracts raw events.
///
/// Events with unparseable boundaries are still returned with the missing
/// boundary unset; normalization decides their fate. A payload that fails
/// to parse as a whole yields an empty list with a warning.
pub fn parse_ics_content(ics: &str, calendar_address: &str) -> Vec<RawEvent> {
    let calendar = match ics.parse::<Calendar>() {
        Ok(cal) => cal,
        Err(e) => {
            warn!(error = %e, "Failed to parse ICS content");
            return Vec::new();
        }
    };

    calendar
        .iter()
        .filter_map(|component| match component {
            CalendarComponent::Event(event) => Some(parse_event(event, calendar_address)),
            _ => None,
        })
        .collect()
}

/// Parses a single VEVENT component.
fn parse_event(event: &Event, calendar_address: &str) -> RawEvent {
    let id = event
        .get_uid()
        .map(str::to_string)
        .unwrap_or_else(|| format!("no-uid@{}", calendar_address));

    let mut raw = RawEvent::new(id, calendar_address);

    if let Some(start) = event.get_start()
        && let Some(start) = convert_date_time(start)
    {
        raw = raw.with_start(start);
    }
    if let Some(end) = event.get_end()
        && let Some(end) = convert_date_time(end)
    {
        raw = raw.with_end(end);
    }
    if let Some(transp) = event.property_value("TRANSP") {
        raw = raw.with_transparency(Transparency::parse(transp));
    }
    if let Some(summary) = event.get_summary() {
        raw = raw.with_summary(summary);
    }
    if let Some(location) = event.get_location() {
        raw = raw.with_location(location);
    }

    debug!(
        uid = %raw.id,
        start = ?raw.start,
        transparency = ?raw.transparency,
        "Parsed event from ICS"
    );

    raw
}

/// Converts an icalendar boundary to a raw event time.
///
/// Floating datetimes are read as UTC wall time. Zoned datetimes resolve
/// their TZID against the static zone table; an unresolvable TZID leaves the
/// boundary unset, so normalization drops the record.
fn convert_date_time(dt: DatePerhapsTime) -> Option<RawEventTime> {
    match dt {
        DatePerhapsTime::Date(date) => Some(RawEventTime::Date(date)),
        DatePerhapsTime::DateTime(cdt) => resolve_instant(cdt).map(RawEventTime::DateTime),
    }
}

/// Resolves a calendar datetime to the UTC instant it denotes.
fn resolve_instant(cdt: CalendarDateTime) -> Option<DateTime<Utc>> {
    match cdt {
        CalendarDateTime::Utc(dt) => Some(dt),
        CalendarDateTime::Floating(naive) => Some(Utc.from_utc_datetime(&naive)),
        CalendarDateTime::WithTimezone { date_time, tzid } => {
            if tzid.eq_ignore_ascii_case("UTC") || tzid.eq_ignore_ascii_case("Etc/UTC") {
                return Some(Utc.from_utc_datetime(&date_time));
            }
            match ZoneRule::find(&tzid) {
                Some(rule) => Some(rule.from_local(date_time)),
                None => {
                    warn!(tzid = %tzid, "Unresolvable TZID on event boundary");
                    None
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_ics() -> &'static str {
        "BEGIN:VCALENDAR\r\n\
         VERSION:2.0\r\n\
         PRODID:-//Test//Test//EN\r\n\
         BEGIN:VEVENT\r\n\
         UID:test-event-1@example.com\r\n\
         DTSTART:20250205T100000Z\r\n\
         DTEND:20250205T110000Z\r\n\
         SUMMARY:Team Meeting\r\n\
         LOCATION:Conference Room A\r\n\
         END:VEVENT\r\n\
         END:VCALENDAR"
    }

    fn transparent_ics() -> &'static str {
        "BEGIN:VCALENDAR\r\n\
         VERSION:2.0\r\n\
         BEGIN:VEVENT\r\n\
         UID:ooo-1@example.com\r\n\
         DTSTART:20250205T100000Z\r\n\
         DTEND:20250205T110000Z\r\n\
         TRANSP:TRANSPARENT\r\n\
         SUMMARY:Focus Time\r\n\
         END:VEVENT\r\n\
         END:VCALENDAR"
    }

    fn all_day_ics() -> &'static str {
        "BEGIN:VCALENDAR\r\n\
         VERSION:2.0\r\n\
         BEGIN:VEVENT\r\n\
         UID:all-day-1@example.com\r\n\
         DTSTART;VALUE=DATE:20250210\r\n\
         DTEND;VALUE=DATE:20250211\r\n\
         SUMMARY:Company Holiday\r\n\
         END:VEVENT\r\n\
         END:VCALENDAR"
    }

    #[test]
    fn parse_basic_event() {
        let events = parse_ics_content(sample_ics(), "test-cal");

        assert_eq!(events.len(), 1);
        let event = &events[0];

        assert_eq!(event.id, "test-event-1@example.com");
        assert_eq!(event.summary, Some("Team Meeting".to_string()));
        assert_eq!(event.location, Some("Conference Room A".to_string()));
        assert_eq!(event.calendar_address, "test-cal");
        assert!(event.transparency.is_none());
        assert!(event.start.is_some_and(|t| !t.is_all_day()));
        assert!(event.end.is_some());
    }

    #[test]
    fn parse_transparent_event() {
        let events = parse_ics_content(transparent_ics(), "test-cal");

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].transparency, Some(Transparency::Transparent));
    }

    #[test]
    fn parse_all_day_event() {
        let events = parse_ics_content(all_day_ics(), "test-cal");

        assert_eq!(events.len(), 1);
        let event = &events[0];

        assert_eq!(event.id, "all-day-1@example.com");
        assert!(event.start.is_some_and(|t| t.is_all_day()));
        assert!(event.end.is_some_and(|t| t.is_all_day()));
    }

    #[test]
    fn zoned_event_converts_to_the_utc_instant() {
        // 11:00 CEST on 2025-07-05 is 09:00 UTC.
        let ics = "BEGIN:VCALENDAR\r\n\
                   VERSION:2.0\r\n\
                   BEGIN:VEVENT\r\n\
                   UID:zoned-1@example.com\r\n\
                   DTSTART;TZID=Europe/Berlin:20250705T110000\r\n\
                   DTEND;TZID=Europe/Berlin:20250705T120000\r\n\
                   SUMMARY:Standup\r\n\
                   END:VEVENT\r\n\
                   END:VCALENDAR";
        let events = parse_ics_content(ics, "test-cal");

        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].start,
            Some(RawEventTime::DateTime(
                Utc.with_ymd_and_hms(2025, 7, 5, 9, 0, 0).unwrap()
            ))
        );
        assert_eq!(
            events[0].end,
            Some(RawEventTime::DateTime(
                Utc.with_ymd_and_hms(2025, 7, 5, 10, 0, 0).unwrap()
            ))
        );
    }

    #[test]
    fn utc_tzid_alias_is_read_as_utc() {
        let ics = "BEGIN:VCALENDAR\r\n\
                   VERSION:2.0\r\n\
                   BEGIN:VEVENT\r\n\
                   UID:utc-alias-1@example.com\r\n\
                   DTSTART;TZID=UTC:20250705T090000\r\n\
                   DTEND;TZID=UTC:20250705T100000\r\n\
                   END:VEVENT\r\n\
                   END:VCALENDAR";
        let events = parse_ics_content(ics, "test-cal");

        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].start,
            Some(RawEventTime::DateTime(
                Utc.with_ymd_and_hms(2025, 7, 5, 9, 0, 0).unwrap()
            ))
        );
    }

    #[test]
    fn unresolvable_tzid_leaves_the_boundary_unset() {
        let ics = "BEGIN:VCALENDAR\r\n\
                   VERSION:2.0\r\n\
                   BEGIN:VEVENT\r\n\
                   UID:zoned-2@example.com\r\n\
                   DTSTART;TZID=America/New_York:20250705T090000\r\n\
                   DTEND;TZID=America/New_York:20250705T100000\r\n\
                   END:VEVENT\r\n\
                   END:VCALENDAR";
        let events = parse_ics_content(ics, "test-cal");

        assert_eq!(events.len(), 1);
        assert!(events[0].start.is_none());
        assert!(events[0].end.is_none());
    }

    #[test]
    fn invalid_ics_yields_nothing() {
        let events = parse_ics_content("not an ics payload", "test-cal");
        assert!(events.is_empty());
    }
}
