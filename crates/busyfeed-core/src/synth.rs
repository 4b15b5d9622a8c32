//! Calendar synthesis and ICS serialization.
//!
//! Wraps the accumulated [`BusySet`] into a single output calendar. When the
//! reference timezone is a named zone, a self-contained VTIMEZONE block is
//! generated from the static [`ZoneRule`] table and the intervals are emitted
//! as TZID-qualified local times; for UTC the intervals are emitted in `Z`
//! form and no timezone block is attached.

use icalendar::{Calendar, CalendarDateTime, Component, Event, EventLike, Property};

use crate::busy::BusySet;
use crate::zone::{ReferenceZone, ZoneRule};

/// Product identifier stamped on every generated calendar.
pub const PROD_ID: &str = "-//busyfeed//EN";

/// The root output artifact: product metadata, an optional synthetic
/// timezone definition and the busy set. Constructed once per run and
/// serialized exactly once.
#[derive(Debug)]
pub struct OutputCalendar {
    zone: ReferenceZone,
    busy: BusySet,
}

impl OutputCalendar {
    /// Wraps a finished busy set for the given reference zone.
    pub fn new(busy: BusySet, zone: ReferenceZone) -> Self {
        Self { zone, busy }
    }

    /// The reference zone the intervals are expressed in.
    pub fn zone(&self) -> ReferenceZone {
        self.zone
    }

    /// The wrapped busy set.
    pub fn busy(&self) -> &BusySet {
        &self.busy
    }

    /// Whether the serialized form carries a VTIMEZONE block.
    pub fn has_timezone_block(&self) -> bool {
        !self.zone.is_utc()
    }

    /// Serializes the calendar to ICS text (CRLF line endings).
    pub fn to_ics(&self) -> String {
        let mut calendar = Calendar::new();

        if let Some(rule) = self.zone.rule() {
            calendar.timezone(rule.name);
        }

        for interval in self.busy.intervals() {
            let mut event = Event::new();
            event
                .uid(&interval.uid)
                .summary(&interval.summary)
                .timestamp(interval.dtstamp)
                .append_property(Property::new("TRANSP", "OPAQUE"));

            match self.zone.rule() {
                Some(rule) => {
                    event.starts(CalendarDateTime::WithTimezone {
                        date_time: rule.to_local(interval.start),
                        tzid: rule.name.to_string(),
                    });
                    event.ends(CalendarDateTime::WithTimezone {
                        date_time: rule.to_local(interval.end),
                        tzid: rule.name.to_string(),
                    });
                }
                None => {
                    event.starts(interval.start);
                    event.ends(interval.end);
                }
            }

            calendar.push(event.done());
        }

        let ics = brand_prod_id(&calendar.to_string());
        match self.zone.rule() {
            Some(rule) => splice_vtimezone(&ics, &vtimezone_block(rule)),
            None => ics,
        }
    }

    /// Serializes to the bytes written to the artifact file.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_ics().into_bytes()
    }
}

/// Renders the VTIMEZONE block for a zone rule.
///
/// DTSTART uses the 1970 occurrence of each transition, per convention for
/// recurring timezone definitions.
fn vtimezone_block(rule: &ZoneRule) -> String {
    let std_start = rule.dst_end.local_instant(1970);
    let dst_start = rule.dst_start.local_instant(1970);

    let mut block = String::new();
    let mut line = |s: &str| {
        block.push_str(s);
        block.push_str("\r\n");
    };

    line("BEGIN:VTIMEZONE");
    line(&format!("TZID:{}", rule.name));
    line("BEGIN:STANDARD");
    line(&format!("DTSTART:{}", std_start.format("%Y%m%dT%H%M%S")));
    line(&format!(
        "RRULE:FREQ=YEARLY;BYMONTH={};BYDAY=-1SU",
        rule.dst_end.month
    ));
    line(&format!(
        "TZOFFSETFROM:{}",
        format_utc_offset(rule.dst_offset_secs)
    ));
    line(&format!(
        "TZOFFSETTO:{}",
        format_utc_offset(rule.std_offset_secs)
    ));
    line(&format!("TZNAME:{}", rule.std_abbrev));
    line("END:STANDARD");
    line("BEGIN:DAYLIGHT");
    line(&format!("DTSTART:{}", dst_start.format("%Y%m%dT%H%M%S")));
    line(&format!(
        "RRULE:FREQ=YEARLY;BYMONTH={};BYDAY=-1SU",
        rule.dst_start.month
    ));
    line(&format!(
        "TZOFFSETFROM:{}",
        format_utc_offset(rule.std_offset_secs)
    ));
    line(&format!(
        "TZOFFSETTO:{}",
        format_utc_offset(rule.dst_offset_secs)
    ));
    line(&format!("TZNAME:{}", rule.dst_abbrev));
    line("END:DAYLIGHT");
    line("END:VTIMEZONE");

    block
}

/// Formats a UTC offset in seconds as `+HHMM` / `-HHMM`.
fn format_utc_offset(secs: i32) -> String {
    let sign = if secs < 0 { '-' } else { '+' };
    let abs = secs.unsigned_abs();
    format!("{}{:02}{:02}", sign, abs / 3600, (abs % 3600) / 60)
}

/// Rewrites the serializer's own PRODID line to [`PROD_ID`].
///
/// The icalendar crate stamps its default product identifier during
/// rendering, and appending a second PRODID property would leave both lines
/// in the output. The artifact must carry the line exactly once, so the
/// rendered text is rewritten instead.
fn brand_prod_id(ics: &str) -> String {
    let mut out = String::with_capacity(ics.len() + PROD_ID.len());
    for line in ics.split_inclusive("\r\n") {
        if line.strip_suffix("\r\n").unwrap_or(line).starts_with("PRODID:") {
            out.push_str("PRODID:");
            out.push_str(PROD_ID);
            out.push_str("\r\n");
        } else {
            out.push_str(line);
        }
    }
    out
}

/// Inserts the VTIMEZONE block ahead of the first VEVENT.
///
/// The icalendar serializer has no first-class VTIMEZONE component, so the
/// block is spliced into the rendered text. Consumers expect the timezone
/// definition before any component referencing its TZID.
fn splice_vtimezone(ics: &str, block: &str) -> String {
    let insert_at = ics
        .find("BEGIN:VEVENT")
        .or_else(|| ics.rfind("END:VCALENDAR"))
        .unwrap_or(ics.len());
    let mut out = String::with_capacity(ics.len() + block.len());
    out.push_str(&ics[..insert_at]);
    out.push_str(block);
    out.push_str(&ics[insert_at..]);
    out
}
