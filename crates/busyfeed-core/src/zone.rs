//! Reference timezone handling backed by a static zone-rule table.
//!
//! The output artifact must be interpretable without a timezone database at
//! read time, so named zones are described by fixed standard/daylight rules
//! embedded in this table rather than resolved dynamically. Extending support
//! to another zone is a data addition: add a row to [`ZONE_TABLE`].
//!
//! The transition rule (last Sunday of a month at a fixed local hour) is an
//! approximation that holds for the shipped zones in current years; it is not
//! a substitute for a full tz database.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;

/// Errors raised while resolving a reference timezone.
#[derive(Debug, Error)]
pub enum ZoneError {
    /// The configured zone name has no entry in the static table.
    #[error("unknown reference timezone '{0}' (known: UTC, {known})", known = known_zones())]
    UnknownZone(String),
}

/// A daylight-saving transition: the last Sunday of `month` at `local_hour`.
///
/// `local_hour` is wall-clock time in the offset that is active just before
/// the transition (standard time for the spring switch, daylight time for the
/// autumn switch).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Month of the transition (1-12).
    pub month: u32,
    /// Local hour at which the switch happens.
    pub local_hour: u32,
}

impl Transition {
    /// Returns the naive local datetime of this transition in the given year.
    pub(crate) fn local_instant(&self, year: i32) -> NaiveDateTime {
        last_sunday(year, self.month)
            .and_hms_opt(self.local_hour, 0, 0)
            .expect("transition hour is a valid time")
    }
}

/// Fixed standard/daylight rules for one named zone.
///
/// This is a static data contract: both offsets and the transition rules are
/// hard-coded so the emitted timezone block is self-contained.
#[derive(Debug, PartialEq, Eq)]
pub struct ZoneRule {
    /// IANA-style zone name used as TZID (e.g. "Europe/Berlin").
    pub name: &'static str,
    /// Abbreviation of the standard-time offset (e.g. "CET").
    pub std_abbrev: &'static str,
    /// Abbreviation of the daylight-time offset (e.g. "CEST").
    pub dst_abbrev: &'static str,
    /// Standard UTC offset in seconds east of Greenwich.
    pub std_offset_secs: i32,
    /// Daylight UTC offset in seconds east of Greenwich.
    pub dst_offset_secs: i32,
    /// When daylight time begins.
    pub dst_start: Transition,
    /// When daylight time ends.
    pub dst_end: Transition,
}

/// All named zones the feed can be anchored to.
pub static ZONE_TABLE: &[ZoneRule] = &[ZoneRule {
    name: "Europe/Berlin",
    std_abbrev: "CET",
    dst_abbrev: "CEST",
    std_offset_secs: 3600,
    dst_offset_secs: 7200,
    dst_start: Transition {
        month: 3,
        local_hour: 2,
    },
    dst_end: Transition {
        month: 10,
        local_hour: 3,
    },
}];

fn known_zones() -> String {
    ZONE_TABLE
        .iter()
        .map(|z| z.name)
        .collect::<Vec<_>>()
        .join(", ")
}

impl ZoneRule {
    /// Looks up a zone rule by its exact name.
    pub fn find(name: &str) -> Option<&'static ZoneRule> {
        ZONE_TABLE.iter().find(|z| z.name == name)
    }

    /// Returns true if daylight time is active at the given local wall time.
    ///
    /// Wall times inside the spring-forward gap are treated as daylight time;
    /// ambiguous autumn times resolve to standard time. Midnight never falls
    /// inside a transition window for the shipped rules.
    pub fn is_dst_local(&self, local: NaiveDateTime) -> bool {
        let year = local.year();
        let start = self.dst_start.local_instant(year);
        let end = self.dst_end.local_instant(year);
        local >= start && local < end
    }

    /// Returns true if daylight time is active at the given UTC instant.
    pub fn is_dst_utc(&self, utc: DateTime<Utc>) -> bool {
        let year = utc.year();
        let start = self.dst_start.local_instant(year)
            - Duration::seconds(i64::from(self.std_offset_secs));
        let end =
            self.dst_end.local_instant(year) - Duration::seconds(i64::from(self.dst_offset_secs));
        let naive = utc.naive_utc();
        naive >= start && naive < end
    }

    /// The UTC offset in seconds active at the given UTC instant.
    pub fn offset_secs_at(&self, utc: DateTime<Utc>) -> i32 {
        if self.is_dst_utc(utc) {
            self.dst_offset_secs
        } else {
            self.std_offset_secs
        }
    }

    /// Converts a local wall time in this zone to the corresponding UTC
    /// instant.
    ///
    /// Wall times inside the spring-forward gap resolve with the daylight
    /// offset and ambiguous autumn times with the standard offset, matching
    /// [`ZoneRule::is_dst_local`].
    pub fn from_local(&self, local: NaiveDateTime) -> DateTime<Utc> {
        let offset = if self.is_dst_local(local) {
            self.dst_offset_secs
        } else {
            self.std_offset_secs
        };
        (local - Duration::seconds(i64::from(offset))).and_utc()
    }

    /// Converts local midnight of `date` to the corresponding UTC instant.
    pub fn midnight_utc(&self, date: NaiveDate) -> DateTime<Utc> {
        self.from_local(date.and_hms_opt(0, 0, 0).expect("midnight is a valid time"))
    }

    /// Converts a UTC instant to the zone's local wall time.
    pub fn to_local(&self, utc: DateTime<Utc>) -> NaiveDateTime {
        utc.naive_utc() + Duration::seconds(i64::from(self.offset_secs_at(utc)))
    }
}

/// Returns the date of the last Sunday of the given month.
fn last_sunday(year: i32, month: u32) -> NaiveDate {
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .expect("valid first of month");
    let last = first_of_next - Duration::days(1);
    let back = last.weekday().num_days_from_sunday();
    last - Duration::days(i64::from(back))
}

/// The timezone in which the run's query window and all-day anchoring are
/// expressed: plain UTC, or a named zone from the static table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceZone {
    /// Instants are emitted in UTC form; no timezone block is attached.
    Utc,
    /// Instants are emitted as TZID-qualified local times.
    Named(&'static ZoneRule),
}

impl ReferenceZone {
    /// Resolves a configured zone name.
    ///
    /// An empty string or "UTC" maps to [`ReferenceZone::Utc`]; any other
    /// value must match a [`ZONE_TABLE`] entry exactly.
    pub fn parse(name: &str) -> Result<Self, ZoneError> {
        let trimmed = name.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("utc") {
            return Ok(Self::Utc);
        }
        ZoneRule::find(trimmed)
            .map(Self::Named)
            .ok_or_else(|| ZoneError::UnknownZone(trimmed.to_string()))
    }

    /// Returns the zone name as used in TZID parameters.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Utc => "UTC",
            Self::Named(rule) => rule.name,
        }
    }

    /// Returns true for plain UTC.
    pub fn is_utc(&self) -> bool {
        matches!(self, Self::Utc)
    }

    /// Returns the zone rule for a named zone.
    pub fn rule(&self) -> Option<&'static ZoneRule> {
        match self {
            Self::Utc => None,
            Self::Named(rule) => Some(rule),
        }
    }

    /// Anchors a date-only value to midnight in this zone, as a UTC instant.
    pub fn midnight_utc(&self, date: NaiveDate) -> DateTime<Utc> {
        match self {
            Self::Utc => date
                .and_hms_opt(0, 0, 0)
                .expect("midnight is a valid time")
                .and_utc(),
            Self::Named(rule) => rule.midnight_utc(date),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn berlin() -> &'static ZoneRule {
        ZoneRule::find("Europe/Berlin").unwrap()
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    mod table {
        use super::*;

        #[test]
        fn berlin_entry_present() {
            let rule = berlin();
            assert_eq!(rule.std_abbrev, "CET");
            assert_eq!(rule.dst_abbrev, "CEST");
            assert_eq!(rule.std_offset_secs, 3600);
            assert_eq!(rule.dst_offset_secs, 7200);
        }

        #[test]
        fn unknown_zone_not_found() {
            assert!(ZoneRule::find("America/New_York").is_none());
        }
    }

    mod transitions {
        use super::*;

        #[test]
        fn last_sunday_of_march_2025() {
            assert_eq!(
                last_sunday(2025, 3),
                NaiveDate::from_ymd_opt(2025, 3, 30).unwrap()
            );
        }

        #[test]
        fn last_sunday_of_october_2025() {
            assert_eq!(
                last_sunday(2025, 10),
                NaiveDate::from_ymd_opt(2025, 10, 26).unwrap()
            );
        }

        #[test]
        fn last_sunday_when_month_ends_on_sunday() {
            // 2024-03-31 is itself a Sunday.
            assert_eq!(
                last_sunday(2024, 3),
                NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()
            );
        }

        #[test]
        fn winter_is_standard_time() {
            assert!(!berlin().is_dst_utc(utc(2025, 1, 15, 12, 0, 0)));
            assert_eq!(berlin().offset_secs_at(utc(2025, 1, 15, 12, 0, 0)), 3600);
        }

        #[test]
        fn summer_is_daylight_time() {
            assert!(berlin().is_dst_utc(utc(2025, 7, 15, 12, 0, 0)));
            assert_eq!(berlin().offset_secs_at(utc(2025, 7, 15, 12, 0, 0)), 7200);
        }

        #[test]
        fn spring_switch_boundary() {
            // 2025-03-30 02:00 CET == 01:00 UTC is the switch instant.
            assert!(!berlin().is_dst_utc(utc(2025, 3, 30, 0, 59, 59)));
            assert!(berlin().is_dst_utc(utc(2025, 3, 30, 1, 0, 0)));
        }

        #[test]
        fn autumn_switch_boundary() {
            // 2025-10-26 03:00 CEST == 01:00 UTC is the switch instant.
            assert!(berlin().is_dst_utc(utc(2025, 10, 26, 0, 59, 59)));
            assert!(!berlin().is_dst_utc(utc(2025, 10, 26, 1, 0, 0)));
        }
    }

    mod anchoring {
        use super::*;

        #[test]
        fn winter_midnight_is_23h_utc_previous_day() {
            let date = NaiveDate::from_ymd_opt(2025, 1, 20).unwrap();
            assert_eq!(berlin().midnight_utc(date), utc(2025, 1, 19, 23, 0, 0));
        }

        #[test]
        fn summer_midnight_is_22h_utc_previous_day() {
            let date = NaiveDate::from_ymd_opt(2025, 7, 20).unwrap();
            assert_eq!(berlin().midnight_utc(date), utc(2025, 7, 19, 22, 0, 0));
        }

        #[test]
        fn utc_midnight_unchanged() {
            let date = NaiveDate::from_ymd_opt(2025, 7, 20).unwrap();
            assert_eq!(
                ReferenceZone::Utc.midnight_utc(date),
                utc(2025, 7, 20, 0, 0, 0)
            );
        }

        #[test]
        fn summer_wall_time_converts_with_daylight_offset() {
            let local = NaiveDate::from_ymd_opt(2025, 7, 5)
                .unwrap()
                .and_hms_opt(11, 0, 0)
                .unwrap();
            assert_eq!(berlin().from_local(local), utc(2025, 7, 5, 9, 0, 0));
        }

        #[test]
        fn winter_wall_time_converts_with_standard_offset() {
            let local = NaiveDate::from_ymd_opt(2025, 1, 20)
                .unwrap()
                .and_hms_opt(10, 30, 0)
                .unwrap();
            assert_eq!(berlin().from_local(local), utc(2025, 1, 20, 9, 30, 0));
        }

        #[test]
        fn local_roundtrip() {
            let instant = utc(2025, 7, 19, 22, 0, 0);
            let local = berlin().to_local(instant);
            assert_eq!(
                local,
                NaiveDate::from_ymd_opt(2025, 7, 20)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap()
            );
        }
    }

    mod parsing {
        use super::*;

        #[test]
        fn parse_utc_variants() {
            assert!(ReferenceZone::parse("UTC").unwrap().is_utc());
            assert!(ReferenceZone::parse("utc").unwrap().is_utc());
            assert!(ReferenceZone::parse("").unwrap().is_utc());
        }

        #[test]
        fn parse_named_zone() {
            let zone = ReferenceZone::parse("Europe/Berlin").unwrap();
            assert!(!zone.is_utc());
            assert_eq!(zone.name(), "Europe/Berlin");
        }

        #[test]
        fn parse_unknown_zone_errors() {
            let err = ReferenceZone::parse("Mars/Olympus").unwrap_err();
            assert!(err.to_string().contains("Mars/Olympus"));
            assert!(err.to_string().contains("Europe/Berlin"));
        }
    }
}
