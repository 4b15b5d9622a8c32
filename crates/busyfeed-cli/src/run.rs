//! Run orchestration.
//!
//! One run processes every configured resource sequentially and
//! independently: discovery, calendar selection, range query,
//! normalization. A failing resource is logged, counted and skipped; it
//! never aborts the run or empties the feed for the healthy resources.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use busyfeed_core::{BusySet, BusySetBuilder, QueryWindow, ReferenceZone};
use busyfeed_providers::{
    CalendarSelector, CalendarSource, SourceError, SourceResult, normalize_records,
    select_calendars,
};

/// Immutable per-run state shared by every processing step.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// The absolute query window.
    pub window: QueryWindow,
    /// The reference zone for all-day anchoring and output rendering.
    pub zone: ReferenceZone,
    /// The display label applied to every interval.
    pub label: String,
    /// The shared processing timestamp (DTSTAMP) of this run.
    pub dtstamp: DateTime<Utc>,
}

impl RunContext {
    /// Creates a run context, sampling the processing timestamp once.
    pub fn new(window: QueryWindow, zone: ReferenceZone, label: impl Into<String>) -> Self {
        Self {
            window,
            zone,
            label: label.into(),
            dtstamp: Utc::now(),
        }
    }
}

/// Per-run outcome counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Resources that contributed (possibly zero) intervals.
    pub resources_processed: usize,
    /// Resources skipped because of a resource-level failure.
    pub resources_skipped: usize,
    /// Calendars queried across all resources.
    pub calendars_queried: usize,
    /// Raw records returned by all queries.
    pub records_seen: usize,
    /// Records dropped as malformed.
    pub records_dropped: usize,
    /// Intervals in the final busy set.
    pub intervals: usize,
}

/// One configured resource ready to be processed.
pub struct ResourceUnit {
    /// The calendar selector from the resource's configuration.
    pub selector: CalendarSelector,
    /// The backend to talk to.
    pub source: Box<dyn CalendarSource>,
}

impl ResourceUnit {
    /// Pairs a source with its selector.
    pub fn new(selector: CalendarSelector, source: Box<dyn CalendarSource>) -> Self {
        Self { selector, source }
    }
}

struct UnitOutcome {
    periods: Vec<busyfeed_core::BusyPeriod>,
    calendars: usize,
    records_seen: usize,
    records_dropped: usize,
}

/// Processes every resource and accumulates the busy set.
pub async fn execute(ctx: &RunContext, units: &[ResourceUnit]) -> (BusySet, RunReport) {
    let mut builder = BusySetBuilder::new(&ctx.label, ctx.dtstamp);
    let mut report = RunReport::default();

    if ctx.window.is_empty() {
        debug!(
            start = %ctx.window.start,
            end = %ctx.window.end,
            "Query window is empty, producing an empty feed"
        );
        return (builder.build(), report);
    }

    for unit in units {
        match process_unit(ctx, unit).await {
            Ok(outcome) => {
                report.resources_processed += 1;
                report.calendars_queried += outcome.calendars;
                report.records_seen += outcome.records_seen;
                report.records_dropped += outcome.records_dropped;
                builder.extend(outcome.periods);
            }
            Err(e) => {
                warn!(resource = %unit.source.name(), error = %e, "Skipping resource");
                report.resources_skipped += 1;
            }
        }
    }

    let busy = builder.build();
    report.intervals = busy.len();

    info!(
        processed = report.resources_processed,
        skipped = report.resources_skipped,
        calendars = report.calendars_queried,
        dropped = report.records_dropped,
        intervals = report.intervals,
        "Run complete"
    );

    (busy, report)
}

async fn process_unit(ctx: &RunContext, unit: &ResourceUnit) -> SourceResult<UnitOutcome> {
    let discovered = unit.source.list_calendars().await?;
    let selected = select_calendars(&discovered, &unit.selector)
        .map_err(|e| SourceError::selection(e.to_string()).with_source_name(unit.source.name()))?;

    let mut outcome = UnitOutcome {
        periods: Vec::new(),
        calendars: selected.len(),
        records_seen: 0,
        records_dropped: 0,
    };

    for calendar in selected {
        let records = unit.source.search_events(calendar, &ctx.window).await?;
        outcome.records_seen += records.len();

        let (periods, dropped) = normalize_records(&records, ctx.zone);
        outcome.records_dropped += dropped;
        outcome.periods.extend(periods);
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use busyfeed_providers::{CalendarInfo, ErrorSource, RawEvent, RawEventTime, StaticSource,
        Transparency};
    use chrono::{Duration, TimeZone};

    fn window() -> QueryWindow {
        QueryWindow::new(
            Utc.with_ymd_and_hms(2025, 2, 5, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 2, 6, 0, 0, 0).unwrap(),
        )
    }

    fn ctx() -> RunContext {
        RunContext::new(window(), ReferenceZone::Utc, "Busy")
    }

    fn timed_event(id: &str, cal: &str, start_h: u32, end_h: u32) -> RawEvent {
        let day = Utc.with_ymd_and_hms(2025, 2, 5, 0, 0, 0).unwrap();
        RawEvent::new(id, cal)
            .with_start(RawEventTime::DateTime(day + Duration::hours(start_h as i64)))
            .with_end(RawEventTime::DateTime(day + Duration::hours(end_h as i64)))
    }

    fn healthy_source() -> StaticSource {
        StaticSource::new("healthy")
            .with_calendar(CalendarInfo::new("cal-addr", "Work"))
            .with_event(timed_event("e1", "cal-addr", 9, 10).with_summary("Standup"))
            .with_event(
                timed_event("e2", "cal-addr", 12, 13)
                    .with_transparency(Transparency::Transparent),
            )
            .with_event(timed_event("e3", "cal-addr", 14, 15))
    }

    #[tokio::test]
    async fn processes_healthy_resource() {
        let units = vec![ResourceUnit::new(
            CalendarSelector::All,
            Box::new(healthy_source()),
        )];

        let (busy, report) = execute(&ctx(), &units).await;

        assert_eq!(report.resources_processed, 1);
        assert_eq!(report.resources_skipped, 0);
        assert_eq!(report.records_seen, 3);
        assert_eq!(report.records_dropped, 0);
        // The transparent record contributes nothing.
        assert_eq!(busy.len(), 2);
        assert!(busy.intervals().iter().all(|i| i.summary == "Busy"));
    }

    #[tokio::test]
    async fn failing_resource_is_skipped_not_fatal() {
        let units = vec![
            ResourceUnit::new(
                CalendarSelector::All,
                Box::new(ErrorSource::new(
                    "down",
                    SourceError::network("connection refused"),
                )),
            ),
            ResourceUnit::new(CalendarSelector::All, Box::new(healthy_source())),
        ];

        let (busy, report) = execute(&ctx(), &units).await;

        assert_eq!(report.resources_processed, 1);
        assert_eq!(report.resources_skipped, 1);
        assert_eq!(busy.len(), 2);
    }

    #[tokio::test]
    async fn selector_miss_skips_the_resource() {
        let units = vec![ResourceUnit::new(
            CalendarSelector::ByName("Nonexistent".to_string()),
            Box::new(healthy_source()),
        )];

        let (busy, report) = execute(&ctx(), &units).await;

        assert_eq!(report.resources_processed, 0);
        assert_eq!(report.resources_skipped, 1);
        assert!(busy.is_empty());
    }

    #[tokio::test]
    async fn empty_window_produces_empty_feed() {
        let now = Utc.with_ymd_and_hms(2025, 2, 5, 0, 0, 0).unwrap();
        let ctx = RunContext::new(
            QueryWindow::new(now, now - Duration::hours(1)),
            ReferenceZone::Utc,
            "Busy",
        );
        let units = vec![ResourceUnit::new(
            CalendarSelector::All,
            Box::new(healthy_source()),
        )];

        let (busy, report) = execute(&ctx, &units).await;

        assert!(busy.is_empty());
        assert_eq!(report.resources_processed, 0);
    }

    #[tokio::test]
    async fn malformed_records_are_counted() {
        let source = StaticSource::new("partial")
            .with_calendar(CalendarInfo::new("cal-addr", "Work"))
            .with_event(timed_event("good", "cal-addr", 9, 10))
            .with_event(timed_event("inverted", "cal-addr", 11, 10))
            .with_event(RawEvent::new("no-times", "cal-addr"));

        let units = vec![ResourceUnit::new(CalendarSelector::All, Box::new(source))];
        let (busy, report) = execute(&ctx(), &units).await;

        assert_eq!(busy.len(), 1);
        assert_eq!(report.records_seen, 3);
        assert_eq!(report.records_dropped, 2);
    }

    #[tokio::test]
    async fn no_resources_yields_empty_feed() {
        let (busy, report) = execute(&ctx(), &[]).await;
        assert!(busy.is_empty());
        assert_eq!(report, RunReport::default());
    }
}
