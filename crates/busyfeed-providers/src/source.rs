//! CalendarSource trait definition.
//!
//! A [`CalendarSource`] represents one configured remote resource and
//! exposes the two operations the run needs: discovering calendars and
//! querying events over an absolute window. Both may fail; failures are
//! caught per resource by the caller and never propagate to the whole run.

use std::future::Future;
use std::pin::Pin;

use busyfeed_core::QueryWindow;

use crate::error::{SourceError, SourceResult};
use crate::raw_event::RawEvent;

/// A discovered remote calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarInfo {
    /// Absolute address of the calendar collection.
    pub address: String,
    /// Human-readable display name.
    pub name: String,
}

impl CalendarInfo {
    /// Creates calendar info with the given address and name.
    pub fn new(address: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: name.into(),
        }
    }
}

/// A boxed future for async trait methods.
///
/// Boxed futures keep the trait object-safe so sources can be held behind
/// `dyn CalendarSource`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The abstraction over remote calendar backends.
pub trait CalendarSource: Send + Sync {
    /// A short name identifying this source in logs (e.g. the resource URL).
    fn name(&self) -> &str;

    /// Discovers all calendars on this resource.
    fn list_calendars(&self) -> BoxFuture<'_, SourceResult<Vec<CalendarInfo>>>;

    /// Fetches the raw events of one calendar inside the query window.
    ///
    /// Recurring events are expanded server-side by the range query; this
    /// layer performs no expansion of its own.
    fn search_events<'a>(
        &'a self,
        calendar: &'a CalendarInfo,
        window: &'a QueryWindow,
    ) -> BoxFuture<'a, SourceResult<Vec<RawEvent>>>;
}

/// A source that always fails.
///
/// Stands in for a resource whose client could not be constructed, and
/// doubles as the unreachable-resource fixture in tests.
#[derive(Debug)]
pub struct ErrorSource {
    name: String,
    error: SourceError,
}

impl ErrorSource {
    /// Creates an error source.
    pub fn new(name: impl Into<String>, error: SourceError) -> Self {
        Self {
            name: name.into(),
            error,
        }
    }

    fn cloned_error(&self) -> SourceError {
        SourceError::new(self.error.code(), self.error.message()).with_source_name(&self.name)
    }
}

impl CalendarSource for ErrorSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_calendars(&self) -> BoxFuture<'_, SourceResult<Vec<CalendarInfo>>> {
        let error = self.cloned_error();
        Box::pin(async move { Err(error) })
    }

    fn search_events<'a>(
        &'a self,
        _calendar: &'a CalendarInfo,
        _window: &'a QueryWindow,
    ) -> BoxFuture<'a, SourceResult<Vec<RawEvent>>> {
        let error = self.cloned_error();
        Box::pin(async move { Err(error) })
    }
}

/// An in-memory source serving a fixed discovery list and event set.
///
/// Used by pipeline tests to drive the run without a network.
#[derive(Debug, Default)]
pub struct StaticSource {
    name: String,
    calendars: Vec<CalendarInfo>,
    events: Vec<RawEvent>,
}

impl StaticSource {
    /// Creates an empty static source.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            calendars: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Adds a calendar to the discovery list.
    pub fn with_calendar(mut self, calendar: CalendarInfo) -> Self {
        self.calendars.push(calendar);
        self
    }

    /// Adds an event served for its calendar's queries.
    pub fn with_event(mut self, event: RawEvent) -> Self {
        self.events.push(event);
        self
    }
}

impl CalendarSource for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_calendars(&self) -> BoxFuture<'_, SourceResult<Vec<CalendarInfo>>> {
        let calendars = self.calendars.clone();
        Box::pin(async move { Ok(calendars) })
    }

    fn search_events<'a>(
        &'a self,
        calendar: &'a CalendarInfo,
        _window: &'a QueryWindow,
    ) -> BoxFuture<'a, SourceResult<Vec<RawEvent>>> {
        let events: Vec<_> = self
            .events
            .iter()
            .filter(|e| e.calendar_address == calendar.address)
            .cloned()
            .collect();
        Box::pin(async move { Ok(events) })
    }
}
