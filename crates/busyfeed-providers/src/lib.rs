//! CalendarSource trait and implementations.
//!
//! This crate provides the abstraction layer over remote calendar backends
//! and the per-record processing that feeds the busy-set:
//!
//! - [`CalendarSource`] - The trait all calendar backends implement
//! - [`RawEvent`] - Backend-agnostic raw event data
//! - [`normalize_record`] - Converts a raw record into a busy period
//! - [`select_calendars`] - Resolves which discovered calendars to query
//! - [`SourceError`] - Error types for source operations
//!
//! Each resource is processed independently: a failing source contributes
//! zero intervals and never aborts the run.

pub mod caldav;
pub mod error;
pub mod normalize;
pub mod raw_event;
pub mod selector;
pub mod source;

pub use error::{SourceError, SourceErrorCode, SourceResult};
pub use normalize::{NormalizeOutcome, RecordError, normalize_record, normalize_records};
pub use raw_event::{RawEvent, RawEventTime, Transparency};
pub use selector::{CalendarSelector, SelectionError, select_calendars};
pub use source::{BoxFuture, CalendarInfo, CalendarSource, ErrorSource, StaticSource};
