//! Core types: query window, zone rules, busy intervals, calendar synthesis

pub mod busy;
pub mod synth;
pub mod tracing;
pub mod window;
pub mod zone;

pub use busy::{BusyInterval, BusyPeriod, BusySet, BusySetBuilder};
pub use synth::{OutputCalendar, PROD_ID};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
pub use window::QueryWindow;
pub use zone::{ReferenceZone, ZoneError, ZoneRule};
