//! CalDAV calendar source implementation.
//!
//! Talks to CalDAV-compatible servers:
//!
//! - PROPFIND for calendar discovery
//! - REPORT with a time-range filter for range-bounded event retrieval
//!   (the server expands recurring events)
//! - Basic authentication
//! - ICS/iCalendar parsing of returned event data
//!
//! # Example
//!
//! ```ignore
//! use busyfeed_providers::caldav::{CalDavConfig, CalDavSource};
//!
//! let config = CalDavConfig::new("https://caldav.example.com/calendars/user/")?
//!     .with_credentials("user", "password");
//! let source = CalDavSource::new(config)?;
//! let calendars = source.list_calendars().await?;
//! ```

mod client;
mod config;
mod ics;
mod source;
mod xml;

pub use config::CalDavConfig;
pub use source::CalDavSource;
