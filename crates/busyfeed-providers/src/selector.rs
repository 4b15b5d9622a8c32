//! Calendar selection for a configured resource.
//!
//! Selection is a pure function of the discovery list and the configured
//! selector: same inputs, same choice. Matching is exact and case-sensitive;
//! the first match wins. There is no retry policy here — discovery failures
//! surface earlier as resource-level errors.

use thiserror::Error;

use crate::source::CalendarInfo;

/// Which calendar(s) of a resource to query.
///
/// The legacy mode queries every discovered calendar; the explicit modes
/// pick exactly one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarSelector {
    /// Legacy mode: process every discovered calendar.
    All,
    /// Select the first calendar whose display name matches exactly.
    ByName(String),
    /// Select the first calendar whose address matches exactly.
    ByAddress(String),
}

/// Errors raised when the configured selector matches nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    /// No discovered calendar has the configured display name.
    #[error("no calendar named '{0}' found on this resource")]
    NoMatchByName(String),
    /// No discovered calendar has the configured address.
    #[error("no calendar with address '{0}' found on this resource")]
    NoMatchByAddress(String),
}

/// Resolves the calendars to query from the discovery list.
pub fn select_calendars<'a>(
    discovered: &'a [CalendarInfo],
    selector: &CalendarSelector,
) -> Result<Vec<&'a CalendarInfo>, SelectionError> {
    match selector {
        CalendarSelector::All => Ok(discovered.iter().collect()),
        CalendarSelector::ByName(name) => discovered
            .iter()
            .find(|c| c.name == *name)
            .map(|c| vec![c])
            .ok_or_else(|| SelectionError::NoMatchByName(name.clone())),
        CalendarSelector::ByAddress(address) => discovered
            .iter()
            .find(|c| c.address == *address)
            .map(|c| vec![c])
            .ok_or_else(|| SelectionError::NoMatchByAddress(address.clone())),
    }
}
