//! CalDAV calendar source.

use tracing::{debug, info, warn};

use crate::error::SourceResult;
use crate::raw_event::RawEvent;
use crate::source::{BoxFuture, CalendarInfo, CalendarSource};
use busyfeed_core::QueryWindow;

use super::client::CalDavClient;
use super::config::CalDavConfig;
use super::ics::parse_ics_content;
use super::xml::{
    calendar_query_body, parse_propfind_response, parse_report_response, propfind_calendars_body,
};

/// A configured CalDAV resource.
///
/// Discovery runs a PROPFIND against the base URL; event queries run a
/// calendar-query REPORT against the selected calendar's address.
pub struct CalDavSource {
    client: CalDavClient,
    config: CalDavConfig,
    name: String,
}

impl CalDavSource {
    /// Creates a new CalDAV source with the given configuration.
    pub fn new(config: CalDavConfig) -> SourceResult<Self> {
        if config.is_plain_http() {
            warn!(url = %config.url_str(), "Resource uses plain HTTP; credentials are sent unencrypted");
        }

        let client = CalDavClient::new(config.clone())?;
        let name = config.url_str().to_string();

        Ok(Self {
            client,
            config,
            name,
        })
    }

    async fn discover(&self) -> SourceResult<Vec<CalendarInfo>> {
        let url = self.config.url_str();
        let body = propfind_calendars_body();

        debug!(url = %url, "Discovering calendars via PROPFIND");

        let response = self.client.propfind(url, &body, 1).await?;
        let discovered = parse_propfind_response(&response);

        if discovered.is_empty() {
            // The URL may itself be a calendar collection rather than a
            // principal; query it directly.
            debug!("No calendars found via PROPFIND, treating base URL as a calendar");
            return Ok(vec![CalendarInfo::new(url, url)]);
        }

        info!(count = discovered.len(), "Discovered calendars");

        Ok(discovered
            .into_iter()
            .map(|c| {
                let address = resolve_href(&self.config.url, &c.href);
                let name = c.display_name.unwrap_or_else(|| c.href.clone());
                CalendarInfo::new(address, name)
            })
            .collect())
    }

    async fn query(
        &self,
        calendar: &CalendarInfo,
        window: &QueryWindow,
    ) -> SourceResult<Vec<RawEvent>> {
        debug!(
            calendar = %calendar.address,
            start = %window.start,
            end = %window.end,
            "Fetching events with REPORT"
        );

        let body = calendar_query_body(window);
        let response = self.client.report(&calendar.address, &body).await?;
        let entries = parse_report_response(&response);

        let mut events = Vec::new();
        for entry in entries {
            events.extend(parse_ics_content(&entry.calendar_data, &calendar.address));
        }

        info!(
            calendar = %calendar.address,
            count = events.len(),
            "Fetched and parsed events"
        );

        Ok(events)
    }
}

impl CalendarSource for CalDavSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_calendars(&self) -> BoxFuture<'_, SourceResult<Vec<CalendarInfo>>> {
        Box::pin(async move {
            self.discover()
                .await
                .map_err(|e| e.with_source_name(&self.name))
        })
    }

    fn search_events<'a>(
        &'a self,
        calendar: &'a CalendarInfo,
        window: &'a QueryWindow,
    ) -> BoxFuture<'a, SourceResult<Vec<RawEvent>>> {
        Box::pin(async move {
            self.query(calendar, window)
                .await
                .map_err(|e| e.with_source_name(&self.name))
        })
    }
}

/// Resolves a relative href against a base URL.
fn resolve_href(base: &url::Url, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else {
        base.join(href)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| href.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_creation() {
        let config = CalDavConfig::new("https://caldav.example.com/calendars/user/").unwrap();
        let source = CalDavSource::new(config);
        assert!(source.is_ok());
    }

    #[test]
    fn source_name_is_the_resource_url() {
        let config = CalDavConfig::new("https://caldav.example.com/").unwrap();
        let source = CalDavSource::new(config).unwrap();
        assert_eq!(source.name(), "https://caldav.example.com/");
    }

    #[test]
    fn resolve_relative_href() {
        let base = url::Url::parse("https://caldav.example.com/calendars/user/").unwrap();

        assert_eq!(
            resolve_href(&base, "work/"),
            "https://caldav.example.com/calendars/user/work/"
        );

        assert_eq!(
            resolve_href(&base, "/calendars/user/personal/"),
            "https://caldav.example.com/calendars/user/personal/"
        );

        assert_eq!(
            resolve_href(&base, "https://other.example.com/cal/"),
            "https://other.example.com/cal/"
        );
    }
}
