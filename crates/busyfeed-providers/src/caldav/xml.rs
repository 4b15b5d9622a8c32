//! XML bodies and multistatus parsing for WebDAV operations.

use std::io::Cursor;

use busyfeed_core::QueryWindow;
use chrono::{DateTime, Utc};
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, Event};

/// DAV namespace
pub const DAV_NS: &str = "DAV:";
/// CalDAV namespace
pub const CALDAV_NS: &str = "urn:ietf:params:xml:ns:caldav";

/// A calendar collection found in a PROPFIND multistatus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredCalendar {
    /// The calendar's href (path), possibly relative to the base URL.
    pub href: String,
    /// The display name, if the server supplied one.
    pub display_name: Option<String>,
}

/// One event body from a REPORT multistatus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    /// The event resource's href.
    pub href: String,
    /// The ICS payload.
    pub calendar_data: String,
}

/// Generates a PROPFIND request body for calendar discovery.
///
/// Requests displayname and resourcetype; resourcetype distinguishes
/// calendar collections from plain WebDAV collections.
pub fn propfind_calendars_body() -> String {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    let mut propfind = BytesStart::new("d:propfind");
    propfind.push_attribute(("xmlns:d", DAV_NS));
    propfind.push_attribute(("xmlns:c", CALDAV_NS));
    writer.write_event(Event::Start(propfind)).unwrap();

    writer
        .write_event(Event::Start(BytesStart::new("d:prop")))
        .unwrap();
    write_empty_element(&mut writer, "d:displayname");
    write_empty_element(&mut writer, "d:resourcetype");
    writer
        .write_event(Event::End(BytesEnd::new("d:prop")))
        .unwrap();

    writer
        .write_event(Event::End(BytesEnd::new("d:propfind")))
        .unwrap();

    let result = writer.into_inner().into_inner();
    String::from_utf8(result).unwrap()
}

/// Generates a calendar-query REPORT body bounded to the query window.
///
/// The time-range filter makes the server expand recurring events into
/// concrete occurrences inside the window.
pub fn calendar_query_body(window: &QueryWindow) -> String {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    let mut query = BytesStart::new("c:calendar-query");
    query.push_attribute(("xmlns:d", DAV_NS));
    query.push_attribute(("xmlns:c", CALDAV_NS));
    writer.write_event(Event::Start(query)).unwrap();

    writer
        .write_event(Event::Start(BytesStart::new("d:prop")))
        .unwrap();
    write_empty_element(&mut writer, "d:getetag");
    write_empty_element(&mut writer, "c:calendar-data");
    writer
        .write_event(Event::End(BytesEnd::new("d:prop")))
        .unwrap();

    writer
        .write_event(Event::Start(BytesStart::new("c:filter")))
        .unwrap();

    let mut vcal_filter = BytesStart::new("c:comp-filter");
    vcal_filter.push_attribute(("name", "VCALENDAR"));
    writer.write_event(Event::Start(vcal_filter)).unwrap();

    let mut vevent_filter = BytesStart::new("c:comp-filter");
    vevent_filter.push_attribute(("name", "VEVENT"));
    writer.write_event(Event::Start(vevent_filter)).unwrap();

    let mut time_range = BytesStart::new("c:time-range");
    time_range.push_attribute(("start", format_utc_datetime(window.start).as_str()));
    time_range.push_attribute(("end", format_utc_datetime(window.end).as_str()));
    writer.write_event(Event::Empty(time_range)).unwrap();

    writer
        .write_event(Event::End(BytesEnd::new("c:comp-filter")))
        .unwrap();
    writer
        .write_event(Event::End(BytesEnd::new("c:comp-filter")))
        .unwrap();
    writer
        .write_event(Event::End(BytesEnd::new("c:filter")))
        .unwrap();
    writer
        .write_event(Event::End(BytesEnd::new("c:calendar-query")))
        .unwrap();

    let result = writer.into_inner().into_inner();
    String::from_utf8(result).unwrap()
}

/// Parses a PROPFIND multistatus into the calendar collections it lists.
///
/// Responses whose resourcetype lacks a calendar element are skipped.
pub fn parse_propfind_response(xml: &str) -> Vec<DiscoveredCalendar> {
    let mut calendars = Vec::new();

    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut href: Option<String> = None;
    let mut display_name: Option<String> = None;
    let mut is_calendar = false;
    let mut current_element: Option<String> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                match local_name(&name) {
                    "response" => {
                        href = None;
                        display_name = None;
                        is_calendar = false;
                    }
                    "calendar" => is_calendar = true,
                    local @ ("href" | "displayname") => {
                        current_element = Some(local.to_string());
                    }
                    _ => {}
                }
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if local_name(&name) == "response"
                    && is_calendar
                    && let Some(href) = href.take()
                {
                    calendars.push(DiscoveredCalendar {
                        href,
                        display_name: display_name.take(),
                    });
                }
                current_element = None;
            }
            Ok(Event::Text(e)) => {
                if let Some(ref elem) = current_element {
                    let text = e.unescape().unwrap_or_default().to_string();
                    match elem.as_str() {
                        "href" => href = Some(text),
                        "displayname" => display_name = Some(text),
                        _ => {}
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    calendars
}

/// Parses a REPORT multistatus into per-event ICS payloads.
pub fn parse_report_response(xml: &str) -> Vec<ReportEntry> {
    let mut entries = Vec::new();

    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut href: Option<String> = None;
    let mut calendar_data: Option<String> = None;
    let mut current_element: Option<String> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                match local_name(&name) {
                    "response" => {
                        href = None;
                        calendar_data = None;
                    }
                    local @ ("href" | "calendar-data") => {
                        current_element = Some(local.to_string());
                    }
                    _ => {}
                }
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if local_name(&name) == "response"
                    && let (Some(href), Some(calendar_data)) = (href.take(), calendar_data.take())
                {
                    entries.push(ReportEntry {
                        href,
                        calendar_data,
                    });
                }
                current_element = None;
            }
            Ok(Event::Text(e)) => {
                if let Some(ref elem) = current_element {
                    let text = e.unescape().unwrap_or_default().to_string();
                    match elem.as_str() {
                        "href" => href = Some(text),
                        "calendar-data" => calendar_data = Some(text),
                        _ => {}
                    }
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(ref elem) = current_element {
                    let text = String::from_utf8_lossy(&e).to_string();
                    match elem.as_str() {
                        "href" => href = Some(text),
                        "calendar-data" => calendar_data = Some(text),
                        _ => {}
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    entries
}

fn write_empty_element(writer: &mut Writer<Cursor<Vec<u8>>>, name: &str) {
    writer
        .write_event(Event::Empty(BytesStart::new(name)))
        .unwrap();
}

/// Extracts the local name from a potentially namespaced element name.
fn local_name(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

/// Formats a datetime for time-range filters (UTC basic format).
fn format_utc_datetime(dt: DateTime<Utc>) -> String {
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn propfind_body_generation() {
        let body = propfind_calendars_body();
        assert!(body.contains("propfind"));
        assert!(body.contains("displayname"));
        assert!(body.contains("resourcetype"));
    }

    #[test]
    fn calendar_query_body_carries_window_bounds() {
        let window = QueryWindow::new(
            Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 2, 2, 0, 0, 0).unwrap(),
        );

        let body = calendar_query_body(&window);

        assert!(body.contains("calendar-query"));
        assert!(body.contains("time-range"));
        assert!(body.contains("20250201T000000Z"));
        assert!(body.contains("20250202T000000Z"));
        assert!(body.contains("VCALENDAR"));
        assert!(body.contains("VEVENT"));
    }

    #[test]
    fn parse_propfind_skips_non_calendar_collections() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<multistatus xmlns="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
  <response>
    <href>/calendars/user/work/</href>
    <propstat>
      <prop>
        <displayname>Work Calendar</displayname>
        <resourcetype>
          <collection/>
          <C:calendar/>
        </resourcetype>
      </prop>
      <status>HTTP/1.1 200 OK</status>
    </propstat>
  </response>
  <response>
    <href>/calendars/user/personal/</href>
    <propstat>
      <prop>
        <displayname>Personal</displayname>
        <resourcetype>
          <collection/>
        </resourcetype>
      </prop>
      <status>HTTP/1.1 200 OK</status>
    </propstat>
  </response>
</multistatus>"#;

        let calendars = parse_propfind_response(xml);

        assert_eq!(calendars.len(), 1);
        assert_eq!(calendars[0].href, "/calendars/user/work/");
        assert_eq!(calendars[0].display_name, Some("Work Calendar".to_string()));
    }

    #[test]
    fn parse_report_extracts_ics_payloads() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<multistatus xmlns="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
  <response>
    <href>/calendars/user/work/event1.ics</href>
    <propstat>
      <prop>
        <getetag>"abc123"</getetag>
        <C:calendar-data>BEGIN:VCALENDAR
VERSION:2.0
BEGIN:VEVENT
UID:event1@example.com
DTSTART:20250205T100000Z
DTEND:20250205T110000Z
SUMMARY:Team Meeting
END:VEVENT
END:VCALENDAR</C:calendar-data>
      </prop>
      <status>HTTP/1.1 200 OK</status>
    </propstat>
  </response>
</multistatus>"#;

        let entries = parse_report_response(xml);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].href, "/calendars/user/work/event1.ics");
        assert!(entries[0].calendar_data.contains("Team Meeting"));
    }

    #[test]
    fn parse_report_without_data_yields_nothing() {
        let xml = r#"<?xml version="1.0"?>
<multistatus xmlns="DAV:">
  <response>
    <href>/calendars/user/work/event1.ics</href>
  </response>
</multistatus>"#;

        assert!(parse_report_response(xml).is_empty());
    }

    #[test]
    fn format_datetime_utc_basic() {
        let dt = Utc.with_ymd_and_hms(2025, 2, 5, 14, 30, 0).unwrap();
        assert_eq!(format_utc_datetime(dt), "20250205T143000Z");
    }
}
