use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use crate::{CalendarDocument, CalendarEvent, Result};

const PROD_ID: &str = "-//Genesis Dumper//Genesis Schedule Calendar//EN";
/// RFC 5545 content lines are limited to 75 octets before folding
const MAX_LINE_OCTETS: usize = 75;

/// ICS generation options
#[derive(Debug, Clone, Default)]
pub struct IcsOptions {
    /// Written as `X-WR-TIMEZONE` when set
    pub timezone: Option<String>,
}

/// ICS calendar generator
pub struct IcsGenerator {
    options: IcsOptions,
}

impl IcsGenerator {
    pub fn new(options: IcsOptions) -> Self {
        Self { options }
    }

    /// Render the whole calendar as ICS text
    pub fn generate(&self, calendar: &CalendarDocument) -> Result<String> {
        let mut ics_content = String::new();

        push_line(&mut ics_content, "BEGIN:VCALENDAR");
        push_line(&mut ics_content, "VERSION:2.0");
        push_line(&mut ics_content, &format!("PRODID:{PROD_ID}"));
        push_line(&mut ics_content, "CALSCALE:GREGORIAN");
        push_line(&mut ics_content, "METHOD:PUBLISH");
        push_line(
            &mut ics_content,
            &format!("X-WR-CALNAME:{}", escape_text(&calendar.name)),
        );

        if let Some(ref timezone) = self.options.timezone {
            push_line(&mut ics_content, &format!("X-WR-TIMEZONE:{timezone}"));
        }

        for event in &calendar.events {
            self.add_event(&mut ics_content, event)?;
        }

        push_line(&mut ics_content, "END:VCALENDAR");

        Ok(ics_content)
    }

    fn add_event(&self, ics_content: &mut String, event: &CalendarEvent) -> Result<()> {
        if event.end < event.start {
            tracing::warn!(
                "Event '{}' ends before it starts ({} > {})",
                event.title,
                event.start,
                event.end
            );
        }

        push_line(ics_content, "BEGIN:VEVENT");
        push_line(ics_content, &format!("UID:{}", Uuid::new_v4()));
        push_line(ics_content, &format!("DTSTAMP:{}", utc_stamp(&Utc::now())));
        push_line(ics_content, &format!("DTSTART:{}", utc_stamp(&event.start)));
        push_line(ics_content, &format!("DTEND:{}", utc_stamp(&event.end)));
        push_line(
            ics_content,
            &format!("SUMMARY:{}", escape_text(&event.title)),
        );

        if !event.location.is_empty() {
            push_line(
                ics_content,
                &format!("LOCATION:{}", escape_text(&event.location)),
            );
        }

        push_line(
            ics_content,
            &format!("DESCRIPTION:{}", escape_text(&event.description)),
        );

        if !event.color.is_empty() {
            push_line(ics_content, &format!("COLOR:{}", escape_text(&event.color)));
        }

        push_line(ics_content, "END:VEVENT");

        Ok(())
    }
}

impl Default for IcsGenerator {
    fn default() -> Self {
        Self::new(IcsOptions::default())
    }
}

fn utc_stamp<Tz: TimeZone>(dt: &DateTime<Tz>) -> String {
    dt.with_timezone(&Utc).format("%Y%m%dT%H%M%SZ").to_string()
}

/// Escape ICS text values
fn escape_text(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('\r', "")
        .replace('\n', "\\n")
        .replace(',', "\\,")
        .replace(';', "\\;")
}

/// Append one content line, folded at 75 octets, terminated by CRLF.
fn push_line(ics_content: &mut String, line: &str) {
    let mut octets = 0;
    for c in line.chars() {
        let width = c.len_utf8();
        if octets + width > MAX_LINE_OCTETS {
            ics_content.push_str("\r\n ");
            // the leading space counts toward the continuation line
            octets = 1;
        }
        ics_content.push(c);
        octets += width;
    }
    ics_content.push_str("\r\n");
}

#[cfg(test)]
mod tests;
