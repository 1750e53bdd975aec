use super::*;
use crate::RefinedCourseRow;
use chrono::TimeZone;
use chrono_tz::Tz;
use ical::parser::ical::{IcalParser, component::IcalEvent};
use std::io::BufReader;

fn course(name: &str, block: &str, hour: u32, room: &str, color: &str) -> RefinedCourseRow {
    let tz = Tz::America__New_York;
    RefinedCourseRow {
        block: block.to_string(),
        start_time: tz.with_ymd_and_hms(2024, 9, 3, hour, 5, 0).unwrap(),
        end_time: tz.with_ymd_and_hms(2024, 9, 3, hour, 55, 0).unwrap(),
        course_name: name.to_string(),
        teacher: "Smith".to_string(),
        room: room.to_string(),
        color: color.to_string(),
    }
}

fn property<'a>(event: &'a IcalEvent, name: &str) -> Option<&'a str> {
    event
        .properties
        .iter()
        .find(|p| p.name == name)
        .and_then(|p| p.value.as_deref())
}

#[test]
fn test_generated_calendar_parses() {
    let rows = [
        course("ap biology", "1", 8, "204", "#aabbcc"),
        course("lunch", "Lunch", 11, "", ""),
    ];
    let calendar = CalendarDocument::from_courses("Schedule for Student 1234 (2024-2025)", &rows);

    let generator = IcsGenerator::new(IcsOptions {
        timezone: Some("America/New_York".to_string()),
    });
    let ics_content = generator.generate(&calendar).expect("ICS generation failed");

    assert!(ics_content.starts_with("BEGIN:VCALENDAR\r\n"));
    assert!(ics_content.ends_with("END:VCALENDAR\r\n"));
    assert!(ics_content.contains("X-WR-TIMEZONE:America/New_York\r\n"));

    let mut parser = IcalParser::new(BufReader::new(ics_content.as_bytes()));
    let parsed = parser
        .next()
        .expect("one calendar")
        .expect("calendar parses");

    let name = parsed
        .properties
        .iter()
        .find(|p| p.name == "X-WR-CALNAME")
        .and_then(|p| p.value.clone());
    assert_eq!(
        name.as_deref(),
        Some("Schedule for Student 1234 (2024-2025)")
    );
    assert_eq!(parsed.events.len(), 2);

    let biology = parsed
        .events
        .iter()
        .find(|e| property(e, "SUMMARY") == Some("📚 AP Biology"))
        .expect("biology event");
    // 08:05 EDT is 12:05 UTC
    assert_eq!(property(biology, "DTSTART"), Some("20240903T120500Z"));
    assert_eq!(property(biology, "DTEND"), Some("20240903T125500Z"));
    assert_eq!(property(biology, "LOCATION"), Some("204"));
    assert_eq!(property(biology, "COLOR"), Some("#AABBCC"));
    assert_eq!(
        property(biology, "DESCRIPTION"),
        Some("Block: 1\\nTeacher: Smith\\nRoom: 204")
    );
    assert!(property(biology, "UID").is_some());

    let lunch = parsed
        .events
        .iter()
        .find(|e| property(e, "SUMMARY") == Some("🍴 Lunch"))
        .expect("lunch event");
    assert_eq!(property(lunch, "LOCATION"), None);
    assert_eq!(property(lunch, "COLOR"), None);
    assert_eq!(ics_content.matches("\r\nCOLOR:").count(), 1);
}

#[test]
fn test_empty_calendar() {
    let calendar = CalendarDocument::new("Empty");
    let ics_content = IcsGenerator::default().generate(&calendar).unwrap();

    assert!(ics_content.contains("X-WR-CALNAME:Empty\r\n"));
    assert!(!ics_content.contains("BEGIN:VEVENT"));
    assert!(!ics_content.contains("X-WR-TIMEZONE"));
}

#[test]
fn test_escape_text() {
    assert_eq!(escape_text("a,b;c\\d\r\ne"), "a\\,b\\;c\\\\d\\ne");
}

#[test]
fn test_long_lines_are_folded() {
    let mut out = String::new();
    let line = format!("SUMMARY:{}", "📚".repeat(30));
    push_line(&mut out, &line);

    for physical in out.split("\r\n").filter(|l| !l.is_empty()) {
        assert!(physical.len() <= MAX_LINE_OCTETS, "{physical:?} too long");
    }
    let unfolded = out.trim_end_matches("\r\n").replace("\r\n ", "");
    assert_eq!(unfolded, line);
}

#[test]
fn test_short_lines_are_untouched() {
    let mut out = String::new();
    push_line(&mut out, "VERSION:2.0");
    assert_eq!(out, "VERSION:2.0\r\n");
}
