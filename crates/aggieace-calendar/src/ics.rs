// SPDX-FileCopyrightText: 2026 AggieAce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! iCalendar rendering and structural validation.

use chrono::{DateTime, Days, NaiveDate, Utc, Weekday};

use aggieace_core::{AggieError, ClassMetadata};

use crate::events::{EventTime, ExtractedEvent, Schedule};

/// PRODID written into every calendar.
pub const PRODID: &str = "-//AggieAce//Syllabus Converter//EN";

const UID_DOMAIN: &str = "aggieace.converter";

/// Escape TEXT values: backslash, semicolon, comma and newline.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            other => out.push(other),
        }
    }
    out
}

fn byday(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}

fn push_span(lines: &mut Vec<String>, date: NaiveDate, time: EventTime) {
    let day = date.format("%Y%m%d");
    match time {
        EventTime::AllDay => {
            let next = date.checked_add_days(Days::new(1)).unwrap_or(date);
            lines.push(format!("DTSTART;VALUE=DATE:{day}"));
            lines.push(format!("DTEND;VALUE=DATE:{}", next.format("%Y%m%d")));
        }
        EventTime::Timed { start, end } => {
            lines.push(format!("DTSTART:{day}T{}", start.format("%H%M%S")));
            lines.push(format!("DTEND:{day}T{}", end.format("%H%M%S")));
        }
    }
}

/// Render `events` as an iCalendar document stamped with the current time.
///
/// Fails with a conversion error when there is nothing to render.
pub fn generate_ics(events: &[ExtractedEvent], metadata: &ClassMetadata) -> Result<String, AggieError> {
    generate_ics_at(events, metadata, Utc::now())
}

/// [`generate_ics`] with an explicit DTSTAMP.
pub fn generate_ics_at(
    events: &[ExtractedEvent],
    metadata: &ClassMetadata,
    stamp: DateTime<Utc>,
) -> Result<String, AggieError> {
    if events.is_empty() {
        return Err(AggieError::conversion(
            "no valid events could be parsed from extraction",
        ));
    }

    let calendar_name = escape_text(&metadata.display_name());
    let dtstamp = stamp.format("%Y%m%dT%H%M%SZ").to_string();

    let mut lines = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        "CALSCALE:GREGORIAN".to_string(),
        format!("PRODID:{PRODID}"),
        format!("X-WR-TIMEZONE:{}", metadata.timezone),
        format!("X-WR-CALNAME:{calendar_name}"),
    ];

    for event in events {
        let name = escape_text(&event.name);
        lines.push("BEGIN:VEVENT".to_string());
        lines.push(format!("UID:{}@{UID_DOMAIN}", uuid::Uuid::new_v4()));
        lines.push(format!("DTSTAMP:{dtstamp}"));
        lines.push(format!("SUMMARY:{calendar_name} - {name}"));
        lines.push(format!("LOCATION:{}", escape_text(&event.location)));
        lines.push("STATUS:CONFIRMED".to_string());

        match &event.schedule {
            Schedule::Single(date) => {
                push_span(&mut lines, *date, event.time);
                lines.push(format!("DESCRIPTION:{name}"));
            }
            Schedule::Weekly { days, first, until } => {
                push_span(&mut lines, *first, event.time);
                let days: Vec<&str> = days.iter().copied().map(byday).collect();
                lines.push(format!(
                    "RRULE:FREQ=WEEKLY;BYDAY={};UNTIL={}T235959",
                    days.join(","),
                    until.format("%Y%m%d")
                ));
                lines.push(format!("DESCRIPTION:Recurring {name}"));
            }
        }
        lines.push("END:VEVENT".to_string());
    }
    lines.push("END:VCALENDAR".to_string());

    let mut text = lines.join("\r\n");
    text.push_str("\r\n");
    Ok(text)
}

/// Check the structure of an iCalendar document and count its events.
pub fn validate_ics(text: &str) -> Result<usize, AggieError> {
    for required in [
        "BEGIN:VCALENDAR",
        "VERSION:2.0",
        "CALSCALE:GREGORIAN",
        "END:VCALENDAR",
    ] {
        if !text.contains(required) {
            return Err(AggieError::conversion(format!(
                "invalid calendar: missing required element '{required}'"
            )));
        }
    }

    let begins = text.matches("BEGIN:VEVENT").count();
    let ends = text.matches("END:VEVENT").count();
    if begins == 0 || ends == 0 {
        return Err(AggieError::conversion("invalid calendar: no events found"));
    }
    if begins != ends {
        return Err(AggieError::conversion(format!(
            "invalid calendar: {begins} BEGIN:VEVENT but {ends} END:VEVENT"
        )));
    }
    Ok(begins)
}
