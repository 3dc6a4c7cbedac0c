// SPDX-FileCopyrightText: 2026 AggieAce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parsing of the event list produced by the extraction step.
//!
//! Each useful line has the shape `Name | Date(s) | Time | Location`, pipe
//! or tab separated. A date field made of weekday names (`Mon/Wed`, `TR`,
//! `Tuesdays and Thursdays`) yields a weekly event for the whole semester;
//! anything else must parse as a single calendar date or the line is
//! skipped.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use tracing::{debug, warn};

use aggieace_core::ClassMetadata;

/// Location used when the extraction gives none.
pub const DEFAULT_LOCATION: &str = "TBA";

/// When an event happens within its day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTime {
    AllDay,
    Timed { start: NaiveTime, end: NaiveTime },
}

/// Which days an event occupies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Schedule {
    /// A one-off event.
    Single(NaiveDate),
    /// Every week on `days`, from `first` (itself one of `days`) through
    /// `until`.
    Weekly {
        days: Vec<Weekday>,
        first: NaiveDate,
        until: NaiveDate,
    },
}

/// One event recovered from the extraction output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedEvent {
    pub name: String,
    pub schedule: Schedule,
    pub time: EventTime,
    pub location: String,
}

/// Parse extraction output into events scoped to the semester in `metadata`.
///
/// Blank lines, `#` comments, `-` bullets, lines without a separator and
/// lines with fewer than three fields are ignored. Lines whose date cannot
/// be understood are skipped with a warning.
pub fn parse_extracted_events(text: &str, metadata: &ClassMetadata) -> Vec<ExtractedEvent> {
    let start = metadata.semester_start;
    let end = metadata.semester_end;
    let mut events = Vec::new();

    for line in text.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') || line.starts_with('-') {
            continue;
        }

        let separator = if line.contains('|') {
            '|'
        } else if line.contains('\t') {
            '\t'
        } else {
            debug!(line, "skipping line without field separator");
            continue;
        };
        let fields: Vec<&str> = line.split(separator).map(str::trim).collect();
        if fields.len() < 3 {
            debug!(line, "skipping line with fewer than three fields");
            continue;
        }

        let name = fields[0].to_string();
        let date_field = fields[1];
        let location = fields
            .get(3)
            .filter(|loc| !loc.is_empty())
            .map_or_else(|| DEFAULT_LOCATION.to_string(), |loc| loc.to_string());

        let Some(schedule) = parse_schedule(date_field, start, end) else {
            warn!(event = %name, date = date_field, "skipping event with unparseable date");
            continue;
        };

        events.push(ExtractedEvent {
            name,
            schedule,
            time: parse_time(fields[2]),
            location,
        });
    }

    events
}

fn parse_schedule(field: &str, start: NaiveDate, end: NaiveDate) -> Option<Schedule> {
    let days = weekdays_in(field);
    let has_digits = field.chars().any(|c| c.is_ascii_digit());

    if !days.is_empty() && !has_digits {
        return weekly(days, start, end);
    }
    if let Some(date) = parse_date(field, start, end) {
        return Some(Schedule::Single(date));
    }
    if !days.is_empty() {
        return weekly(days, start, end);
    }
    None
}

fn weekly(days: Vec<Weekday>, start: NaiveDate, end: NaiveDate) -> Option<Schedule> {
    let first = first_occurrence(start, &days);
    if first > end {
        return None;
    }
    Some(Schedule::Weekly {
        days,
        first,
        until: end,
    })
}

/// First date on or after `start` falling on one of `days`.
pub fn first_occurrence(start: NaiveDate, days: &[Weekday]) -> NaiveDate {
    start
        .iter_days()
        .take(7)
        .find(|d| days.contains(&d.weekday()))
        .unwrap_or(start)
}

fn day_name(token: &str) -> Option<Weekday> {
    let token = match token.strip_suffix('s') {
        Some(stem) if stem.ends_with("day") => stem,
        _ => token,
    };
    match token {
        "monday" | "mon" | "m" => Some(Weekday::Mon),
        "tuesday" | "tues" | "tue" | "tu" | "t" => Some(Weekday::Tue),
        "wednesday" | "wed" | "w" => Some(Weekday::Wed),
        "thursday" | "thurs" | "thur" | "thu" | "th" | "r" => Some(Weekday::Thu),
        "friday" | "fri" | "f" => Some(Weekday::Fri),
        "saturday" | "sat" | "s" => Some(Weekday::Sat),
        "sunday" | "sun" | "su" => Some(Weekday::Sun),
        _ => None,
    }
}

/// Split compact day codes such as `mwf` or `tth`.
fn compact_days(token: &str) -> Option<Vec<Weekday>> {
    const CODES: &[(&str, Weekday)] = &[
        ("th", Weekday::Thu),
        ("tu", Weekday::Tue),
        ("su", Weekday::Sun),
        ("m", Weekday::Mon),
        ("t", Weekday::Tue),
        ("w", Weekday::Wed),
        ("r", Weekday::Thu),
        ("f", Weekday::Fri),
        ("s", Weekday::Sat),
    ];
    if token.len() > 7 {
        return None;
    }
    let mut rest = token;
    let mut days = Vec::new();
    while !rest.is_empty() {
        let (code, day) = CODES.iter().find(|(code, _)| rest.starts_with(code))?;
        days.push(*day);
        rest = &rest[code.len()..];
    }
    Some(days)
}

fn is_filler(token: &str) -> bool {
    matches!(token, "and" | "every" | "each" | "weekly" | "on")
}

/// Weekdays named in a date field, in calendar order.
///
/// Words glued to digits (`5th`) are ignored. Single letters and compact
/// codes only count when the whole field is about weekdays, so `October`
/// does not read as Tuesday/Thursday.
fn weekdays_in(field: &str) -> Vec<Weekday> {
    let tokens: Vec<String> = field
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty() && t.chars().all(|c| c.is_ascii_alphabetic()))
        .map(str::to_ascii_lowercase)
        .collect();

    let only_weekdays = !tokens.is_empty()
        && tokens
            .iter()
            .all(|t| is_filler(t) || day_name(t).is_some() || compact_days(t).is_some());

    let mut days = Vec::new();
    for token in &tokens {
        if only_weekdays {
            if let Some(day) = day_name(token) {
                days.push(day);
            } else if let Some(compact) = compact_days(token) {
                days.extend(compact);
            }
        } else if token.len() >= 2
            && let Some(day) = day_name(token)
        {
            days.push(day);
        }
    }

    days.sort_by_key(|d| d.num_days_from_monday());
    days.dedup();
    days
}

/// Drop weekday words, ordinal suffixes and the `Sept` spelling.
fn normalize_date(raw: &str) -> String {
    let without_weekdays: Vec<&str> = raw
        .split_whitespace()
        .filter(|word| {
            let bare = word.trim_end_matches([',', '.']).to_ascii_lowercase();
            !(bare.len() >= 3 && day_name(&bare).is_some())
        })
        .collect();
    let joined = without_weekdays.join(" ");

    let chars: Vec<char> = joined.chars().collect();
    let mut out = String::with_capacity(joined.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        out.push(c);
        if c.is_ascii_digit()
            && let Some(pair) = chars.get(i + 1..i + 3)
        {
            let suffix = pair.iter().collect::<String>().to_ascii_lowercase();
            let boundary = chars.get(i + 3).is_none_or(|n| !n.is_ascii_alphabetic());
            if boundary && matches!(suffix.as_str(), "st" | "nd" | "rd" | "th") {
                i += 3;
                continue;
            }
        }
        i += 1;
    }

    out.split_whitespace()
        .map(|word| {
            if word.trim_end_matches('.').eq_ignore_ascii_case("sept") {
                "Sep".to_string()
            } else {
                word.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse a single event date.
///
/// Accepts `MM/DD/YYYY`, `MM/DD`, `Month DD, YYYY`, `Month DD` and
/// `Mon DD`. Dates without a year take the semester's start year, or its
/// end year when that would put them before the semester starts.
pub fn parse_date(raw: &str, start: NaiveDate, end: NaiveDate) -> Option<NaiveDate> {
    let cleaned = normalize_date(raw.trim());
    if cleaned.is_empty() {
        return None;
    }

    const WITH_YEAR: &[&str] = &["%m/%d/%Y", "%B %d, %Y", "%B %d %Y", "%Y-%m-%d"];
    for fmt in WITH_YEAR {
        if let Ok(date) = NaiveDate::parse_from_str(&cleaned, fmt) {
            return Some(date);
        }
    }

    const WITHOUT_YEAR: &[&str] = &["%m/%d", "%B %d"];
    for fmt in WITHOUT_YEAR {
        let with_year = |year: i32| {
            NaiveDate::parse_from_str(&format!("{cleaned} {year}"), &format!("{fmt} %Y")).ok()
        };
        let in_start_year = with_year(start.year());
        match in_start_year {
            Some(date) if date >= start => return Some(date),
            _ => {
                if let Some(date) = with_year(end.year()) {
                    return Some(date);
                }
                if in_start_year.is_some() {
                    return in_start_year;
                }
            }
        }
    }

    None
}

/// Parse the time field of an event.
///
/// Empty, `all-day` and `all day` mean an all-day event. Otherwise only
/// digits, `:` and `-` are kept and read as `HH:MM-HH:MM`; a lone start time
/// lasts one hour. Anything unreadable falls back to all-day.
pub fn parse_time(raw: &str) -> EventTime {
    let lower = raw.trim().to_ascii_lowercase();
    if lower.is_empty() || lower.contains("all-day") || lower.contains("all day") {
        return EventTime::AllDay;
    }

    let cleaned: String = lower
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ':' || *c == '-')
        .collect();
    let (start_part, end_part) = match cleaned.split_once('-') {
        Some((s, e)) => (s, Some(e)),
        None => (cleaned.as_str(), None),
    };

    let Some(start) = parse_clock(start_part) else {
        warn!(time = raw, "unreadable event time; treating as all-day");
        return EventTime::AllDay;
    };

    let one_hour_later = match start.overflowing_add_signed(Duration::hours(1)) {
        (end, 0) => end,
        _ => NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(start),
    };

    let end = match end_part.and_then(parse_clock) {
        Some(end) if end > start => end,
        // "11:00-1:00" written on a 12 hour clock.
        Some(end) => match end.overflowing_add_signed(Duration::hours(12)) {
            (afternoon, 0) if afternoon > start => afternoon,
            _ => one_hour_later,
        },
        None => one_hour_later,
    };

    EventTime::Timed { start, end }
}

fn parse_clock(part: &str) -> Option<NaiveTime> {
    let part = part.trim();
    if part.is_empty() {
        return None;
    }
    let (h, m) = match part.split_once(':') {
        Some((h, m)) => (h, m),
        None => (part, "0"),
    };
    let hour: u32 = h.parse().ok()?;
    let minute: u32 = if m.is_empty() { 0 } else { m.parse().ok()? };
    NaiveTime::from_hms_opt(hour, minute, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fall() -> ClassMetadata {
        ClassMetadata::parse("CSCE 311", "546", "08/25/2025", "12/16/2025", "America/Chicago")
            .unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn parses_pipe_separated_single_event() {
        let events = parse_extracted_events("Midterm Exam | 10/15/2025 | 14:00-15:15 | ZACH 350", &fall());
        assert_eq!(events.len(), 1);
        let e = &events[0];
        assert_eq!(e.name, "Midterm Exam");
        assert_eq!(e.schedule, Schedule::Single(date(2025, 10, 15)));
        assert_eq!(
            e.time,
            EventTime::Timed {
                start: time(14, 0),
                end: time(15, 15)
            }
        );
        assert_eq!(e.location, "ZACH 350");
    }

    #[test]
    fn tab_separated_with_missing_location_defaults_to_tba() {
        let events = parse_extracted_events("Final Exam\t12/12/2025\tall-day", &fall());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].location, DEFAULT_LOCATION);
        assert_eq!(events[0].time, EventTime::AllDay);
    }

    #[test]
    fn skips_comments_bullets_and_short_lines() {
        let text = "# Events for CSCE 311\n\n- note\nJust prose without fields\nQuiz | 09/10/2025\nQuiz 1 | 09/10/2025 | 9:00 | HRBB 124\n";
        let events = parse_extracted_events(text, &fall());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "Quiz 1");
    }

    #[test]
    fn weekday_names_become_weekly_event() {
        let events = parse_extracted_events("Lecture | Mon/Wed/Fri | 10:20-11:10 | HRBB 113", &fall());
        match &events[0].schedule {
            Schedule::Weekly { days, first, until } => {
                assert_eq!(days, &vec![Weekday::Mon, Weekday::Wed, Weekday::Fri]);
                // 08/25/2025 is a Monday.
                assert_eq!(*first, date(2025, 8, 25));
                assert_eq!(*until, date(2025, 12, 16));
            }
            other => panic!("expected weekly schedule, got {other:?}"),
        }
    }

    #[test]
    fn compact_codes_and_plural_names_are_understood() {
        assert_eq!(weekdays_in("TR"), vec![Weekday::Tue, Weekday::Thu]);
        assert_eq!(weekdays_in("TTh"), vec![Weekday::Tue, Weekday::Thu]);
        assert_eq!(
            weekdays_in("Tuesdays and Thursdays"),
            vec![Weekday::Tue, Weekday::Thu]
        );
        assert_eq!(weekdays_in("MWF"), vec![Weekday::Mon, Weekday::Wed, Weekday::Fri]);
    }

    #[test]
    fn month_names_are_not_weekdays() {
        assert!(weekdays_in("October 1st").is_empty());
        assert!(weekdays_in("March 3").is_empty());
        assert!(weekdays_in("September 5th").is_empty());
    }

    #[test]
    fn weekly_event_starts_on_first_matching_day() {
        let events = parse_extracted_events("Lab | Thursday | 15:00-16:50 | ETB 1020", &fall());
        match &events[0].schedule {
            Schedule::Weekly { first, .. } => assert_eq!(*first, date(2025, 8, 28)),
            other => panic!("expected weekly schedule, got {other:?}"),
        }
    }

    #[test]
    fn year_less_dates_use_semester_years() {
        let start = date(2025, 8, 25);
        let end = date(2026, 1, 10);
        assert_eq!(parse_date("10/15", start, end), Some(date(2025, 10, 15)));
        assert_eq!(parse_date("01/05", start, end), Some(date(2026, 1, 5)));
        assert_eq!(parse_date("January 5", start, end), Some(date(2026, 1, 5)));
        assert_eq!(parse_date("Sep 3", start, end), Some(date(2025, 9, 3)));
        assert_eq!(parse_date("Sept 3", start, end), Some(date(2025, 9, 3)));
    }

    #[test]
    fn full_dates_in_several_formats() {
        let start = date(2025, 8, 25);
        let end = date(2025, 12, 16);
        assert_eq!(parse_date("10/15/2025", start, end), Some(date(2025, 10, 15)));
        assert_eq!(
            parse_date("October 15, 2025", start, end),
            Some(date(2025, 10, 15))
        );
        assert_eq!(
            parse_date("Wednesday, October 15th", start, end),
            Some(date(2025, 10, 15))
        );
        assert_eq!(parse_date("TBA", start, end), None);
    }

    #[test]
    fn weekday_with_explicit_date_is_single_event() {
        let events = parse_extracted_events("Exam 2 | Mon 11/03 | 19:00-21:00 | ILCB 111", &fall());
        assert_eq!(events[0].schedule, Schedule::Single(date(2025, 11, 3)));
    }

    #[test]
    fn unparseable_dates_are_skipped() {
        let events = parse_extracted_events(
            "Project | See Canvas | all-day | TBA\nHomework 1 | 09/05/2025 | all-day | Canvas",
            &fall(),
        );
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "Homework 1");
    }

    #[test]
    fn time_forms() {
        assert_eq!(parse_time(""), EventTime::AllDay);
        assert_eq!(parse_time("All Day"), EventTime::AllDay);
        assert_eq!(parse_time("TBA"), EventTime::AllDay);
        assert_eq!(
            parse_time("9:10"),
            EventTime::Timed {
                start: time(9, 10),
                end: time(10, 10)
            }
        );
        assert_eq!(
            parse_time("14:00 - 15:15 CT"),
            EventTime::Timed {
                start: time(14, 0),
                end: time(15, 15)
            }
        );
        assert_eq!(
            parse_time("11:00-1:00"),
            EventTime::Timed {
                start: time(11, 0),
                end: time(13, 0)
            }
        );
    }

    #[test]
    fn late_single_time_does_not_wrap_past_midnight() {
        match parse_time("23:30") {
            EventTime::Timed { start, end } => {
                assert_eq!(start, time(23, 30));
                assert!(end > start);
            }
            EventTime::AllDay => panic!("expected a timed event"),
        }
    }

    proptest! {
        #[test]
        fn timed_events_always_end_after_they_start(h in 0u32..24, m in 0u32..60, raw_end in "[0-9]{1,2}:[0-9]{2}") {
            let raw = format!("{h}:{m:02}-{raw_end}");
            if let EventTime::Timed { start, end } = parse_time(&raw) {
                prop_assert!(end > start, "{raw} gave {start}..{end}");
            }
        }

        #[test]
        fn numeric_dates_inside_the_semester_parse(offset in 0u64..113) {
            let meta = fall();
            let day = meta.semester_start.checked_add_days(chrono::Days::new(offset)).unwrap();
            let text = day.format("%m/%d/%Y").to_string();
            prop_assert_eq!(parse_date(&text, meta.semester_start, meta.semester_end), Some(day));
        }
    }
}
