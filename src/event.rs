//! Event construction from date matches.
//!
//! A range is dated on its END day; the start is kept only as
//! `range_start`. Events are all-day unless the description carries an
//! explicit time token.

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveTime};
use regex::{Captures, Regex};
use serde::Serialize;

use crate::error::LineIssue;
use crate::months::month_name;
use crate::types::{DateMatch, LineRef};
use crate::year::AcademicYear;

// ── Time span ────────────────────────────────────────────────────────

/// Naive wall-clock times, no timezone attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeSpan {
    pub start: NaiveTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<NaiveTime>,
}

// ── Event ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub date: NaiveDate,
    /// Trimmed, original case.
    pub description: String,
    pub all_day: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<TimeSpan>,
    /// First day of the range this event closes, if it came from one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range_start: Option<NaiveDate>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub out_of_range: bool,
    pub source: LineRef,
}

/// Description form used for duplicate detection: lowercase, single spaces.
pub fn normalized_description(s: &str) -> String {
    s.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

impl Event {
    pub fn key(&self) -> (NaiveDate, String) {
        (self.date, normalized_description(&self.description))
    }
}

// ── Time tokens ──────────────────────────────────────────────────────

/// `9:00 AM - 10:30 AM`, `9:00 - 10:00`
static RE_CLOCK_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2}):(\d{2})\s*([ap]m)?\s*[-–]\s*(\d{1,2}):(\d{2})\s*([ap]m)?\b").unwrap()
});

/// `9 AM - 10 PM`
static RE_HOUR_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})\s*([ap]m)\s*[-–]\s*(\d{1,2})\s*([ap]m)\b").unwrap()
});

/// `9:00 AM`
static RE_CLOCK_MERIDIEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d{1,2}):(\d{2})\s*([ap]m)\b").unwrap());

/// `9 PM`
static RE_HOUR_MERIDIEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d{1,2})\s*([ap]m)\b").unwrap());

/// `14:30`
static RE_CLOCK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(\d{1,2}):(\d{2})\b").unwrap());

fn to_time(hour: &str, minute: Option<&str>, meridiem: Option<&str>) -> Option<NaiveTime> {
    let mut h: u32 = hour.parse().ok()?;
    let m: u32 = match minute {
        Some(s) => s.parse().ok()?,
        None => 0,
    };
    match meridiem.map(str::to_ascii_lowercase).as_deref() {
        Some(mer) => {
            if !(1..=12).contains(&h) {
                return None;
            }
            if mer == "pm" && h != 12 {
                h += 12;
            } else if mer == "am" && h == 12 {
                h = 0;
            }
        }
        // Bare early hours on a school calendar are afternoon
        None if (1..=7).contains(&h) => h += 12,
        None => {}
    }
    NaiveTime::from_hms_opt(h, m, 0)
}

fn group<'a>(caps: &'a Captures, i: usize) -> Option<&'a str> {
    caps.get(i).map(|m| m.as_str())
}

/// The first explicit time token in `text`, most specific pattern first.
pub fn extract_time(text: &str) -> Option<TimeSpan> {
    if let Some(c) = RE_CLOCK_RANGE.captures(text) {
        let (start_mer, end_mer) = (group(&c, 3), group(&c, 6));
        let start = to_time(&c[1], Some(&c[2]), start_mer.or(end_mer))?;
        let end = to_time(&c[4], Some(&c[5]), end_mer)?;
        return Some(TimeSpan {
            start,
            end: Some(end),
        });
    }
    if let Some(c) = RE_HOUR_RANGE.captures(text) {
        let start = to_time(&c[1], None, Some(&c[2]))?;
        let end = to_time(&c[3], None, Some(&c[4]))?;
        return Some(TimeSpan {
            start,
            end: Some(end),
        });
    }
    if let Some(c) = RE_CLOCK_MERIDIEM.captures(text) {
        let start = to_time(&c[1], Some(&c[2]), Some(&c[3]))?;
        return Some(TimeSpan { start, end: None });
    }
    if let Some(c) = RE_HOUR_MERIDIEM.captures(text) {
        let start = to_time(&c[1], None, Some(&c[2]))?;
        return Some(TimeSpan { start, end: None });
    }
    let c = RE_CLOCK.captures(text)?;
    let start = to_time(&c[1], Some(&c[2]), None)?;
    Some(TimeSpan { start, end: None })
}

// ── Event builder ────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct EventBuilder {
    year: AcademicYear,
    detect_times: bool,
    min_description_len: usize,
}

impl EventBuilder {
    pub fn new(year: AcademicYear) -> Self {
        EventBuilder {
            year,
            detect_times: true,
            min_description_len: 3,
        }
    }

    pub fn detect_times(mut self, on: bool) -> Self {
        self.detect_times = on;
        self
    }

    pub fn min_description_len(mut self, n: usize) -> Self {
        self.min_description_len = n;
        self
    }

    pub fn year(&self) -> AcademicYear {
        self.year
    }

    fn resolve(&self, month: chrono::Month, day: u32, line: LineRef) -> Result<NaiveDate, LineIssue> {
        self.year
            .date(month, day)
            .ok_or_else(|| LineIssue::DateOutOfRange {
                line,
                detail: format!(
                    "{} {day} is not a calendar date in {}",
                    month_name(month),
                    self.year.resolve_year(month)
                ),
            })
    }

    /// Turn a match into an event. Problems are pushed onto `issues`; an
    /// event outside the academic year is still returned, flagged.
    pub fn build(&self, m: &DateMatch, issues: &mut Vec<LineIssue>) -> Option<Event> {
        let description = m.description.trim();
        if description.chars().count() < self.min_description_len {
            issues.push(LineIssue::MissingDescription { line: m.source });
            return None;
        }

        let (end_month, end_day) = m.end();
        let dates = self.resolve(end_month, end_day, m.source).and_then(|date| {
            let range_start = if m.is_range() {
                Some(self.resolve(m.start_month, m.start_day, m.source)?)
            } else {
                None
            };
            Ok((date, range_start))
        });
        let (date, range_start) = match dates {
            Ok(d) => d,
            Err(issue) => {
                issues.push(issue);
                return None;
            }
        };

        let out_of_range = match window_issue(&self.year, date, m.source) {
            Some(issue) => {
                issues.push(issue);
                true
            }
            None => false,
        };

        let time = if self.detect_times {
            extract_time(description)
        } else {
            None
        };

        Some(Event {
            date,
            description: description.to_string(),
            all_day: time.is_none(),
            time,
            range_start,
            out_of_range,
            source: m.source,
        })
    }
}

/// A `DateOutOfRange` issue when `date` lies outside the academic year.
pub fn window_issue(year: &AcademicYear, date: NaiveDate, line: LineRef) -> Option<LineIssue> {
    (!year.contains(date)).then(|| LineIssue::DateOutOfRange {
        line,
        detail: format!("{date} falls outside academic year {year}"),
    })
}
