//! Output projections: the month-grouped report consumed by presentation
//! code, and Google Calendar v3 event resources.

use calendar_types::{EventRecord, ExtractionReport, IssueRecord, MonthGroup};
use chrono::{NaiveDateTime, TimeDelta};
use serde::Serialize;

use crate::config::OutputConfig;
use crate::event::Event;
use crate::months::month_name;
use crate::pipeline::Extraction;
use crate::year::AcademicYear;

const TIME_FORMAT: &str = "%H:%M";
const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

// ── Report ───────────────────────────────────────────────────────────

pub fn event_record(e: &Event) -> EventRecord {
    EventRecord {
        date: e.date.to_string(),
        description: e.description.clone(),
        all_day: e.all_day,
        start_time: e.time.map(|t| t.start.format(TIME_FORMAT).to_string()),
        end_time: e
            .time
            .and_then(|t| t.end)
            .map(|t| t.format(TIME_FORMAT).to_string()),
        range_start: e.range_start.map(|d| d.to_string()),
        out_of_range: e.out_of_range,
        page: e.source.page,
        line: e.source.ordinal,
    }
}

pub fn report(extraction: &Extraction, year: &AcademicYear) -> ExtractionReport {
    let months = extraction
        .months()
        .into_iter()
        .map(|g| MonthGroup {
            year: g.year,
            month: g.month.number_from_month(),
            label: format!("{} {}", month_name(g.month), g.year),
            events: g.events.iter().map(event_record).collect(),
        })
        .collect();
    let issues = extraction
        .issues
        .iter()
        .map(|i| IssueRecord {
            kind: i.kind().to_string(),
            message: i.to_string(),
            page: i.line().page,
            line: i.line().ordinal,
        })
        .collect();
    ExtractionReport {
        academic_year: year.to_string(),
        event_count: extraction.events.len(),
        skipped_lines: extraction.skipped_lines,
        months,
        issues,
    }
}

// ── Google Calendar ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoogleEvent {
    pub summary: String,
    pub description: String,
    pub start: EventDateTime,
    pub end: EventDateTime,
}

/// Either `date` (all-day) or `dateTime` + `timeZone` is set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl EventDateTime {
    fn date(d: chrono::NaiveDate) -> Self {
        EventDateTime {
            date: Some(d.to_string()),
            date_time: None,
            time_zone: None,
        }
    }

    fn timed(dt: NaiveDateTime, zone: &str) -> Self {
        EventDateTime {
            date: None,
            date_time: Some(dt.format(DATETIME_FORMAT).to_string()),
            time_zone: Some(zone.to_string()),
        }
    }
}

/// All-day events end on the following day (Google end dates are
/// exclusive). Timed events without an end last one hour.
pub fn google_event(e: &Event, output: &OutputConfig) -> GoogleEvent {
    let (start, end) = match e.time {
        None => {
            let end = e.date.succ_opt().unwrap_or(e.date);
            (EventDateTime::date(e.date), EventDateTime::date(end))
        }
        Some(span) => {
            let start = e.date.and_time(span.start);
            let end = match span.end {
                Some(t) => e.date.and_time(t),
                None => start + TimeDelta::hours(1),
            };
            (
                EventDateTime::timed(start, &output.timezone),
                EventDateTime::timed(end, &output.timezone),
            )
        }
    };
    GoogleEvent {
        summary: e.description.clone(),
        description: output.google_description.clone(),
        start,
        end,
    }
}

pub fn google_events(events: &[Event], output: &OutputConfig) -> Vec<GoogleEvent> {
    events.iter().map(|e| google_event(e, output)).collect()
}
