//! Duplicate removal, ordering and month grouping.

use std::collections::HashSet;

use chrono::{Datelike, Month};

use crate::event::Event;

/// Collapse events sharing (date, normalized description) to the one that
/// appeared first, then order by date and appearance. Idempotent.
pub fn dedup_and_sort(mut events: Vec<Event>) -> Vec<Event> {
    events.sort_by_key(|e| e.source);
    let mut seen = HashSet::new();
    events.retain(|e| seen.insert(e.key()));
    events.sort_by_key(|e| (e.date, e.source));
    events
}

// ── Month grouping ───────────────────────────────────────────────────

/// A run of consecutive events in one calendar month.
#[derive(Debug, PartialEq)]
pub struct MonthGroup<'a> {
    pub year: i32,
    pub month: Month,
    pub events: &'a [Event],
}

/// Group a sorted event sequence by (year, month). The groups borrow from
/// `events` and preserve its order.
pub fn group_by_month(events: &[Event]) -> Vec<MonthGroup<'_>> {
    events
        .chunk_by(|a, b| (a.date.year(), a.date.month()) == (b.date.year(), b.date.month()))
        .filter_map(|run| {
            let first = run.first()?;
            let month = Month::try_from(u8::try_from(first.date.month()).ok()?).ok()?;
            Some(MonthGroup {
                year: first.date.year(),
                month,
                events: run,
            })
        })
        .collect()
}
