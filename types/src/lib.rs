use serde::{Deserialize, Serialize};

// ── Event record ─────────────────────────────────────────────────────────

/// One extracted calendar event, as handed to presentation and sync consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// ISO date, e.g. "2025-08-20"
    pub date: String,
    pub description: String,
    pub all_day: bool,
    /// "HH:MM" when the line carried an explicit time token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    /// First day of the textual range; `date` holds the range end
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_start: Option<String>,
    /// Set when the date fell outside the academic-year window
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub out_of_range: bool,
    pub page: u32,
    /// Appearance order of the source line within the document
    pub line: usize,
}

// ── Month grouping ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthGroup {
    pub year: i32,
    pub month: u32,
    /// Display label, e.g. "August 2025"
    pub label: String,
    pub events: Vec<EventRecord>,
}

// ── Per-line issues ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueRecord {
    /// "date_out_of_range", "ambiguous_month", "missing_description"
    pub kind: String,
    pub message: String,
    pub page: u32,
    pub line: usize,
}

// ── JSON output format ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionReport {
    /// e.g. "2025-2026"
    pub academic_year: String,
    pub event_count: usize,
    pub skipped_lines: usize,
    pub months: Vec<MonthGroup>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<IssueRecord>,
}

impl ExtractionReport {
    /// Iterate events across all month groups in display order.
    pub fn events(&self) -> impl Iterator<Item = &EventRecord> {
        self.months.iter().flat_map(|m| m.events.iter())
    }

    /// One-line summary for status messages.
    pub fn summary(&self) -> String {
        format!(
            "{} events extracted, {} lines skipped",
            self.event_count, self.skipped_lines
        )
    }
}
