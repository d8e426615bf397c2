//! Static dictionary of English month names.
//!
//! Only the twelve full names are recognized as dates. Abbreviations are
//! listed separately so the normalizer can leave them alone instead of
//! "repairing" `Jun` into `June`.

use chrono::Month;

// ── Month name entry ─────────────────────────────────────────────────

pub struct MonthEntry {
    pub name: &'static str,
    pub month: Month,
}

/// The supported month names, in calendar order.
pub static MONTH_NAMES: &[MonthEntry] = &[
    MonthEntry {
        name: "January",
        month: Month::January,
    },
    MonthEntry {
        name: "February",
        month: Month::February,
    },
    MonthEntry {
        name: "March",
        month: Month::March,
    },
    MonthEntry {
        name: "April",
        month: Month::April,
    },
    MonthEntry {
        name: "May",
        month: Month::May,
    },
    MonthEntry {
        name: "June",
        month: Month::June,
    },
    MonthEntry {
        name: "July",
        month: Month::July,
    },
    MonthEntry {
        name: "August",
        month: Month::August,
    },
    MonthEntry {
        name: "September",
        month: Month::September,
    },
    MonthEntry {
        name: "October",
        month: Month::October,
    },
    MonthEntry {
        name: "November",
        month: Month::November,
    },
    MonthEntry {
        name: "December",
        month: Month::December,
    },
];

/// Common short forms. Never matched as dates.
pub static ABBREVIATIONS: &[&str] = &[
    "jan", "feb", "mar", "apr", "jun", "jul", "aug", "sep", "sept", "oct", "nov", "dec",
];

// ── Lookup ───────────────────────────────────────────────────────────

/// Resolve a full month name, case-insensitively.
pub fn parse_month(s: &str) -> Option<Month> {
    MONTH_NAMES
        .iter()
        .find(|e| e.name.eq_ignore_ascii_case(s))
        .map(|e| e.month)
}

pub fn is_abbreviation(s: &str) -> bool {
    let s = s.trim_end_matches('.');
    ABBREVIATIONS.iter().any(|a| a.eq_ignore_ascii_case(s))
}

/// Canonical display name for a month.
pub fn month_name(month: Month) -> &'static str {
    MONTH_NAMES[month.number_from_month() as usize - 1].name
}

/// Build a regex alternation matching any full month name.
/// Longest first so no name can shadow a longer one.
pub fn build_month_regex() -> String {
    let mut names: Vec<&str> = MONTH_NAMES.iter().map(|e| e.name).collect();
    names.sort_by_key(|n| std::cmp::Reverse(n.len()));
    format!("(?:{})", names.join("|"))
}
