//! Date pattern matcher.
//!
//! Finds the first `<Month> <Day>` on a line and, at that position, tries
//! the three supported shapes in priority order:
//!
//!   1. `December 22-January 2 Winter Break`   cross-month range
//!   2. `August 11-12 Leadership Time`         same-month range
//!   3. `August 20 First Day of School`        single date
//!
//! Only full month names count. Abbreviations and month names without a
//! day number do not match.

use std::sync::LazyLock;

use chrono::Month;
use regex::{Captures, Regex};

use crate::holidays;
use crate::months::{self, build_month_regex};
use crate::normalize::GRID_NOISE;
use crate::types::{DateMatch, DateShape, NormalizedLine};
use crate::year::AcademicYear;

// ── Regex building blocks ────────────────────────────────────────────

const DAY: &str = r"(\d{1,2})(?:st|nd|rd|th)?\b";
const SEP: &str = r"(?:\s*[-–—]\s*|\s+to\s+)";

/// First date-like position on a line.
static RE_LOCATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\b({})\s*{DAY}", build_month_regex())).unwrap()
});

static RE_CROSS_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    let m = build_month_regex();
    Regex::new(&format!(r"(?i)^({m})\s*{DAY}{SEP}({m})\s*{DAY}")).unwrap()
});

static RE_SAME_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)^({})\s*{DAY}{SEP}{DAY}", build_month_regex())).unwrap()
});

static RE_SINGLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)^({})\s*{DAY}", build_month_regex())).unwrap()
});

/// A month name followed by text but no day number.
static RE_MONTH_ONLY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\b({})\s+(\D.*)$", build_month_regex())).unwrap()
});

/// Separators plus every glyph the normalizer treats as grid noise.
fn junk_class() -> String {
    let noise: String = GRID_NOISE
        .iter()
        .map(|c| regex::escape(c.encode_utf8(&mut [0; 4])))
        .collect();
    format!(r"[\s,;:\[\]{noise}]")
}

static RE_LEADING_JUNK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^{}+", junk_class())).unwrap());
static RE_TRAILING_JUNK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("{}+$", junk_class())).unwrap());
/// `, 2025` left behind by `August 20, 2025 First Day`
static RE_LEADING_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\s,]*(?:19|20)\d{2}(?:\s+|$)").unwrap());
static RE_ONLY_JUNK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\d\s\-,i|]+$").unwrap());

// ── Description cleaning ─────────────────────────────────────────────

/// Strip separator junk and leaked month headers from event text.
/// Returns an empty string when nothing meaningful is left.
pub fn clean_description(raw: &str) -> String {
    let s = RE_LEADING_JUNK.replace(raw, "");
    let s = RE_TRAILING_JUNK.replace(&s, "");

    // Grid month banners often merge into cell text ("MAY January Staff ...")
    let mut words: Vec<&str> = s.split_whitespace().collect();
    let leading_months = words
        .iter()
        .take_while(|w| {
            let w = w.trim_end_matches(['.', ',']);
            months::parse_month(w).is_some() || months::is_abbreviation(w)
        })
        .count();
    words.drain(..leading_months);
    let s = words.join(" ");

    if s.is_empty() || RE_ONLY_JUNK.is_match(&s) {
        return String::new();
    }
    s
}

/// Text after the date tokens. An explicit `|` or `[` separator wins.
fn description_after(after: &str) -> String {
    let after = RE_LEADING_YEAR.replace(after, "");
    if let Some((_, rest)) = after.split_once('|') {
        return clean_description(rest);
    }
    if let Some((_, rest)) = after.split_once('[') {
        return clean_description(rest.trim_end_matches(']'));
    }
    clean_description(&after)
}

fn build_match(
    shape: DateShape,
    caps: &Captures,
    rest: &str,
    end_month: Option<Month>,
    end_day: Option<u32>,
    line: &NormalizedLine,
) -> Option<DateMatch> {
    let start_month = months::parse_month(&caps[1])?;
    let start_day: u32 = caps[2].parse().ok()?;
    let end = caps.get(0)?.end();
    Some(DateMatch {
        shape,
        start_month,
        start_day,
        end_month,
        end_day,
        description: description_after(&rest[end..]),
        source: line.source,
    })
}

// ── Matcher ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct Matcher {
    /// Academic year used to date holiday lines that lack a day number.
    holiday_year: Option<AcademicYear>,
}

impl Matcher {
    pub fn new() -> Self {
        Matcher::default()
    }

    pub fn with_holiday_inference(mut self, year: AcademicYear) -> Self {
        self.holiday_year = Some(year);
        self
    }

    /// Does the line contain a `<Month> <Day>` anywhere?
    pub fn has_date(text: &str) -> bool {
        RE_LOCATE.is_match(text)
    }

    /// Match one normalized line. Lines carrying an ambiguous month token
    /// never match.
    pub fn match_line(&self, line: &NormalizedLine) -> Option<DateMatch> {
        if line.ambiguous_month.is_some() {
            return None;
        }
        let text = line.text.as_str();
        let Some(loc) = RE_LOCATE.find(text) else {
            return self.match_holiday(line);
        };
        let rest = &text[loc.start()..];

        if let Some(caps) = RE_CROSS_RANGE.captures(rest) {
            let end_month = months::parse_month(&caps[3]);
            let end_day = caps[4].parse().ok();
            return build_match(DateShape::CrossMonthRange, &caps, rest, end_month, end_day, line);
        }
        if let Some(caps) = RE_SAME_RANGE.captures(rest) {
            let end_day = caps[3].parse().ok();
            return build_match(DateShape::SameMonthRange, &caps, rest, None, end_day, line);
        }
        let caps = RE_SINGLE.captures(rest)?;
        build_match(DateShape::Single, &caps, rest, None, None, line)
    }

    fn match_holiday(&self, line: &NormalizedLine) -> Option<DateMatch> {
        let year = self.holiday_year?;
        let caps = RE_MONTH_ONLY.captures(&line.text)?;
        let month = months::parse_month(&caps[1])?;
        let text = &caps[2];
        let day = holidays::infer_day(text, month, year.resolve_year(month))?;
        Some(DateMatch {
            shape: DateShape::InferredHoliday,
            start_month: month,
            start_day: day,
            end_month: None,
            end_day: None,
            description: clean_description(text),
            source: line.source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AmbiguousMonth, LineRef};

    fn line(s: &str) -> NormalizedLine {
        NormalizedLine {
            text: s.to_string(),
            source: LineRef { ordinal: 3, page: 0 },
            ambiguous_month: None,
        }
    }

    fn m(s: &str) -> Option<DateMatch> {
        Matcher::new().match_line(&line(s))
    }

    // ── match_line ──

    #[test]
    fn test_single_date() {
        let d = m("August 20 First Day of School").unwrap();
        assert_eq!(d.shape, DateShape::Single);
        assert_eq!((d.start_month, d.start_day), (Month::August, 20));
        assert_eq!(d.end_day, None);
        assert_eq!(d.description, "First Day of School");
        assert_eq!(d.source.ordinal, 3);
    }

    #[test]
    fn test_same_month_range() {
        let d = m("August 11-12 Leadership Time").unwrap();
        assert_eq!(d.shape, DateShape::SameMonthRange);
        assert_eq!(d.start_day, 11);
        assert_eq!(d.end_day, Some(12));
        assert_eq!(d.end_month, None);
        assert_eq!(d.end(), (Month::August, 12));
        assert_eq!(d.description, "Leadership Time");
    }

    #[test]
    fn test_cross_month_range() {
        let d = m("December 22-January 2 Winter Break").unwrap();
        assert_eq!(d.shape, DateShape::CrossMonthRange);
        assert_eq!((d.start_month, d.start_day), (Month::December, 22));
        assert_eq!(d.end(), (Month::January, 2));
        assert_eq!(d.description, "Winter Break");
    }

    #[test]
    fn test_separators() {
        for s in [
            "March 16 - 20 Spring Break",
            "March 16–20 Spring Break",
            "March 16 — 20 Spring Break",
            "March 16 to 20 Spring Break",
        ] {
            let d = m(s).unwrap();
            assert_eq!(d.end_day, Some(20), "{s}");
            assert_eq!(d.description, "Spring Break", "{s}");
        }
        let d = m("December 22 to January 2 Winter Break").unwrap();
        assert_eq!(d.shape, DateShape::CrossMonthRange);
    }

    #[test]
    fn test_ordinal_suffixes() {
        let d = m("November 27th-28th Thanksgiving Break").unwrap();
        assert_eq!((d.start_day, d.end_day), (27, Some(28)));
        assert_eq!(m("June 1st Graduation").unwrap().start_day, 1);
    }

    #[test]
    fn test_case_insensitive_months() {
        assert_eq!(m("SEPTEMBER 1 Labor Day").unwrap().start_month, Month::September);
        assert_eq!(m("october 13 No School").unwrap().start_month, Month::October);
    }

    #[test]
    fn test_abbreviated_month_does_not_match() {
        assert!(m("Sept 3 Back to School Night").is_none());
        assert!(m("Aug 20 First Day").is_none());
    }

    #[test]
    fn test_month_without_day_does_not_match() {
        assert!(m("May Memorial Day").is_none());
        assert!(m("January").is_none());
    }

    #[test]
    fn test_year_number_is_not_a_day() {
        assert!(m("August 2025").is_none());
    }

    #[test]
    fn test_only_first_date_used() {
        let d = m("Progress reports: October 10 and November 14").unwrap();
        assert_eq!((d.start_month, d.start_day), (Month::October, 10));
        assert_eq!(d.description, "and November 14");
    }

    #[test]
    fn test_pipe_and_bracket_separators() {
        assert_eq!(m("September 1 | Labor Day").unwrap().description, "Labor Day");
        assert_eq!(
            m("September 1 Mon | Labor Day").unwrap().description,
            "Labor Day"
        );
        assert_eq!(m("October 13 [No School]").unwrap().description, "No School");
    }

    #[test]
    fn test_empty_description() {
        assert_eq!(m("August 20").unwrap().description, "");
        assert_eq!(m("August 20 | 1 i 2").unwrap().description, "");
    }

    #[test]
    fn test_ambiguous_line_never_matches() {
        let mut l = line("Juny 5 Field Day June 6");
        l.ambiguous_month = Some(AmbiguousMonth {
            token: "Juny".to_string(),
            candidates: vec!["June", "July"],
        });
        assert!(Matcher::new().match_line(&l).is_none());
    }

    #[test]
    fn test_has_date() {
        assert!(Matcher::has_date("then April 3 Conferences"));
        assert!(!Matcher::has_date("Parent Conferences"));
    }

    #[test]
    fn test_grid_glyph_between_date_and_text() {
        for s in ["August 20 ─ First Day", "August 20 • First Day", "August 20 │ First Day"] {
            assert_eq!(m(s).unwrap().description, "First Day", "{s}");
        }
    }

    #[test]
    fn test_year_after_day_is_dropped() {
        assert_eq!(m("August 20, 2025 First Day").unwrap().description, "First Day");
        assert_eq!(m("January 5 2026 Classes Resume").unwrap().description, "Classes Resume");
        assert_eq!(m("June 4 2025-26 Awards").unwrap().description, "2025-26 Awards");
    }

    #[test]
    fn test_description_keeps_name_and_number() {
        assert_eq!(
            m("October 10 Mary 5 Retirement").unwrap().description,
            "Mary 5 Retirement"
        );
    }

    // ── clean_description ──

    #[test]
    fn test_clean_description_strips_junk() {
        assert_eq!(clean_description(" :- First Day ;|"), "First Day");
        assert_eq!(clean_description("  Winter   Break "), "Winter Break");
    }

    #[test]
    fn test_clean_description_drops_leaked_months() {
        assert_eq!(
            clean_description("MAY January Staff Development Time"),
            "Staff Development Time"
        );
        assert_eq!(clean_description("Sept. Picnic"), "Picnic");
    }

    #[test]
    fn test_clean_description_rejects_digit_junk() {
        assert_eq!(clean_description("12 - 13, 14"), "");
        assert_eq!(clean_description("1 i 2"), "");
        assert_eq!(clean_description("7th Grade Trip"), "7th Grade Trip");
    }

    // ── holiday inference ──

    #[test]
    fn test_holiday_inference_opt_in() {
        let ay = AcademicYear::new(2025).unwrap();
        let matcher = Matcher::new().with_holiday_inference(ay);
        let d = matcher.match_line(&line("May Memorial Day")).unwrap();
        assert_eq!(d.shape, DateShape::InferredHoliday);
        assert_eq!((d.start_month, d.start_day), (Month::May, 25));
        assert_eq!(d.description, "Memorial Day");
        assert!(matcher.match_line(&line("May Staff Picnic")).is_none());
    }
}
