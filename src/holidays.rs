//! Fixed-rule US holidays, used to date lines where OCR dropped the day
//! number ("May  Memorial Day").

use chrono::{Datelike, Month, NaiveDate, Weekday};

// ── Holiday rule entry ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub enum DayRule {
    Fixed(u32),
    /// n-th (1-based) weekday of the month
    Nth(Weekday, u8),
    Last(Weekday),
}

pub struct HolidayRule {
    /// Lowercase substrings, any of which identifies the holiday.
    pub keywords: &'static [&'static str],
    pub month: Month,
    pub rule: DayRule,
}

pub static HOLIDAYS: &[HolidayRule] = &[
    HolidayRule {
        keywords: &["memorial"],
        month: Month::May,
        rule: DayRule::Last(Weekday::Mon),
    },
    HolidayRule {
        keywords: &["labor"],
        month: Month::September,
        rule: DayRule::Nth(Weekday::Mon, 1),
    },
    HolidayRule {
        keywords: &["indigenous", "columbus"],
        month: Month::October,
        rule: DayRule::Nth(Weekday::Mon, 2),
    },
    HolidayRule {
        keywords: &["veteran"],
        month: Month::November,
        rule: DayRule::Fixed(11),
    },
    HolidayRule {
        keywords: &["martin luther", "mlk"],
        month: Month::January,
        rule: DayRule::Nth(Weekday::Mon, 3),
    },
    HolidayRule {
        keywords: &["juneteenth"],
        month: Month::June,
        rule: DayRule::Fixed(19),
    },
    HolidayRule {
        keywords: &["independence"],
        month: Month::July,
        rule: DayRule::Fixed(4),
    },
];

impl DayRule {
    pub fn day_in(self, year: i32, month: Month) -> Option<u32> {
        let m = month.number_from_month();
        match self {
            DayRule::Fixed(d) => NaiveDate::from_ymd_opt(year, m, d).map(|_| d),
            DayRule::Nth(wd, n) => NaiveDate::from_weekday_of_month_opt(year, m, wd, n).map(|d| d.day()),
            DayRule::Last(wd) => (4..=5)
                .rev()
                .find_map(|n| NaiveDate::from_weekday_of_month_opt(year, m, wd, n))
                .map(|d| d.day()),
        }
    }
}

/// Day of `month` in `year` for the holiday named in `text`, if any rule
/// for that month matches.
pub fn infer_day(text: &str, month: Month, year: i32) -> Option<u32> {
    let lower = text.to_lowercase();
    HOLIDAYS
        .iter()
        .filter(|h| h.month == month)
        .find(|h| h.keywords.iter().any(|k| lower.contains(k)))
        .and_then(|h| h.rule.day_in(year, month))
}
