//! Academic-year context and month → calendar-year resolution.
//!
//! An academic year runs from August 1st of `start_year` to July 31st of
//! `start_year + 1`. Resolution looks only at the month number: it is not
//! calendar arithmetic, so June and July land in the *later* year even though
//! they precede August numerically.

use std::fmt;
use std::str::FromStr;

use chrono::{Month, NaiveDate};

use crate::error::ExtractError;

/// First month of the academic year.
pub const START_MONTH: Month = Month::August;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AcademicYear {
    start_year: i32,
    first_day: NaiveDate,
    last_day: NaiveDate,
}

impl AcademicYear {
    pub fn new(start_year: i32) -> Result<Self, ExtractError> {
        let invalid = || ExtractError::InvalidAcademicYear(start_year.to_string());
        let first_day = NaiveDate::from_ymd_opt(start_year, 8, 1).ok_or_else(invalid)?;
        let last_day = start_year
            .checked_add(1)
            .and_then(|end| NaiveDate::from_ymd_opt(end, 7, 31))
            .ok_or_else(invalid)?;
        Ok(AcademicYear {
            start_year,
            first_day,
            last_day,
        })
    }

    pub fn start_year(&self) -> i32 {
        self.start_year
    }

    pub fn end_year(&self) -> i32 {
        self.start_year + 1
    }

    /// Aug–Dec → start year, Jan–Jul → end year.
    pub fn resolve_year(&self, month: Month) -> i32 {
        if month.number_from_month() >= START_MONTH.number_from_month() {
            self.start_year
        } else {
            self.end_year()
        }
    }

    /// Build the absolute date for a month/day, or `None` when the day does
    /// not exist in that month (e.g. February 30).
    pub fn date(&self, month: Month, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.resolve_year(month), month.number_from_month(), day)
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first_day
    }

    pub fn last_day(&self) -> NaiveDate {
        self.last_day
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.first_day && date <= self.last_day
    }
}

impl fmt::Display for AcademicYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start_year, self.end_year())
    }
}

/// Accepts "2025-2026", "2025–2026", "2025/2026" or a bare "2025".
impl FromStr for AcademicYear {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        if raw.is_empty() {
            return Err(ExtractError::MissingAcademicYear);
        }
        let invalid = || ExtractError::InvalidAcademicYear(raw.to_string());

        let parts: Vec<&str> = raw.split(['-', '–', '/']).map(str::trim).collect();
        match parts.as_slice() {
            [start] => AcademicYear::new(start.parse().map_err(|_| invalid())?),
            [start, end] => {
                let start: i32 = start.parse().map_err(|_| invalid())?;
                let end: i32 = end.parse().map_err(|_| invalid())?;
                if end != start + 1 {
                    return Err(invalid());
                }
                AcademicYear::new(start)
            }
            _ => Err(invalid()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ay() -> AcademicYear {
        AcademicYear::new(2025).unwrap()
    }

    #[test]
    fn test_resolve_year_fall_months() {
        assert_eq!(ay().resolve_year(Month::August), 2025);
        assert_eq!(ay().resolve_year(Month::September), 2025);
        assert_eq!(ay().resolve_year(Month::December), 2025);
    }

    #[test]
    fn test_resolve_year_spring_months() {
        assert_eq!(ay().resolve_year(Month::January), 2026);
        assert_eq!(ay().resolve_year(Month::May), 2026);
        assert_eq!(ay().resolve_year(Month::July), 2026);
    }

    #[test]
    fn test_resolve_year_june_is_end_year() {
        // June numerically precedes August but belongs to the later year
        assert_eq!(ay().resolve_year(Month::June), 2026);
        assert_eq!(
            ay().date(Month::June, 30),
            NaiveDate::from_ymd_opt(2026, 6, 30)
        );
    }

    #[test]
    fn test_date_rejects_nonexistent_day() {
        assert_eq!(ay().date(Month::February, 30), None);
        // 2026 is not a leap year
        assert_eq!(ay().date(Month::February, 29), None);
        let leap = AcademicYear::new(2023).unwrap();
        assert!(leap.date(Month::February, 29).is_some());
    }

    #[test]
    fn test_window_bounds() {
        let a = ay();
        assert_eq!(a.first_day(), NaiveDate::from_ymd_opt(2025, 8, 1).unwrap());
        assert_eq!(a.last_day(), NaiveDate::from_ymd_opt(2026, 7, 31).unwrap());
        assert!(a.contains(NaiveDate::from_ymd_opt(2026, 7, 31).unwrap()));
        assert!(!a.contains(NaiveDate::from_ymd_opt(2025, 7, 31).unwrap()));
        assert!(!a.contains(NaiveDate::from_ymd_opt(2026, 8, 1).unwrap()));
    }

    #[test]
    fn test_every_resolved_date_is_in_window() {
        let a = ay();
        for e in crate::months::MONTH_NAMES {
            for day in [1, 15, 28] {
                let d = a.date(e.month, day).unwrap();
                assert!(a.contains(d), "{d} should be inside {a}");
            }
        }
    }

    #[test]
    fn test_from_str_forms() {
        assert_eq!("2025-2026".parse::<AcademicYear>().unwrap(), ay());
        assert_eq!("2025–2026".parse::<AcademicYear>().unwrap(), ay());
        assert_eq!("2025/2026".parse::<AcademicYear>().unwrap(), ay());
        assert_eq!(" 2025 ".parse::<AcademicYear>().unwrap(), ay());
        assert_eq!(ay().to_string(), "2025-2026");
    }

    #[test]
    fn test_from_str_rejects_bad_input() {
        assert!(matches!(
            "".parse::<AcademicYear>(),
            Err(ExtractError::MissingAcademicYear)
        ));
        assert!(matches!(
            "2025-2027".parse::<AcademicYear>(),
            Err(ExtractError::InvalidAcademicYear(_))
        ));
        assert!(matches!(
            "twenty".parse::<AcademicYear>(),
            Err(ExtractError::InvalidAcademicYear(_))
        ));
    }
}
