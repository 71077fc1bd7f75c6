//! Date ranges and materialization periods.
//!
//! Weeks start on Sunday. All dates are local calendar dates.

use std::fmt;

use chrono::{Datelike, Days, NaiveDate};

use crate::constants::MONTH_GRID_DAYS;

/// Inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    /// Range from `from` to `to`, swapped if given in reverse.
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        if from <= to {
            DateRange { from, to }
        } else {
            DateRange { from: to, to: from }
        }
    }

    pub fn single(date: NaiveDate) -> Self {
        DateRange { from: date, to: date }
    }

    /// The Sunday-to-Saturday week containing `date`. The last week of the
    /// calendar is cut short at `NaiveDate::MAX`.
    pub fn week_of(date: NaiveDate) -> Self {
        let from = start_of_week(date);
        DateRange {
            from,
            to: from.checked_add_days(Days::new(6)).unwrap_or(NaiveDate::MAX),
        }
    }

    /// The 42 days of a month grid: starts on the Sunday on or before the
    /// first of the month. `None` for an invalid year/month, or when the grid
    /// would run past `NaiveDate::MAX`.
    pub fn month_grid(year: i32, month: u32) -> Option<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let from = start_of_week(first);
        let to = from.checked_add_days(Days::new(MONTH_GRID_DAYS as u64 - 1))?;
        Some(DateRange { from, to })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }

    pub fn num_days(&self) -> usize {
        ((self.to - self.from).num_days() + 1) as usize
    }

    /// Every date in the range, ascending.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let to = self.to;
        self.from.iter_days().take_while(move |d| *d <= to)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.from == self.to {
            write!(f, "{}", self.from)
        } else {
            write!(f, "{}..{}", self.from, self.to)
        }
    }
}

/// Period targeted by a materialization run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    /// Week starting on the given Sunday
    Week(NaiveDate),
    Month { year: i32, month: u32 },
}

impl Period {
    pub fn week_of(date: NaiveDate) -> Self {
        Period::Week(start_of_week(date))
    }

    pub fn month_of(date: NaiveDate) -> Self {
        Period::Month {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn range(&self) -> DateRange {
        match *self {
            Period::Week(sunday) => DateRange::week_of(sunday),
            Period::Month { year, month } => {
                let first = NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN);
                let last = first
                    .checked_add_months(chrono::Months::new(1))
                    .and_then(|next| next.pred_opt())
                    .unwrap_or(first);
                DateRange::new(first, last)
            }
        }
    }

    /// Idempotency key for single-flight guards, e.g. `week-2024-03-10`.
    pub fn key(&self) -> String {
        match self {
            Period::Week(sunday) => format!("week-{}", sunday.format("%Y-%m-%d")),
            Period::Month { year, month } => format!("month-{:04}-{:02}", year, month),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Period::Week(sunday) => write!(f, "week of {}", sunday.format("%Y-%m-%d")),
            Period::Month { .. } => write!(f, "{}", self.range().from.format("%B %Y")),
        }
    }
}

/// Most recent Sunday on or before `date`.
pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    let offset = date.weekday().num_days_from_sunday() as u64;
    date.checked_sub_days(Days::new(offset)).unwrap_or(date)
}

/// Parse YYYY-MM-DD
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| format!("Invalid date format '{}'. Expected YYYY-MM-DD", s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn start_of_week_is_sunday() {
        // 2024-03-13 is a Wednesday
        assert_eq!(start_of_week(date(2024, 3, 13)), date(2024, 3, 10));
        assert_eq!(start_of_week(date(2024, 3, 10)), date(2024, 3, 10));
        assert_eq!(start_of_week(date(2024, 3, 16)), date(2024, 3, 10));
        // Crosses a month boundary
        assert_eq!(start_of_week(date(2024, 3, 1)), date(2024, 2, 25));
    }

    #[test]
    fn month_grid_covers_six_weeks() {
        let grid = DateRange::month_grid(2024, 2).unwrap();
        assert_eq!(grid.from, date(2024, 1, 28));
        assert_eq!(grid.from.weekday(), Weekday::Sun);
        assert_eq!(grid.num_days(), 42);
        assert_eq!(grid.days().count(), 42);
        assert!(grid.contains(date(2024, 2, 29)));
    }

    #[test]
    fn month_grid_starting_on_sunday_keeps_first() {
        // 2024-09-01 is a Sunday
        let grid = DateRange::month_grid(2024, 9).unwrap();
        assert_eq!(grid.from, date(2024, 9, 1));
    }

    #[test]
    fn month_grid_rejects_invalid_month() {
        assert!(DateRange::month_grid(2024, 13).is_none());
        assert!(DateRange::month_grid(2024, 0).is_none());
    }

    #[test]
    fn ranges_at_the_end_of_the_calendar_do_not_overflow() {
        let week = DateRange::week_of(NaiveDate::MAX);
        assert_eq!(week.to, NaiveDate::MAX);
        assert_eq!(week.from.weekday(), Weekday::Sun);
        assert_eq!(week.days().last(), Some(NaiveDate::MAX));

        assert!(DateRange::month_grid(NaiveDate::MAX.year(), 12).is_none());
    }

    #[test]
    fn period_ranges() {
        let week = Period::week_of(date(2024, 3, 13));
        assert_eq!(week, Period::Week(date(2024, 3, 10)));
        assert_eq!(week.range(), DateRange::new(date(2024, 3, 10), date(2024, 3, 16)));
        assert_eq!(week.key(), "week-2024-03-10");

        let feb = Period::month_of(date(2023, 2, 14));
        assert_eq!(feb.range(), DateRange::new(date(2023, 2, 1), date(2023, 2, 28)));
        assert_eq!(feb.key(), "month-2023-02");

        let dec = Period::month_of(date(2024, 12, 5));
        assert_eq!(dec.range().to, date(2024, 12, 31));
    }
}
