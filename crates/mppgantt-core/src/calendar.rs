//! Working-day calendar used to shade non-working columns of the chart.

use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::BTreeSet;

/// Weekends plus a set of listed holidays
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkCalendar {
    holidays: BTreeSet<NaiveDate>,
}

impl WorkCalendar {
    pub fn new(holidays: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            holidays: holidays.into_iter().collect(),
        }
    }

    /// Saturday, Sunday, or a listed holiday
    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        matches!(date.weekday(), Weekday::Sat | Weekday::Sun) || self.holidays.contains(&date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn weekends_are_holidays() {
        let cal = WorkCalendar::default();

        // 2025-02-01 is a Saturday
        assert!(cal.is_holiday(date(2025, 2, 1)));
        assert!(cal.is_holiday(date(2025, 2, 2)));
        assert!(!cal.is_holiday(date(2025, 2, 3)));
        assert!(!cal.is_holiday(date(2025, 2, 7)));
    }

    #[test]
    fn listed_holidays_on_weekdays() {
        let cal = WorkCalendar::new([date(2025, 1, 1), date(2025, 12, 25)]);

        assert!(cal.is_holiday(date(2025, 1, 1)));
        assert!(cal.is_holiday(date(2025, 12, 25)));
        assert!(!cal.is_holiday(date(2025, 1, 2)));
    }

    #[test]
    fn duplicate_holidays_collapse() {
        let cal = WorkCalendar::new([date(2025, 5, 5), date(2025, 5, 5), date(2025, 5, 7)]);
        assert_eq!(cal, WorkCalendar::new([date(2025, 5, 7), date(2025, 5, 5)]));
        assert!(cal.is_holiday(date(2025, 5, 7)));
        assert!(!cal.is_holiday(date(2025, 5, 6)));
    }
}
