use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};

use crate::error::PrazoError;

/// One calendar month. Ordering and equality come from the integers, so
/// `"2024-1"` and `"2024-01"` parse to the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeriodKey {
    pub year: i32,
    pub month: u32,
}

impl PeriodKey {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        // month is always 1..=12 by construction
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for PeriodKey {
    type Err = PrazoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PrazoError::InvalidDate(format!("expected YYYY-MM, got '{s}'"));
        let (y, m) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = y.parse().map_err(|_| invalid())?;
        let month: u32 = m.parse().map_err(|_| invalid())?;
        PeriodKey::new(year, month).ok_or_else(invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_pads_month() {
        let key = PeriodKey::new(2024, 3).unwrap();
        assert_eq!(key.to_string(), "2024-03");
    }

    #[test]
    fn test_parse_normalizes_unpadded_month() {
        let a: PeriodKey = "2024-1".parse().unwrap();
        let b: PeriodKey = "2024-01".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "2024-01");
    }

    #[test]
    fn test_parse_rejects_bad_month() {
        assert!("2024-13".parse::<PeriodKey>().is_err());
        assert!("2024-00".parse::<PeriodKey>().is_err());
        assert!("202401".parse::<PeriodKey>().is_err());
    }

    #[test]
    fn test_ordering_crosses_year_boundary() {
        let dec = PeriodKey::new(2023, 12).unwrap();
        let jan = PeriodKey::new(2024, 1).unwrap();
        assert!(dec < jan);
    }

    #[test]
    fn test_of_date() {
        let d = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(PeriodKey::of(d), PeriodKey::new(2024, 2).unwrap());
        assert_eq!(PeriodKey::of(d).first_day(), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
    }
}
