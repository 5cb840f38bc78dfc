use chrono::{Datelike, Days, Months, NaiveDate, Weekday};

use crate::error::{PrazoError, Result};
use crate::models::{RecurrenceType, WeekendRule};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| PrazoError::InvalidDate(format!("expected YYYY-MM-DD, got '{raw}'")))
}

/// Move a Saturday/Sunday due date onto a business day. Weekdays pass through.
pub fn adjust_for_weekend(date: NaiveDate, rule: WeekendRule) -> NaiveDate {
    let (back, forward) = match date.weekday() {
        Weekday::Sat => (1, 2),
        Weekday::Sun => (2, 1),
        _ => return date,
    };
    match rule {
        WeekendRule::None => date,
        WeekendRule::Advance => date.checked_sub_days(Days::new(back)).unwrap_or(date),
        WeekendRule::Postpone => date.checked_add_days(Days::new(forward)).unwrap_or(date),
    }
}

/// Months covered by one step of the recurrence. Fixed types ignore the
/// stored interval; `None` has no step.
pub fn step_months(recurrence: RecurrenceType, interval: Option<u32>) -> Option<u32> {
    match recurrence {
        RecurrenceType::None => None,
        RecurrenceType::Monthly => Some(1),
        RecurrenceType::Bimonthly => Some(2),
        RecurrenceType::Quarterly => Some(3),
        RecurrenceType::Semiannual => Some(6),
        RecurrenceType::Annual => Some(12),
        RecurrenceType::Custom => Some(interval.unwrap_or(1)),
    }
}

/// Move `date` forward by one recurrence step. The day is clamped to the end
/// of the target month (Jan 31 + 1 month is Feb 28/29).
///
/// Every successful call returns a date strictly after `date`; anything else
/// (`None` recurrence, a zero custom interval, calendar overflow) is reported
/// as `NonTerminatingRecurrence` so advancing loops cannot spin.
pub fn advance_by_recurrence(
    date: NaiveDate,
    recurrence: RecurrenceType,
    interval: Option<u32>,
) -> Result<NaiveDate> {
    let stuck = || PrazoError::NonTerminatingRecurrence { date };
    let months = step_months(recurrence, interval).ok_or_else(stuck)?;
    let next = date.checked_add_months(Months::new(months)).ok_or_else(stuck)?;
    if next <= date {
        return Err(stuck());
    }
    Ok(next)
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let first = NaiveDate::from_ymd_opt(year, month, 1);
    let next = first.and_then(|d| d.checked_add_months(Months::new(1)));
    match (first, next) {
        (Some(a), Some(b)) => (b - a).num_days() as u32,
        _ => 31,
    }
}

/// `year-month-day`, with `day` pulled back to the month's last day when the
/// month is shorter. Returns `None` only for an invalid month.
pub fn clamped_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    if !(1..=12).contains(&month) {
        return None;
    }
    let day = day.clamp(1, days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_advance_moves_saturday_to_friday() {
        assert_eq!(adjust_for_weekend(ymd(2024, 8, 10), WeekendRule::Advance), ymd(2024, 8, 9));
        assert_eq!(adjust_for_weekend(ymd(2024, 8, 11), WeekendRule::Advance), ymd(2024, 8, 9));
    }

    #[test]
    fn test_postpone_moves_weekend_to_monday() {
        assert_eq!(adjust_for_weekend(ymd(2024, 8, 10), WeekendRule::Postpone), ymd(2024, 8, 12));
        assert_eq!(adjust_for_weekend(ymd(2024, 8, 11), WeekendRule::Postpone), ymd(2024, 8, 12));
    }

    #[test]
    fn test_none_rule_and_weekdays_are_identity() {
        assert_eq!(adjust_for_weekend(ymd(2024, 8, 10), WeekendRule::None), ymd(2024, 8, 10));
        assert_eq!(adjust_for_weekend(ymd(2024, 8, 14), WeekendRule::Postpone), ymd(2024, 8, 14));
    }

    #[test]
    fn test_adjusted_dates_never_fall_on_weekend() {
        let mut day = ymd(2023, 12, 1);
        for _ in 0..400 {
            for rule in [WeekendRule::Advance, WeekendRule::Postpone] {
                let adjusted = adjust_for_weekend(day, rule);
                assert!(
                    !matches!(adjusted.weekday(), Weekday::Sat | Weekday::Sun),
                    "{day} -> {adjusted} with {rule:?}"
                );
            }
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_fixed_types_ignore_interval() {
        let base = ymd(2023, 10, 15);
        assert_eq!(advance_by_recurrence(base, RecurrenceType::Quarterly, Some(5)).unwrap(), ymd(2024, 1, 15));
        assert_eq!(advance_by_recurrence(base, RecurrenceType::Bimonthly, Some(7)).unwrap(), ymd(2023, 12, 15));
        assert_eq!(advance_by_recurrence(base, RecurrenceType::Semiannual, Some(1)).unwrap(), ymd(2024, 4, 15));
        assert_eq!(advance_by_recurrence(base, RecurrenceType::Annual, None).unwrap(), ymd(2024, 10, 15));
    }

    #[test]
    fn test_custom_uses_interval_with_default() {
        let base = ymd(2024, 1, 10);
        assert_eq!(advance_by_recurrence(base, RecurrenceType::Custom, Some(4)).unwrap(), ymd(2024, 5, 10));
        assert_eq!(advance_by_recurrence(base, RecurrenceType::Custom, None).unwrap(), ymd(2024, 2, 10));
    }

    #[test]
    fn test_advance_clamps_month_end() {
        assert_eq!(advance_by_recurrence(ymd(2024, 1, 31), RecurrenceType::Monthly, None).unwrap(), ymd(2024, 2, 29));
        assert_eq!(advance_by_recurrence(ymd(2024, 2, 29), RecurrenceType::Annual, None).unwrap(), ymd(2025, 2, 28));
    }

    #[test]
    fn test_no_progress_is_an_error() {
        let base = ymd(2024, 1, 10);
        assert!(matches!(
            advance_by_recurrence(base, RecurrenceType::Custom, Some(0)),
            Err(PrazoError::NonTerminatingRecurrence { .. })
        ));
        assert!(matches!(
            advance_by_recurrence(base, RecurrenceType::None, None),
            Err(PrazoError::NonTerminatingRecurrence { .. })
        ));
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date(" 2024-02-29 ").unwrap(), ymd(2024, 2, 29));
        assert!(matches!(parse_date("2023-02-29"), Err(PrazoError::InvalidDate(_))));
        assert!(parse_date("29/02/2024").is_err());
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2024, 4), 30);
        assert_eq!(days_in_month(2024, 12), 31);
    }

    #[test]
    fn test_clamped_date() {
        assert_eq!(clamped_date(2024, 2, 31), Some(ymd(2024, 2, 29)));
        assert_eq!(clamped_date(2024, 6, 31), Some(ymd(2024, 6, 30)));
        assert_eq!(clamped_date(2024, 6, 15), Some(ymd(2024, 6, 15)));
        assert_eq!(clamped_date(2024, 13, 1), None);
    }
}
