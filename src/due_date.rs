use chrono::{Datelike, NaiveDate};

use crate::dates::{adjust_for_weekend, advance_by_recurrence, clamped_date, step_months};
use crate::error::{PrazoError, Result};
use crate::models::{RecurrenceTemplate, RecurrenceType, TemplateKind};

/// Reject templates the calculator cannot work with.
pub fn validate_template(template: &RecurrenceTemplate) -> Result<()> {
    let invalid = |reason: &str| PrazoError::InvalidTemplate {
        id: template.id,
        reason: reason.to_string(),
    };

    if !(1..=31).contains(&template.due_day) {
        return Err(invalid("due day must be between 1 and 31"));
    }
    if template.recurrence == RecurrenceType::Annual {
        match template.due_month {
            None => return Err(invalid("annual recurrence needs a due month")),
            Some(m) if !(1..=12).contains(&m) => {
                return Err(invalid("due month must be between 1 and 12"))
            }
            Some(_) => {}
        }
    }
    if template.recurrence == RecurrenceType::Custom && template.recurrence_interval == Some(0) {
        return Err(invalid("custom interval must be at least 1 month"));
    }
    if let TemplateKind::Installment {
        base_number,
        total_installments,
    } = template.kind
    {
        if base_number == 0 {
            return Err(invalid("installment numbering starts at 1"));
        }
        if total_installments.is_some_and(|total| total < base_number) {
            return Err(invalid("installment plan ends before its first installment"));
        }
    }
    Ok(())
}

/// Due date of `template` that applies on `reference`: the first due date on
/// or after the reference, weekend-adjusted. Non-recurring templates return
/// their single fixed date even when it has already passed.
pub fn compute_due_date(template: &RecurrenceTemplate, reference: NaiveDate) -> Result<NaiveDate> {
    let raw = unadjusted_due_date(template, reference)?;
    Ok(adjust_for_weekend(raw, template.weekend_rule))
}

/// Same as [`compute_due_date`] without the weekend rule applied. Projections
/// step from this date so weekend shifts never accumulate.
pub fn unadjusted_due_date(template: &RecurrenceTemplate, reference: NaiveDate) -> Result<NaiveDate> {
    validate_template(template)?;

    // The first due date fixes the cycle's phase. Without one, the cycle
    // runs on calendar months: quarterly falls in Jan/Apr/Jul/Oct, and so on.
    let (year, month) = match (template.first_due_date, template.recurrence) {
        (Some(first), RecurrenceType::Annual) => (first.year(), template.due_month.unwrap_or(first.month())),
        (Some(first), _) => (first.year(), first.month()),
        (None, RecurrenceType::Annual) => (reference.year(), template.due_month.unwrap_or(reference.month())),
        (None, recurrence) => {
            let step = step_months(recurrence, template.recurrence_interval).unwrap_or(1).max(1) as i32;
            calendar_phase(reference, step)
        }
    };
    let mut candidate = anchor(template, year, month)?;

    if template.recurrence == RecurrenceType::None {
        return Ok(candidate);
    }

    while candidate < reference {
        candidate = next_due(template, candidate)?;
    }
    Ok(candidate)
}

/// One recurrence step after `date`, re-anchored on the template's due day
/// so a 31st-of-month template returns to the 31st after a short month.
pub fn next_due(template: &RecurrenceTemplate, date: NaiveDate) -> Result<NaiveDate> {
    let stepped = advance_by_recurrence(date, template.recurrence, template.recurrence_interval)?;
    let next = anchor(template, stepped.year(), stepped.month())?;
    if next <= date {
        return Err(PrazoError::NonTerminatingRecurrence { date });
    }
    Ok(next)
}

/// Latest month at or before `date` whose absolute index (`year * 12 + month0`)
/// is a multiple of `step`.
fn calendar_phase(date: NaiveDate, step: i32) -> (i32, u32) {
    let index = date.year() * 12 + date.month0() as i32;
    let aligned = index - index.rem_euclid(step);
    (aligned.div_euclid(12), aligned.rem_euclid(12) as u32 + 1)
}

fn anchor(template: &RecurrenceTemplate, year: i32, month: u32) -> Result<NaiveDate> {
    clamped_date(year, month, template.due_day).ok_or_else(|| PrazoError::InvalidTemplate {
        id: template.id,
        reason: format!("no such month: {year}-{month}"),
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use chrono::Weekday;

    use super::*;
    use crate::models::{TemplateStatus, WeekendRule};

    pub(crate) fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub(crate) fn template(due_day: u32, recurrence: RecurrenceType, weekend_rule: WeekendRule) -> RecurrenceTemplate {
        RecurrenceTemplate {
            id: 1,
            client_id: 1,
            name: "DAS Simples Nacional".to_string(),
            kind: TemplateKind::Tax,
            due_day,
            due_month: None,
            recurrence,
            recurrence_interval: None,
            first_due_date: None,
            recurrence_end_date: None,
            auto_generate: true,
            weekend_rule,
            parent_template_id: None,
            status: TemplateStatus::Active,
            amount: None,
        }
    }

    #[test]
    fn test_leap_year_clamp_stays_in_february() {
        let t = template(31, RecurrenceType::Monthly, WeekendRule::None);
        assert_eq!(compute_due_date(&t, ymd(2024, 2, 15)).unwrap(), ymd(2024, 2, 29));
    }

    #[test]
    fn test_clamped_day_recovers_after_short_month() {
        let t = template(31, RecurrenceType::Monthly, WeekendRule::None);
        assert_eq!(next_due(&t, ymd(2024, 2, 29)).unwrap(), ymd(2024, 3, 31));
        assert_eq!(compute_due_date(&t, ymd(2024, 4, 15)).unwrap(), ymd(2024, 4, 30));
    }

    #[test]
    fn test_quarterly_ignores_stored_interval() {
        let mut t = template(15, RecurrenceType::Quarterly, WeekendRule::Postpone);
        t.recurrence_interval = Some(5);
        t.first_due_date = Some(ymd(2023, 10, 15));
        assert_eq!(next_due(&t, ymd(2023, 10, 15)).unwrap(), ymd(2024, 1, 15));
        let due = compute_due_date(&t, ymd(2024, 1, 1)).unwrap();
        assert_eq!(due, ymd(2024, 1, 15));
        assert_eq!(due.weekday(), Weekday::Mon);
    }

    #[test]
    fn test_saturday_due_date_advances_to_friday() {
        let t = template(10, RecurrenceType::Monthly, WeekendRule::Advance);
        assert_eq!(compute_due_date(&t, ymd(2024, 8, 1)).unwrap(), ymd(2024, 8, 9));
    }

    #[test]
    fn test_past_due_day_rolls_to_next_month() {
        let t = template(10, RecurrenceType::Monthly, WeekendRule::None);
        assert_eq!(compute_due_date(&t, ymd(2024, 3, 20)).unwrap(), ymd(2024, 4, 10));
    }

    #[test]
    fn test_due_today_is_not_advanced() {
        let t = template(20, RecurrenceType::Monthly, WeekendRule::None);
        assert_eq!(compute_due_date(&t, ymd(2024, 3, 20)).unwrap(), ymd(2024, 3, 20));
    }

    #[test]
    fn test_non_recurring_keeps_past_date() {
        let t = template(5, RecurrenceType::None, WeekendRule::None);
        assert_eq!(compute_due_date(&t, ymd(2024, 3, 20)).unwrap(), ymd(2024, 3, 5));

        let mut fixed = template(5, RecurrenceType::None, WeekendRule::None);
        fixed.first_due_date = Some(ymd(2023, 11, 5));
        assert_eq!(compute_due_date(&fixed, ymd(2024, 3, 20)).unwrap(), ymd(2023, 11, 5));
    }

    #[test]
    fn test_first_due_date_sets_phase() {
        let mut t = template(20, RecurrenceType::Semiannual, WeekendRule::None);
        t.first_due_date = Some(ymd(2023, 4, 20));
        assert_eq!(compute_due_date(&t, ymd(2024, 5, 2)).unwrap(), ymd(2024, 10, 20));
        assert_eq!(compute_due_date(&t, ymd(2024, 4, 2)).unwrap(), ymd(2024, 4, 20));
    }

    #[test]
    fn test_future_first_due_date_is_returned_as_is() {
        let mut t = template(10, RecurrenceType::Quarterly, WeekendRule::None);
        t.first_due_date = Some(ymd(2024, 9, 10));
        assert_eq!(compute_due_date(&t, ymd(2024, 3, 1)).unwrap(), ymd(2024, 9, 10));
    }

    #[test]
    fn test_annual_uses_due_month() {
        let mut t = template(31, RecurrenceType::Annual, WeekendRule::None);
        t.due_month = Some(5);
        assert_eq!(compute_due_date(&t, ymd(2024, 2, 1)).unwrap(), ymd(2024, 5, 31));
        assert_eq!(compute_due_date(&t, ymd(2024, 6, 1)).unwrap(), ymd(2025, 5, 31));
    }

    #[test]
    fn test_custom_interval_steps() {
        let mut t = template(20, RecurrenceType::Custom, WeekendRule::None);
        t.recurrence_interval = Some(4);
        assert_eq!(compute_due_date(&t, ymd(2024, 3, 25)).unwrap(), ymd(2024, 5, 20));
        t.first_due_date = Some(ymd(2023, 11, 20));
        assert_eq!(compute_due_date(&t, ymd(2024, 3, 25)).unwrap(), ymd(2024, 7, 20));
    }

    #[test]
    fn test_unanchored_quarterly_follows_calendar_quarters() {
        let t = template(15, RecurrenceType::Quarterly, WeekendRule::None);
        for (reference, expected) in [
            (ymd(2024, 1, 2), ymd(2024, 1, 15)),
            (ymd(2024, 2, 2), ymd(2024, 4, 15)),
            (ymd(2024, 3, 2), ymd(2024, 4, 15)),
            (ymd(2024, 4, 16), ymd(2024, 7, 15)),
            (ymd(2024, 11, 1), ymd(2025, 1, 15)),
        ] {
            assert_eq!(compute_due_date(&t, reference).unwrap(), expected, "from {reference}");
        }
    }

    #[test]
    fn test_unanchored_phase_is_stable_across_references() {
        // An interval that does not divide a year must still land on one fixed cycle
        let mut t = template(10, RecurrenceType::Custom, WeekendRule::None);
        t.recurrence_interval = Some(5);
        let from_january: Vec<NaiveDate> = {
            let mut due = unadjusted_due_date(&t, ymd(2024, 1, 1)).unwrap();
            let mut dates = vec![due];
            for _ in 0..4 {
                due = next_due(&t, due).unwrap();
                dates.push(due);
            }
            dates
        };
        let mut reference = ymd(2024, 1, 1);
        while reference < ymd(2025, 6, 1) {
            let due = unadjusted_due_date(&t, reference).unwrap();
            assert!(from_january.contains(&due), "{due} off the cycle for {reference}");
            reference = reference.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_due_date_never_precedes_reference() {
        let recurrences = [
            RecurrenceType::Monthly,
            RecurrenceType::Bimonthly,
            RecurrenceType::Quarterly,
            RecurrenceType::Semiannual,
            RecurrenceType::Annual,
            RecurrenceType::Custom,
        ];
        let mut reference = ymd(2023, 11, 1);
        while reference < ymd(2025, 3, 1) {
            for recurrence in recurrences {
                for due_day in [1, 15, 28, 29, 30, 31] {
                    for rule in [WeekendRule::None, WeekendRule::Postpone] {
                        let mut t = template(due_day, recurrence, rule);
                        t.due_month = Some(2);
                        t.recurrence_interval = Some(5);
                        let due = compute_due_date(&t, reference).unwrap();
                        assert!(due >= reference, "{recurrence} day {due_day}: {due} < {reference}");
                    }
                }
            }
            reference = reference.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_invalid_templates_rejected() {
        let t = template(0, RecurrenceType::Monthly, WeekendRule::None);
        assert!(matches!(compute_due_date(&t, ymd(2024, 1, 1)), Err(PrazoError::InvalidTemplate { .. })));

        let t = template(32, RecurrenceType::Monthly, WeekendRule::None);
        assert!(validate_template(&t).is_err());

        let t = template(10, RecurrenceType::Annual, WeekendRule::None);
        assert!(validate_template(&t).is_err());

        let mut t = template(10, RecurrenceType::Custom, WeekendRule::None);
        t.recurrence_interval = Some(0);
        assert!(validate_template(&t).is_err());

        let mut t = template(10, RecurrenceType::Monthly, WeekendRule::None);
        t.kind = TemplateKind::Installment { base_number: 1, total_installments: Some(0) };
        assert!(validate_template(&t).is_err());

        t.kind = TemplateKind::Installment { base_number: 11, total_installments: Some(10) };
        assert!(validate_template(&t).is_err());
    }
}
