use std::iter::FusedIterator;

use chrono::{Months, NaiveDate};
use serde::Serialize;
use tracing::warn;

use crate::dates::adjust_for_weekend;
use crate::due_date::{next_due, unadjusted_due_date};
use crate::error::{PrazoError, Result};
use crate::models::{RecurrenceTemplate, RecurrenceType, TemplateStatus};

/// Lazy projection of a template's due dates. Holds no resources between
/// items; clone it to restart from the first date.
#[derive(Debug, Clone)]
pub struct Expansion<'a> {
    template: &'a RecurrenceTemplate,
    /// Next unadjusted due date; weekend shifts are applied on output only.
    next: Option<NaiveDate>,
    /// Horizon, compared against the adjusted date.
    until: NaiveDate,
}

/// Project `template`'s due dates from the one that applies on `reference`
/// up to `reference + horizon_months`. A non-recurring template yields its
/// single date regardless of the horizon. Dates whose unadjusted day falls
/// after the template's end date are left out, the same cutoff generation
/// uses.
pub fn expand(template: &RecurrenceTemplate, horizon_months: u32, reference: NaiveDate) -> Result<Expansion<'_>> {
    let start = unadjusted_due_date(template, reference)?;
    let until = reference
        .checked_add_months(Months::new(horizon_months))
        .unwrap_or(NaiveDate::MAX);
    Ok(Expansion {
        template,
        next: Some(start),
        until,
    })
}

impl Iterator for Expansion<'_> {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let raw = self.next.take()?;
        if self.template.recurrence_end_date.is_some_and(|end| raw > end) {
            return None;
        }
        let projected = adjust_for_weekend(raw, self.template.weekend_rule);
        if self.template.recurrence == RecurrenceType::None {
            return Some(projected);
        }
        if projected > self.until {
            return None;
        }
        self.next = match next_due(self.template, raw) {
            Ok(next) => Some(next),
            Err(e) => {
                warn!(template_id = self.template.id, error = %e, "projection stopped early");
                None
            }
        };
        Some(projected)
    }
}

impl FusedIterator for Expansion<'_> {}

#[derive(Debug, Clone, Serialize)]
pub struct ForecastEntry {
    pub template_id: i64,
    pub client_id: i64,
    pub name: String,
    pub due_date: NaiveDate,
}

/// Calendar view over every active root template, sorted by date.
/// Templates that fail validation are left out.
pub fn forecast(templates: &[RecurrenceTemplate], horizon_months: u32, reference: NaiveDate) -> Vec<ForecastEntry> {
    let mut entries = Vec::new();
    for template in templates
        .iter()
        .filter(|t| t.is_root() && t.status == TemplateStatus::Active)
    {
        match expand(template, horizon_months, reference) {
            Ok(dates) => entries.extend(dates.map(|due_date| ForecastEntry {
                template_id: template.id,
                client_id: template.client_id,
                name: template.name.clone(),
                due_date,
            })),
            Err(PrazoError::InvalidTemplate { id, reason }) => {
                warn!(template_id = id, %reason, "template left out of forecast");
            }
            Err(e) => warn!(template_id = template.id, error = %e, "template left out of forecast"),
        }
    }
    entries.sort_by(|a, b| a.due_date.cmp(&b.due_date).then(a.template_id.cmp(&b.template_id)));
    entries
}
