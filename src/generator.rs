use chrono::NaiveDate;
use tracing::debug;

use crate::dates::adjust_for_weekend;
use crate::due_date::unadjusted_due_date;
use crate::error::Result;
use crate::models::{Occurrence, OccurrenceStatus, RecurrenceTemplate, RecurrenceType, TemplateKind};
use crate::period::PeriodKey;

/// Build the occurrence `template` owes for the period containing `target`,
/// or `None` when nothing should be materialized:
///
/// - the template does not auto-generate, or `target` is past its end date
/// - the period's due date falls after the template's end date
/// - an occurrence for this template and period already exists
/// - no due date of the cycle falls inside the period (e.g. the off months
///   of a quarterly tax)
/// - a non-recurring template was already materialized once
/// - an installment plan has reached its last installment
///
/// Pure: the returned occurrence has no id until the caller stores it.
pub fn generate_for_period(
    template: &RecurrenceTemplate,
    target: NaiveDate,
    existing: &[Occurrence],
) -> Result<Option<Occurrence>> {
    if !template.auto_generate {
        return Ok(None);
    }
    if template.recurrence_end_date.is_some_and(|end| target > end) {
        return Ok(None);
    }

    let period = PeriodKey::of(target);
    let siblings: Vec<&Occurrence> = existing
        .iter()
        .filter(|o| o.parent_template_id == template.id)
        .collect();

    if siblings.iter().any(|o| o.generated_for_period == period) {
        debug!(template_id = template.id, %period, "occurrence already exists");
        return Ok(None);
    }
    if template.recurrence == RecurrenceType::None && !siblings.is_empty() {
        return Ok(None);
    }

    let raw_due = unadjusted_due_date(template, period.first_day())?;
    if template.recurrence != RecurrenceType::None && PeriodKey::of(raw_due) != period {
        debug!(template_id = template.id, %period, next_due = %raw_due, "nothing due this period");
        return Ok(None);
    }
    if template.recurrence_end_date.is_some_and(|end| raw_due > end) {
        debug!(template_id = template.id, %period, "recurrence ended");
        return Ok(None);
    }

    let installment_number = match template.kind {
        TemplateKind::Installment {
            base_number,
            total_installments,
        } => {
            let number = base_number + siblings.len() as u32;
            if total_installments.is_some_and(|total| number > total) {
                debug!(template_id = template.id, number, "installment plan finished");
                return Ok(None);
            }
            Some(number)
        }
        TemplateKind::Tax | TemplateKind::Obligation => None,
    };

    let due = adjust_for_weekend(raw_due, template.weekend_rule);
    debug!(template_id = template.id, %period, %due, "generated occurrence");

    Ok(Some(Occurrence {
        id: None,
        parent_template_id: template.id,
        client_id: template.client_id,
        name: template.name.clone(),
        generated_for_period: period,
        calculated_due_date: due,
        status: OccurrenceStatus::Pending,
        installment_number,
        amount: template.amount,
        archived: false,
        completed_at: None,
    }))
}
