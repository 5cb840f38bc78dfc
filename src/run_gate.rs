use chrono::{NaiveDate, NaiveDateTime};
use tracing::{info, warn};

use crate::error::{PrazoError, Result};
use crate::generator::generate_for_period;
use crate::models::{Occurrence, OccurrenceStatus, RecurrenceTemplate, RunLog};
use crate::period::PeriodKey;
use crate::store::{OccurrenceScope, PersistSummary, RunLogStore, TemplateStore};

#[derive(Debug, Default)]
pub struct RunOutcome {
    pub new_occurrences: Vec<Occurrence>,
    pub occurrences_to_archive: Vec<i64>,
    /// Templates skipped because their configuration is invalid.
    pub rejected: Vec<(i64, String)>,
}

impl RunOutcome {
    pub fn is_empty(&self) -> bool {
        self.new_occurrences.is_empty() && self.occurrences_to_archive.is_empty()
    }
}

/// One generation pass for the period containing `now`, or an empty outcome
/// when the run log shows this period (or a later one) already ran.
///
/// `existing` should hold every stored occurrence, archived ones included,
/// so installment numbering and the duplicate check see the full history.
pub fn run_if_due(
    now: NaiveDate,
    templates: &[RecurrenceTemplate],
    existing: &[Occurrence],
    run_log: &RunLog,
) -> Result<RunOutcome> {
    let period = PeriodKey::of(now);
    if run_log.last_run_period.is_some_and(|last| last >= period) {
        info!(%period, "generation already ran for this period");
        return Ok(RunOutcome::default());
    }

    let mut outcome = RunOutcome::default();
    for template in templates.iter().filter(|t| t.is_generating()) {
        match generate_for_period(template, now, existing) {
            Ok(Some(occurrence)) => outcome.new_occurrences.push(occurrence),
            Ok(None) => {}
            Err(PrazoError::InvalidTemplate { id, reason }) => {
                warn!(template_id = id, %reason, "skipping invalid template");
                outcome.rejected.push((id, reason));
            }
            Err(e) => return Err(e),
        }
    }

    outcome.occurrences_to_archive = existing
        .iter()
        .filter(|o| !o.archived && o.status == OccurrenceStatus::Completed)
        .filter(|o| o.generated_for_period < period)
        .filter(|o| is_superseded(o, existing, &outcome.new_occurrences))
        .filter_map(|o| o.id)
        .collect();

    info!(
        %period,
        generated = outcome.new_occurrences.len(),
        to_archive = outcome.occurrences_to_archive.len(),
        rejected = outcome.rejected.len(),
        "generation pass planned"
    );
    Ok(outcome)
}

/// A newer period of the same template exists, stored or about to be.
fn is_superseded(occurrence: &Occurrence, existing: &[Occurrence], new: &[Occurrence]) -> bool {
    existing.iter().chain(new).any(|other| {
        other.parent_template_id == occurrence.parent_template_id
            && other.generated_for_period > occurrence.generated_for_period
    })
}

#[derive(Debug)]
pub struct RunSummary {
    pub period: PeriodKey,
    pub already_ran: bool,
    pub generated: usize,
    pub duplicates: usize,
    pub archived: usize,
    pub rejected: Vec<(i64, String)>,
}

/// Load, plan, persist, then advance the run log. The run log moves only
/// after persistence succeeds, so a failed pass is retried in full on the
/// next call and the duplicate checks make that retry safe.
pub fn execute_run<S>(store: &mut S, now: NaiveDateTime) -> Result<RunSummary>
where
    S: TemplateStore + RunLogStore,
{
    let period = PeriodKey::of(now.date());
    let run_log = store.run_log()?;
    if run_log.last_run_period.is_some_and(|last| last >= period) {
        return Ok(RunSummary {
            period,
            already_ran: true,
            generated: 0,
            duplicates: 0,
            archived: 0,
            rejected: Vec::new(),
        });
    }

    let templates = store.load_templates()?;
    let existing = store.load_occurrences(OccurrenceScope::All)?;
    let outcome = run_if_due(now.date(), &templates, &existing, &run_log)?;

    let persisted = if outcome.is_empty() {
        PersistSummary::default()
    } else {
        store.persist_run(&outcome.new_occurrences, &outcome.occurrences_to_archive)?
    };
    store.record_run(period, now)?;
    info!(
        %period,
        inserted = persisted.inserted,
        duplicates = persisted.duplicates,
        archived = persisted.archived,
        "generation pass complete"
    );

    Ok(RunSummary {
        period,
        already_ran: false,
        generated: persisted.inserted,
        duplicates: persisted.duplicates,
        archived: persisted.archived,
        rejected: outcome.rejected,
    })
}
