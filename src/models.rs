use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{PrazoError, Result};
use crate::period::PeriodKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecurrenceType {
    None,
    Monthly,
    Bimonthly,
    Quarterly,
    Semiannual,
    Annual,
    Custom,
}

impl RecurrenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurrenceType::None => "none",
            RecurrenceType::Monthly => "monthly",
            RecurrenceType::Bimonthly => "bimonthly",
            RecurrenceType::Quarterly => "quarterly",
            RecurrenceType::Semiannual => "semiannual",
            RecurrenceType::Annual => "annual",
            RecurrenceType::Custom => "custom",
        }
    }
}

impl FromStr for RecurrenceType {
    type Err = PrazoError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "none" => Ok(RecurrenceType::None),
            "monthly" => Ok(RecurrenceType::Monthly),
            "bimonthly" => Ok(RecurrenceType::Bimonthly),
            "quarterly" => Ok(RecurrenceType::Quarterly),
            "semiannual" => Ok(RecurrenceType::Semiannual),
            "annual" => Ok(RecurrenceType::Annual),
            "custom" => Ok(RecurrenceType::Custom),
            other => Err(PrazoError::Other(format!("Unknown recurrence type: {other}"))),
        }
    }
}

impl fmt::Display for RecurrenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeekendRule {
    /// Keep the date as is.
    None,
    /// Move back to the preceding Friday.
    Advance,
    /// Move forward to the following Monday.
    Postpone,
}

impl WeekendRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeekendRule::None => "none",
            WeekendRule::Advance => "advance",
            WeekendRule::Postpone => "postpone",
        }
    }
}

impl FromStr for WeekendRule {
    type Err = PrazoError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "none" => Ok(WeekendRule::None),
            "advance" => Ok(WeekendRule::Advance),
            "postpone" => Ok(WeekendRule::Postpone),
            other => Err(PrazoError::Other(format!("Unknown weekend rule: {other}"))),
        }
    }
}

/// What a template tracks. Installment plans carry their own numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    Tax,
    Obligation,
    Installment {
        base_number: u32,
        total_installments: Option<u32>,
    },
}

impl TemplateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKind::Tax => "tax",
            TemplateKind::Obligation => "obligation",
            TemplateKind::Installment { .. } => "installment",
        }
    }

    /// Rebuild from the stored `kind` column plus the installment columns.
    pub fn from_parts(kind: &str, base_number: Option<u32>, total_installments: Option<u32>) -> Result<Self> {
        match kind {
            "tax" => Ok(TemplateKind::Tax),
            "obligation" => Ok(TemplateKind::Obligation),
            "installment" => Ok(TemplateKind::Installment {
                base_number: base_number.unwrap_or(1),
                total_installments,
            }),
            other => Err(PrazoError::Other(format!("Unknown template kind: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateStatus {
    Active,
    Inactive,
}

impl TemplateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateStatus::Active => "active",
            TemplateStatus::Inactive => "inactive",
        }
    }

    pub fn parse(s: &str) -> Self {
        if s == "inactive" {
            TemplateStatus::Inactive
        } else {
            TemplateStatus::Active
        }
    }
}

#[derive(Debug, Clone)]
pub struct Client {
    pub id: i64,
    pub name: String,
    pub document: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RecurrenceTemplate {
    pub id: i64,
    pub client_id: i64,
    pub name: String,
    pub kind: TemplateKind,
    pub due_day: u32,
    /// 1-based month; only read for annual recurrence.
    pub due_month: Option<u32>,
    pub recurrence: RecurrenceType,
    /// Months between occurrences; only read for custom recurrence.
    pub recurrence_interval: Option<u32>,
    /// First due date of the cycle; sets the phase of non-monthly recurrences
    /// and the fixed date of non-recurring templates.
    pub first_due_date: Option<NaiveDate>,
    pub recurrence_end_date: Option<NaiveDate>,
    pub auto_generate: bool,
    pub weekend_rule: WeekendRule,
    pub parent_template_id: Option<i64>,
    pub status: TemplateStatus,
    pub amount: Option<f64>,
}

impl RecurrenceTemplate {
    pub fn is_root(&self) -> bool {
        self.parent_template_id.is_none()
    }

    /// Root, active and allowed to materialize occurrences.
    pub fn is_generating(&self) -> bool {
        self.is_root() && self.auto_generate && self.status == TemplateStatus::Active
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OccurrenceStatus {
    Pending,
    InProgress,
    Completed,
}

impl OccurrenceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OccurrenceStatus::Pending => "pending",
            OccurrenceStatus::InProgress => "in_progress",
            OccurrenceStatus::Completed => "completed",
        }
    }
}

impl FromStr for OccurrenceStatus {
    type Err = PrazoError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(OccurrenceStatus::Pending),
            "in_progress" => Ok(OccurrenceStatus::InProgress),
            "completed" => Ok(OccurrenceStatus::Completed),
            other => Err(PrazoError::Other(format!("Unknown occurrence status: {other}"))),
        }
    }
}

/// Status as shown to users. `Overdue` is never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayStatus {
    Pending,
    InProgress,
    Completed,
    Overdue,
}

impl DisplayStatus {
    pub fn label(&self) -> &'static str {
        match self {
            DisplayStatus::Pending => "pending",
            DisplayStatus::InProgress => "in progress",
            DisplayStatus::Completed => "completed",
            DisplayStatus::Overdue => "overdue",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Occurrence {
    /// Assigned by the store on insert.
    pub id: Option<i64>,
    pub parent_template_id: i64,
    pub client_id: i64,
    pub name: String,
    pub generated_for_period: PeriodKey,
    pub calculated_due_date: NaiveDate,
    pub status: OccurrenceStatus,
    pub installment_number: Option<u32>,
    pub amount: Option<f64>,
    pub archived: bool,
    pub completed_at: Option<NaiveDateTime>,
}

impl Occurrence {
    pub fn display_status(&self, today: NaiveDate) -> DisplayStatus {
        match self.status {
            OccurrenceStatus::Completed => DisplayStatus::Completed,
            _ if self.calculated_due_date < today => DisplayStatus::Overdue,
            OccurrenceStatus::Pending => DisplayStatus::Pending,
            OccurrenceStatus::InProgress => DisplayStatus::InProgress,
        }
    }

    pub fn start(&mut self) -> Result<()> {
        self.ensure_not_archived("start")?;
        match self.status {
            OccurrenceStatus::Pending => {
                self.status = OccurrenceStatus::InProgress;
                Ok(())
            }
            other => Err(invalid_transition("start", other)),
        }
    }

    pub fn complete(&mut self, at: NaiveDateTime) -> Result<()> {
        self.ensure_not_archived("complete")?;
        match self.status {
            OccurrenceStatus::Pending | OccurrenceStatus::InProgress => {
                self.status = OccurrenceStatus::Completed;
                self.completed_at = Some(at);
                Ok(())
            }
            other => Err(invalid_transition("complete", other)),
        }
    }

    pub fn reopen(&mut self) -> Result<()> {
        self.ensure_not_archived("reopen")?;
        match self.status {
            OccurrenceStatus::Completed => {
                self.status = OccurrenceStatus::Pending;
                self.completed_at = None;
                Ok(())
            }
            other => Err(invalid_transition("reopen", other)),
        }
    }

    fn ensure_not_archived(&self, action: &'static str) -> Result<()> {
        if self.archived {
            return Err(PrazoError::InvalidTransition {
                action,
                status: "archived".to_string(),
            });
        }
        Ok(())
    }
}

fn invalid_transition(action: &'static str, status: OccurrenceStatus) -> PrazoError {
    PrazoError::InvalidTransition {
        action,
        status: status.as_str().to_string(),
    }
}

/// Singleton per database. Gates generation to once per period.
#[derive(Debug, Clone, Default)]
pub struct RunLog {
    pub last_run_period: Option<PeriodKey>,
    pub last_run_at: Option<NaiveDateTime>,
}
