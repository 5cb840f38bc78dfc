use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{Connection, OptionalExtension};
use tracing::debug;

use crate::dates::{parse_date, DATE_FORMAT, TIMESTAMP_FORMAT};
use crate::due_date::validate_template;
use crate::error::{PrazoError, Result};
use crate::models::{
    Client, Occurrence, OccurrenceStatus, RecurrenceTemplate, RunLog, TemplateKind, TemplateStatus,
};
use crate::period::PeriodKey;

// ---------------------------------------------------------------------------
// Storage seams
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OccurrenceScope {
    /// Operational view: archived history left out.
    Active,
    All,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PersistSummary {
    pub inserted: usize,
    /// Rows rejected by the (template, period) uniqueness constraint.
    pub duplicates: usize,
    pub archived: usize,
}

pub trait TemplateStore {
    fn load_templates(&self) -> Result<Vec<RecurrenceTemplate>>;
    fn load_occurrences(&self, scope: OccurrenceScope) -> Result<Vec<Occurrence>>;
    /// Store new occurrences and archive flags as one unit.
    fn persist_run(&mut self, new: &[Occurrence], archive: &[i64]) -> Result<PersistSummary>;
}

pub trait RunLogStore {
    fn run_log(&self) -> Result<RunLog>;
    /// Never moves the stored period backwards.
    fn record_run(&mut self, period: PeriodKey, at: NaiveDateTime) -> Result<()>;
}

pub struct SqliteStore<'a> {
    conn: &'a mut Connection,
}

impl<'a> SqliteStore<'a> {
    pub fn new(conn: &'a mut Connection) -> Self {
        Self { conn }
    }
}

impl TemplateStore for SqliteStore<'_> {
    fn load_templates(&self) -> Result<Vec<RecurrenceTemplate>> {
        load_templates(self.conn)
    }

    fn load_occurrences(&self, scope: OccurrenceScope) -> Result<Vec<Occurrence>> {
        load_occurrences(self.conn, scope)
    }

    fn persist_run(&mut self, new: &[Occurrence], archive: &[i64]) -> Result<PersistSummary> {
        persist_occurrences(self.conn, new, archive).map_err(|e| PrazoError::Persistence(e.to_string()))
    }
}

fn persist_occurrences(
    conn: &mut Connection,
    new: &[Occurrence],
    archive: &[i64],
) -> rusqlite::Result<PersistSummary> {
    let tx = conn.transaction()?;
    let mut summary = PersistSummary::default();
    {
        let mut insert = tx.prepare(
            "INSERT INTO occurrences (template_id, client_id, name, period_key, due_date, status, installment_number, amount) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) \
             ON CONFLICT (template_id, period_key) DO NOTHING",
        )?;
        for occ in new {
            let changed = insert.execute(rusqlite::params![
                occ.parent_template_id,
                occ.client_id,
                occ.name,
                occ.generated_for_period.to_string(),
                occ.calculated_due_date.format(DATE_FORMAT).to_string(),
                occ.status.as_str(),
                occ.installment_number,
                occ.amount,
            ])?;
            if changed == 0 {
                summary.duplicates += 1;
            } else {
                summary.inserted += 1;
            }
        }
        let mut archive_stmt =
            tx.prepare("UPDATE occurrences SET is_archived = 1 WHERE id = ?1 AND is_archived = 0")?;
        for id in archive {
            summary.archived += archive_stmt.execute([id])?;
        }
    }
    tx.commit()?;
    Ok(summary)
}

impl RunLogStore for SqliteStore<'_> {
    fn run_log(&self) -> Result<RunLog> {
        get_run_log(self.conn)
    }

    fn record_run(&mut self, period: PeriodKey, at: NaiveDateTime) -> Result<()> {
        let tx = self.conn.transaction()?;
        // Compared as parsed keys, not as stored text
        if let Some(last) = get_run_log(&tx)?.last_run_period {
            if last >= period {
                debug!(%last, %period, "run log already at or past period");
                return Ok(());
            }
        }
        tx.execute(
            "INSERT INTO run_log (id, last_run_period, last_run_at) VALUES (1, ?1, ?2) \
             ON CONFLICT (id) DO UPDATE SET last_run_period = excluded.last_run_period, last_run_at = excluded.last_run_at",
            rusqlite::params![period.to_string(), at.format(TIMESTAMP_FORMAT).to_string()],
        )?;
        tx.commit()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Clients
// ---------------------------------------------------------------------------

pub fn add_client(conn: &Connection, name: &str, document: Option<&str>) -> Result<i64> {
    conn.execute(
        "INSERT INTO clients (name, document) VALUES (?1, ?2)",
        rusqlite::params![name, document],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_clients(conn: &Connection) -> Result<Vec<Client>> {
    let mut stmt = conn.prepare("SELECT id, name, document FROM clients ORDER BY name")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(Client {
                id: row.get(0)?,
                name: row.get(1)?,
                document: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn find_client(conn: &Connection, name: &str) -> Result<Client> {
    conn.query_row(
        "SELECT id, name, document FROM clients WHERE name = ?1",
        [name],
        |row| {
            Ok(Client {
                id: row.get(0)?,
                name: row.get(1)?,
                document: row.get(2)?,
            })
        },
    )
    .optional()?
    .ok_or_else(|| PrazoError::UnknownClient(name.to_string()))
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

/// Validates before writing; the returned id is the new template's.
pub fn insert_template(conn: &Connection, template: &RecurrenceTemplate) -> Result<i64> {
    validate_template(template)?;
    let (base_number, total_installments) = match template.kind {
        TemplateKind::Installment {
            base_number,
            total_installments,
        } => (Some(base_number), total_installments),
        TemplateKind::Tax | TemplateKind::Obligation => (None, None),
    };
    conn.execute(
        "INSERT INTO templates (client_id, name, kind, base_number, total_installments, due_day, due_month, \
         recurrence_type, recurrence_interval, first_due_date, recurrence_end_date, auto_generate, weekend_rule, \
         parent_template_id, status, amount) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        rusqlite::params![
            template.client_id,
            template.name,
            template.kind.as_str(),
            base_number,
            total_installments,
            template.due_day,
            template.due_month,
            template.recurrence.as_str(),
            template.recurrence_interval,
            template.first_due_date.map(|d| d.format(DATE_FORMAT).to_string()),
            template.recurrence_end_date.map(|d| d.format(DATE_FORMAT).to_string()),
            template.auto_generate,
            template.weekend_rule.as_str(),
            template.parent_template_id,
            template.status.as_str(),
            template.amount,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

struct TemplateRow {
    id: i64,
    client_id: i64,
    name: String,
    kind: String,
    base_number: Option<u32>,
    total_installments: Option<u32>,
    due_day: u32,
    due_month: Option<u32>,
    recurrence: String,
    recurrence_interval: Option<u32>,
    first_due_date: Option<String>,
    recurrence_end_date: Option<String>,
    auto_generate: bool,
    weekend_rule: String,
    parent_template_id: Option<i64>,
    status: String,
    amount: Option<f64>,
}

impl TemplateRow {
    fn into_template(self) -> Result<RecurrenceTemplate> {
        Ok(RecurrenceTemplate {
            id: self.id,
            client_id: self.client_id,
            name: self.name,
            kind: TemplateKind::from_parts(&self.kind, self.base_number, self.total_installments)?,
            due_day: self.due_day,
            due_month: self.due_month,
            recurrence: self.recurrence.parse()?,
            recurrence_interval: self.recurrence_interval,
            first_due_date: optional_date(self.first_due_date)?,
            recurrence_end_date: optional_date(self.recurrence_end_date)?,
            auto_generate: self.auto_generate,
            weekend_rule: self.weekend_rule.parse()?,
            parent_template_id: self.parent_template_id,
            status: TemplateStatus::parse(&self.status),
            amount: self.amount,
        })
    }
}

pub fn load_templates(conn: &Connection) -> Result<Vec<RecurrenceTemplate>> {
    let mut stmt = conn.prepare(
        "SELECT id, client_id, name, kind, base_number, total_installments, due_day, due_month, recurrence_type, \
         recurrence_interval, first_due_date, recurrence_end_date, auto_generate, weekend_rule, parent_template_id, \
         status, amount FROM templates ORDER BY client_id, id",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(TemplateRow {
                id: row.get(0)?,
                client_id: row.get(1)?,
                name: row.get(2)?,
                kind: row.get(3)?,
                base_number: row.get(4)?,
                total_installments: row.get(5)?,
                due_day: row.get(6)?,
                due_month: row.get(7)?,
                recurrence: row.get(8)?,
                recurrence_interval: row.get(9)?,
                first_due_date: row.get(10)?,
                recurrence_end_date: row.get(11)?,
                auto_generate: row.get(12)?,
                weekend_rule: row.get(13)?,
                parent_template_id: row.get(14)?,
                status: row.get(15)?,
                amount: row.get(16)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    rows.into_iter().map(TemplateRow::into_template).collect()
}

// ---------------------------------------------------------------------------
// Occurrences
// ---------------------------------------------------------------------------

struct OccurrenceRow {
    id: i64,
    template_id: i64,
    client_id: i64,
    name: String,
    period_key: String,
    due_date: String,
    status: String,
    installment_number: Option<u32>,
    amount: Option<f64>,
    is_archived: bool,
    completed_at: Option<String>,
}

impl OccurrenceRow {
    fn into_occurrence(self) -> Result<Occurrence> {
        Ok(Occurrence {
            id: Some(self.id),
            parent_template_id: self.template_id,
            client_id: self.client_id,
            name: self.name,
            generated_for_period: self.period_key.parse()?,
            calculated_due_date: parse_date(&self.due_date)?,
            status: self.status.parse()?,
            installment_number: self.installment_number,
            amount: self.amount,
            archived: self.is_archived,
            completed_at: optional_timestamp(self.completed_at)?,
        })
    }
}

const OCCURRENCE_COLUMNS: &str = "id, template_id, client_id, name, period_key, due_date, status, \
                                  installment_number, amount, is_archived, completed_at";

fn occurrence_row(row: &rusqlite::Row) -> rusqlite::Result<OccurrenceRow> {
    Ok(OccurrenceRow {
        id: row.get(0)?,
        template_id: row.get(1)?,
        client_id: row.get(2)?,
        name: row.get(3)?,
        period_key: row.get(4)?,
        due_date: row.get(5)?,
        status: row.get(6)?,
        installment_number: row.get(7)?,
        amount: row.get(8)?,
        is_archived: row.get(9)?,
        completed_at: row.get(10)?,
    })
}

pub fn load_occurrences(conn: &Connection, scope: OccurrenceScope) -> Result<Vec<Occurrence>> {
    let filter = match scope {
        OccurrenceScope::Active => "WHERE is_archived = 0",
        OccurrenceScope::All => "",
    };
    let sql = format!("SELECT {OCCURRENCE_COLUMNS} FROM occurrences {filter} ORDER BY due_date, id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], occurrence_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    rows.into_iter().map(OccurrenceRow::into_occurrence).collect()
}

pub fn get_occurrence(conn: &Connection, id: i64) -> Result<Occurrence> {
    let sql = format!("SELECT {OCCURRENCE_COLUMNS} FROM occurrences WHERE id = ?1");
    conn.query_row(&sql, [id], occurrence_row)
        .optional()?
        .ok_or(PrazoError::UnknownOccurrence(id))?
        .into_occurrence()
}

pub fn save_occurrence_status(conn: &Connection, occurrence: &Occurrence) -> Result<()> {
    let id = occurrence.id.ok_or_else(|| PrazoError::Other("occurrence was never stored".to_string()))?;
    conn.execute(
        "UPDATE occurrences SET status = ?1, completed_at = ?2 WHERE id = ?3",
        rusqlite::params![
            occurrence.status.as_str(),
            occurrence.completed_at.map(|t| t.format(TIMESTAMP_FORMAT).to_string()),
            id,
        ],
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Run log
// ---------------------------------------------------------------------------

pub fn get_run_log(conn: &Connection) -> Result<RunLog> {
    let row: Option<(Option<String>, Option<String>)> = conn
        .query_row(
            "SELECT last_run_period, last_run_at FROM run_log WHERE id = 1",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    let Some((period, at)) = row else {
        return Ok(RunLog::default());
    };
    Ok(RunLog {
        last_run_period: period.map(|p| p.parse()).transpose()?,
        last_run_at: optional_timestamp(at)?,
    })
}

fn optional_timestamp(raw: Option<String>) -> Result<Option<NaiveDateTime>> {
    raw.map(|t| NaiveDateTime::parse_from_str(&t, TIMESTAMP_FORMAT).map_err(|_| PrazoError::InvalidDate(t)))
        .transpose()
}

fn optional_date(raw: Option<String>) -> Result<Option<NaiveDate>> {
    raw.as_deref().map(parse_date).transpose()
}
