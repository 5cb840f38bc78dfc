pub mod clients;
pub mod forecast;
pub mod init;
pub mod occurrences;
pub mod run;
pub mod status;
pub mod templates;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::dates::parse_date;
use crate::error::Result;

/// `--date` when given, otherwise today.
pub(crate) fn date_or_today(date: Option<&str>) -> Result<NaiveDate> {
    match date {
        Some(raw) => parse_date(raw),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

#[derive(Parser)]
#[command(name = "prazo", about = "Due dates for recurring fiscal obligations, per client.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up Prazo: choose a data directory and initialize the database.
    Init {
        /// Path for Prazo data (default: ~/Documents/prazo)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Manage clients.
    Clients {
        #[command(subcommand)]
        command: ClientsCommands,
    },
    /// Manage recurring templates (taxes, obligations, installment plans).
    Templates {
        #[command(subcommand)]
        command: TemplatesCommands,
    },
    /// Generate this month's occurrences (at most once per month).
    Run {
        /// Run as of this date: YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,
    },
    /// List and update generated occurrences.
    Occurrences {
        #[command(subcommand)]
        command: OccurrencesCommands,
    },
    /// Project upcoming due dates without generating anything.
    Forecast {
        /// Months ahead to project (default from settings)
        #[arg(long)]
        months: Option<u32>,
        /// Project from this date: YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show current database and summary statistics.
    Status,
}

#[derive(Subcommand)]
pub enum ClientsCommands {
    /// Add a new client.
    Add {
        /// Client name, e.g. 'Padaria Central'
        name: String,
        /// Tax identifier (CNPJ/CPF)
        #[arg(long)]
        document: Option<String>,
    },
    /// List all clients.
    List,
}

#[derive(Subcommand)]
pub enum TemplatesCommands {
    /// Add a recurring template for a client.
    Add(TemplateArgs),
    /// List all templates with their next due date.
    List,
}

#[derive(clap::Args)]
pub struct TemplateArgs {
    /// Client name
    #[arg(long)]
    pub client: String,
    /// Template name, e.g. 'DAS' or 'DCTFWeb'
    #[arg(long)]
    pub name: String,
    /// Kind: tax, obligation, installment
    #[arg(long, default_value = "obligation")]
    pub kind: String,
    /// Day of month the obligation is due (1-31)
    #[arg(long = "due-day")]
    pub due_day: u32,
    /// Month of the year (1-12), required for annual recurrence
    #[arg(long = "due-month")]
    pub due_month: Option<u32>,
    /// Recurrence: none, monthly, bimonthly, quarterly, semiannual, annual, custom
    #[arg(long, default_value = "monthly")]
    pub recurrence: String,
    /// Months between occurrences for custom recurrence
    #[arg(long)]
    pub interval: Option<u32>,
    /// First due date: YYYY-MM-DD
    #[arg(long)]
    pub start: Option<String>,
    /// Last date to generate for: YYYY-MM-DD
    #[arg(long = "end-date")]
    pub end_date: Option<String>,
    /// Weekend rule: none, advance, postpone
    #[arg(long, default_value = "none")]
    pub weekend: String,
    /// Track due dates only; never generate occurrences
    #[arg(long = "no-auto")]
    pub no_auto: bool,
    /// Amount due per occurrence
    #[arg(long)]
    pub amount: Option<f64>,
    /// First installment number (installments only)
    #[arg(long = "base-number")]
    pub base_number: Option<u32>,
    /// Total installments in the plan (installments only)
    #[arg(long)]
    pub total: Option<u32>,
}

#[derive(Subcommand)]
pub enum OccurrencesCommands {
    /// List occurrences; overdue ones are highlighted.
    List {
        /// Include archived history
        #[arg(long)]
        all: bool,
        /// Only this client's occurrences
        #[arg(long)]
        client: Option<String>,
    },
    /// Mark an occurrence as in progress.
    Start { id: i64 },
    /// Mark an occurrence as completed.
    Complete { id: i64 },
    /// Reopen a completed occurrence.
    Reopen { id: i64 },
}
