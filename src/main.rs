mod cli;
mod dates;
mod db;
mod due_date;
mod error;
mod expansion;
mod fmt;
mod generator;
mod models;
mod period;
mod run_gate;
mod settings;
mod store;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, ClientsCommands, Commands, OccurrencesCommands, TemplatesCommands};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Clients { command } => match command {
            ClientsCommands::Add { name, document } => cli::clients::add(&name, document.as_deref()),
            ClientsCommands::List => cli::clients::list(),
        },
        Commands::Templates { command } => match command {
            TemplatesCommands::Add(args) => cli::templates::add(args),
            TemplatesCommands::List => cli::templates::list(),
        },
        Commands::Run { date } => cli::run::run(date.as_deref()),
        Commands::Occurrences { command } => match command {
            OccurrencesCommands::List { all, client } => cli::occurrences::list(all, client.as_deref()),
            OccurrencesCommands::Start { id } => cli::occurrences::start(id),
            OccurrencesCommands::Complete { id } => cli::occurrences::complete(id),
            OccurrencesCommands::Reopen { id } => cli::occurrences::reopen(id),
        },
        Commands::Forecast { months, date, json } => cli::forecast::run(months, date.as_deref(), json),
        Commands::Status => cli::status::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
