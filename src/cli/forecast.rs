use std::collections::HashMap;

use comfy_table::{Cell, Table};

use crate::cli::date_or_today;
use crate::db::get_connection;
use crate::error::{PrazoError, Result};
use crate::expansion::forecast;
use crate::settings::{db_path, load_settings};
use crate::store;

pub fn run(months: Option<u32>, date: Option<&str>, json: bool) -> Result<()> {
    let conn = get_connection(&db_path())?;
    let reference = date_or_today(date)?;
    let months = months.unwrap_or_else(|| load_settings().forecast_months);

    let templates = store::load_templates(&conn)?;
    let entries = forecast(&templates, months, reference);

    if json {
        let out = serde_json::to_string_pretty(&entries).map_err(|e| PrazoError::Other(e.to_string()))?;
        println!("{out}");
        return Ok(());
    }

    let clients: HashMap<i64, String> = store::list_clients(&conn)?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();
    let mut table = Table::new();
    table.set_header(vec!["Due", "Weekday", "Client", "Name"]);
    for entry in &entries {
        table.add_row(vec![
            Cell::new(entry.due_date),
            Cell::new(entry.due_date.format("%a")),
            Cell::new(clients.get(&entry.client_id).cloned().unwrap_or_default()),
            Cell::new(&entry.name),
        ]);
    }
    println!("Forecast from {reference}, {months} month(s)\n{table}");
    Ok(())
}
