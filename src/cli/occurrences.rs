use std::collections::HashMap;

use comfy_table::{Cell, Table};

use crate::db::get_connection;
use crate::error::Result;
use crate::fmt::{optional_money, status_label};
use crate::models::DisplayStatus;
use crate::settings::db_path;
use crate::store::{self, OccurrenceScope};

pub fn list(all: bool, client: Option<&str>) -> Result<()> {
    let conn = get_connection(&db_path())?;
    let clients: HashMap<i64, String> = store::list_clients(&conn)?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();
    let client_id = client
        .map(|name| store::find_client(&conn, name).map(|c| c.id))
        .transpose()?;

    let scope = if all { OccurrenceScope::All } else { OccurrenceScope::Active };
    let today = chrono::Local::now().date_naive();

    let mut table = Table::new();
    table.set_header(vec!["ID", "Client", "Name", "Period", "Due", "#", "Amount", "Status"]);
    let mut overdue = 0usize;
    for occ in store::load_occurrences(&conn, scope)?
        .into_iter()
        .filter(|o| client_id.map_or(true, |id| o.client_id == id))
    {
        let status = occ.display_status(today);
        if status == DisplayStatus::Overdue {
            overdue += 1;
        }
        let label = if occ.archived {
            format!("{} (archived)", status_label(status))
        } else {
            status_label(status).to_string()
        };
        table.add_row(vec![
            Cell::new(occ.id.unwrap_or_default()),
            Cell::new(clients.get(&occ.client_id).cloned().unwrap_or_default()),
            Cell::new(&occ.name),
            Cell::new(occ.generated_for_period),
            Cell::new(occ.calculated_due_date),
            Cell::new(occ.installment_number.map(|n| n.to_string()).unwrap_or_default()),
            Cell::new(optional_money(occ.amount)),
            Cell::new(label),
        ]);
    }
    println!("Occurrences\n{table}");
    if overdue > 0 {
        println!("{overdue} overdue");
    }
    Ok(())
}

pub fn start(id: i64) -> Result<()> {
    let conn = get_connection(&db_path())?;
    let mut occ = store::get_occurrence(&conn, id)?;
    occ.start()?;
    store::save_occurrence_status(&conn, &occ)?;
    println!("Started #{id}: {} ({})", occ.name, occ.generated_for_period);
    Ok(())
}

pub fn complete(id: i64) -> Result<()> {
    let conn = get_connection(&db_path())?;
    let mut occ = store::get_occurrence(&conn, id)?;
    occ.complete(chrono::Local::now().naive_local())?;
    store::save_occurrence_status(&conn, &occ)?;
    println!("Completed #{id}: {} ({})", occ.name, occ.generated_for_period);
    Ok(())
}

pub fn reopen(id: i64) -> Result<()> {
    let conn = get_connection(&db_path())?;
    let mut occ = store::get_occurrence(&conn, id)?;
    occ.reopen()?;
    store::save_occurrence_status(&conn, &occ)?;
    println!("Reopened #{id}: {} ({})", occ.name, occ.generated_for_period);
    Ok(())
}
