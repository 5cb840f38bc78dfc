use comfy_table::{Cell, Table};

use crate::db::get_connection;
use crate::error::Result;
use crate::settings::db_path;
use crate::store;

pub fn add(name: &str, document: Option<&str>) -> Result<()> {
    let conn = get_connection(&db_path())?;
    store::add_client(&conn, name, document)?;
    println!("Added client: {name}");
    Ok(())
}

pub fn list() -> Result<()> {
    let conn = get_connection(&db_path())?;
    let clients = store::list_clients(&conn)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Document"]);
    for client in clients {
        table.add_row(vec![
            Cell::new(client.id),
            Cell::new(client.name),
            Cell::new(client.document.unwrap_or_default()),
        ]);
    }
    println!("Clients\n{table}");
    Ok(())
}
