use crate::db::get_connection;
use crate::error::Result;
use crate::settings::load_settings;
use crate::store::get_run_log;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let data_dir = std::path::PathBuf::from(&settings.data_dir);
    let db_path = data_dir.join("prazo.db");

    println!("User:       {}", if settings.user_name.is_empty() { "(not set)" } else { &settings.user_name });
    println!("Data dir:   {}", data_dir.display());
    println!("Database:   {}", db_path.display());

    if db_path.exists() {
        let conn = get_connection(&db_path)?;

        let clients: i64 = conn.query_row("SELECT count(*) FROM clients", [], |r| r.get(0))?;
        let templates: i64 = conn.query_row("SELECT count(*) FROM templates", [], |r| r.get(0))?;
        let open: i64 = conn.query_row(
            "SELECT count(*) FROM occurrences WHERE is_archived = 0 AND status != 'completed'",
            [],
            |r| r.get(0),
        )?;
        let archived: i64 =
            conn.query_row("SELECT count(*) FROM occurrences WHERE is_archived = 1", [], |r| r.get(0))?;
        let run_log = get_run_log(&conn)?;

        println!();
        println!("Clients:       {clients}");
        println!("Templates:     {templates}");
        println!("Open items:    {open}");
        println!("Archived:      {archived}");
        match (run_log.last_run_period, run_log.last_run_at) {
            (Some(period), Some(at)) => println!("Last run:      {period} (at {})", at.format("%Y-%m-%d %H:%M")),
            (Some(period), None) => println!("Last run:      {period}"),
            (None, _) => println!("Last run:      (never)"),
        }
    } else {
        println!();
        println!("Database not found. Run `prazo init` to set up.");
    }

    Ok(())
}
