use crate::cli::date_or_today;
use crate::db::get_connection;
use crate::error::Result;
use crate::run_gate::execute_run;
use crate::settings::db_path;
use crate::store::SqliteStore;

pub fn run(date: Option<&str>) -> Result<()> {
    let mut conn = get_connection(&db_path())?;
    let now = date_or_today(date)?.and_time(chrono::Local::now().time());

    let summary = execute_run(&mut SqliteStore::new(&mut conn), now)?;
    if summary.already_ran {
        println!("Already ran for {}. Nothing to do.", summary.period);
        return Ok(());
    }

    println!("Generation for {}", summary.period);
    println!("  Generated:  {}", summary.generated);
    if summary.duplicates > 0 {
        println!("  Skipped:    {} (already generated)", summary.duplicates);
    }
    println!("  Archived:   {}", summary.archived);
    for (id, reason) in &summary.rejected {
        println!("  Template #{id} skipped: {reason}");
    }
    Ok(())
}
