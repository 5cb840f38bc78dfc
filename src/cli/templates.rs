use std::collections::HashMap;

use comfy_table::{Cell, Table};

use crate::cli::TemplateArgs;
use crate::dates::parse_date;
use crate::db::get_connection;
use crate::due_date::compute_due_date;
use crate::error::Result;
use crate::fmt::optional_money;
use crate::models::{RecurrenceTemplate, TemplateKind, TemplateStatus};
use crate::settings::db_path;
use crate::store;

pub fn add(args: TemplateArgs) -> Result<()> {
    let conn = get_connection(&db_path())?;
    let client = store::find_client(&conn, &args.client)?;

    let kind = match args.kind.as_str() {
        "installment" => TemplateKind::Installment {
            base_number: args.base_number.unwrap_or(1),
            total_installments: args.total,
        },
        other => TemplateKind::from_parts(other, None, None)?,
    };

    let template = RecurrenceTemplate {
        id: 0,
        client_id: client.id,
        name: args.name,
        kind,
        due_day: args.due_day,
        due_month: args.due_month,
        recurrence: args.recurrence.parse()?,
        recurrence_interval: args.interval,
        first_due_date: args.start.as_deref().map(parse_date).transpose()?,
        recurrence_end_date: args.end_date.as_deref().map(parse_date).transpose()?,
        auto_generate: !args.no_auto,
        weekend_rule: args.weekend.parse()?,
        parent_template_id: None,
        status: TemplateStatus::Active,
        amount: args.amount,
    };
    let id = store::insert_template(&conn, &template)?;

    let today = chrono::Local::now().date_naive();
    let next = compute_due_date(&template, today)?;
    println!("Added template #{id}: {} for {} (next due {next})", template.name, client.name);
    Ok(())
}

pub fn list() -> Result<()> {
    let conn = get_connection(&db_path())?;
    let clients: HashMap<i64, String> = store::list_clients(&conn)?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();
    let templates = store::load_templates(&conn)?;
    let today = chrono::Local::now().date_naive();

    let mut table = Table::new();
    table.set_header(vec![
        "ID", "Client", "Name", "Kind", "Recurrence", "Day", "Weekend", "Auto", "Amount", "Next Due",
    ]);
    for t in templates {
        let next_due = match compute_due_date(&t, today) {
            Ok(date) => date.to_string(),
            Err(e) => format!("({e})"),
        };
        table.add_row(vec![
            Cell::new(t.id),
            Cell::new(clients.get(&t.client_id).cloned().unwrap_or_default()),
            Cell::new(&t.name),
            Cell::new(t.kind.as_str()),
            Cell::new(t.recurrence.as_str()),
            Cell::new(t.due_day),
            Cell::new(t.weekend_rule.as_str()),
            Cell::new(if t.auto_generate { "yes" } else { "no" }),
            Cell::new(optional_money(t.amount)),
            Cell::new(next_due),
        ]);
    }
    println!("Templates\n{table}");
    Ok(())
}
