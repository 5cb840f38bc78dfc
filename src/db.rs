use std::path::Path;

use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS clients (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    document TEXT,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS templates (
    id INTEGER PRIMARY KEY,
    client_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    kind TEXT NOT NULL DEFAULT 'obligation',
    base_number INTEGER,
    total_installments INTEGER,
    due_day INTEGER NOT NULL,
    due_month INTEGER,
    recurrence_type TEXT NOT NULL DEFAULT 'monthly',
    recurrence_interval INTEGER,
    first_due_date TEXT,
    recurrence_end_date TEXT,
    auto_generate INTEGER DEFAULT 1,
    weekend_rule TEXT NOT NULL DEFAULT 'none',
    parent_template_id INTEGER,
    status TEXT NOT NULL DEFAULT 'active',
    amount REAL,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (client_id) REFERENCES clients(id),
    FOREIGN KEY (parent_template_id) REFERENCES templates(id)
);

CREATE TABLE IF NOT EXISTS occurrences (
    id INTEGER PRIMARY KEY,
    template_id INTEGER NOT NULL,
    client_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    period_key TEXT NOT NULL,
    due_date TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending',
    installment_number INTEGER,
    amount REAL,
    is_archived INTEGER DEFAULT 0,
    completed_at TEXT,
    created_at TEXT DEFAULT (datetime('now')),
    UNIQUE (template_id, period_key),
    FOREIGN KEY (template_id) REFERENCES templates(id),
    FOREIGN KEY (client_id) REFERENCES clients(id)
);

CREATE TABLE IF NOT EXISTS run_log (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    last_run_period TEXT,
    last_run_at TEXT
);
";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    #[test]
    fn test_init_db_creates_tables() {
        let (_dir, conn) = test_db();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        for expected in &["clients", "templates", "occurrences", "run_log"] {
            assert!(tables.contains(&expected.to_string()), "missing table: {expected}");
        }
    }

    #[test]
    fn test_init_db_is_idempotent() {
        let (_dir, conn) = test_db();
        init_db(&conn).unwrap();
    }

    #[test]
    fn test_occurrence_period_is_unique_per_template() {
        let (_dir, conn) = test_db();
        conn.execute("INSERT INTO clients (name) VALUES ('Acme')", []).unwrap();
        conn.execute(
            "INSERT INTO templates (client_id, name, due_day) VALUES (1, 'ISS', 10)",
            [],
        )
        .unwrap();
        let insert = "INSERT INTO occurrences (template_id, client_id, name, period_key, due_date) \
                      VALUES (1, 1, 'ISS', '2024-03', '2024-03-10')";
        conn.execute(insert, []).unwrap();
        assert!(conn.execute(insert, []).is_err());
    }

    #[test]
    fn test_run_log_is_singleton() {
        let (_dir, conn) = test_db();
        conn.execute("INSERT INTO run_log (id, last_run_period) VALUES (1, '2024-03')", []).unwrap();
        assert!(conn
            .execute("INSERT INTO run_log (id, last_run_period) VALUES (2, '2024-04')", [])
            .is_err());
    }
}
