use anyhow::{Context, Result};
use rusqlite::Connection;

use super::migrations;

pub fn initialize_schema(conn: &Connection) -> Result<()> {
    create_sessions_table(conn)?;
    run_session_migrations(conn)?;
    create_indexes(conn)?;
    Ok(())
}

fn create_sessions_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS sessions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            start_minute INTEGER NOT NULL,
            end_minute INTEGER NOT NULL,
            status TEXT NOT NULL DEFAULT 'scheduled',
            title TEXT NOT NULL,
            note TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK (end_minute > start_minute),
            CHECK (end_minute <= 1440)
        )",
        [],
    )
    .context("Failed to create sessions table")?;

    Ok(())
}

fn run_session_migrations(conn: &Connection) -> Result<()> {
    migrations::ensure_column(
        conn,
        "sessions",
        "pattern",
        "ALTER TABLE sessions ADD COLUMN pattern TEXT",
    )?;

    Ok(())
}

fn create_indexes(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_sessions_date ON sessions(date)",
        [],
    )
    .context("Failed to create sessions date index")?;

    Ok(())
}
