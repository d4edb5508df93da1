// Database service module
// SQLite connection and schema for the local session store

mod connection;
mod migrations;
mod schema;

pub use connection::Database;

#[cfg(test)]
mod tests {
    use super::migrations::column_exists;
    use super::*;
    use std::path::Path;

    #[test]
    fn test_new_database_in_memory() {
        let result = Database::new(":memory:");
        assert!(result.is_ok(), "Should create in-memory database");
    }

    #[test]
    fn test_new_database_with_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("sessions.db");
        let db_path_str = db_path.to_str().unwrap();

        let result = Database::new(db_path_str);
        assert!(result.is_ok(), "Should create file-based database");
        assert!(Path::new(db_path_str).exists(), "Database file should exist");
    }

    #[test]
    fn test_sessions_table_exists() {
        let db = Database::in_memory().unwrap();

        let count: i64 = db
            .connection()
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='sessions'",
                [],
                |row| row.get(0),
            )
            .unwrap();

        assert_eq!(count, 1, "Sessions table should exist");
        assert!(column_exists(db.connection(), "sessions", "pattern").unwrap());
    }

    #[test]
    fn test_schema_initialization_is_idempotent() {
        let db = Database::in_memory().unwrap();
        assert!(db.initialize_schema().is_ok());
    }

    #[test]
    fn test_check_constraint_rejects_inverted_times() {
        let db = Database::in_memory().unwrap();
        let result = db.connection().execute(
            "INSERT INTO sessions (date, start_minute, end_minute, title)
             VALUES ('2025-03-03', 600, 540, 'Bad')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let db = Database::new(":memory:").unwrap();
        let enabled: i64 = db
            .connection()
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1, "Foreign keys should be enabled");
    }
}
