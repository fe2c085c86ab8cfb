//! Embedded SQL migration runner.
//!
//! Migrations are SQL files embedded at compile time. They run sequentially
//! on startup, tracked by the `_liftlog_migrations` table. Each migration
//! runs exactly once, inside its own transaction.

use rusqlite::Connection;
use thiserror::Error;

/// Name of the bookkeeping table. It is never exposed to the admin console.
pub const MIGRATIONS_TABLE: &str = "_liftlog_migrations";

/// A single embedded migration.
struct Migration {
    name: &'static str,
    sql: &'static str,
}

/// All migrations in order. New migrations are appended here.
const MIGRATIONS: &[Migration] = &[
    Migration {
        name: "000_users",
        sql: include_str!("migrations/000_users.sql"),
    },
    Migration {
        name: "001_sessions",
        sql: include_str!("migrations/001_sessions.sql"),
    },
    Migration {
        name: "002_login_reset",
        sql: include_str!("migrations/002_login_reset.sql"),
    },
    Migration {
        name: "003_exercises",
        sql: include_str!("migrations/003_exercises.sql"),
    },
    Migration {
        name: "004_workouts",
        sql: include_str!("migrations/004_workouts.sql"),
    },
];

/// Errors that can occur during migration execution.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// A SQL statement within a migration failed.
    #[error("migration '{name}' failed: {source}")]
    ExecutionFailed {
        /// The name of the migration that failed.
        name: String,
        /// The underlying SQLite error.
        source: rusqlite::Error,
    },

    /// Failed to query migration state.
    #[error("failed to check migration state: {0}")]
    StateQuery(rusqlite::Error),
}

/// Runs all pending migrations against the given connection.
///
/// Returns the number of migrations applied by this call.
///
/// # Errors
///
/// Returns `MigrationError` if any migration fails to execute or if the
/// migration tracking table cannot be queried.
pub fn run_migrations(conn: &Connection) -> Result<usize, MigrationError> {
    run_migrations_from_list(conn, MIGRATIONS)
}

fn run_migrations_from_list(
    conn: &Connection,
    migrations: &[Migration],
) -> Result<usize, MigrationError> {
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {MIGRATIONS_TABLE} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );"
    ))
    .map_err(|e| MigrationError::ExecutionFailed {
        name: format!("{MIGRATIONS_TABLE}_bootstrap"),
        source: e,
    })?;

    let check_sql = format!("SELECT COUNT(*) > 0 FROM {MIGRATIONS_TABLE} WHERE name = ?1");
    let record_sql = format!("INSERT INTO {MIGRATIONS_TABLE} (name) VALUES (?1)");
    let mut applied = 0;

    for migration in migrations {
        let already_applied: bool = conn
            .query_row(&check_sql, [migration.name], |row| row.get(0))
            .map_err(MigrationError::StateQuery)?;

        if already_applied {
            tracing::debug!(
                migration = migration.name,
                "migration already applied, skipping"
            );
            continue;
        }

        tracing::info!(migration = migration.name, "applying migration");

        let failed = |e: rusqlite::Error| MigrationError::ExecutionFailed {
            name: migration.name.to_string(),
            source: e,
        };

        let tx = conn.unchecked_transaction().map_err(failed)?;
        tx.execute_batch(migration.sql).map_err(failed)?;
        tx.execute(&record_sql, [migration.name]).map_err(failed)?;
        tx.commit().map_err(failed)?;

        applied += 1;
    }

    Ok(applied)
}
