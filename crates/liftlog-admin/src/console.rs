//! Console operations: the four table actions an administrator can take.

use crate::command::TableCommand;
use crate::schema::SchemaSnapshot;
use crate::AdminError;
use liftlog_db::{execute, query_rows};
use liftlog_types::MutationOutcome;
use rusqlite::{params_from_iter, Connection};
use serde::Serialize;
use serde_json::{Map, Value};

/// One page of a table: column headers plus row values in header order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableData {
    pub headers: Vec<String>,
    pub body: Vec<Vec<Value>>,
}

/// Names of every table the console may touch.
pub fn list_tables(schema: &SchemaSnapshot) -> Vec<String> {
    schema.tables().to_vec()
}

/// Reads page `page` (zero-based, ten rows) of `table`.
///
/// When the page is empty the headers still come from the schema, so the
/// client can render an empty grid.
///
/// # Errors
///
/// See [`TableCommand::prepare`]; store failures surface as `AdminError::Store`.
pub fn get_table_data(
    conn: &Connection,
    schema: &SchemaSnapshot,
    table: &str,
    page: i64,
) -> Result<TableData, AdminError> {
    let stmt = TableCommand::select(table, page).prepare(schema)?;
    let rows = query_rows(conn, &stmt.sql, params_from_iter(stmt.params.iter()))?;

    let headers = match rows.first() {
        Some(first) => first.columns().to_vec(),
        None => schema.headers(table),
    };
    let body = rows.into_iter().map(|row| row.into_values()).collect();

    Ok(TableData { headers, body })
}

/// Overwrites the given columns of row `id`.
///
/// # Errors
///
/// See [`TableCommand::prepare`]; constraint violations surface as
/// `AdminError::Store`.
pub fn update_table_data(
    conn: &Connection,
    schema: &SchemaSnapshot,
    table: &str,
    id: i64,
    values: &Map<String, Value>,
) -> Result<MutationOutcome, AdminError> {
    apply(conn, schema, TableCommand::update(table, id, values))
}

/// Inserts one row built from `values`.
///
/// # Errors
///
/// See [`update_table_data`].
pub fn insert_table_data(
    conn: &Connection,
    schema: &SchemaSnapshot,
    table: &str,
    values: &Map<String, Value>,
) -> Result<MutationOutcome, AdminError> {
    apply(conn, schema, TableCommand::insert(table, values))
}

/// Deletes row `id`.
///
/// # Errors
///
/// See [`update_table_data`].
pub fn delete_table_data(
    conn: &Connection,
    schema: &SchemaSnapshot,
    table: &str,
    id: i64,
) -> Result<MutationOutcome, AdminError> {
    apply(conn, schema, TableCommand::delete(table, id))
}

fn apply(
    conn: &Connection,
    schema: &SchemaSnapshot,
    command: TableCommand,
) -> Result<MutationOutcome, AdminError> {
    let stmt = command.prepare(schema)?;
    let changed = execute(conn, &stmt.sql, params_from_iter(stmt.params.iter()))?;
    tracing::info!(
        table = %command.table,
        operation = ?command.operation,
        rows = changed,
        "admin mutation applied"
    );
    Ok(MutationOutcome::for_table(&command.table))
}
