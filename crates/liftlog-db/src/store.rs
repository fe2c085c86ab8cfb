//! Parameterized query adapter.
//!
//! Statements are always executed with bound parameters. Result rows come
//! back as [`Record`]s: column names plus JSON values in select order, so
//! callers that do not know the table shape up front (the admin console)
//! can still render them faithfully.

use rusqlite::types::ValueRef;
use rusqlite::{Connection, Params, Row};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Number, Value};
use thiserror::Error;

/// Errors raised by the store adapter.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The statement was rejected by SQLite (syntax, constraint, type).
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// One result row with its column names, in select order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Record {
    /// Column names in select order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Column values aligned with [`Record::columns`].
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Consumes the record, keeping only the values.
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Looks a value up by column name.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|idx| &self.values[idx])
    }

    /// Integer value of `column`, if present and integral.
    pub fn get_i64(&self, column: &str) -> Option<i64> {
        self.get(column).and_then(Value::as_i64)
    }

    /// Text value of `column`, if present and textual.
    pub fn get_str(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(Value::as_str)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, value) in self.columns.iter().zip(&self.values) {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// Result of [`query`]: every row, or only the first one.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput {
    Rows(Vec<Record>),
    Row(Option<Record>),
}

/// Runs `sql` with `params` and returns either all rows or, when `single`
/// is set, only the first row.
///
/// # Errors
///
/// Returns `StoreError::Database` if the statement cannot be prepared or
/// executed.
pub fn query<P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
    single: bool,
) -> Result<QueryOutput, StoreError> {
    if single {
        query_one(conn, sql, params).map(QueryOutput::Row)
    } else {
        query_rows(conn, sql, params).map(QueryOutput::Rows)
    }
}

/// Runs a query and collects every row.
///
/// # Errors
///
/// Returns `StoreError::Database` if the statement cannot be prepared or
/// executed.
pub fn query_rows<P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Vec<Record>, StoreError> {
    let mut stmt = conn.prepare(sql)?;
    let columns = column_names(&stmt);
    let width = columns.len();

    let rows = stmt.query_map(params, |row| read_values(row, width))?;
    let mut records = Vec::new();
    for values in rows {
        records.push(Record {
            columns: columns.clone(),
            values: values?,
        });
    }
    Ok(records)
}

/// Runs a query and returns its first row, if any.
///
/// An empty result is `Ok(None)`, not an error.
///
/// # Errors
///
/// Returns `StoreError::Database` if the statement cannot be prepared or
/// executed.
pub fn query_one<P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Option<Record>, StoreError> {
    let mut stmt = conn.prepare(sql)?;
    let columns = column_names(&stmt);
    let width = columns.len();

    let mut rows = stmt.query(params)?;
    match rows.next()? {
        Some(row) => Ok(Some(Record {
            values: read_values(row, width)?,
            columns,
        })),
        None => Ok(None),
    }
}

/// Executes a statement that returns no rows, yielding the change count.
///
/// # Errors
///
/// Returns `StoreError::Database` if the statement fails.
pub fn execute<P: Params>(conn: &Connection, sql: &str, params: P) -> Result<usize, StoreError> {
    Ok(conn.execute(sql, params)?)
}

fn column_names(stmt: &rusqlite::Statement<'_>) -> Vec<String> {
    stmt.column_names().into_iter().map(String::from).collect()
}

fn read_values(row: &Row<'_>, width: usize) -> rusqlite::Result<Vec<Value>> {
    (0..width)
        .map(|idx| row.get_ref(idx).map(value_to_json))
        .collect()
}

fn value_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::String(hex::encode(bytes)),
    }
}
