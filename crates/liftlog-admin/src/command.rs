//! Validated table commands.
//!
//! A [`TableCommand`] describes what an administrator asked for in terms of
//! runtime strings. [`TableCommand::prepare`] checks it against the schema
//! snapshot and only then renders SQL, so no unchecked name ever reaches
//! query text and no value ever does.

use crate::schema::{Affinity, ColumnInfo, SchemaSnapshot};
use crate::AdminError;
use liftlog_types::ADMIN_PAGE_SIZE;
use rusqlite::types::Value as SqlValue;
use serde_json::{Map, Value};

/// Primary key column every console-editable table is addressed by.
const ID_COLUMN: &str = "id";

/// The kind of statement a command renders to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// One page of rows, `ADMIN_PAGE_SIZE` long.
    Select { page: i64 },
    Insert,
    Update,
    Delete,
}

/// An unvalidated request against a runtime-named table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableCommand {
    pub table: String,
    pub operation: Operation,
    pub columns: Vec<String>,
    pub values: Vec<Value>,
    /// Primary key the statement is restricted to (update and delete).
    pub predicate: Option<i64>,
}

/// SQL text plus its bound parameters, ready for the store.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedStatement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl TableCommand {
    pub fn select(table: &str, page: i64) -> Self {
        Self {
            table: table.to_string(),
            operation: Operation::Select { page },
            columns: Vec::new(),
            values: Vec::new(),
            predicate: None,
        }
    }

    pub fn insert(table: &str, values: &Map<String, Value>) -> Self {
        let (columns, values) = split_values(values);
        Self {
            table: table.to_string(),
            operation: Operation::Insert,
            columns,
            values,
            predicate: None,
        }
    }

    pub fn update(table: &str, id: i64, values: &Map<String, Value>) -> Self {
        let (columns, values) = split_values(values);
        Self {
            table: table.to_string(),
            operation: Operation::Update,
            columns,
            values,
            predicate: Some(id),
        }
    }

    pub fn delete(table: &str, id: i64) -> Self {
        Self {
            table: table.to_string(),
            operation: Operation::Delete,
            columns: Vec::new(),
            values: Vec::new(),
            predicate: Some(id),
        }
    }

    /// Validates the command against `schema` and renders it.
    ///
    /// # Errors
    ///
    /// - `AdminError::UnknownTable` if the table is not allow-listed.
    /// - `AdminError::UnknownColumn` if a column (or the `id` key) is missing.
    /// - `AdminError::InvalidValue` if a value does not fit its column, or the
    ///   page number is negative.
    /// - `AdminError::EmptyValues` for an insert or update with no columns.
    pub fn prepare(&self, schema: &SchemaSnapshot) -> Result<PreparedStatement, AdminError> {
        if !schema.allows(&self.table) {
            return Err(AdminError::UnknownTable(self.table.clone()));
        }
        let table = quote_ident(&self.table);

        match self.operation {
            Operation::Select { page } => {
                let offset = page
                    .checked_mul(ADMIN_PAGE_SIZE)
                    .filter(|offset| *offset >= 0)
                    .ok_or_else(|| AdminError::InvalidValue {
                        column: "page".to_string(),
                        reason: format!("page out of range: {page}"),
                    })?;
                Ok(PreparedStatement {
                    sql: format!("SELECT * FROM {table} LIMIT ?1 OFFSET ?2"),
                    params: vec![SqlValue::Integer(ADMIN_PAGE_SIZE), SqlValue::Integer(offset)],
                })
            }
            Operation::Insert => {
                let (names, params) = self.bind_columns(schema)?;
                let placeholders: Vec<String> =
                    (1..=params.len()).map(|idx| format!("?{idx}")).collect();
                let sql = format!(
                    "INSERT INTO {table} ({}) VALUES ({})",
                    names.join(", "),
                    placeholders.join(", ")
                );
                Ok(PreparedStatement { sql, params })
            }
            Operation::Update => {
                let id = self.require_predicate(schema)?;
                let (names, mut params) = self.bind_columns(schema)?;
                let assignments: Vec<String> = names
                    .iter()
                    .enumerate()
                    .map(|(idx, name)| format!("{name} = ?{}", idx + 1))
                    .collect();
                let sql = format!(
                    "UPDATE {table} SET {} WHERE {} = ?{}",
                    assignments.join(", "),
                    quote_ident(ID_COLUMN),
                    params.len() + 1
                );
                params.push(SqlValue::Integer(id));
                Ok(PreparedStatement { sql, params })
            }
            Operation::Delete => {
                let id = self.require_predicate(schema)?;
                Ok(PreparedStatement {
                    sql: format!("DELETE FROM {table} WHERE {} = ?1", quote_ident(ID_COLUMN)),
                    params: vec![SqlValue::Integer(id)],
                })
            }
        }
    }

    fn require_predicate(&self, schema: &SchemaSnapshot) -> Result<i64, AdminError> {
        if schema.column(&self.table, ID_COLUMN).is_none() {
            return Err(AdminError::UnknownColumn {
                table: self.table.clone(),
                column: ID_COLUMN.to_string(),
            });
        }
        self.predicate.ok_or_else(|| AdminError::InvalidValue {
            column: ID_COLUMN.to_string(),
            reason: "missing row id".to_string(),
        })
    }

    fn bind_columns(
        &self,
        schema: &SchemaSnapshot,
    ) -> Result<(Vec<String>, Vec<SqlValue>), AdminError> {
        if self.columns.is_empty() {
            return Err(AdminError::EmptyValues);
        }

        let mut names = Vec::with_capacity(self.columns.len());
        let mut params = Vec::with_capacity(self.columns.len());
        for (name, value) in self.columns.iter().zip(&self.values) {
            let column =
                schema
                    .column(&self.table, name)
                    .ok_or_else(|| AdminError::UnknownColumn {
                        table: self.table.clone(),
                        column: name.clone(),
                    })?;
            names.push(quote_ident(&column.name));
            params.push(coerce(value, column)?);
        }
        Ok((names, params))
    }
}

fn split_values(values: &Map<String, Value>) -> (Vec<String>, Vec<Value>) {
    values
        .iter()
        .map(|(column, value)| (column.clone(), value.clone()))
        .unzip()
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Converts a JSON value into the SQLite value its column expects.
fn coerce(value: &Value, column: &ColumnInfo) -> Result<SqlValue, AdminError> {
    let invalid = |reason: &str| AdminError::InvalidValue {
        column: column.name.clone(),
        reason: reason.to_string(),
    };

    match (column.affinity, value) {
        (_, Value::Null) => Ok(SqlValue::Null),

        (Affinity::Text, Value::String(s)) => Ok(SqlValue::Text(s.clone())),
        (Affinity::Text, Value::Number(n)) => Ok(SqlValue::Text(n.to_string())),
        (Affinity::Text, Value::Bool(b)) => Ok(SqlValue::Text(b.to_string())),
        (Affinity::Text, nested) => Ok(SqlValue::Text(nested.to_string())),

        (_, Value::Bool(b)) => Ok(SqlValue::Integer(i64::from(*b))),

        (Affinity::Integer, Value::Number(n)) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Ok(SqlValue::Integer(i)),
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                Ok(SqlValue::Integer(f as i64))
            }
            _ => Err(invalid("expected an integer")),
        },
        (Affinity::Integer, Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(SqlValue::Integer)
            .map_err(|_| invalid("expected an integer")),

        (Affinity::Real, Value::Number(n)) => n
            .as_f64()
            .map(SqlValue::Real)
            .ok_or_else(|| invalid("expected a number")),
        (Affinity::Real, Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(SqlValue::Real)
            .map_err(|_| invalid("expected a number")),

        (Affinity::Numeric | Affinity::Blob, Value::Number(n)) => Ok(match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or_default()),
        }),
        (Affinity::Numeric, Value::String(s)) => {
            let trimmed = s.trim();
            if let Ok(i) = trimmed.parse::<i64>() {
                Ok(SqlValue::Integer(i))
            } else if let Ok(f) = trimmed.parse::<f64>() {
                Ok(SqlValue::Real(f))
            } else {
                Ok(SqlValue::Text(s.clone()))
            }
        }
        (Affinity::Blob, Value::String(s)) => Ok(SqlValue::Text(s.clone())),

        (_, Value::Array(_) | Value::Object(_)) => Err(invalid("nested values need a text column")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use liftlog_db::run_migrations;
    use rusqlite::Connection;
    use serde_json::json;

    fn snapshot() -> SchemaSnapshot {
        let conn = Connection::open_in_memory().expect("failed to open in-memory db");
        run_migrations(&conn).expect("failed to run migrations");
        SchemaSnapshot::introspect(&conn).expect("introspection")
    }

    fn values(v: Value) -> Map<String, Value> {
        v.as_object().cloned().expect("object literal")
    }

    #[test]
    fn select_pages_by_ten() {
        let stmt = TableCommand::select("exercise", 3)
            .prepare(&snapshot())
            .expect("valid select");
        assert_eq!(stmt.sql, "SELECT * FROM \"exercise\" LIMIT ?1 OFFSET ?2");
        assert_eq!(stmt.params, vec![SqlValue::Integer(10), SqlValue::Integer(30)]);
    }

    #[test]
    fn negative_page_is_rejected() {
        let err = TableCommand::select("exercise", -1).prepare(&snapshot());
        assert!(matches!(err, Err(AdminError::InvalidValue { .. })));
    }

    #[test]
    fn update_binds_every_value_and_the_key() {
        let cmd = TableCommand::update(
            "user",
            7,
            &values(json!({"is_admin": "1", "email": "x@y.io"})),
        );
        let stmt = cmd.prepare(&snapshot()).expect("valid update");

        assert_eq!(
            stmt.sql,
            "UPDATE \"user\" SET \"email\" = ?1, \"is_admin\" = ?2 WHERE \"id\" = ?3"
        );
        assert_eq!(
            stmt.params,
            vec![
                SqlValue::Text("x@y.io".to_string()),
                SqlValue::Integer(1),
                SqlValue::Integer(7)
            ]
        );
    }

    #[test]
    fn hostile_values_never_reach_sql_text() {
        let hostile = "'; DROP TABLE user; --";
        let cmd = TableCommand::insert("exercise", &values(json!({"name": hostile})));
        let stmt = cmd.prepare(&snapshot()).expect("valid insert");

        assert_eq!(stmt.sql, "INSERT INTO \"exercise\" (\"name\") VALUES (?1)");
        assert!(!stmt.sql.contains("DROP"));
        assert_eq!(stmt.params, vec![SqlValue::Text(hostile.to_string())]);
    }

    #[test]
    fn unknown_table_fails_closed() {
        let err = TableCommand::delete("_liftlog_migrations", 1).prepare(&snapshot());
        assert!(matches!(err, Err(AdminError::UnknownTable(_))));

        let err = TableCommand::select("user; DROP TABLE user", 0).prepare(&snapshot());
        assert!(matches!(err, Err(AdminError::UnknownTable(_))));
    }

    #[test]
    fn unknown_column_is_rejected() {
        let cmd = TableCommand::update("user", 1, &values(json!({"name = 'x' --": "y"})));
        assert!(matches!(
            cmd.prepare(&snapshot()),
            Err(AdminError::UnknownColumn { .. })
        ));
    }

    #[test]
    fn empty_values_are_rejected() {
        let cmd = TableCommand::insert("exercise", &Map::new());
        assert!(matches!(cmd.prepare(&snapshot()), Err(AdminError::EmptyValues)));
    }

    #[test]
    fn values_are_coerced_to_column_affinity() {
        let schema = snapshot();
        let cmd = TableCommand::insert(
            "calendar",
            &values(json!({
                "user_id": "4",
                "date": "2024-01-02",
                "carbs": "120.5",
                "protein": 80,
                "diet": {"breakfast": []}
            })),
        );
        let stmt = cmd.prepare(&schema).expect("valid insert");
        assert!(stmt.params.contains(&SqlValue::Integer(4)));
        assert!(stmt.params.contains(&SqlValue::Real(120.5)));
        assert!(stmt.params.contains(&SqlValue::Real(80.0)));
        assert!(stmt
            .params
            .contains(&SqlValue::Text(r#"{"breakfast":[]}"#.to_string())));

        let bad = TableCommand::update("calendar", 1, &values(json!({"user_id": "four"})));
        assert!(matches!(
            bad.prepare(&schema),
            Err(AdminError::InvalidValue { .. })
        ));
    }
}
