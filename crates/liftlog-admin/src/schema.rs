//! Schema introspection and the process-wide snapshot cache.

use crate::AdminError;
use liftlog_db::{query_rows, MIGRATIONS_TABLE};
use liftlog_types::coerce_flag;
use rusqlite::Connection;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// SQLite type affinity of a column, derived from its declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affinity {
    Integer,
    Text,
    Blob,
    Real,
    Numeric,
}

impl Affinity {
    /// Applies SQLite's affinity rules (section 3.1 of the datatype docs)
    /// to a declared column type.
    pub fn from_declared(declared: &str) -> Self {
        let upper = declared.to_ascii_uppercase();
        if upper.contains("INT") {
            Self::Integer
        } else if upper.contains("CHAR") || upper.contains("CLOB") || upper.contains("TEXT") {
            Self::Text
        } else if upper.contains("BLOB") || upper.trim().is_empty() {
            Self::Blob
        } else if upper.contains("REAL") || upper.contains("FLOA") || upper.contains("DOUB") {
            Self::Real
        } else {
            Self::Numeric
        }
    }
}

/// One column of an allow-listed table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub declared_type: String,
    pub affinity: Affinity,
    pub not_null: bool,
    pub primary_key: bool,
}

/// The allow-list of tables and their column structure at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaSnapshot {
    tables: Vec<String>,
    structure: HashMap<String, Vec<ColumnInfo>>,
}

impl SchemaSnapshot {
    /// Reads every user table and its columns from the database.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Store` if `sqlite_master` or `pragma_table_info`
    /// cannot be queried.
    pub fn introspect(conn: &Connection) -> Result<Self, AdminError> {
        let table_rows = query_rows(
            conn,
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' AND name != ?1
             ORDER BY name",
            [MIGRATIONS_TABLE],
        )?;

        let mut tables = Vec::with_capacity(table_rows.len());
        let mut structure = HashMap::with_capacity(table_rows.len());

        for row in table_rows {
            let Some(table) = row.get_str("name").map(str::to_string) else {
                continue;
            };
            let column_rows = query_rows(
                conn,
                "SELECT name, type, \"notnull\", pk FROM pragma_table_info(?1) ORDER BY cid",
                [&table],
            )?;
            let columns = column_rows
                .iter()
                .filter_map(|col| {
                    let declared_type = col.get_str("type").unwrap_or_default().to_string();
                    Some(ColumnInfo {
                        name: col.get_str("name")?.to_string(),
                        affinity: Affinity::from_declared(&declared_type),
                        declared_type,
                        not_null: col.get("notnull").is_some_and(coerce_flag),
                        primary_key: col.get("pk").is_some_and(coerce_flag),
                    })
                })
                .collect();

            structure.insert(table.clone(), columns);
            tables.push(table);
        }

        Ok(Self { tables, structure })
    }

    /// The allow-listed table names, sorted.
    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    /// Whether `table` may be operated on.
    pub fn allows(&self, table: &str) -> bool {
        self.structure.contains_key(table)
    }

    /// Columns of `table` in declaration order.
    pub fn columns(&self, table: &str) -> Option<&[ColumnInfo]> {
        self.structure.get(table).map(Vec::as_slice)
    }

    /// Looks up a single column.
    pub fn column(&self, table: &str, column: &str) -> Option<&ColumnInfo> {
        self.columns(table)?.iter().find(|c| c.name == column)
    }

    /// Column names of `table`, empty when the table is unknown.
    pub fn headers(&self, table: &str) -> Vec<String> {
        self.columns(table)
            .map(|cols| cols.iter().map(|c| c.name.clone()).collect())
            .unwrap_or_default()
    }
}

/// Owner of the current [`SchemaSnapshot`].
///
/// Populated lazily and replaced wholesale by [`SchemaCache::rebuild`].
/// Concurrent rebuilds are not coordinated: the last one to finish wins.
#[derive(Debug, Default)]
pub struct SchemaCache {
    current: RwLock<Option<Arc<SchemaSnapshot>>>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Introspects the database and replaces the cached snapshot.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Store` if introspection fails; the previous
    /// snapshot is kept in that case.
    pub fn rebuild(&self, conn: &Connection) -> Result<Arc<SchemaSnapshot>, AdminError> {
        let snapshot = Arc::new(SchemaSnapshot::introspect(conn)?);
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::error!("schema cache lock poisoned, replacing stale snapshot");
                poisoned.into_inner()
            }
        };
        *guard = Some(Arc::clone(&snapshot));
        tracing::debug!(tables = snapshot.tables().len(), "schema snapshot rebuilt");
        Ok(snapshot)
    }

    /// The cached snapshot, if one has been built.
    pub fn snapshot(&self) -> Option<Arc<SchemaSnapshot>> {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}
