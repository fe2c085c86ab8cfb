use liftlog_db::StoreError;
use thiserror::Error;

/// Errors produced by the admin console.
#[derive(Debug, Error)]
pub enum AdminError {
    /// The table is not in the introspected allow-list.
    #[error("table not allowed: {0}")]
    UnknownTable(String),

    /// The column does not exist on the table.
    #[error("unknown column {column} on table {table}")]
    UnknownColumn { table: String, column: String },

    /// A value cannot be stored in its column.
    #[error("invalid value for column {column}: {reason}")]
    InvalidValue { column: String, reason: String },

    /// An insert or update named no columns.
    #[error("no values supplied")]
    EmptyValues,

    /// The store rejected the statement (constraint violation, type error).
    #[error("store rejected admin statement: {0}")]
    Store(#[from] StoreError),
}

impl AdminError {
    /// True for errors caused by the request itself rather than the store.
    pub fn is_invalid_request(&self) -> bool {
        !matches!(self, Self::Store(_))
    }
}
