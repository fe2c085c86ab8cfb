//! Generic table console for administrators.
//!
//! The console lets an administrator page through, edit, insert into and
//! delete from any application table without per-table code. Because
//! table and column names arrive at runtime, every request is first turned
//! into a [`TableCommand`] and checked against a [`SchemaSnapshot`]
//! introspected from the live database:
//!
//! - the table must be in the snapshot's allow-list (internal `sqlite_*`
//!   and migration bookkeeping tables never are);
//! - every column must exist on that table;
//! - every value must be coercible to the column's type affinity.
//!
//! Only then is SQL text assembled, with quoted identifiers and bound
//! parameters for every value. Authorization is the caller's job; this
//! crate assumes the admin gate has already been passed.

mod command;
mod console;
mod error;
mod schema;

pub use command::{Operation, PreparedStatement, TableCommand};
pub use console::{
    delete_table_data, get_table_data, insert_table_data, list_tables, update_table_data,
    TableData,
};
pub use error::AdminError;
pub use schema::{Affinity, ColumnInfo, SchemaCache, SchemaSnapshot};
