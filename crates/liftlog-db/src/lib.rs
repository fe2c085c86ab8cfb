//! Database layer for the liftlog backend.
//!
//! Provides SQLite connection pooling (via `r2d2`), WAL-mode initialization,
//! embedded SQL migrations, and the parameterized query adapter every other
//! crate goes through. The adapter owns no business logic: it binds
//! parameters, runs one statement, and hands rows back as ordered JSON
//! records.

mod migrations;
mod pool;
mod store;

pub use migrations::{run_migrations, MigrationError, MIGRATIONS_TABLE};
pub use pool::{create_pool, open_and_migrate, DbPool, DbRuntimeSettings, PoolError};
pub use store::{execute, query, query_one, query_rows, QueryOutput, Record, StoreError};
