#![allow(dead_code)]

use liftlog_db::run_migrations;
use liftlog_identity::register_user;
use rusqlite::Connection;

pub const USERNAME: &str = "module_test";
pub const EMAIL: &str = "module_test@teszt.com";
pub const PASSWORD: &str = "teszt123";

/// Opens an in-memory database with the schema applied and one account.
pub fn setup_with_user() -> (Connection, i64) {
    let conn = Connection::open_in_memory().expect("failed to open in-memory db");
    run_migrations(&conn).expect("failed to run migrations");
    let id = register_user(&conn, USERNAME, EMAIL, PASSWORD).expect("failed to register user");
    (conn, id)
}
