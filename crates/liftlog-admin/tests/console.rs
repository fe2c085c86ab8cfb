use liftlog_admin::{
    delete_table_data, get_table_data, insert_table_data, list_tables, update_table_data,
    AdminError, SchemaCache, SchemaSnapshot,
};
use liftlog_db::{query_one, run_migrations, MIGRATIONS_TABLE};
use liftlog_types::MutationOutcome;
use rusqlite::Connection;
use serde_json::{json, Map, Value};

fn setup() -> (Connection, SchemaSnapshot) {
    let conn = Connection::open_in_memory().expect("failed to open in-memory db");
    run_migrations(&conn).expect("failed to run migrations");
    let snapshot = SchemaSnapshot::introspect(&conn).expect("introspection");
    (conn, snapshot)
}

fn object(v: Value) -> Map<String, Value> {
    v.as_object().cloned().expect("object literal")
}

fn seed_exercises(conn: &Connection, count: usize) {
    for i in 0..count {
        conn.execute(
            "INSERT INTO exercise (name, muscles) VALUES (?1, 'chest')",
            [format!("exercise-{i:02}")],
        )
        .expect("failed to seed exercise");
    }
}

#[test]
fn tables_are_listed_without_internal_ones() {
    let (_conn, schema) = setup();
    let tables = list_tables(&schema);

    assert!(tables.contains(&"user".to_string()));
    assert!(tables.contains(&"calendar_workout".to_string()));
    assert!(!tables.iter().any(|t| t == MIGRATIONS_TABLE));
    assert!(!tables.iter().any(|t| t.starts_with("sqlite_")));
}

#[test]
fn table_data_is_paged_by_ten() {
    let (conn, schema) = setup();
    seed_exercises(&conn, 23);

    let first = get_table_data(&conn, &schema, "exercise", 0).expect("page 0");
    assert_eq!(first.headers, vec!["id", "name", "muscles"]);
    assert_eq!(first.body.len(), 10);
    assert_eq!(first.body[0][1], json!("exercise-00"));

    let last = get_table_data(&conn, &schema, "exercise", 2).expect("page 2");
    assert_eq!(last.body.len(), 3);

    let beyond = get_table_data(&conn, &schema, "exercise", 9).expect("page 9");
    assert!(beyond.body.is_empty());
    assert_eq!(beyond.headers, vec!["id", "name", "muscles"]);
}

#[test]
fn non_allow_listed_table_is_rejected_before_any_sql() {
    let (conn, schema) = setup();

    for table in [MIGRATIONS_TABLE, "sqlite_master", "user; DROP TABLE user", "nope"] {
        let err = get_table_data(&conn, &schema, table, 0);
        assert!(matches!(err, Err(AdminError::UnknownTable(_))), "{table}");
        let err = delete_table_data(&conn, &schema, table, 1);
        assert!(matches!(err, Err(AdminError::UnknownTable(_))), "{table}");
    }

    let users: i64 = conn
        .query_row("SELECT COUNT(*) FROM sqlite_master WHERE name = 'user'", [], |r| r.get(0))
        .expect("schema lookup");
    assert_eq!(users, 1);
}

#[test]
fn exercise_mutations_report_catalog_change() {
    let (conn, schema) = setup();

    let outcome = insert_table_data(
        &conn,
        &schema,
        "exercise",
        &object(json!({"name": "Squat", "muscles": "quads,glutes"})),
    )
    .expect("insert");
    assert_eq!(outcome, MutationOutcome::CatalogChanged);

    let outcome = update_table_data(
        &conn,
        &schema,
        "exercise",
        1,
        &object(json!({"muscles": "quads"})),
    )
    .expect("update");
    assert_eq!(outcome, MutationOutcome::CatalogChanged);

    let row = query_one(&conn, "SELECT muscles FROM exercise WHERE id = 1", [])
        .expect("query")
        .expect("row");
    assert_eq!(row.get_str("muscles"), Some("quads"));

    let outcome = delete_table_data(&conn, &schema, "exercise", 1).expect("delete");
    assert_eq!(outcome, MutationOutcome::CatalogChanged);
}

#[test]
fn other_tables_report_plain_application() {
    let (conn, schema) = setup();
    let outcome = insert_table_data(
        &conn,
        &schema,
        "user",
        &object(json!({"username": "admin_made", "email": "a@b.co", "password": "x"})),
    )
    .expect("insert");
    assert_eq!(outcome, MutationOutcome::Applied);
}

#[test]
fn constraint_violation_surfaces_as_store_error() {
    let (conn, schema) = setup();
    seed_exercises(&conn, 1);

    let err = insert_table_data(
        &conn,
        &schema,
        "exercise",
        &object(json!({"name": "exercise-00"})),
    );
    assert!(matches!(err, Err(AdminError::Store(_))));
    assert!(!err.expect_err("store error").is_invalid_request());
}

#[test]
fn hostile_values_are_stored_literally() {
    let (conn, schema) = setup();
    let hostile = "x'); DROP TABLE user; --";

    insert_table_data(&conn, &schema, "exercise", &object(json!({"name": hostile})))
        .expect("insert");

    let row = query_one(&conn, "SELECT name FROM exercise WHERE id = 1", [])
        .expect("query")
        .expect("row");
    assert_eq!(row.get_str("name"), Some(hostile));
    assert!(SchemaSnapshot::introspect(&conn).expect("introspect").allows("user"));
}

#[test]
fn unknown_column_is_an_invalid_request() {
    let (conn, schema) = setup();
    seed_exercises(&conn, 1);

    let err = update_table_data(
        &conn,
        &schema,
        "exercise",
        1,
        &object(json!({"muscles\" = 'x' --": "y"})),
    )
    .expect_err("unknown column must be rejected");
    assert!(matches!(err, AdminError::UnknownColumn { .. }));
    assert!(err.is_invalid_request());
}

#[test]
fn cache_sees_tables_created_after_startup() {
    let (conn, _) = setup();
    let cache = SchemaCache::new();
    cache.rebuild(&conn).expect("initial build");

    conn.execute_batch("CREATE TABLE bodyweight (id INTEGER PRIMARY KEY, kg REAL);")
        .expect("create table");
    let snapshot = cache.rebuild(&conn).expect("rebuild");

    insert_table_data(&conn, &snapshot, "bodyweight", &object(json!({"kg": "81.4"})))
        .expect("insert into new table");
    let page = get_table_data(&conn, &snapshot, "bodyweight", 0).expect("read");
    assert_eq!(page.body, vec![vec![json!(1), json!(81.4)]]);
}
