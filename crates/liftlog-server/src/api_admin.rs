//! Admin console handlers.
//!
//! Field validation runs before the admin gate, so malformed requests are
//! rejected the same way for every caller. Passing the gate refreshes the
//! schema snapshot the request is validated against.

use crate::gate::AuthGate;
use crate::respond::{ApiError, Responder};
use crate::validate::Fields;
use crate::{with_conn, AppState};
use axum::{body::Bytes, response::Response};
use liftlog_admin::{
    delete_table_data, get_table_data, insert_table_data, list_tables, update_table_data,
};
use liftlog_types::MutationOutcome;
use rusqlite::Connection;
use serde_json::{json, Value};

/// Handler for `GET /api/admin/tables`.
pub async fn tables_handler(responder: Responder, gate: AuthGate) -> Response {
    responder.finish(
        gate.require_admin()
            .await
            .map(|schema| json!({ "tables": list_tables(&schema) })),
    )
}

/// Handler for `POST /api/admin/data`.
pub async fn data_handler(responder: Responder, gate: AuthGate, body: Bytes) -> Response {
    responder.finish(handle_data(&gate, Fields::parse(&body)).await)
}

async fn handle_data(gate: &AuthGate, fields: Fields) -> Result<Value, ApiError> {
    fields.require(&["table", "page"])?;
    let table = fields.text("table")?;
    let page = fields.int("page")?;
    let schema = gate.require_admin().await?;

    let data = with_conn(gate.state(), move |conn| {
        Ok(get_table_data(conn, &schema, &table, page)?)
    })
    .await?;
    Ok(json!({ "json": data }))
}

/// Handler for `POST /api/admin/update`.
pub async fn update_handler(responder: Responder, gate: AuthGate, body: Bytes) -> Response {
    responder.finish(handle_update(&gate, Fields::parse(&body)).await)
}

async fn handle_update(gate: &AuthGate, fields: Fields) -> Result<Value, ApiError> {
    fields.require(&["table", "id", "values"])?;
    let table = fields.text("table")?;
    let id = fields.int("id")?;
    let values = fields.object("values")?.clone();
    let schema = gate.require_admin().await?;

    let state = gate.state().clone();
    with_conn(gate.state(), move |conn| {
        let outcome = update_table_data(conn, &schema, &table, id, &values)?;
        refresh_catalog_if_changed(&state, conn, outcome);
        Ok(Value::Null)
    })
    .await
}

/// Handler for `POST /api/admin/delete`.
pub async fn delete_handler(responder: Responder, gate: AuthGate, body: Bytes) -> Response {
    responder.finish(handle_delete(&gate, Fields::parse(&body)).await)
}

async fn handle_delete(gate: &AuthGate, fields: Fields) -> Result<Value, ApiError> {
    fields.require(&["table", "id"])?;
    let table = fields.text("table")?;
    let id = fields.int("id")?;
    let schema = gate.require_admin().await?;

    let state = gate.state().clone();
    with_conn(gate.state(), move |conn| {
        let outcome = delete_table_data(conn, &schema, &table, id)?;
        refresh_catalog_if_changed(&state, conn, outcome);
        Ok(Value::Null)
    })
    .await
}

/// Handler for `POST /api/admin/insert`.
pub async fn insert_handler(responder: Responder, gate: AuthGate, body: Bytes) -> Response {
    responder.finish(handle_insert(&gate, Fields::parse(&body)).await)
}

async fn handle_insert(gate: &AuthGate, fields: Fields) -> Result<Value, ApiError> {
    fields.require(&["table", "values"])?;
    let table = fields.text("table")?;
    let values = fields.object("values")?.clone();
    let schema = gate.require_admin().await?;

    let state = gate.state().clone();
    with_conn(gate.state(), move |conn| {
        let outcome = insert_table_data(conn, &schema, &table, &values)?;
        refresh_catalog_if_changed(&state, conn, outcome);
        Ok(Value::Null)
    })
    .await
}

fn refresh_catalog_if_changed(state: &AppState, conn: &Connection, outcome: MutationOutcome) {
    if outcome != MutationOutcome::CatalogChanged {
        return;
    }
    if let Err(e) = state.catalog.rebuild(conn) {
        tracing::warn!(error = %e, "exercise catalog reload failed, dropping cached copy");
        state.catalog.invalidate();
    }
}
