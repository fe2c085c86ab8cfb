//! Workout, template, diet and analytics handlers. All require a session.

use crate::gate::AuthGate;
use crate::respond::{ApiError, Responder};
use crate::validate::Fields;
use crate::with_conn;
use axum::{body::Bytes, response::Response};
use chrono::Local;
use liftlog_training::{
    add_diet, aggregate_muscle_usage, count_exercises, delete_template, diet_for_day,
    finish_workout, finished_workout_dates, finished_workouts_in_window, list_templates,
    normalize_date, normalize_month, save_template, save_workout, workout_dates_in_month,
    workouts_on_day, NewWorkout,
};
use serde_json::{json, Value};
use std::sync::Arc;

/// Handler for `GET /api/exercises`.
pub async fn exercises_handler(responder: Responder, gate: AuthGate) -> Response {
    responder.finish(handle_exercises(&gate).await)
}

async fn handle_exercises(gate: &AuthGate) -> Result<Value, ApiError> {
    gate.user_id().await?;
    let catalog = Arc::clone(&gate.state().catalog);
    let catalog = with_conn(gate.state(), move |conn| Ok(catalog.get_or_load(conn)?)).await?;
    Ok(json!({ "json": catalog.exercises() }))
}

/// Handler for `POST /api/user/muscles`.
///
/// Scores each muscle group over the caller's finished workouts from the
/// last `timespan` days.
pub async fn muscles_handler(responder: Responder, gate: AuthGate, body: Bytes) -> Response {
    responder.finish(handle_muscles(&gate, Fields::parse(&body)).await)
}

async fn handle_muscles(gate: &AuthGate, fields: Fields) -> Result<Value, ApiError> {
    fields.require(&["timespan"])?;
    // Digits only by now, so the parse can only fail on overflow.
    let days = fields.text("timespan")?.parse::<u64>().unwrap_or(u64::MAX);
    let user_id = gate.user_id().await?;

    let catalog = Arc::clone(&gate.state().catalog);
    let today = Local::now().date_naive();
    let muscles = with_conn(gate.state(), move |conn| {
        let workouts = finished_workouts_in_window(conn, user_id, days, today)?;
        let catalog = catalog.get_or_load(conn)?;
        Ok(aggregate_muscle_usage(&count_exercises(&workouts), &catalog))
    })
    .await?;
    Ok(json!({ "muscles": muscles }))
}

/// Handler for `POST /api/workouts/save`.
pub async fn save_workout_handler(responder: Responder, gate: AuthGate, body: Bytes) -> Response {
    responder.finish(handle_save_workout(&gate, Fields::parse(&body)).await)
}

async fn handle_save_workout(gate: &AuthGate, fields: Fields) -> Result<Value, ApiError> {
    fields.require(&["name", "json", "time", "date"])?;
    let workout = NewWorkout {
        name: fields.text("name")?,
        json: fields.value("json")?.clone(),
        time: fields.value("time")?.clone(),
        date: normalize_date(&fields.text("date")?)?,
    };
    let user_id = gate.user_id().await?;

    let id = with_conn(gate.state(), move |conn| Ok(save_workout(conn, user_id, &workout)?)).await?;
    Ok(json!({ "id": id }))
}

/// Handler for `POST /api/workouts/finish`.
pub async fn finish_workout_handler(responder: Responder, gate: AuthGate, body: Bytes) -> Response {
    responder.finish(handle_finish_workout(&gate, Fields::parse(&body)).await)
}

async fn handle_finish_workout(gate: &AuthGate, fields: Fields) -> Result<Value, ApiError> {
    fields.require(&["id"])?;
    let id = fields.int("id")?;
    let user_id = gate.user_id().await?;

    let matched = with_conn(gate.state(), move |conn| Ok(finish_workout(conn, user_id, id)?)).await?;
    if !matched {
        tracing::debug!(user_id, workout_id = id, "finish matched no workout of the caller");
    }
    Ok(Value::Null)
}

/// Handler for `GET /api/workouts/finished`.
pub async fn finished_dates_handler(responder: Responder, gate: AuthGate) -> Response {
    responder.finish(handle_finished_dates(&gate).await)
}

async fn handle_finished_dates(gate: &AuthGate) -> Result<Value, ApiError> {
    let user_id = gate.user_id().await?;
    let dates = with_conn(gate.state(), move |conn| Ok(finished_workout_dates(conn, user_id)?)).await?;
    let dates: Vec<Value> = dates.into_iter().map(|date| json!({ "date": date })).collect();
    Ok(json!({ "dates": dates }))
}

/// Handler for `POST /api/workouts/dates`.
pub async fn month_dates_handler(responder: Responder, gate: AuthGate, body: Bytes) -> Response {
    responder.finish(handle_month_dates(&gate, Fields::parse(&body)).await)
}

async fn handle_month_dates(gate: &AuthGate, fields: Fields) -> Result<Value, ApiError> {
    fields.require(&["date"])?;
    let month = normalize_month(&fields.text("date")?)?;
    let user_id = gate.user_id().await?;

    let dates = with_conn(gate.state(), move |conn| {
        Ok(workout_dates_in_month(conn, user_id, &month)?)
    })
    .await?;
    Ok(json!({ "dates": dates }))
}

/// Handler for `POST /api/workouts/data`.
pub async fn day_workouts_handler(responder: Responder, gate: AuthGate, body: Bytes) -> Response {
    responder.finish(handle_day_workouts(&gate, Fields::parse(&body)).await)
}

async fn handle_day_workouts(gate: &AuthGate, fields: Fields) -> Result<Value, ApiError> {
    fields.require(&["date"])?;
    let date = normalize_date(&fields.text("date")?)?;
    let user_id = gate.user_id().await?;

    let data = with_conn(gate.state(), move |conn| Ok(workouts_on_day(conn, user_id, &date)?)).await?;
    Ok(json!({ "data": data }))
}

/// Handler for `GET /api/templates`.
pub async fn templates_handler(responder: Responder, gate: AuthGate) -> Response {
    responder.finish(handle_templates(&gate).await)
}

async fn handle_templates(gate: &AuthGate) -> Result<Value, ApiError> {
    let user_id = gate.user_id().await?;
    let catalog = Arc::clone(&gate.state().catalog);
    let templates = with_conn(gate.state(), move |conn| {
        let catalog = catalog.get_or_load(conn)?;
        Ok(list_templates(conn, user_id, &catalog)?)
    })
    .await?;
    Ok(json!({ "templates": templates }))
}

/// Handler for `POST /api/templates/save`.
pub async fn save_template_handler(responder: Responder, gate: AuthGate, body: Bytes) -> Response {
    responder.finish(handle_save_template(&gate, Fields::parse(&body)).await)
}

async fn handle_save_template(gate: &AuthGate, fields: Fields) -> Result<Value, ApiError> {
    fields.require(&["name", "json"])?;
    let name = fields.text("name")?;
    let json = fields.value("json")?.clone();
    let user_id = gate.user_id().await?;

    let id = with_conn(gate.state(), move |conn| {
        Ok(save_template(conn, user_id, &name, &json)?)
    })
    .await?;
    Ok(json!({ "id": id }))
}

/// Handler for `POST /api/templates/delete`.
pub async fn delete_template_handler(responder: Responder, gate: AuthGate, body: Bytes) -> Response {
    responder.finish(handle_delete_template(&gate, Fields::parse(&body)).await)
}

async fn handle_delete_template(gate: &AuthGate, fields: Fields) -> Result<Value, ApiError> {
    fields.require(&["id"])?;
    let id = fields.int("id")?;
    let user_id = gate.user_id().await?;

    with_conn(gate.state(), move |conn| Ok(delete_template(conn, user_id, id)?)).await?;
    Ok(Value::Null)
}

/// Handler for `POST /api/diet`.
pub async fn diet_handler(responder: Responder, gate: AuthGate, body: Bytes) -> Response {
    responder.finish(handle_diet(&gate, Fields::parse(&body)).await)
}

async fn handle_diet(gate: &AuthGate, fields: Fields) -> Result<Value, ApiError> {
    fields.require(&["date"])?;
    let date = normalize_date(&fields.text("date")?)?;
    let user_id = gate.user_id().await?;

    let diet = with_conn(gate.state(), move |conn| Ok(diet_for_day(conn, user_id, &date)?)).await?;
    Ok(json!({ "json": diet }))
}

/// Handler for `POST /api/diet/add`. Always writes to today's entry.
pub async fn add_diet_handler(responder: Responder, gate: AuthGate, body: Bytes) -> Response {
    responder.finish(handle_add_diet(&gate, Fields::parse(&body)).await)
}

async fn handle_add_diet(gate: &AuthGate, fields: Fields) -> Result<Value, ApiError> {
    fields.require(&["json"])?;
    let diet = fields.value("json")?.clone();
    let user_id = gate.user_id().await?;

    let today = Local::now().date_naive().format("%Y-%m-%d").to_string();
    with_conn(gate.state(), move |conn| Ok(add_diet(conn, user_id, &today, &diet)?)).await?;
    Ok(Value::Null)
}
