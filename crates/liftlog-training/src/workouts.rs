//! Logged workouts and reusable templates.
//!
//! Both live in the `workout` table, told apart by `is_template`. A logged
//! workout is linked to a calendar day through `calendar_workout`.

use crate::{ExerciseCatalog, TrainingError};
use liftlog_db::{execute, query_one, query_rows, Record};
use rusqlite::{params, Connection};
use serde::Serialize;
use serde_json::Value;

/// A workout as submitted by the client.
#[derive(Debug, Clone, PartialEq)]
pub struct NewWorkout {
    pub name: String,
    /// Exercise entries, each carrying an `exercise_id`.
    pub json: Value,
    /// Client timing data; stored verbatim.
    pub time: Value,
    /// Normalized `YYYY-MM-DD` day the workout belongs to.
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayWorkout {
    pub id: i64,
    pub name: String,
    pub json: Value,
    pub time: Value,
    #[serde(rename = "isFinished")]
    pub is_finished: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Template {
    pub id: i64,
    pub name: String,
    pub json: Value,
}

/// Stores a workout and links it to its calendar day, creating the day if
/// needed. Returns the new workout id.
///
/// The three inserts are not wrapped in a transaction; a failure part way
/// leaves the earlier rows in place.
pub fn save_workout(
    conn: &Connection,
    user_id: i64,
    workout: &NewWorkout,
) -> Result<i64, TrainingError> {
    execute(
        conn,
        "INSERT INTO workout (user_id, name, json, time, is_template) VALUES (?1, ?2, ?3, ?4, 0)",
        params![
            user_id,
            workout.name,
            to_stored_text(&workout.json),
            to_stored_text(&workout.time)
        ],
    )?;
    let workout_id = conn.last_insert_rowid();

    let calendar_id = calendar_day(conn, user_id, &workout.date)?;
    execute(
        conn,
        "INSERT INTO calendar_workout (calendar_id, workout_id) VALUES (?1, ?2)",
        params![calendar_id, workout_id],
    )?;

    tracing::debug!(user_id, workout_id, date = %workout.date, "workout saved");
    Ok(workout_id)
}

/// Finds or creates the calendar row for `(user_id, date)`.
pub(crate) fn calendar_day(
    conn: &Connection,
    user_id: i64,
    date: &str,
) -> Result<i64, TrainingError> {
    execute(
        conn,
        "INSERT OR IGNORE INTO calendar (user_id, date) VALUES (?1, ?2)",
        params![user_id, date],
    )?;
    query_one(
        conn,
        "SELECT id FROM calendar WHERE user_id = ?1 AND date = ?2",
        params![user_id, date],
    )?
    .and_then(|row| row.get_i64("id"))
    .ok_or_else(|| TrainingError::InvalidDate(date.to_string()))
}

/// Marks one of the caller's workouts finished. Returns whether a row of
/// theirs matched.
pub fn finish_workout(conn: &Connection, user_id: i64, id: i64) -> Result<bool, TrainingError> {
    let changed = execute(
        conn,
        "UPDATE workout SET is_finished = 1 WHERE id = ?1 AND user_id = ?2",
        params![id, user_id],
    )?;
    Ok(changed > 0)
}

/// Days holding at least one finished, non-template workout.
pub fn finished_workout_dates(conn: &Connection, user_id: i64) -> Result<Vec<String>, TrainingError> {
    let rows = query_rows(
        conn,
        "SELECT DISTINCT calendar.date FROM workout
         INNER JOIN calendar_workout ON calendar_workout.workout_id = workout.id
         INNER JOIN calendar ON calendar_workout.calendar_id = calendar.id
         WHERE workout.user_id = ?1 AND workout.is_template = 0 AND workout.is_finished = 1
         ORDER BY calendar.date",
        [user_id],
    )?;
    Ok(dates_of(rows))
}

/// Days of `month` (`YYYY-MM`) with at least one logged workout.
pub fn workout_dates_in_month(
    conn: &Connection,
    user_id: i64,
    month: &str,
) -> Result<Vec<String>, TrainingError> {
    let rows = query_rows(
        conn,
        "SELECT DISTINCT calendar.date FROM calendar_workout
         INNER JOIN calendar ON calendar_workout.calendar_id = calendar.id
         WHERE substr(calendar.date, 1, 7) = ?1 AND calendar.user_id = ?2
         ORDER BY calendar.date",
        params![month, user_id],
    )?;
    Ok(dates_of(rows))
}

/// Non-template workouts logged on `date`.
pub fn workouts_on_day(
    conn: &Connection,
    user_id: i64,
    date: &str,
) -> Result<Vec<DayWorkout>, TrainingError> {
    let rows = query_rows(
        conn,
        "SELECT workout.id, workout.name, workout.json, workout.time, workout.is_finished
         FROM calendar_workout
         INNER JOIN workout ON calendar_workout.workout_id = workout.id
         INNER JOIN calendar ON calendar_workout.calendar_id = calendar.id
         WHERE calendar.date = ?1 AND workout.user_id = ?2 AND workout.is_template = 0
         ORDER BY workout.id",
        params![date, user_id],
    )?;

    Ok(rows
        .iter()
        .filter_map(|row| {
            Some(DayWorkout {
                id: row.get_i64("id")?,
                name: row.get_str("name").unwrap_or_default().to_string(),
                json: parse_stored(row.get_str("json")),
                time: parse_stored(row.get_str("time")),
                is_finished: row.get("is_finished").is_some_and(liftlog_types::coerce_flag),
            })
        })
        .collect())
}

/// The caller's templates, with each exercise entry annotated with the
/// catalog `name` of its `exercise_id` (null when unknown).
pub fn list_templates(
    conn: &Connection,
    user_id: i64,
    catalog: &ExerciseCatalog,
) -> Result<Vec<Template>, TrainingError> {
    let rows = query_rows(
        conn,
        "SELECT id, name, json FROM workout WHERE is_template = 1 AND user_id = ?1 ORDER BY id",
        [user_id],
    )?;

    Ok(rows
        .iter()
        .filter_map(|row| {
            let mut json = parse_stored(row.get_str("json"));
            if let Some(entries) = json.as_array_mut() {
                for entry in entries.iter_mut().filter_map(Value::as_object_mut) {
                    let name = entry
                        .get("exercise_id")
                        .and_then(exercise_id)
                        .and_then(|id| catalog.name_for(id))
                        .map_or(Value::Null, Value::from);
                    entry.insert("name".to_string(), name);
                }
            }
            Some(Template {
                id: row.get_i64("id")?,
                name: row.get_str("name").unwrap_or_default().to_string(),
                json,
            })
        })
        .collect())
}

/// Stores a template and returns its id.
pub fn save_template(
    conn: &Connection,
    user_id: i64,
    name: &str,
    json: &Value,
) -> Result<i64, TrainingError> {
    execute(
        conn,
        "INSERT INTO workout (user_id, name, time, is_template, is_finished, json)
         VALUES (?1, ?2, '{}', 1, 0, ?3)",
        params![user_id, name, to_stored_text(json)],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Deletes one of the caller's templates. Logged workouts are never
/// touched. Returns whether a row matched.
pub fn delete_template(conn: &Connection, user_id: i64, id: i64) -> Result<bool, TrainingError> {
    let changed = execute(
        conn,
        "DELETE FROM workout WHERE id = ?1 AND user_id = ?2 AND is_template = 1",
        params![id, user_id],
    )?;
    Ok(changed > 0)
}

fn dates_of(rows: Vec<Record>) -> Vec<String> {
    rows.iter()
        .filter_map(|row| row.get_str("date").map(str::to_string))
        .collect()
}

fn exercise_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Text columns hold JSON; strings submitted by the client are assumed to
/// be JSON already.
pub(crate) fn to_stored_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub(crate) fn parse_stored(raw: Option<&str>) -> Value {
    match raw {
        Some(text) => serde_json::from_str(text).unwrap_or_else(|_| Value::from(text)),
        None => Value::Null,
    }
}
