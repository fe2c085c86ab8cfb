//! Per-day diet log stored on the calendar row.

use crate::workouts::{calendar_day, parse_stored, to_stored_text};
use crate::TrainingError;
use liftlog_db::{execute, query_one};
use rusqlite::{params, Connection};
use serde::Serialize;
use serde_json::Value;

/// Meals of one day. Missing meals default to empty lists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DietLog {
    pub breakfast: Value,
    pub lunch: Value,
    pub dinner: Value,
    pub snacks: Value,
}

impl DietLog {
    fn empty() -> Self {
        let none = || Value::Array(Vec::new());
        Self {
            breakfast: none(),
            lunch: none(),
            dinner: none(),
            snacks: none(),
        }
    }

    fn from_stored(stored: &Value) -> Self {
        let meal = |key: &str| {
            stored
                .get(key)
                .cloned()
                .unwrap_or_else(|| Value::Array(Vec::new()))
        };
        Self {
            breakfast: meal("breakfast"),
            lunch: meal("lunch"),
            dinner: meal("dinner"),
            snacks: meal("snacks"),
        }
    }
}

/// The diet logged on `date`, or empty meals if nothing was stored.
pub fn diet_for_day(conn: &Connection, user_id: i64, date: &str) -> Result<DietLog, TrainingError> {
    let row = query_one(
        conn,
        "SELECT diet FROM calendar WHERE user_id = ?1 AND date = ?2",
        params![user_id, date],
    )?;
    let stored = row
        .as_ref()
        .and_then(|r| r.get_str("diet"))
        .filter(|text| !text.trim().is_empty());

    Ok(match stored {
        Some(text) => DietLog::from_stored(&parse_stored(Some(text))),
        None => DietLog::empty(),
    })
}

/// Replaces the diet logged on `date`, creating the day if needed.
pub fn add_diet(
    conn: &Connection,
    user_id: i64,
    date: &str,
    diet: &Value,
) -> Result<(), TrainingError> {
    let calendar_id = calendar_day(conn, user_id, date)?;
    execute(
        conn,
        "UPDATE calendar SET diet = ?1 WHERE id = ?2",
        params![to_stored_text(diet), calendar_id],
    )?;
    Ok(())
}
