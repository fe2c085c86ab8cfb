//! Muscle-load scoring over a trailing window of finished workouts.

use crate::{ExerciseCatalog, TrainingError};
use chrono::{Duration, NaiveDate};
use liftlog_db::query_rows;
use rusqlite::{params, Connection};
use serde_json::Value;
use std::collections::BTreeMap;

/// First day of a `days`-long window ending on `today`, or `None` when the
/// window reaches past the earliest representable date.
pub fn window_start(today: NaiveDate, days: u64) -> Option<NaiveDate> {
    let span = i64::try_from(days).ok().and_then(Duration::try_days)?;
    today.checked_sub_signed(span)
}

/// Exercise lists (the `json` column) of the user's finished, non-template
/// workouts dated within `days` days before `today`, inclusive.
///
/// Unparsable workout bodies are skipped with a warning.
pub fn finished_workouts_in_window(
    conn: &Connection,
    user_id: i64,
    days: u64,
    today: NaiveDate,
) -> Result<Vec<Value>, TrainingError> {
    // Unbounded windows compare against "", which sorts before every date.
    let since = window_start(today, days)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();
    let rows = query_rows(
        conn,
        "SELECT workout.id, workout.json FROM calendar_workout
         INNER JOIN calendar ON calendar_workout.calendar_id = calendar.id
         INNER JOIN workout ON calendar_workout.workout_id = workout.id
         WHERE calendar.user_id = ?1 AND calendar.date >= ?2
           AND workout.is_template = 0 AND workout.is_finished = 1",
        params![user_id, since],
    )?;

    Ok(rows
        .iter()
        .filter_map(|row| {
            let raw = row.get_str("json").unwrap_or_default();
            match serde_json::from_str::<Value>(raw) {
                Ok(body) => Some(body),
                Err(e) => {
                    tracing::warn!(workout = ?row.get_i64("id"), error = %e, "skipping unparsable workout");
                    None
                }
            }
        })
        .collect())
}

/// Counts how often each exercise id occurs across `workouts`.
///
/// Each workout body is a list of entries carrying an `exercise_id`, given
/// either as a number or as numeric text.
pub fn count_exercises(workouts: &[Value]) -> BTreeMap<i64, u64> {
    let mut counts = BTreeMap::new();
    let entries = workouts
        .iter()
        .filter_map(Value::as_array)
        .flatten()
        .filter_map(|entry| entry.get("exercise_id"));
    for id in entries {
        let id = match id {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        if let Some(id) = id {
            *counts.entry(id).or_insert(0) += 1;
        }
    }
    counts
}

/// Scores each muscle group 1 (light) to 3 (heavy).
///
/// A muscle's score is `round(load / total * 3 + 1)` clamped to `1..=3`,
/// where `load` sums the occurrence counts of every exercise hitting that
/// muscle and `total` sums all occurrence counts. No occurrences yields an
/// empty map.
pub fn aggregate_muscle_usage(
    counts: &BTreeMap<i64, u64>,
    catalog: &ExerciseCatalog,
) -> BTreeMap<String, u8> {
    let total: u64 = counts.values().sum();
    if total == 0 {
        return BTreeMap::new();
    }

    let mut load: BTreeMap<String, u64> = BTreeMap::new();
    for (&exercise_id, &count) in counts {
        for muscle in catalog.muscles_for(exercise_id) {
            *load.entry(muscle.clone()).or_insert(0) += count;
        }
    }

    load.into_iter()
        .map(|(muscle, used)| {
            let score = (used as f64 / total as f64 * 3.0 + 1.0).round().clamp(1.0, 3.0);
            (muscle, score as u8)
        })
        .collect()
}
