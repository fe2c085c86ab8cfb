//! The exercise catalog and its process-wide cache.

use crate::TrainingError;
use liftlog_db::query_rows;
use rusqlite::Connection;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// A catalog exercise and the muscle groups it loads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Exercise {
    pub id: i64,
    pub name: String,
    pub muscles: Vec<String>,
}

/// All exercises, indexed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExerciseCatalog {
    exercises: Vec<Exercise>,
    by_id: HashMap<i64, usize>,
}

impl ExerciseCatalog {
    /// Reads the whole `exercise` table.
    pub fn load(conn: &Connection) -> Result<Self, TrainingError> {
        let rows = query_rows(conn, "SELECT id, name, muscles FROM exercise ORDER BY id", [])?;
        let exercises = rows
            .iter()
            .filter_map(|row| {
                Some(Exercise {
                    id: row.get_i64("id")?,
                    name: row.get_str("name").unwrap_or_default().to_string(),
                    muscles: split_muscles(row.get_str("muscles").unwrap_or_default()),
                })
            })
            .collect();
        Ok(Self::from_exercises(exercises))
    }

    pub fn from_exercises(exercises: Vec<Exercise>) -> Self {
        let by_id = exercises
            .iter()
            .enumerate()
            .map(|(idx, e)| (e.id, idx))
            .collect();
        Self { exercises, by_id }
    }

    pub fn exercises(&self) -> &[Exercise] {
        &self.exercises
    }

    pub fn get(&self, id: i64) -> Option<&Exercise> {
        self.by_id.get(&id).map(|&idx| &self.exercises[idx])
    }

    /// Muscle groups of exercise `id`; empty for unknown exercises.
    pub fn muscles_for(&self, id: i64) -> &[String] {
        self.get(id).map(|e| e.muscles.as_slice()).unwrap_or_default()
    }

    pub fn name_for(&self, id: i64) -> Option<&str> {
        self.get(id).map(|e| e.name.as_str())
    }
}

fn split_muscles(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect()
}

/// Lazily loaded, wholesale-replaced [`ExerciseCatalog`].
///
/// Concurrent rebuilds are not coordinated; the last one to finish wins.
#[derive(Debug, Default)]
pub struct CatalogCache {
    current: RwLock<Option<Arc<ExerciseCatalog>>>,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached catalog, loading it on first use.
    pub fn get_or_load(&self, conn: &Connection) -> Result<Arc<ExerciseCatalog>, TrainingError> {
        let cached = match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        match cached {
            Some(catalog) => Ok(catalog),
            None => self.rebuild(conn),
        }
    }

    /// Reloads the catalog from the database and replaces the cached copy.
    pub fn rebuild(&self, conn: &Connection) -> Result<Arc<ExerciseCatalog>, TrainingError> {
        let catalog = Arc::new(ExerciseCatalog::load(conn)?);
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::error!("exercise catalog lock poisoned, replacing stale catalog");
                poisoned.into_inner()
            }
        };
        *guard = Some(Arc::clone(&catalog));
        tracing::debug!(exercises = catalog.exercises().len(), "exercise catalog loaded");
        Ok(catalog)
    }

    /// Drops the cached catalog; the next read reloads it.
    pub fn invalidate(&self) {
        match self.current.write() {
            Ok(mut guard) => *guard = None,
            Err(poisoned) => *poisoned.into_inner() = None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use liftlog_db::run_migrations;

    #[test]
    fn muscles_are_split_and_trimmed() {
        assert_eq!(split_muscles("chest, triceps,,shoulders "), ["chest", "triceps", "shoulders"]);
        assert!(split_muscles("").is_empty());
    }

    #[test]
    fn cache_serves_stale_copy_until_rebuilt() {
        let conn = Connection::open_in_memory().expect("failed to open in-memory db");
        run_migrations(&conn).expect("failed to run migrations");
        conn.execute(
            "INSERT INTO exercise (name, muscles) VALUES ('Bench press', 'chest,triceps')",
            [],
        )
        .expect("seed");

        let cache = CatalogCache::new();
        let first = cache.get_or_load(&conn).expect("load");
        assert_eq!(first.muscles_for(1), ["chest", "triceps"]);
        assert_eq!(first.name_for(1), Some("Bench press"));
        assert!(first.muscles_for(99).is_empty());

        conn.execute("INSERT INTO exercise (name, muscles) VALUES ('Row', 'back')", [])
            .expect("seed");
        assert!(cache.get_or_load(&conn).expect("cached").get(2).is_none());

        cache.invalidate();
        assert_eq!(cache.get_or_load(&conn).expect("reload").name_for(2), Some("Row"));
    }
}
