//! Workout logging, templates, diet tracking and muscle-load analytics.
//!
//! Workouts and diet entries hang off one `calendar` row per user per day.
//! The exercise catalog is read far more often than it changes, so it is
//! held in a process-wide [`CatalogCache`] that the admin console rebuilds
//! whenever it mutates the `exercise` table.

mod catalog;
mod dates;
mod diet;
mod error;
mod muscles;
mod workouts;

pub use catalog::{CatalogCache, Exercise, ExerciseCatalog};
pub use dates::{normalize_date, normalize_month};
pub use diet::{add_diet, diet_for_day, DietLog};
pub use error::TrainingError;
pub use muscles::{
    aggregate_muscle_usage, count_exercises, finished_workouts_in_window, window_start,
};
pub use workouts::{
    delete_template, finish_workout, finished_workout_dates, list_templates, save_template,
    save_workout, workout_dates_in_month, workouts_on_day, DayWorkout, NewWorkout, Template,
};
