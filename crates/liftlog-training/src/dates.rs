//! Calendar date normalization.
//!
//! Clients send dates as `YYYY-M` or `YYYY-M-D` with unpadded parts. The
//! store keeps zero-padded ISO dates so that text comparison orders them.

use crate::TrainingError;
use chrono::NaiveDate;

fn parts(raw: &str) -> Result<Vec<u32>, TrainingError> {
    raw.trim()
        .split('-')
        .map(|p| p.parse::<u32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| TrainingError::InvalidDate(raw.to_string()))
}

/// Normalizes a `YYYY-M-D` date to `YYYY-MM-DD`, rejecting impossible days.
///
/// # Errors
///
/// Returns `TrainingError::InvalidDate` unless the input names a real day.
pub fn normalize_date(raw: &str) -> Result<String, TrainingError> {
    let invalid = || TrainingError::InvalidDate(raw.to_string());
    match parts(raw)?.as_slice() {
        [year, month, day] => {
            let year = i32::try_from(*year).map_err(|_| invalid())?;
            NaiveDate::from_ymd_opt(year, *month, *day)
                .map(|d| d.format("%Y-%m-%d").to_string())
                .ok_or_else(invalid)
        }
        _ => Err(invalid()),
    }
}

/// Normalizes the month part of a `YYYY-M` or `YYYY-M-D` date to `YYYY-MM`.
///
/// # Errors
///
/// Returns `TrainingError::InvalidDate` for a month outside 1..=12.
pub fn normalize_month(raw: &str) -> Result<String, TrainingError> {
    match parts(raw)?.as_slice() {
        [year, month] | [year, month, _] if (1..=12).contains(month) => {
            Ok(format!("{year:04}-{month:02}"))
        }
        _ => Err(TrainingError::InvalidDate(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_single_digit_parts() {
        assert_eq!(normalize_date("2024-3-7").expect("valid"), "2024-03-07");
        assert_eq!(normalize_date("2024-11-30").expect("valid"), "2024-11-30");
        assert_eq!(normalize_month("2024-3").expect("valid"), "2024-03");
        assert_eq!(normalize_month("2024-03-15").expect("valid"), "2024-03");
    }

    #[test]
    fn rejects_impossible_dates() {
        assert!(normalize_date("2023-2-29").is_err());
        assert!(normalize_date("2024-13-1").is_err());
        assert!(normalize_date("2024-3").is_err());
        assert!(normalize_month("2024-0").is_err());
        assert!(normalize_month("march").is_err());
    }
}
