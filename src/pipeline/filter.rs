//! Filter stage: derive the analysis subset of the dataset.

use std::collections::HashSet;

use camino::Utf8Path;

use crate::dataset::{read_rows, write_rows};
use crate::github::ScrapeError;

const NEW_FEATURE_MARKER: &str = "New feature";
const NEW_INTEGRATION_MARKER: &str = "New integration";

/// Writes the filtered dataset used for analysis.
///
/// Keeps rows whose type of change marks a new feature or new integration
/// and whose decision time is at least `min_decision_days`, de-duplicated
/// by pull request number with the first occurrence winning. Returns the
/// number of rows written.
///
/// # Errors
///
/// Returns [`ScrapeError::Dataset`] when either file cannot be read or
/// written.
pub fn run_filter(
    source: &Utf8Path,
    destination: &Utf8Path,
    min_decision_days: i64,
) -> Result<usize, ScrapeError> {
    let rows = read_rows(source)?;
    let mut seen: HashSet<u64> = HashSet::new();

    let kept: Vec<_> = rows
        .into_iter()
        .filter(|row| {
            row.type_of_change.as_deref().is_some_and(|value| {
                value.contains(NEW_FEATURE_MARKER) || value.contains(NEW_INTEGRATION_MARKER)
            })
        })
        .filter(|row| row.decision_days >= min_decision_days)
        .filter(|row| seen.insert(row.number))
        .collect();

    write_rows(destination, &kept)?;
    Ok(kept.len())
}
