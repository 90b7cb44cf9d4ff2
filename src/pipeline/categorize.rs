//! Categorize stage: classify challenges from rendered transcripts.

use camino::Utf8Path;

use crate::classify::{ChallengeClassifier, classify_or_empty};
use crate::dataset::{read_rows, write_rows};
use crate::github::ScrapeError;
use crate::telemetry::{TelemetryEvent, TelemetrySink};

const CHECKPOINT_INTERVAL: usize = 100;

/// Fills the categorized-challenges column for rows carrying a transcript.
///
/// Each transcript is classified independently; a provider failure records
/// an empty category list rather than aborting the run. Categories are
/// stored as a JSON array string so the column survives the CSV round
/// trip unambiguously. Rows already categorised are skipped. Returns the
/// number of rows classified in this run.
///
/// The classifier blocks on HTTP, so this stage runs outside the async
/// runtime.
///
/// # Errors
///
/// Returns [`ScrapeError::Dataset`] when the dataset cannot be read or
/// written, or [`ScrapeError::Api`] when the category list cannot be
/// encoded.
pub fn run_categorize(
    classifier: &dyn ChallengeClassifier,
    path: &Utf8Path,
    limit: Option<usize>,
    telemetry: &dyn TelemetrySink,
) -> Result<usize, ScrapeError> {
    let mut rows = read_rows(path)?;
    let mut classified = 0usize;
    let mut since_checkpoint = 0usize;

    for index in 0..rows.len() {
        if limit.is_some_and(|cap| classified >= cap) {
            break;
        }
        let transcript = {
            let Some(row) = rows.get(index) else {
                break;
            };
            if row.categorized_challenges.is_some() {
                continue;
            }
            row.formatted_comments.clone().unwrap_or_default()
        };

        let categories = classify_or_empty(classifier, &transcript);
        let encoded = serde_json::to_string(&categories).map_err(|error| ScrapeError::Api {
            message: format!("failed to encode categories: {error}"),
        })?;
        if let Some(row) = rows.get_mut(index) {
            row.categorized_challenges = Some(encoded);
        }
        classified += 1;
        since_checkpoint += 1;

        if since_checkpoint >= CHECKPOINT_INTERVAL {
            write_rows(path, &rows)?;
            telemetry.record(TelemetryEvent::ClassificationCheckpoint {
                rows_completed: classified,
            });
            since_checkpoint = 0;
        }
    }

    write_rows(path, &rows)?;
    Ok(classified)
}
