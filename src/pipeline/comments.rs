//! Comments stage: fetch conversations and render transcripts into rows.

use camino::Utf8Path;

use crate::assembly::assemble;
use crate::dataset::{read_rows, write_rows};
use crate::github::{Comment, CommentGateway, RepositoryLocator, ScrapeError};
use crate::telemetry::{TelemetryEvent, TelemetrySink};
use crate::transcript::render_transcript;

const CHECKPOINT_INTERVAL: usize = 100;

/// Fills the comment count and transcript columns for every dataset row.
///
/// Rows already processed (a non-negative comment count, recorded even
/// when the conversation was empty) are left untouched so an interrupted
/// run resumes cheaply. A failed comment fetch is logged and
/// treated as an empty conversation rather than aborting the run; a
/// malformed reply thread is likewise logged and leaves the row unfilled.
/// The whole file is rewritten at each checkpoint and at the end. Returns
/// the number of rows filled in this run.
///
/// # Errors
///
/// Returns [`ScrapeError::Dataset`] when the dataset cannot be read or
/// written.
pub async fn run_comments(
    gateway: &dyn CommentGateway,
    locator: &RepositoryLocator,
    path: &Utf8Path,
    telemetry: &dyn TelemetrySink,
) -> Result<usize, ScrapeError> {
    let mut rows = read_rows(path)?;
    let mut filled = 0usize;
    let mut since_checkpoint = 0usize;

    for index in 0..rows.len() {
        let (number, author) = {
            let Some(current) = rows.get(index) else {
                break;
            };
            if current.formatted_comments.is_some() || current.total_comments >= 0 {
                continue;
            }
            (current.number, current.author.clone())
        };

        let issue_comments = fetch_or_empty(
            gateway.list_issue_comments(locator, number, &author).await,
            number,
            "issue",
        );
        let review_comments = fetch_or_empty(
            gateway.list_review_comments(locator, number, &author).await,
            number,
            "review",
        );
        let total = issue_comments.len() + review_comments.len();

        let transcript = match assemble(issue_comments, review_comments) {
            Ok(units) => render_transcript(&units),
            Err(error) => {
                tracing::warn!(number, error = %error, "skipping malformed conversation");
                continue;
            }
        };

        if let Some(entry) = rows.get_mut(index) {
            entry.total_comments = i64::try_from(total).unwrap_or(i64::MAX);
            entry.formatted_comments = Some(transcript);
        }
        filled += 1;
        since_checkpoint += 1;

        if since_checkpoint >= CHECKPOINT_INTERVAL {
            write_rows(path, &rows)?;
            telemetry.record(TelemetryEvent::CommentsCheckpoint {
                rows_completed: filled,
            });
            since_checkpoint = 0;
        }
    }

    write_rows(path, &rows)?;
    Ok(filled)
}

fn fetch_or_empty(
    result: Result<Vec<Comment>, ScrapeError>,
    number: u64,
    endpoint: &str,
) -> Vec<Comment> {
    match result {
        Ok(comments) => comments,
        Err(error) => {
            tracing::warn!(
                number,
                endpoint,
                error = %error,
                "comment fetch failed; treating conversation side as empty"
            );
            Vec::new()
        }
    }
}
