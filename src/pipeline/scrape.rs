//! Scrape stage: collect closed pull request metadata into the dataset.

use chrono::{DateTime, NaiveDate};

use crate::dataset::{Dataset, PullRequestRow, last_recorded_number};
use crate::github::{PullRequestRecord, RepositoryGateway, RepositoryLocator, ScrapeError};
use crate::telemetry::{TelemetryEvent, TelemetrySink};

const LISTING_PAGE_SIZE: u8 = 100;

/// Bounds applied to a scrape run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScrapeOptions {
    /// Inclusive start of the creation-date window.
    pub since: Option<NaiveDate>,
    /// Inclusive end of the creation-date window.
    pub until: Option<NaiveDate>,
    /// Maximum number of rows to append in this run.
    pub limit: Option<usize>,
}

/// Walks closed pull requests newest-first and appends one row per request.
///
/// Requests created after the window are skipped; the walk stops at the
/// first request created before the window, since the listing is ordered by
/// creation date descending. Requests at or above the last number already
/// on disk are skipped so an interrupted run resumes where it left off.
/// Returns the number of rows appended.
///
/// # Errors
///
/// Returns [`ScrapeError`] when a listing call or a dataset write fails.
/// Buffered rows are flushed before the error is surfaced.
pub async fn run_scrape(
    gateway: &dyn RepositoryGateway,
    locator: &RepositoryLocator,
    dataset: &mut Dataset,
    options: ScrapeOptions,
    telemetry: &dyn TelemetrySink,
) -> Result<usize, ScrapeError> {
    let resume_from = last_recorded_number(dataset.path())?;
    if let Some(number) = resume_from {
        tracing::info!(number, "resuming below previously recorded pull request");
    }

    let mut appended = 0usize;
    let mut page = 1u32;
    loop {
        let listing = match gateway
            .list_closed_pull_requests(locator, page, LISTING_PAGE_SIZE)
            .await
        {
            Ok(listing) => listing,
            Err(error) => {
                dataset.flush()?;
                return Err(error);
            }
        };
        if listing.items.is_empty() {
            break;
        }

        for record in listing.items {
            let created = creation_date(&record);
            if let (Some(until), Some(created)) = (options.until, created)
                && created > until
            {
                continue;
            }
            if let (Some(since), Some(created)) = (options.since, created)
                && created < since
            {
                // Listing is newest-first, so everything beyond is older.
                dataset.flush()?;
                return Ok(appended);
            }
            if resume_from.is_some_and(|last| record.number >= last) {
                continue;
            }

            let row = build_row(gateway, locator, record).await;
            let number = row.number;
            dataset.append(row)?;
            appended += 1;
            if dataset.pending() == 0 {
                telemetry.record(TelemetryEvent::ScrapeCheckpoint {
                    rows_written: appended,
                    last_number: number,
                });
            }

            if options.limit.is_some_and(|limit| appended >= limit) {
                dataset.flush()?;
                return Ok(appended);
            }
        }

        if !listing.has_next {
            break;
        }
        page += 1;
    }

    dataset.flush()?;
    Ok(appended)
}

async fn build_row(
    gateway: &dyn RepositoryGateway,
    locator: &RepositoryLocator,
    record: PullRequestRecord,
) -> PullRequestRow {
    let mut row = PullRequestRow::from_record(&record);
    row.decision_days = decision_days(&record).unwrap_or_default();
    row.type_of_change = record.body.as_deref().and_then(checked_task_items);

    match gateway.lines_changed(locator, record.number).await {
        Ok(total) => row.loc_changed = i64::try_from(total).unwrap_or(i64::MAX),
        Err(error) => {
            tracing::warn!(
                number = record.number,
                error = %error,
                "failed to sum changed lines; recording -1"
            );
        }
    }
    row
}

fn creation_date(record: &PullRequestRecord) -> Option<NaiveDate> {
    let raw = record.created_at.as_deref()?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|stamp| stamp.date_naive())
}

fn decision_days(record: &PullRequestRecord) -> Option<i64> {
    let created = DateTime::parse_from_rfc3339(record.created_at.as_deref()?).ok()?;
    let closed = DateTime::parse_from_rfc3339(record.closed_at.as_deref()?).ok()?;
    Some((closed - created).num_days())
}

/// Extracts the checked task-list items from a pull request body.
///
/// Bodies follow the repository's PR template, where the type of change is
/// a markdown task list; checked entries look like `- [x] New feature ...`.
/// Returns the checked labels joined with `, `, or `None` when the body has
/// no checked item.
#[must_use]
pub fn checked_task_items(body: &str) -> Option<String> {
    let checked: Vec<&str> = body
        .lines()
        .map(str::trim)
        .filter_map(|line| {
            line.strip_prefix("- [x]")
                .or_else(|| line.strip_prefix("- [X]"))
                .or_else(|| line.strip_prefix("* [x]"))
                .or_else(|| line.strip_prefix("* [X]"))
        })
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .collect();

    if checked.is_empty() {
        None
    } else {
        Some(checked.join(", "))
    }
}
