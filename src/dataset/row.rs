//! Dataset row schema for the pull request CSV files.

use serde::{Deserialize, Serialize};

use crate::github::PullRequestRecord;

/// One pull request's row in the tabular dataset.
///
/// Column names match the historical dataset layout so files produced by
/// earlier collection runs stay readable. The trailing columns are filled in
/// by later pipeline stages and stay empty until then.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PullRequestRow {
    /// Pull request number.
    #[serde(rename = "PR Number")]
    pub number: u64,
    /// Pull request title.
    #[serde(rename = "Title")]
    pub title: String,
    /// Author login.
    #[serde(rename = "Author")]
    pub author: String,
    /// Integration name from the `integration:` label, when present.
    #[serde(rename = "Integration")]
    pub integration: String,
    /// Creation timestamp (ISO-8601).
    #[serde(rename = "Created At")]
    pub created_at: String,
    /// Last-update timestamp (ISO-8601).
    #[serde(rename = "Updated At")]
    pub updated_at: String,
    /// `merged` or `closed`.
    #[serde(rename = "State")]
    pub state: String,
    /// Number of files changed.
    #[serde(rename = "Files Changed")]
    pub files_changed: u64,
    /// Total lines changed across all files; -1 when the files endpoint
    /// could not be read.
    #[serde(rename = "LOC Changed")]
    pub loc_changed: i64,
    /// Count of non-bot issue and review comments; -1 until the comments
    /// stage has processed the row, so a zero-comment pull request is not
    /// refetched on resume.
    #[serde(rename = "Total Comments")]
    pub total_comments: i64,
    /// Whole days between creation and close.
    #[serde(rename = "Decision Time")]
    pub decision_days: i64,
    /// Close timestamp (ISO-8601).
    #[serde(rename = "Closed Date")]
    pub closed_at: String,
    /// HTML URL of the pull request.
    #[serde(rename = "URL")]
    pub url: String,
    /// Checked type-of-change task-list items, comma separated.
    #[serde(rename = "Type of Change", default)]
    pub type_of_change: Option<String>,
    /// Rendered conversation transcript.
    #[serde(rename = "Formatted Comments", default)]
    pub formatted_comments: Option<String>,
    /// JSON array of challenge categories from classification.
    #[serde(rename = "Categorized Challenges", default)]
    pub categorized_challenges: Option<String>,
}

impl PullRequestRow {
    /// Builds a row from scraped metadata; later-stage columns start empty.
    #[must_use]
    pub fn from_record(record: &PullRequestRecord) -> Self {
        Self {
            number: record.number,
            title: record.title.clone().unwrap_or_default(),
            author: record.author.clone().unwrap_or_default(),
            integration: record.integration.clone().unwrap_or_default(),
            created_at: record.created_at.clone().unwrap_or_default(),
            updated_at: record.updated_at.clone().unwrap_or_default(),
            state: record.state_label().to_owned(),
            files_changed: record.changed_files.unwrap_or_default(),
            loc_changed: -1,
            total_comments: -1,
            decision_days: 0,
            closed_at: record.closed_at.clone().unwrap_or_default(),
            url: record.html_url.clone().unwrap_or_default(),
            type_of_change: None,
            formatted_comments: None,
            categorized_challenges: None,
        }
    }
}
