//! Data models for pull request metadata and comment payloads.
//!
//! The `Api*` structs mirror the REST payloads; the domain types carry only
//! what the pipeline consumes. Bot-authored comments are dropped during
//! conversion, and `is_from_author` is computed against the pull request
//! author's login by exact, case-sensitive equality.

use serde::Deserialize;

/// Which listing endpoint a comment came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentKind {
    /// General comment on the pull request's conversation tab; never
    /// threaded.
    Issue,
    /// Comment anchored to a diff location; may reply to another review
    /// comment.
    Review,
}

impl CommentKind {
    /// Label used in rendered transcripts.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Issue => "issue",
            Self::Review => "review",
        }
    }
}

/// One atomic remark on a pull request.
///
/// The timestamp is kept as the ISO-8601 string delivered by the API:
/// lexicographic order equals chronological order for that format, and the
/// assembly code relies on the equivalence throughout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// Unique comment identifier.
    pub id: u64,
    /// Source endpoint for this comment.
    pub kind: CommentKind,
    /// Creation time as an ISO-8601 string.
    pub timestamp: String,
    /// Free-text body.
    pub body: String,
    /// Whether the commenting login equals the pull request author's login.
    pub is_from_author: bool,
    /// Parent comment id when this review comment is a direct reply.
    pub in_reply_to_id: Option<u64>,
    /// Code context a review comment is attached to.
    pub diff_hunk: Option<String>,
}

impl Comment {
    /// Converts an issue-comment payload, dropping bot authors.
    #[must_use]
    pub fn from_issue(api: ApiIssueComment, author_login: &str) -> Option<Self> {
        let user = api.user?;
        if user.is_bot() {
            return None;
        }
        Some(Self {
            id: api.id,
            kind: CommentKind::Issue,
            timestamp: api.created_at.unwrap_or_default(),
            body: api.body.unwrap_or_default(),
            is_from_author: user.login.as_deref() == Some(author_login),
            in_reply_to_id: None,
            diff_hunk: None,
        })
    }

    /// Converts a review-comment payload, dropping bot authors.
    #[must_use]
    pub fn from_review(api: ApiReviewComment, author_login: &str) -> Option<Self> {
        let user = api.user?;
        if user.is_bot() {
            return None;
        }
        Some(Self {
            id: api.id,
            kind: CommentKind::Review,
            timestamp: api.created_at.unwrap_or_default(),
            body: api.body.unwrap_or_default(),
            is_from_author: user.login.as_deref() == Some(author_login),
            in_reply_to_id: api.in_reply_to_id,
            diff_hunk: api.diff_hunk,
        })
    }
}

/// Pull request metadata captured by the scrape stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRecord {
    /// Pull request number.
    pub number: u64,
    /// Title of the pull request.
    pub title: Option<String>,
    /// Author login if present.
    pub author: Option<String>,
    /// Integration label value, when an `integration:` label is attached.
    pub integration: Option<String>,
    /// Creation timestamp (ISO-8601 string).
    pub created_at: Option<String>,
    /// Last-update timestamp (ISO-8601 string).
    pub updated_at: Option<String>,
    /// Close timestamp (ISO-8601 string), if the PR is closed.
    pub closed_at: Option<String>,
    /// Merge timestamp; presence distinguishes merged from closed-unmerged.
    pub merged_at: Option<String>,
    /// Number of files changed, when the listing payload includes it.
    pub changed_files: Option<u64>,
    /// HTML URL for display and dataset output.
    pub html_url: Option<String>,
    /// Markdown body; the type-of-change task list is parsed from it.
    pub body: Option<String>,
}

impl PullRequestRecord {
    /// Returns `"merged"` or `"closed"` following the original dataset's
    /// state column.
    #[must_use]
    pub const fn state_label(&self) -> &'static str {
        if self.merged_at.is_some() {
            "merged"
        } else {
            "closed"
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiPullRequest {
    pub(super) number: u64,
    pub(super) title: Option<String>,
    pub(super) user: Option<ApiUser>,
    #[serde(default)]
    pub(super) labels: Vec<ApiLabel>,
    pub(super) created_at: Option<String>,
    pub(super) updated_at: Option<String>,
    pub(super) closed_at: Option<String>,
    pub(super) merged_at: Option<String>,
    pub(super) changed_files: Option<u64>,
    pub(super) html_url: Option<String>,
    pub(super) body: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiLabel {
    pub(super) name: Option<String>,
}

/// User payload attached to comments and pull requests.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiUser {
    /// Login handle.
    pub login: Option<String>,
    /// Account type; `"Bot"` marks automated accounts.
    #[serde(rename = "type")]
    pub account_type: Option<String>,
}

impl ApiUser {
    /// Whether this account is an automated bot.
    #[must_use]
    pub fn is_bot(&self) -> bool {
        self.account_type.as_deref() == Some("Bot")
    }
}

/// Issue-comment payload from the issues comments endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiIssueComment {
    /// Comment identifier.
    pub id: u64,
    /// Comment body.
    pub body: Option<String>,
    /// Commenting user.
    pub user: Option<ApiUser>,
    /// Creation timestamp.
    pub created_at: Option<String>,
}

/// Review-comment payload from the pulls comments endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiReviewComment {
    /// Comment identifier.
    pub id: u64,
    /// Comment body.
    pub body: Option<String>,
    /// Commenting user.
    pub user: Option<ApiUser>,
    /// Creation timestamp.
    pub created_at: Option<String>,
    /// Parent comment id for direct replies.
    pub in_reply_to_id: Option<u64>,
    /// Diff context this comment is anchored to.
    pub diff_hunk: Option<String>,
}

/// Changed-file payload from the pull request files endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiPullRequestFile {
    /// Added plus deleted lines for this file.
    #[serde(default)]
    pub changes: u64,
}

/// Extracts the integration name from an `integration: <name>` label.
fn integration_from_labels(labels: &[ApiLabel]) -> Option<String> {
    labels
        .iter()
        .filter_map(|label| label.name.as_deref())
        .find(|name| name.starts_with("integration:"))
        .map(|name| name.rsplit(": ").next().unwrap_or(name).to_owned())
}

impl From<ApiPullRequest> for PullRequestRecord {
    fn from(value: ApiPullRequest) -> Self {
        let integration = integration_from_labels(&value.labels);
        Self {
            number: value.number,
            title: value.title,
            author: value.user.and_then(|user| user.login),
            integration,
            created_at: value.created_at,
            updated_at: value.updated_at,
            closed_at: value.closed_at,
            merged_at: value.merged_at,
            changed_files: value.changed_files,
            html_url: value.html_url,
            body: value.body,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{ApiIssueComment, ApiPullRequest, ApiReviewComment, Comment, PullRequestRecord};

    #[test]
    fn issue_comment_conversion_flags_author_and_drops_bots() {
        let human: ApiIssueComment = serde_json::from_value(json!({
            "id": 1,
            "body": "looks good",
            "user": { "login": "alice", "type": "User" },
            "created_at": "2023-01-01T00:00:00Z"
        }))
        .expect("payload should deserialise");
        let bot: ApiIssueComment = serde_json::from_value(json!({
            "id": 2,
            "body": "coverage report",
            "user": { "login": "codecov[bot]", "type": "Bot" },
            "created_at": "2023-01-01T00:00:01Z"
        }))
        .expect("payload should deserialise");

        let converted = Comment::from_issue(human, "alice").expect("human comment kept");
        assert!(converted.is_from_author);
        assert_eq!(converted.timestamp, "2023-01-01T00:00:00Z");
        assert!(Comment::from_issue(bot, "alice").is_none());
    }

    #[test]
    fn author_match_is_case_sensitive() {
        let api: ApiReviewComment = serde_json::from_value(json!({
            "id": 3,
            "body": "nit",
            "user": { "login": "Alice", "type": "User" },
            "created_at": "2023-01-01T00:00:00Z",
            "in_reply_to_id": null,
            "diff_hunk": "@@ -1 +1 @@"
        }))
        .expect("payload should deserialise");

        let converted = Comment::from_review(api, "alice").expect("comment kept");
        assert!(!converted.is_from_author);
        assert_eq!(converted.diff_hunk.as_deref(), Some("@@ -1 +1 @@"));
    }

    #[test]
    fn pull_request_record_extracts_integration_label_and_state() {
        let api: ApiPullRequest = serde_json::from_value(json!({
            "number": 101,
            "title": "Add frobnicator integration",
            "user": { "login": "alice" },
            "labels": [
                { "name": "cla-signed" },
                { "name": "integration: frobnicator" }
            ],
            "created_at": "2023-01-01T00:00:00Z",
            "updated_at": "2023-01-02T00:00:00Z",
            "closed_at": "2023-01-03T00:00:00Z",
            "merged_at": "2023-01-03T00:00:00Z",
            "html_url": "https://github.com/owner/repo/pull/101",
            "body": "- [x] New integration (thank you!)"
        }))
        .expect("payload should deserialise");

        let record = PullRequestRecord::from(api);
        assert_eq!(record.integration.as_deref(), Some("frobnicator"));
        assert_eq!(record.state_label(), "merged");
    }
}
