//! Gateways for scraping pull request data through Octocrab.
//!
//! Trait-based gateways keep the pipeline testable with mocks while the
//! Octocrab implementation handles real HTTP requests. Octocrab errors are
//! mapped into [`ScrapeError`] variants so callers never see transport
//! internals, and rate-limit responses are distinguished so the token pool
//! can rotate credentials.

use async_trait::async_trait;
use http::{StatusCode, Uri};
use octocrab::{Octocrab, Page};

use super::error::ScrapeError;
use super::locator::{PersonalAccessToken, RepositoryLocator};
use super::models::{
    ApiIssueComment, ApiPullRequest, ApiPullRequestFile, ApiReviewComment, Comment,
    PullRequestRecord,
};
use super::rate_limit::RateLimitInfo;

/// Builds an Octocrab client for the given token and API base URL.
///
/// # Errors
///
/// Returns `ScrapeError::InvalidUrl` when the base URI cannot be parsed or
/// `ScrapeError::Api` when Octocrab fails to construct a client.
pub(super) fn build_octocrab_client(
    token: &PersonalAccessToken,
    api_base: &str,
) -> Result<Octocrab, ScrapeError> {
    let base_uri: Uri = api_base
        .parse::<Uri>()
        .map_err(|error| ScrapeError::InvalidUrl(error.to_string()))?;

    Octocrab::builder()
        .personal_token(token.as_ref())
        .base_uri(base_uri)
        .map_err(|error| ScrapeError::Api {
            message: format!("build client failed: {error}"),
        })?
        .build()
        .map_err(|error| map_octocrab_error("build client", &error))
}

/// One page of pull request records from the listing endpoint.
#[derive(Debug, Clone)]
pub struct PullRequestPage {
    /// Records on this page, in the order delivered by the API.
    pub items: Vec<PullRequestRecord>,
    /// Whether the API advertises a further page.
    pub has_next: bool,
}

/// Gateway for repository-level pull request listing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RepositoryGateway: Send + Sync {
    /// Lists one page of closed pull requests sorted by creation date
    /// descending.
    async fn list_closed_pull_requests(
        &self,
        locator: &RepositoryLocator,
        page: u32,
        per_page: u8,
    ) -> Result<PullRequestPage, ScrapeError>;

    /// Sums the changed-line counts across a pull request's files.
    async fn lines_changed(
        &self,
        locator: &RepositoryLocator,
        number: u64,
    ) -> Result<u64, ScrapeError>;
}

/// Gateway for per-pull-request comment listings.
///
/// Both listings are delivered by the API in ascending creation order, which
/// the assembly step relies on as a merge precondition. Bot-authored entries
/// are filtered out during conversion.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommentGateway: Send + Sync {
    /// Lists all non-bot issue comments for a pull request.
    async fn list_issue_comments(
        &self,
        locator: &RepositoryLocator,
        number: u64,
        author_login: &str,
    ) -> Result<Vec<Comment>, ScrapeError>;

    /// Lists all non-bot review comments for a pull request.
    async fn list_review_comments(
        &self,
        locator: &RepositoryLocator,
        number: u64,
        author_login: &str,
    ) -> Result<Vec<Comment>, ScrapeError>;
}

/// Octocrab-backed gateway implementing both scraping traits.
pub struct OctocrabGateway {
    client: Octocrab,
}

impl OctocrabGateway {
    /// Creates a new gateway from an Octocrab client.
    #[must_use]
    pub const fn new(client: Octocrab) -> Self {
        Self { client }
    }

    /// Builds an Octocrab client for the given token and repository locator.
    ///
    /// # Errors
    ///
    /// Returns `ScrapeError::InvalidUrl` when the base URI cannot be parsed
    /// or `ScrapeError::Api` when Octocrab fails to construct a client.
    pub fn for_token(
        token: &PersonalAccessToken,
        locator: &RepositoryLocator,
    ) -> Result<Self, ScrapeError> {
        let octocrab = build_octocrab_client(token, locator.api_base().as_str())?;
        Ok(Self::new(octocrab))
    }

    /// Queries the core rate-limit state for this gateway's credential.
    ///
    /// Returns `None` when the endpoint cannot be reached or the payload does
    /// not fit in 32-bit counters.
    pub async fn rate_limit_info(&self) -> Option<RateLimitInfo> {
        let rate = self.client.ratelimit().get().await.ok()?.rate;
        let Ok(remaining) = u32::try_from(rate.remaining) else {
            return None;
        };
        Some(RateLimitInfo::new(remaining, rate.reset))
    }

    async fn all_pages<T>(&self, operation: &str, first: Page<T>) -> Result<Vec<T>, ScrapeError>
    where
        T: serde::de::DeserializeOwned + Send + 'static,
    {
        self.client
            .all_pages(first)
            .await
            .map_err(|error| map_octocrab_error(operation, &error))
    }
}

#[async_trait]
impl RepositoryGateway for OctocrabGateway {
    async fn list_closed_pull_requests(
        &self,
        locator: &RepositoryLocator,
        page: u32,
        per_page: u8,
    ) -> Result<PullRequestPage, ScrapeError> {
        let page_str = page.to_string();
        let per_page_str = per_page.to_string();
        let query_params = [
            ("state", "closed"),
            ("sort", "created"),
            ("direction", "desc"),
            ("page", page_str.as_str()),
            ("per_page", per_page_str.as_str()),
        ];

        let page_result: Page<ApiPullRequest> = self
            .client
            .get(locator.pulls_path(), Some(&query_params))
            .await
            .map_err(|error| map_octocrab_error("list pull requests", &error))?;

        let has_next = page_result.next.is_some();
        let items = page_result
            .items
            .into_iter()
            .map(PullRequestRecord::from)
            .collect();

        Ok(PullRequestPage { items, has_next })
    }

    async fn lines_changed(
        &self,
        locator: &RepositoryLocator,
        number: u64,
    ) -> Result<u64, ScrapeError> {
        let page = self
            .client
            .get::<Page<ApiPullRequestFile>, _, _>(locator.files_path(number), None::<&()>)
            .await
            .map_err(|error| map_octocrab_error("pull request files", &error))?;

        let files = self.all_pages("pull request files", page).await?;
        Ok(files.iter().map(|file| file.changes).sum())
    }
}

#[async_trait]
impl CommentGateway for OctocrabGateway {
    async fn list_issue_comments(
        &self,
        locator: &RepositoryLocator,
        number: u64,
        author_login: &str,
    ) -> Result<Vec<Comment>, ScrapeError> {
        let page = self
            .client
            .get::<Page<ApiIssueComment>, _, _>(locator.issue_comments_path(number), None::<&()>)
            .await
            .map_err(|error| map_octocrab_error("issue comments", &error))?;

        let comments = self.all_pages("issue comments", page).await?;
        Ok(comments
            .into_iter()
            .filter_map(|comment| Comment::from_issue(comment, author_login))
            .collect())
    }

    async fn list_review_comments(
        &self,
        locator: &RepositoryLocator,
        number: u64,
        author_login: &str,
    ) -> Result<Vec<Comment>, ScrapeError> {
        let page = self
            .client
            .get::<Page<ApiReviewComment>, _, _>(locator.review_comments_path(number), None::<&()>)
            .await
            .map_err(|error| map_octocrab_error("review comments", &error))?;

        let comments = self.all_pages("review comments", page).await?;
        Ok(comments
            .into_iter()
            .filter_map(|comment| Comment::from_review(comment, author_login))
            .collect())
    }
}

// --- Error mapping helpers ---

/// Checks if a GitHub error status indicates an authentication failure.
const fn is_auth_failure(status: StatusCode) -> bool {
    matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
}

/// Checks if an octocrab error represents a network/transport issue.
const fn is_network_error(error: &octocrab::Error) -> bool {
    matches!(
        error,
        octocrab::Error::Http { .. }
            | octocrab::Error::Hyper { .. }
            | octocrab::Error::Service { .. }
    )
}

/// Checks whether the GitHub error represents a rate limit error based on the
/// HTTP status and message / documentation URL content.
fn is_rate_limit_error(source: &octocrab::GitHubError) -> bool {
    let is_rate_limit_status = matches!(
        source.status_code,
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS
    );

    let message_indicates_rate_limit = source.message.to_lowercase().contains("rate limit")
        || source
            .documentation_url
            .as_deref()
            .is_some_and(|url| url.contains("rate-limit"));

    is_rate_limit_status && message_indicates_rate_limit
}

pub(super) fn map_octocrab_error(operation: &str, error: &octocrab::Error) -> ScrapeError {
    if let octocrab::Error::GitHub { source, .. } = error {
        if is_rate_limit_error(source) {
            return ScrapeError::RateLimitExceeded {
                rate_limit: None,
                message: format!("{operation} failed: {message}", message = source.message),
            };
        }

        return if is_auth_failure(source.status_code) {
            ScrapeError::Authentication {
                message: format!(
                    "{operation} failed: GitHub returned {status} {message}",
                    status = source.status_code,
                    message = source.message
                ),
            }
        } else {
            ScrapeError::Api {
                message: format!(
                    "{operation} failed with status {status}: {message}",
                    status = source.status_code,
                    message = source.message
                ),
            }
        };
    }

    if is_network_error(error) {
        return ScrapeError::Network {
            message: format!("{operation} failed: {error}"),
        };
    }

    ScrapeError::Api {
        message: format!("{operation} failed: {error}"),
    }
}
