//! GitHub REST scraping layer.
//!
//! Wraps Octocrab to list closed pull requests, fetch per-PR comment streams
//! and changed-file totals, and rotate personal access tokens when the API
//! reports an exhausted rate limit. Errors are mapped into user-friendly
//! variants so callers never see Octocrab internals.

pub mod error;
pub mod gateway;
pub mod locator;
pub mod models;
pub mod rate_limit;
pub mod token_pool;

pub use error::ScrapeError;
pub use gateway::{CommentGateway, OctocrabGateway, PullRequestPage, RepositoryGateway};
pub use locator::{PersonalAccessToken, RepositoryLocator};
pub use models::{Comment, CommentKind, PullRequestRecord};
pub use rate_limit::RateLimitInfo;
pub use token_pool::{RotatingGateway, TokenPool};

#[cfg(test)]
pub use gateway::{MockCommentGateway, MockRepositoryGateway};
