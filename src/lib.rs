//! Magpie library crate for collecting pull request review data.
//!
//! Magpie scrapes closed pull requests and their conversations from the
//! GitHub REST API, reconstructs review threads into chronological
//! transcripts, classifies the challenges they evidence through an
//! OpenAI-compatible API, and maintains the results as CSV datasets. The
//! work is split into resumable pipeline stages so multi-day collection
//! runs survive rate limits and interruptions.

pub mod assembly;
pub mod classify;
pub mod config;
pub mod dataset;
pub mod github;
pub mod pipeline;
pub mod telemetry;
pub mod transcript;

pub use assembly::{AssemblyError, CommentThread, ConversationUnit, assemble};
pub use config::{MagpieConfig, Stage};
pub use dataset::{Dataset, PullRequestRow};
pub use github::{
    Comment, CommentGateway, CommentKind, OctocrabGateway, PersonalAccessToken, PullRequestRecord,
    RepositoryGateway, RepositoryLocator, RotatingGateway, ScrapeError, TokenPool,
};
pub use transcript::render_transcript;
