//! Credential pool and rate-limit-driven token rotation.
//!
//! The scraper accepts several personal access tokens and cycles through
//! them whenever GitHub reports an exhausted rate limit. Rotation state
//! lives in this pool object rather than process-wide globals, and each
//! pooled token gets its own authenticated gateway.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::error::ScrapeError;
use super::gateway::{CommentGateway, OctocrabGateway, PullRequestPage, RepositoryGateway};
use super::locator::{PersonalAccessToken, RepositoryLocator};
use super::models::Comment;
use crate::telemetry::{NoopTelemetrySink, TelemetryEvent, TelemetrySink};

/// An ordered pool of personal access tokens.
#[derive(Debug)]
pub struct TokenPool {
    tokens: Vec<PersonalAccessToken>,
}

impl TokenPool {
    /// Creates a pool from validated tokens.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::MissingToken`] when the pool would be empty.
    pub fn new(tokens: Vec<PersonalAccessToken>) -> Result<Self, ScrapeError> {
        if tokens.is_empty() {
            return Err(ScrapeError::MissingToken);
        }
        Ok(Self { tokens })
    }

    /// Creates a pool from a comma-separated token list, skipping blank
    /// entries.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::MissingToken`] when no non-blank entry remains.
    pub fn from_comma_separated(raw: &str) -> Result<Self, ScrapeError> {
        let tokens = raw
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(PersonalAccessToken::new)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(tokens)
    }

    /// Number of pooled tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the pool holds no tokens. Construction forbids this; the
    /// method exists for API completeness.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Borrows the pooled tokens in rotation order.
    #[must_use]
    pub fn tokens(&self) -> &[PersonalAccessToken] {
        &self.tokens
    }
}

/// Gateway wrapper that retries rate-limited calls once per pooled token.
///
/// The wrapper keeps one authenticated [`OctocrabGateway`] per token and a
/// cursor identifying the active one. A call that fails with
/// [`ScrapeError::RateLimitExceeded`] advances the cursor and retries; once
/// every token has been tried the error is surfaced unchanged. All other
/// errors pass through immediately.
pub struct RotatingGateway {
    gateways: Vec<OctocrabGateway>,
    cursor: AtomicUsize,
    telemetry: Arc<dyn TelemetrySink>,
}

impl RotatingGateway {
    /// Builds one authenticated gateway per pooled token.
    ///
    /// Rotation events are dropped until a sink is attached with
    /// [`Self::with_telemetry`].
    ///
    /// # Errors
    ///
    /// Returns any [`ScrapeError`] raised while constructing a client.
    pub fn for_pool(pool: &TokenPool, locator: &RepositoryLocator) -> Result<Self, ScrapeError> {
        let gateways = pool
            .tokens()
            .iter()
            .map(|token| OctocrabGateway::for_token(token, locator))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            gateways,
            cursor: AtomicUsize::new(0),
            telemetry: Arc::new(NoopTelemetrySink),
        })
    }

    /// Attaches a sink that receives a [`TelemetryEvent::TokenRotated`]
    /// whenever a rate limit forces a credential swap.
    #[must_use]
    pub fn with_telemetry(mut self, sink: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = sink;
        self
    }

    fn gateway_at(&self, slot: usize) -> Result<&OctocrabGateway, ScrapeError> {
        self.gateways
            .get(slot % self.gateways.len().max(1))
            .ok_or_else(|| ScrapeError::Configuration {
                message: "token pool produced no gateways".to_owned(),
            })
    }

    /// Runs `call` against the active gateway, rotating on rate limits.
    async fn with_rotation<T, F, Fut>(&self, operation: &str, call: F) -> Result<T, ScrapeError>
    where
        F: Fn(usize) -> Fut,
        Fut: Future<Output = Result<T, ScrapeError>>,
    {
        let mut attempts = 0;
        loop {
            let slot = self.cursor.load(Ordering::Relaxed);
            match call(slot).await {
                Err(ScrapeError::RateLimitExceeded {
                    rate_limit,
                    message,
                }) if attempts + 1 < self.gateways.len() => {
                    attempts += 1;
                    let info = match rate_limit {
                        Some(info) => Some(info),
                        None => match self.gateway_at(slot) {
                            Ok(gateway) => gateway.rate_limit_info().await,
                            Err(_) => None,
                        },
                    };
                    let reset_in = info.map_or(0, |details| details.seconds_until_reset());
                    let remaining = info.map_or(0, |details| details.remaining());
                    tracing::warn!(
                        operation,
                        slot,
                        remaining,
                        reset_in_seconds = reset_in,
                        "rate limit hit ({message}); rotating token"
                    );
                    let next = (slot + 1) % self.gateways.len().max(1);
                    self.cursor.store(next, Ordering::Relaxed);
                    self.telemetry
                        .record(TelemetryEvent::TokenRotated { slot: next });
                }
                result => return result,
            }
        }
    }
}

#[async_trait]
impl CommentGateway for RotatingGateway {
    async fn list_issue_comments(
        &self,
        locator: &RepositoryLocator,
        number: u64,
        author_login: &str,
    ) -> Result<Vec<Comment>, ScrapeError> {
        self.with_rotation("issue comments", |slot| async move {
            self.gateway_at(slot)?
                .list_issue_comments(locator, number, author_login)
                .await
        })
        .await
    }

    async fn list_review_comments(
        &self,
        locator: &RepositoryLocator,
        number: u64,
        author_login: &str,
    ) -> Result<Vec<Comment>, ScrapeError> {
        self.with_rotation("review comments", |slot| async move {
            self.gateway_at(slot)?
                .list_review_comments(locator, number, author_login)
                .await
        })
        .await
    }
}

#[async_trait]
impl RepositoryGateway for RotatingGateway {
    async fn list_closed_pull_requests(
        &self,
        locator: &RepositoryLocator,
        page: u32,
        per_page: u8,
    ) -> Result<PullRequestPage, ScrapeError> {
        self.with_rotation("list pull requests", |slot| async move {
            self.gateway_at(slot)?
                .list_closed_pull_requests(locator, page, per_page)
                .await
        })
        .await
    }

    async fn lines_changed(
        &self,
        locator: &RepositoryLocator,
        number: u64,
    ) -> Result<u64, ScrapeError> {
        self.with_rotation("pull request files", |slot| async move {
            self.gateway_at(slot)?.lines_changed(locator, number).await
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::{RotatingGateway, TokenPool};
    use crate::github::error::ScrapeError;
    use crate::github::gateway::CommentGateway;
    use crate::github::locator::RepositoryLocator;
    use crate::telemetry::{TelemetryEvent, TelemetrySink};

    #[derive(Debug, Default)]
    struct RecordingSink {
        events: Mutex<Vec<TelemetryEvent>>,
    }

    impl TelemetrySink for RecordingSink {
        fn record(&self, event: TelemetryEvent) {
            self.events
                .lock()
                .expect("events mutex should be available")
                .push(event);
        }
    }

    #[test]
    fn pool_parses_comma_separated_tokens() {
        let pool =
            TokenPool::from_comma_separated("ghp_one, ghp_two ,,ghp_three").expect("valid pool");
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn pool_rejects_blank_input() {
        let error = TokenPool::from_comma_separated(" , ").expect_err("blank pool rejected");
        assert_eq!(error, ScrapeError::MissingToken);
    }

    #[tokio::test]
    async fn rate_limited_token_rotates_to_next_credential() {
        let server = MockServer::start().await;
        let locator = RepositoryLocator::parse(&format!("{}/owner/repo", server.uri()))
            .expect("should create repository locator");
        let pool = TokenPool::from_comma_separated("token-one,token-two").expect("valid pool");
        let sink = Arc::new(RecordingSink::default());
        let gateway = RotatingGateway::for_pool(&pool, &locator)
            .expect("should build gateways")
            .with_telemetry(Arc::clone(&sink) as Arc<dyn TelemetrySink>);

        let comments_path = "/api/v3/repos/owner/repo/issues/9/comments";
        Mock::given(method("GET"))
            .and(path(comments_path))
            .and(header("authorization", "Bearer token-one"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "message": "API rate limit exceeded",
                "documentation_url": "https://docs.github.com/rest/rate-limit"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v3/rate_limit"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "resources": {
                    "core": { "limit": 5000, "used": 5000, "remaining": 0, "reset": 1 },
                    "search": { "limit": 30, "used": 0, "remaining": 30, "reset": 1 }
                },
                "rate": { "limit": 5000, "used": 5000, "remaining": 0, "reset": 1 }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(comments_path))
            .and(header("authorization", "Bearer token-two"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "id": 1,
                    "body": "hello",
                    "user": { "login": "alice", "type": "User" },
                    "created_at": "2023-01-01T00:00:00Z"
                }
            ])))
            .mount(&server)
            .await;

        let comments = gateway
            .list_issue_comments(&locator, 9, "alice")
            .await
            .expect("second token should succeed");

        assert_eq!(comments.len(), 1);
        let events = sink
            .events
            .lock()
            .expect("events mutex should be available");
        assert_eq!(
            events.as_slice(),
            [TelemetryEvent::TokenRotated { slot: 1 }]
        );
    }

    #[tokio::test]
    async fn exhausted_pool_surfaces_rate_limit_error() {
        let server = MockServer::start().await;
        let locator = RepositoryLocator::parse(&format!("{}/owner/repo", server.uri()))
            .expect("should create repository locator");
        let pool = TokenPool::from_comma_separated("only-token").expect("valid pool");
        let gateway = RotatingGateway::for_pool(&pool, &locator).expect("should build gateways");

        Mock::given(method("GET"))
            .and(path("/api/v3/repos/owner/repo/issues/9/comments"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "message": "API rate limit exceeded",
                "documentation_url": "https://docs.github.com/rest/rate-limit"
            })))
            .mount(&server)
            .await;

        let error = gateway
            .list_issue_comments(&locator, 9, "alice")
            .await
            .expect_err("single-token pool cannot recover");

        assert!(
            matches!(error, ScrapeError::RateLimitExceeded { .. }),
            "expected RateLimitExceeded, got {error:?}"
        );
    }
}
