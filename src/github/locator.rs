//! Repository identity, endpoint paths, and token wrappers.

use url::Url;

use super::error::ScrapeError;

/// Personal access token wrapper enforcing presence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonalAccessToken(String);

impl PersonalAccessToken {
    /// Validates that the token is non-empty and trims whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::MissingToken`] when the supplied string is blank.
    pub fn new(token: impl AsRef<str>) -> Result<Self, ScrapeError> {
        let trimmed = token.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ScrapeError::MissingToken);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the token value.
    #[must_use]
    pub const fn value(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for PersonalAccessToken {
    fn as_ref(&self) -> &str {
        self.value()
    }
}

/// Derives the GitHub API base URL from a host string.
fn derive_api_base_from_host(
    scheme: &str,
    host: &str,
    port: Option<u16>,
) -> Result<Url, ScrapeError> {
    if host.eq_ignore_ascii_case("github.com") {
        Url::parse("https://api.github.com")
            .map_err(|error| ScrapeError::InvalidUrl(error.to_string()))
    } else {
        let authority = if host.contains(':') {
            format!("[{host}]")
        } else {
            host.to_owned()
        };
        let mut api_url = Url::parse(&format!("{scheme}://{authority}"))
            .map_err(|error| ScrapeError::InvalidUrl(error.to_string()))?;

        api_url
            .set_port(port)
            .map_err(|()| ScrapeError::InvalidUrl("invalid port".to_owned()))?;
        api_url.set_path("api/v3");
        Ok(api_url)
    }
}

/// Identifies the repository being scraped and its derived API base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryLocator {
    api_base: Url,
    owner: String,
    repository: String,
}

impl RepositoryLocator {
    /// Creates a locator for a repository hosted on github.com.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::MissingRepository`] when either segment is
    /// blank.
    pub fn from_owner_repo(owner: &str, repository: &str) -> Result<Self, ScrapeError> {
        if owner.trim().is_empty() || repository.trim().is_empty() {
            return Err(ScrapeError::MissingRepository);
        }

        let api_base = Url::parse("https://api.github.com")
            .map_err(|error| ScrapeError::InvalidUrl(error.to_string()))?;
        Ok(Self {
            api_base,
            owner: owner.trim().to_owned(),
            repository: repository.trim().to_owned(),
        })
    }

    /// Parses a repository URL of the form `https://<host>/<owner>/<repo>`.
    ///
    /// For hosts other than github.com the API base is derived as
    /// `<scheme>://<host>/api/v3`, matching GitHub Enterprise conventions.
    /// Test doubles use this path to point the gateway at a mock server.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::InvalidUrl`] when parsing fails and
    /// [`ScrapeError::MissingRepository`] when owner or repo segments are
    /// absent.
    pub fn parse(input: &str) -> Result<Self, ScrapeError> {
        let parsed =
            Url::parse(input).map_err(|error| ScrapeError::InvalidUrl(error.to_string()))?;

        let mut segments = parsed
            .path_segments()
            .ok_or(ScrapeError::MissingRepository)?;
        let owner = segments
            .next()
            .filter(|segment| !segment.is_empty())
            .ok_or(ScrapeError::MissingRepository)?
            .to_owned();
        let repository = segments
            .next()
            .filter(|segment| !segment.is_empty())
            .ok_or(ScrapeError::MissingRepository)?
            .to_owned();

        let host = parsed
            .host_str()
            .ok_or_else(|| ScrapeError::InvalidUrl("URL must include a host".to_owned()))?;
        let api_base = derive_api_base_from_host(parsed.scheme(), host, parsed.port())?;

        Ok(Self {
            api_base,
            owner,
            repository,
        })
    }

    /// Returns the API base URL for this repository's host.
    #[must_use]
    pub const fn api_base(&self) -> &Url {
        &self.api_base
    }

    /// Returns the repository owner.
    #[must_use]
    pub const fn owner(&self) -> &str {
        self.owner.as_str()
    }

    /// Returns the repository name.
    #[must_use]
    pub const fn repository(&self) -> &str {
        self.repository.as_str()
    }

    /// Path for listing pull requests.
    #[must_use]
    pub fn pulls_path(&self) -> String {
        format!("/repos/{}/{}/pulls", self.owner, self.repository)
    }

    /// Path for a pull request's issue comments (the conversation tab).
    #[must_use]
    pub fn issue_comments_path(&self, number: u64) -> String {
        format!(
            "/repos/{}/{}/issues/{number}/comments",
            self.owner, self.repository
        )
    }

    /// Path for a pull request's review comments (diff-anchored).
    #[must_use]
    pub fn review_comments_path(&self, number: u64) -> String {
        format!(
            "/repos/{}/{}/pulls/{number}/comments",
            self.owner, self.repository
        )
    }

    /// Path for a pull request's changed files.
    #[must_use]
    pub fn files_path(&self, number: u64) -> String {
        format!(
            "/repos/{}/{}/pulls/{number}/files",
            self.owner, self.repository
        )
    }
}
