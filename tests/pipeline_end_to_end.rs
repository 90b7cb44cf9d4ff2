//! End-to-end pipeline run against a mocked GitHub API.

use camino::Utf8PathBuf;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use magpie::classify::ChallengeClassifier;
use magpie::dataset::read_rows;
use magpie::pipeline::{ScrapeOptions, run_categorize, run_comments, run_filter, run_scrape};
use magpie::telemetry::NoopTelemetrySink;
use magpie::{Dataset, PersonalAccessToken, RepositoryLocator, ScrapeError};

#[derive(Debug)]
struct FixedClassifier;

impl ChallengeClassifier for FixedClassifier {
    fn classify(&self, _transcript: &str) -> Result<Vec<String>, ScrapeError> {
        Ok(vec!["Review Process Issues".to_owned()])
    }
}

async fn mount_repository(server: &MockServer) {
    let listing = ResponseTemplate::new(200).set_body_json(json!([
        {
            "number": 42,
            "title": "Add tide sensor",
            "user": { "login": "alice" },
            "labels": [{ "name": "integration: tide" }],
            "created_at": "2023-03-01T00:00:00Z",
            "updated_at": "2023-03-09T00:00:00Z",
            "closed_at": "2023-03-11T00:00:00Z",
            "merged_at": "2023-03-11T00:00:00Z",
            "html_url": "https://github.com/owner/repo/pull/42",
            "body": "## Type of change\n- [ ] Bugfix\n- [x] New feature (which adds functionality to an existing integration)"
        }
    ]));
    Mock::given(method("GET"))
        .and(path("/api/v3/repos/owner/repo/pulls"))
        .respond_with(listing)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v3/repos/owner/repo/pulls/42/files"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "changes": 80 }, { "changes": 40 }])),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v3/repos/owner/repo/issues/42/comments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": 100,
                "body": "Looks good overall.",
                "user": { "login": "bob", "type": "User" },
                "created_at": "2023-03-02T00:00:00Z"
            },
            {
                "id": 101,
                "body": "automated check passed",
                "user": { "login": "ci[bot]", "type": "Bot" },
                "created_at": "2023-03-02T00:01:00Z"
            }
        ])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v3/repos/owner/repo/pulls/42/comments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": 200,
                "body": "Prefer a tuple here.",
                "user": { "login": "bob", "type": "User" },
                "created_at": "2023-03-03T00:00:00Z",
                "in_reply_to_id": null,
                "diff_hunk": "@@ -1 +1 @@"
            },
            {
                "id": 201,
                "body": "Done, thanks.",
                "user": { "login": "alice", "type": "User" },
                "created_at": "2023-03-04T00:00:00Z",
                "in_reply_to_id": 200,
                "diff_hunk": "@@ -1 +1 @@"
            }
        ])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn scrape_comments_categorize_and_filter_produce_a_complete_dataset() {
    let server = MockServer::start().await;
    mount_repository(&server).await;

    let locator = RepositoryLocator::parse(&format!("{}/owner/repo", server.uri()))
        .expect("locator should parse");
    let token = PersonalAccessToken::new("test-token").expect("token should be valid");
    let gateway =
        magpie::OctocrabGateway::for_token(&token, &locator).expect("gateway should build");

    let dir = TempDir::new().expect("temp dir");
    let dataset_path = Utf8PathBuf::from_path_buf(dir.path().join("prs.csv"))
        .expect("temp path should be UTF-8");
    let filtered_path = Utf8PathBuf::from_path_buf(dir.path().join("filtered.csv"))
        .expect("temp path should be UTF-8");

    // Scrape.
    let mut dataset = Dataset::new(dataset_path.clone());
    let appended = run_scrape(
        &gateway,
        &locator,
        &mut dataset,
        ScrapeOptions::default(),
        &NoopTelemetrySink,
    )
    .await
    .expect("scrape should succeed");
    assert_eq!(appended, 1);

    let scraped = read_rows(&dataset_path).expect("rows readable");
    let row = scraped.first().expect("one row");
    assert_eq!(row.number, 42);
    assert_eq!(row.integration, "tide");
    assert_eq!(row.state, "merged");
    assert_eq!(row.loc_changed, 120);
    assert_eq!(row.decision_days, 10);
    assert!(
        row.type_of_change
            .as_deref()
            .is_some_and(|value| value.contains("New feature"))
    );

    // Comments.
    let filled = run_comments(&gateway, &locator, &dataset_path, &NoopTelemetrySink)
        .await
        .expect("comments stage should succeed");
    assert_eq!(filled, 1);

    let with_comments = read_rows(&dataset_path).expect("rows readable");
    let commented = with_comments.first().expect("one row");
    assert_eq!(commented.total_comments, 3, "bot comment is excluded");
    let transcript = commented
        .formatted_comments
        .as_deref()
        .expect("transcript present");
    assert!(transcript.starts_with("(issue comment from reviewer)"));
    assert!(transcript.contains("---BEGIN THREAD---"));
    assert!(transcript.contains("(from author) [2023-03-04T00:00:00Z] Done, thanks."));

    // Categorize.
    let classified = run_categorize(&FixedClassifier, &dataset_path, None, &NoopTelemetrySink)
        .expect("categorize stage should succeed");
    assert_eq!(classified, 1);

    // Filter.
    let written =
        run_filter(&dataset_path, &filtered_path, 7).expect("filter stage should succeed");
    assert_eq!(written, 1);

    let filtered = read_rows(&filtered_path).expect("rows readable");
    let kept = filtered.first().expect("one row kept");
    assert_eq!(kept.number, 42);
    assert_eq!(
        kept.categorized_challenges.as_deref(),
        Some("[\"Review Process Issues\"]")
    );
}
