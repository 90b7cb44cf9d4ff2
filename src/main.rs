//! Magpie CLI entrypoint for the collection pipeline.

use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use magpie::classify::OpenAiChallengeClassifier;
use magpie::pipeline::{ScrapeOptions, run_categorize, run_comments, run_filter, run_scrape};
use magpie::telemetry::{StderrJsonlTelemetrySink, TelemetrySink};
use magpie::{Dataset, MagpieConfig, RepositoryLocator, RotatingGateway, ScrapeError, Stage};
use ortho_config::OrthoConfig;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            if writeln!(io::stderr().lock(), "{error}").is_err() {
                return ExitCode::FAILURE;
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), ScrapeError> {
    let config = load_config()?;
    let stage = config.resolve_stage()?;
    let telemetry = StderrJsonlTelemetrySink;

    match stage {
        Stage::Scrape => {
            let (gateway, locator) = build_gateway(&config)?;
            let (since, until) = config.resolve_date_window()?;
            let mut dataset = Dataset::new(config.dataset_path());
            let options = ScrapeOptions {
                since,
                until,
                limit: config.limit,
            };
            let appended =
                run_scrape(&gateway, &locator, &mut dataset, options, &telemetry).await?;
            tracing::info!(appended, stage = stage.label(), "stage complete");
        }
        Stage::Comments => {
            let (gateway, locator) = build_gateway(&config)?;
            let filled =
                run_comments(&gateway, &locator, &config.dataset_path(), &telemetry).await?;
            tracing::info!(filled, stage = stage.label(), "stage complete");
        }
        Stage::Categorize => {
            let classifier = OpenAiChallengeClassifier::new(config.classifier_config()?);
            let path = config.dataset_path();
            let limit = config.limit;
            // Blocking HTTP client; keep it off the async runtime.
            let classified = tokio::task::spawn_blocking(move || {
                run_categorize(&classifier, &path, limit, &StderrJsonlTelemetrySink)
            })
            .await
            .map_err(|error| ScrapeError::Api {
                message: format!("classification task failed: {error}"),
            })??;
            tracing::info!(classified, stage = stage.label(), "stage complete");
        }
        Stage::Filter => {
            let written = run_filter(
                &config.dataset_path(),
                &config.filtered_dataset_path(),
                config.min_decision_days(),
            )?;
            tracing::info!(written, stage = stage.label(), "stage complete");
        }
    }

    Ok(())
}

fn build_gateway(config: &MagpieConfig) -> Result<(RotatingGateway, RepositoryLocator), ScrapeError>
{
    let (owner, repo) = config.require_repository_info()?;
    let locator = RepositoryLocator::from_owner_repo(owner, repo)?;
    let pool = config.resolve_tokens()?;
    let sink: Arc<dyn TelemetrySink> = Arc::new(StderrJsonlTelemetrySink);
    let gateway = RotatingGateway::for_pool(&pool, &locator)?.with_telemetry(sink);
    Ok((gateway, locator))
}

/// Loads configuration from CLI, environment, and files.
///
/// # Errors
///
/// Returns [`ScrapeError::Configuration`] when ortho-config fails to parse
/// arguments or load configuration files.
fn load_config() -> Result<MagpieConfig, ScrapeError> {
    MagpieConfig::load().map_err(|error| ScrapeError::Configuration {
        message: error.to_string(),
    })
}
