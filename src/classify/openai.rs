//! OpenAI-compatible HTTP implementation of the challenge classifier.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::github::ScrapeError;

use super::{ChallengeClassifier, ClassificationMode};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Configuration for [`OpenAiChallengeClassifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAiClassifierConfig {
    /// Base API URL (e.g., `https://api.openai.com/v1`).
    pub base_url: String,
    /// Model identifier sent in chat-completions requests.
    pub model: String,
    /// API key used for bearer authentication.
    pub api_key: Option<String>,
    /// Prompt variant to run with.
    pub mode: ClassificationMode,
    /// HTTP timeout.
    pub timeout: Duration,
}

impl Default for OpenAiClassifierConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            model: DEFAULT_MODEL.to_owned(),
            api_key: None,
            mode: ClassificationMode::Discover,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Chat-completions classifier decoding a structured `categories` payload.
#[derive(Debug, Clone, Default)]
pub struct OpenAiChallengeClassifier {
    config: OpenAiClassifierConfig,
}

impl OpenAiChallengeClassifier {
    /// Creates a classifier from explicit configuration.
    #[must_use]
    pub const fn new(config: OpenAiClassifierConfig) -> Self {
        Self { config }
    }

    fn extract_api_key(&self) -> Result<&str, ScrapeError> {
        self.config
            .api_key
            .as_deref()
            .ok_or_else(|| ScrapeError::Configuration {
                message: concat!(
                    "AI API key is required (use --ai-api-key, ",
                    "MAGPIE_AI_API_KEY, or OPENAI_API_KEY)"
                )
                .to_owned(),
            })
    }

    fn create_http_client(&self) -> Result<Client, ScrapeError> {
        Client::builder()
            .timeout(self.config.timeout)
            .build()
            .map_err(|error| ScrapeError::Configuration {
                message: format!("failed to configure AI HTTP client: {error}"),
            })
    }
}

impl ChallengeClassifier for OpenAiChallengeClassifier {
    fn classify(&self, transcript: &str) -> Result<Vec<String>, ScrapeError> {
        let api_key = self.extract_api_key()?;
        let endpoint = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let payload = ChatCompletionsRequest {
            model: self.config.model.as_str(),
            messages: build_messages(self.config.mode, transcript),
            response_format: categories_response_format(),
        };

        let client = self.create_http_client()?;
        let response = client
            .post(endpoint)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .map_err(|error| ScrapeError::Network {
                message: format!("AI request transport failed: {error}"),
            })?;

        if response.status() != StatusCode::OK {
            let status = response.status();
            let body = response.text().map_or_else(
                |_| "(failed to read error response body)".to_owned(),
                |content| truncate_for_message(content.as_str(), 160),
            );
            return Err(ScrapeError::Api {
                message: format!("AI request failed with status {}: {body}", status.as_u16()),
            });
        }

        let response_payload: ChatCompletionsResponse =
            response.json().map_err(|error| ScrapeError::Api {
                message: format!("AI response JSON decoding failed: {error}"),
            })?;

        let content = response_payload
            .choices
            .first()
            .map(|choice| choice.message.content.trim())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| ScrapeError::Api {
                message: "AI response did not contain assistant text".to_owned(),
            })?;

        let extraction: CategoriesExtraction =
            serde_json::from_str(content).map_err(|error| ScrapeError::Api {
                message: format!("AI response was not a categories object: {error}"),
            })?;
        Ok(extraction.categories)
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionsRequest<'a> {
    model: &'a str,
    messages: Vec<ChatCompletionsMessage>,
    response_format: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct ChatCompletionsMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionsResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct CategoriesExtraction {
    categories: Vec<String>,
}

/// JSON-schema response format forcing a `{"categories": [...]}` object.
fn categories_response_format() -> serde_json::Value {
    serde_json::json!({
        "type": "json_schema",
        "json_schema": {
            "name": "comment_categories_extraction",
            "strict": true,
            "schema": {
                "type": "object",
                "properties": {
                    "categories": {
                        "type": "array",
                        "items": {"type": "string"}
                    }
                },
                "required": ["categories"],
                "additionalProperties": false
            }
        }
    })
}

fn build_messages(mode: ClassificationMode, transcript: &str) -> Vec<ChatCompletionsMessage> {
    match mode {
        ClassificationMode::Discover => vec![
            ChatCompletionsMessage {
                role: "system",
                content: concat!(
                    "You are a helpful assistant that analyzes pull request comments ",
                    "to categorize challenges faced when developing device integrations, ",
                    "and returns a list of them. If not categorizable, use 'Other'. ",
                    "If you can see that there's a long gap before or between a comment, ",
                    "and it's likely that the gap is simply due to delay in a reviewer ",
                    "commenting, use 'Reviewer Delay' rather than inventing categories."
                )
                .to_owned(),
            },
            ChatCompletionsMessage {
                role: "user",
                content: format!("Analyze the following conversation:\n{transcript}"),
            },
            ChatCompletionsMessage {
                role: "assistant",
                content: concat!(
                    "categories=['Testing Issues', 'Naming/ID Issues', ",
                    "'Code Structure Issues', 'Communication Issues', ",
                    "'Review Process Issues', 'Other']"
                )
                .to_owned(),
            },
            ChatCompletionsMessage {
                role: "user",
                content: format!(
                    "Can you make sure any ecosystem-specific concepts are captured:\n{transcript}"
                ),
            },
        ],
        ClassificationMode::Refine => vec![
            ChatCompletionsMessage {
                role: "system",
                content: concat!(
                    "You are tasked with categorizing pull request challenges based on ",
                    "comments during their review process. The categories are: ",
                    "1. **Process Delays**: Issues like reviewer delays, merge conflicts, ",
                    "or prolonged review times. Keywords: 'reviewer delay', 'merge conflict', ",
                    "'waiting for review'. ",
                    "2. **Technical Challenges**: Issues like code structure problems, ",
                    "integration difficulties, or test failures. Keywords: 'code structure', ",
                    "'flaky tests', 'integration logic'. ",
                    "3. **Documentation and Communication**: Problems with documentation or ",
                    "team communication. Keywords: 'documentation gaps', 'unclear docs', ",
                    "'communication issues'. ",
                    "4. **Specific Domain Challenges**: Ecosystem-specific problems like ",
                    "schema errors or device API limitations. Keywords: 'YAML schema', ",
                    "'device API limitation', 'sensor value'. ",
                    "5. **User Experience**: Issues related to UI/UX or end-user impact. ",
                    "Keywords: 'UI feedback', 'user-facing bug'. ",
                    "A pull request can fall into multiple categories."
                )
                .to_owned(),
            },
            ChatCompletionsMessage {
                role: "user",
                content: format!("Categorize this PR:\n{transcript}"),
            },
        ],
    }
}

fn truncate_for_message(content: &str, limit: usize) -> String {
    let mut truncated: String = content.chars().take(limit).collect();
    if content.chars().count() > limit {
        truncated.push_str("...");
    }
    truncated
}

#[cfg(test)]
mod tests {
    use super::{
        ChatCompletionsResponse, OpenAiChallengeClassifier, OpenAiClassifierConfig,
        build_messages, truncate_for_message,
    };
    use crate::classify::{ChallengeClassifier, ClassificationMode};
    use crate::github::ScrapeError;

    #[test]
    fn missing_api_key_is_a_configuration_error() {
        let classifier = OpenAiChallengeClassifier::new(OpenAiClassifierConfig::default());

        let error = classifier
            .classify("(from reviewer) [t] please rename")
            .expect_err("no key configured");
        assert!(
            matches!(error, ScrapeError::Configuration { .. }),
            "expected Configuration, got {error:?}"
        );
    }

    #[test]
    fn discover_mode_seeds_the_starter_category_list() {
        let messages = build_messages(ClassificationMode::Discover, "transcript");

        assert_eq!(messages.len(), 4);
        assert!(
            messages
                .iter()
                .any(|message| message.role == "assistant"
                    && message.content.contains("Testing Issues"))
        );
    }

    #[test]
    fn refine_mode_carries_the_fixed_taxonomy() {
        let messages = build_messages(ClassificationMode::Refine, "transcript");

        assert_eq!(messages.len(), 2);
        assert!(
            messages
                .first()
                .is_some_and(|message| message.content.contains("Process Delays"))
        );
    }

    #[test]
    fn chat_response_decodes_structured_categories() {
        let raw = serde_json::json!({
            "choices": [{
                "message": {
                    "content": "{\"categories\": [\"Testing Issues\", \"Other\"]}"
                }
            }]
        });

        let response: ChatCompletionsResponse =
            serde_json::from_value(raw).expect("response should decode");
        let content = response
            .choices
            .first()
            .map(|choice| choice.message.content.as_str())
            .expect("one choice");
        let extraction: super::CategoriesExtraction =
            serde_json::from_str(content).expect("categories should decode");
        assert_eq!(extraction.categories, vec!["Testing Issues", "Other"]);
    }

    #[test]
    fn long_error_bodies_are_truncated() {
        let body = "x".repeat(500);
        let truncated = truncate_for_message(&body, 160);
        assert_eq!(truncated.len(), 163);
        assert!(truncated.ends_with("..."));
    }
}
