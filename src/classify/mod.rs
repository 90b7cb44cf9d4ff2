//! Challenge classification for rendered conversation transcripts.

mod openai;

use crate::github::ScrapeError;

pub use openai::{OpenAiChallengeClassifier, OpenAiClassifierConfig};

/// Which prompt the classifier runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassificationMode {
    /// Open-ended discovery: the model proposes category names freely,
    /// seeded with a starter list. Used to build a taxonomy.
    #[default]
    Discover,
    /// Re-classification against the fixed five-category taxonomy derived
    /// from a discovery pass.
    Refine,
}

impl ClassificationMode {
    /// Short name used in logs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Discover => "discover",
            Self::Refine => "refine",
        }
    }
}

/// Classifier contract over one pull request's transcript.
pub trait ChallengeClassifier: Send + Sync + std::fmt::Debug {
    /// Returns the challenge categories evidenced by `transcript`.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError`] when the provider call fails.
    fn classify(&self, transcript: &str) -> Result<Vec<String>, ScrapeError>;
}

/// Classifies a transcript, degrading to an empty category list on failure.
///
/// An empty transcript short-circuits to no categories without a provider
/// call; a provider error is logged and yields no categories so one bad
/// request cannot abort a long classification run.
#[must_use]
pub fn classify_or_empty(classifier: &dyn ChallengeClassifier, transcript: &str) -> Vec<String> {
    if transcript.is_empty() {
        return Vec::new();
    }

    match classifier.classify(transcript) {
        Ok(categories) => categories,
        Err(error) => {
            tracing::warn!(error = %error, "classification failed; recording no categories");
            Vec::new()
        }
    }
}
