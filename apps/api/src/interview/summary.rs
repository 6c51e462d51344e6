use std::sync::Arc;

use tracing::warn;

use crate::interview::models::{CandidateProfile, QuestionRecord};
use crate::provider::{AiProvider, ProviderErrorKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub text: String,
    /// Set when `text` is the deterministic fallback.
    pub fallback: Option<ProviderErrorKind>,
}

/// Produces the closing narrative. Never fails: every provider problem
/// becomes a fixed text embedding the candidate's name and score.
#[derive(Clone)]
pub struct SummaryGenerator {
    provider: Arc<dyn AiProvider>,
}

impl SummaryGenerator {
    pub fn new(provider: Arc<dyn AiProvider>) -> Self {
        Self { provider }
    }

    pub async fn summarize(
        &self,
        profile: &CandidateProfile,
        records: &[QuestionRecord],
        final_percent: u32,
    ) -> Summary {
        match self
            .provider
            .generate_summary(profile, records, final_percent)
            .await
        {
            Ok(text) if !text.trim().is_empty() => Summary {
                text: text.trim().to_string(),
                fallback: None,
            },
            Ok(_) => {
                warn!("Summary generation returned empty text, using fallback");
                Summary {
                    text: fallback_summary(&profile.name, final_percent, ProviderErrorKind::Generic),
                    fallback: Some(ProviderErrorKind::Generic),
                }
            }
            Err(e) => {
                warn!("Summary generation failed ({:?}): {}", e.kind, e.message);
                Summary {
                    text: fallback_summary(&profile.name, final_percent, e.kind),
                    fallback: Some(e.kind),
                }
            }
        }
    }
}

pub fn fallback_summary(name: &str, final_percent: u32, kind: ProviderErrorKind) -> String {
    let marker = match kind {
        ProviderErrorKind::QuotaExceeded => "(API limit exceeded - detailed summary unavailable)",
        ProviderErrorKind::Generic => "Unable to generate detailed summary.",
    };
    format!(
        "Candidate {} completed the interview with a score of {}%. {}",
        name, final_percent, marker
    )
}
