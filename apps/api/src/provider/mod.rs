//! AI provider contract consumed by the interview controller.
//!
//! The controller only ever sees `ProviderError::kind`. Free-text inspection of
//! upstream failures happens once, here at the boundary, in [`classify`].

use async_trait::async_trait;
use thiserror::Error;

use crate::interview::models::{CandidateProfile, ContactInfo, Difficulty, QuestionRecord};

pub mod contact;
pub mod llm;
pub mod prompts;

pub use llm::LlmProvider;

/// Upstream message fragments that indicate rate, quota or credential exhaustion.
const QUOTA_MARKERS: &[&str] = &["quota", "limit", "429", "resource_exhausted", "api key"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Rate/quota/authorization exhaustion. Always recoverable via a fixed fallback.
    QuotaExceeded,
    Generic,
}

#[derive(Debug, Clone, Error)]
#[error("{kind:?} provider failure: {message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
}

impl ProviderError {
    pub fn quota(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::QuotaExceeded,
            message: message.into(),
        }
    }

    pub fn generic(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::Generic,
            message: message.into(),
        }
    }

    pub fn is_quota_exceeded(&self) -> bool {
        self.kind == ProviderErrorKind::QuotaExceeded
    }
}

/// Classifies an upstream failure. An explicit 429 status wins; otherwise the
/// message is matched case-insensitively against [`QUOTA_MARKERS`].
pub fn classify(status: Option<u16>, message: &str) -> ProviderErrorKind {
    if status == Some(429) {
        return ProviderErrorKind::QuotaExceeded;
    }
    let lower = message.to_lowercase();
    if QUOTA_MARKERS.iter().any(|m| lower.contains(m)) {
        ProviderErrorKind::QuotaExceeded
    } else {
        ProviderErrorKind::Generic
    }
}

/// The four AI operations the interview needs. Every call may fail.
///
/// Carried by the controller as `Arc<dyn AiProvider>`, injected at construction.
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Best-effort contact extraction; unfound fields come back empty.
    async fn extract_contact_info(&self, resume_text: &str) -> Result<ContactInfo, ProviderError>;

    async fn generate_question(
        &self,
        difficulty: Difficulty,
        question_number: u32,
        resume_text: &str,
        prior_questions: &[String],
    ) -> Result<String, ProviderError>;

    /// Returns the model's verdict as text (`Score: N` / `Feedback: ...`).
    /// Parsing is the evaluator's job.
    async fn evaluate_answer(
        &self,
        question: &str,
        answer: &str,
        difficulty: Difficulty,
    ) -> Result<String, ProviderError>;

    async fn generate_summary(
        &self,
        profile: &CandidateProfile,
        records: &[QuestionRecord],
        final_percent: u32,
    ) -> Result<String, ProviderError>;
}
