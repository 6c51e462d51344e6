//! Scores a single answer.
//!
//! The provider returns free text in the form `Score: N` / `Feedback: ...`.
//! Quota exhaustion yields a fixed default verdict; any other failure is
//! returned to the caller and produces no record.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::interview::models::Difficulty;
use crate::interview::scoring::MAX_SCORE_PER_QUESTION;
use crate::provider::{AiProvider, ProviderError};

pub const DEFAULT_SCORE: u32 = 5;
pub const DEFAULT_FEEDBACK: &str = "Answer received.";
pub const QUOTA_FALLBACK_SCORE: u32 = 5;
pub const QUOTA_FALLBACK_FEEDBACK: &str = "API limit reached. Default score assigned.";

static SCORE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Score:\s*(\d+)").expect("valid score regex"));
static FEEDBACK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)Feedback:\s*(.+)").expect("valid feedback regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub score: u32,
    pub feedback: String,
    /// True when the verdict is the quota default rather than a model judgement.
    pub quota_fallback: bool,
}

#[derive(Clone)]
pub struct AnswerEvaluator {
    provider: Arc<dyn AiProvider>,
}

impl AnswerEvaluator {
    pub fn new(provider: Arc<dyn AiProvider>) -> Self {
        Self { provider }
    }

    pub async fn evaluate(
        &self,
        question: &str,
        answer: &str,
        difficulty: Difficulty,
    ) -> Result<Evaluation, ProviderError> {
        match self
            .provider
            .evaluate_answer(question, answer, difficulty)
            .await
        {
            Ok(text) => {
                let (score, feedback) = parse_evaluation(&text);
                debug!("Evaluation parsed: score={}", score);
                Ok(Evaluation {
                    score,
                    feedback,
                    quota_fallback: false,
                })
            }
            Err(e) if e.is_quota_exceeded() => {
                warn!("Evaluation hit provider quota, assigning default score");
                Ok(Evaluation {
                    score: QUOTA_FALLBACK_SCORE,
                    feedback: QUOTA_FALLBACK_FEEDBACK.to_string(),
                    quota_fallback: true,
                })
            }
            Err(e) => {
                warn!("Evaluation failed: {}", e.message);
                Err(e)
            }
        }
    }
}

/// Extracts `(score, feedback)` from a textual verdict. The score is clamped to
/// `0..=10`; missing parts fall back to [`DEFAULT_SCORE`] and [`DEFAULT_FEEDBACK`].
pub fn parse_evaluation(text: &str) -> (u32, String) {
    let score = SCORE_RE
        .captures(text)
        .map(|caps| {
            caps[1]
                .parse::<u64>()
                .map(|n| n.min(MAX_SCORE_PER_QUESTION as u64) as u32)
                // Only overflow can fail here: the digits are all there.
                .unwrap_or(MAX_SCORE_PER_QUESTION)
        })
        .unwrap_or(DEFAULT_SCORE);

    let feedback = FEEDBACK_RE
        .captures(text)
        .map(|caps| caps[1].trim().to_string())
        .filter(|f| !f.is_empty())
        .unwrap_or_else(|| DEFAULT_FEEDBACK.to_string());

    (score, feedback)
}
