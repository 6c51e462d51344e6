//! `AiProvider` backed by `LlmClient`.
//!
//! This is the boundary where transport failures become `ProviderError`s with an
//! explicit kind. Nothing past this file looks at upstream error text.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::{debug, warn};

use crate::interview::models::{CandidateProfile, ContactInfo, Difficulty, QuestionRecord};
use crate::llm_client::{LlmClient, LlmError};
use crate::provider::contact::{extract_with_regex, merge_contact};
use crate::provider::prompts::{
    CONTACT_EXTRACT_PROMPT, EVALUATION_PROMPT, INTERVIEWER_SYSTEM, JOB_ROLE, JSON_ONLY_SYSTEM,
    QUESTION_PROMPT, SUMMARY_PROMPT,
};
use crate::provider::{classify, AiProvider, ProviderError};

const RESUME_SUMMARY_CHARS: usize = 1000;
const CONTACT_SCAN_CHARS: usize = 3000;

static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([a-z_]+)\}").expect("valid placeholder regex"));

#[derive(Clone)]
pub struct LlmProvider {
    llm: LlmClient,
}

impl LlmProvider {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

impl From<LlmError> for ProviderError {
    fn from(e: LlmError) -> Self {
        let message = e.to_string();
        ProviderError {
            kind: classify(e.status(), &message),
            message,
        }
    }
}

#[async_trait]
impl AiProvider for LlmProvider {
    async fn extract_contact_info(&self, resume_text: &str) -> Result<ContactInfo, ProviderError> {
        let heuristic = extract_with_regex(resume_text);
        let prompt = fill_template(
            CONTACT_EXTRACT_PROMPT,
            &[("resume_text", &truncate(resume_text, CONTACT_SCAN_CHARS))],
        );

        match self.llm.call_json::<ContactInfo>(&prompt, JSON_ONLY_SYSTEM).await {
            Ok(model) => {
                debug!("Model contact extraction returned {:?}", model);
                Ok(merge_contact(model, heuristic))
            }
            Err(e) => {
                let err = ProviderError::from(e);
                if err.is_quota_exceeded() {
                    return Err(err);
                }
                warn!("Contact extraction failed, using heuristic only: {}", err.message);
                Ok(heuristic)
            }
        }
    }

    async fn generate_question(
        &self,
        difficulty: Difficulty,
        question_number: u32,
        resume_text: &str,
        prior_questions: &[String],
    ) -> Result<String, ProviderError> {
        let previous = if prior_questions.is_empty() {
            "None - this is the first question".to_string()
        } else {
            prior_questions.join("\n")
        };
        let (focus, answer_window) = match difficulty {
            Difficulty::Easy => (
                "Focus on fundamental concepts and basic implementation",
                "20 seconds",
            ),
            Difficulty::Medium => (
                "Test practical application and problem-solving skills",
                "60 seconds",
            ),
            Difficulty::Hard => (
                "Challenge advanced understanding, system design, and best practices",
                "2 minutes",
            ),
        };

        let prompt = fill_template(
            QUESTION_PROMPT,
            &[
                ("job_role", JOB_ROLE),
                ("resume_summary", &truncate(resume_text, RESUME_SUMMARY_CHARS)),
                ("previous_questions", &previous),
                ("difficulty", difficulty.as_str()),
                ("question_number", &question_number.to_string()),
                ("focus", focus),
                ("answer_window", answer_window),
            ],
        );

        let question = self.llm.call_text(&prompt, INTERVIEWER_SYSTEM).await?;
        if question.is_empty() {
            return Ok(format!(
                "What is your experience with {}-level {} development?",
                difficulty.as_str().to_lowercase(),
                JOB_ROLE
            ));
        }
        Ok(question)
    }

    async fn evaluate_answer(
        &self,
        question: &str,
        answer: &str,
        difficulty: Difficulty,
    ) -> Result<String, ProviderError> {
        let prompt = evaluation_prompt(question, answer, difficulty);
        Ok(self.llm.call_text(&prompt, INTERVIEWER_SYSTEM).await?)
    }

    async fn generate_summary(
        &self,
        profile: &CandidateProfile,
        records: &[QuestionRecord],
        final_percent: u32,
    ) -> Result<String, ProviderError> {
        let transcript = records
            .iter()
            .enumerate()
            .map(|(i, r)| {
                format!(
                    "Q{} ({}): {}\nA: {}\nScore: {}/10",
                    i + 1,
                    r.difficulty,
                    r.question,
                    r.answer,
                    r.score
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        let prompt = fill_template(
            SUMMARY_PROMPT,
            &[
                ("job_role", JOB_ROLE),
                ("name", &profile.name),
                ("email", &profile.email),
                ("final_percent", &final_percent.to_string()),
                ("transcript", &transcript),
            ],
        );

        Ok(self.llm.call_text(&prompt, INTERVIEWER_SYSTEM).await?)
    }
}

fn evaluation_prompt(question: &str, answer: &str, difficulty: Difficulty) -> String {
    let expectation = match difficulty {
        Difficulty::Easy => "Expect basic understanding and correct fundamentals",
        Difficulty::Medium => "Expect practical knowledge and problem-solving approach",
        Difficulty::Hard => "Expect deep technical knowledge, best practices, and system thinking",
    };
    fill_template(
        EVALUATION_PROMPT,
        &[
            ("job_role", JOB_ROLE),
            ("difficulty", difficulty.as_str()),
            ("question", question),
            ("answer", answer),
            ("expectation", expectation),
        ],
    )
}

/// Substitutes `{name}` placeholders in one pass over the template. Inserted
/// values are never scanned again; unknown placeholders are left as they are.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    PLACEHOLDER_RE
        .replace_all(template, |caps: &Captures| {
            let key = &caps[1];
            values
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| value.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Truncates on a char boundary.
fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderErrorKind;

    #[test]
    fn test_rate_limited_llm_error_maps_to_quota() {
        let err = ProviderError::from(LlmError::RateLimited { retries: 3 });
        assert_eq!(err.kind, ProviderErrorKind::QuotaExceeded);
    }

    #[test]
    fn test_auth_errors_classified_by_message() {
        let err = ProviderError::from(LlmError::Api {
            status: 401,
            message: "invalid x-api-key".to_string(),
        });
        assert_eq!(err.kind, ProviderErrorKind::Generic);

        let err = ProviderError::from(LlmError::Api {
            status: 403,
            message: "Your API key has been disabled".to_string(),
        });
        assert_eq!(err.kind, ProviderErrorKind::QuotaExceeded);
    }

    #[test]
    fn test_empty_content_is_generic() {
        let err = ProviderError::from(LlmError::EmptyContent);
        assert_eq!(err.kind, ProviderErrorKind::Generic);
    }

    #[test]
    fn test_answer_text_is_not_reinterpreted_as_placeholder() {
        let prompt = evaluation_prompt(
            "What is {job_role}?",
            "I would write {expectation} and {answer} literally.",
            Difficulty::Easy,
        );
        assert!(prompt.contains("What is {job_role}?"));
        assert!(prompt.contains("I would write {expectation} and {answer} literally."));
        assert!(prompt.contains("- Expect basic understanding and correct fundamentals"));
    }

    #[test]
    fn test_fill_template_leaves_unknown_placeholders() {
        assert_eq!(
            fill_template("{a} + {b} = {c}", &[("a", "1"), ("b", "{c}")]),
            "1 + {c} = {c}"
        );
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("abc", 10), "abc");
    }
}
