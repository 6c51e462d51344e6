//! Question orchestration: maps a question index to its tier and time limit and
//! asks the provider for question text.
//!
//! Generation never blocks the interview: every provider failure, quota or
//! otherwise, is replaced by [`FALLBACK_QUESTION`] and reported alongside.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::interview::models::{CandidateProfile, Difficulty};
use crate::provider::{AiProvider, ProviderError};

pub const FALLBACK_QUESTION: &str =
    "What is your experience with Full Stack Development using React and Node.js?";

/// Per-tier countdown lengths, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierLimits {
    pub easy: u32,
    pub medium: u32,
    pub hard: u32,
}

impl Default for TierLimits {
    fn default() -> Self {
        Self {
            easy: 45,
            medium: 80,
            hard: 145,
        }
    }
}

impl TierLimits {
    pub fn limit_for(&self, difficulty: Difficulty) -> u32 {
        match difficulty {
            Difficulty::Easy => self.easy,
            Difficulty::Medium => self.medium,
            Difficulty::Hard => self.hard,
        }
    }
}

/// Fixed difficulty schedule plus tier limits. The default is the reference
/// 3 Easy / 4 Medium / 3 Hard interview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterviewConfig {
    pub schedule: Vec<Difficulty>,
    pub limits: TierLimits,
}

impl Default for InterviewConfig {
    fn default() -> Self {
        let mut schedule = vec![Difficulty::Easy; 3];
        schedule.extend([Difficulty::Medium; 4]);
        schedule.extend([Difficulty::Hard; 3]);
        Self {
            schedule,
            limits: TierLimits::default(),
        }
    }
}

impl InterviewConfig {
    pub fn question_count(&self) -> usize {
        self.schedule.len()
    }

    pub fn slot(&self, index: usize) -> Option<QuestionSlot> {
        self.schedule.get(index).map(|&difficulty| QuestionSlot {
            index,
            question_number: index as u32 + 1,
            difficulty,
            time_limit: self.limits.limit_for(difficulty),
        })
    }

    /// Sum of every slot's time limit.
    pub fn total_allotted_seconds(&self) -> u32 {
        self.schedule
            .iter()
            .map(|&d| self.limits.limit_for(d))
            .sum()
    }
}

/// One position in the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionSlot {
    pub index: usize,
    pub question_number: u32,
    pub difficulty: Difficulty,
    pub time_limit: u32,
}

#[derive(Debug, Clone)]
pub struct GeneratedQuestion {
    pub question: String,
    pub difficulty: Difficulty,
    pub time_limit: u32,
    /// Set when the text is the fallback question.
    pub fallback: Option<ProviderError>,
}

#[derive(Clone)]
pub struct QuestionOrchestrator {
    provider: Arc<dyn AiProvider>,
    config: InterviewConfig,
}

impl QuestionOrchestrator {
    pub fn new(provider: Arc<dyn AiProvider>, config: InterviewConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &InterviewConfig {
        &self.config
    }

    /// Generates the question for `index`. Returns `None` once the schedule is exhausted.
    pub async fn generate_next(
        &self,
        index: usize,
        profile: &CandidateProfile,
        prior_questions: &[String],
    ) -> Option<GeneratedQuestion> {
        let slot = self.config.slot(index)?;
        Some(self.generate(slot, profile, prior_questions).await)
    }

    pub async fn generate(
        &self,
        slot: QuestionSlot,
        profile: &CandidateProfile,
        prior_questions: &[String],
    ) -> GeneratedQuestion {
        info!(
            "Generating question {}/{} ({})",
            slot.question_number,
            self.config.question_count(),
            slot.difficulty
        );

        let result = self
            .provider
            .generate_question(
                slot.difficulty,
                slot.question_number,
                &profile.resume_text,
                prior_questions,
            )
            .await;

        match result {
            Ok(question) => GeneratedQuestion {
                question,
                difficulty: slot.difficulty,
                time_limit: slot.time_limit,
                fallback: None,
            },
            Err(e) => {
                if e.is_quota_exceeded() {
                    warn!(
                        "Question {} generation hit provider quota, using fallback question",
                        slot.question_number
                    );
                } else {
                    warn!(
                        "Question {} generation failed, using fallback question: {}",
                        slot.question_number, e.message
                    );
                }
                GeneratedQuestion {
                    question: FALLBACK_QUESTION.to_string(),
                    difficulty: slot.difficulty,
                    time_limit: slot.time_limit,
                    fallback: Some(e),
                }
            }
        }
    }
}
