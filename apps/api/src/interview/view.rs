use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::interview::models::{CandidateResult, Difficulty, InterviewSession, Phase};
use crate::interview::orchestrator::InterviewConfig;
use crate::interview::scoring::{max_points, score_category, ScoreCategory};
use crate::interview::timer::{format_time, is_time_critical};

/// Which step produced a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    ContactExtraction,
    QuestionGeneration,
    Evaluation,
    Summary,
}

/// Degraded-but-continuing outcomes surfaced to the candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// The provider ran out of quota; a fixed fallback was used.
    QuotaExceeded { stage: Stage },
    /// The provider failed for another reason; a fixed fallback was used.
    ProviderFallback { stage: Stage, message: String },
    /// The session could not be saved and will not survive a restart.
    SnapshotNotSaved,
    ArchiveNotSaved,
}

impl Warning {
    pub fn message(&self) -> String {
        match self {
            Warning::QuotaExceeded { stage } => match stage {
                Stage::ContactExtraction => {
                    "API limit reached. Please enter your details manually.".to_string()
                }
                Stage::QuestionGeneration => {
                    "API limit reached. Using a standard question.".to_string()
                }
                Stage::Evaluation => "API limit reached. Default score assigned.".to_string(),
                Stage::Summary => "API limit reached. Summary is unavailable.".to_string(),
            },
            Warning::ProviderFallback { message, .. } => message.clone(),
            Warning::SnapshotNotSaved => {
                "Progress could not be saved and cannot be resumed after a restart.".to_string()
            }
            Warning::ArchiveNotSaved => "The interview result could not be archived.".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CandidateView {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub has_resume: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub question_number: u32,
    pub total_questions: usize,
    pub difficulty: Difficulty,
    pub text: String,
    pub time_limit: u32,
    pub time_remaining: u32,
    pub time_display: String,
    pub time_critical: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressView {
    pub answered: usize,
    pub total_questions: usize,
    pub total_score: u32,
    pub max_score: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultView {
    #[serde(flatten)]
    pub result: CandidateResult,
    pub category: ScoreCategory,
}

#[derive(Debug, Clone, Serialize)]
pub struct WarningView {
    #[serde(flatten)]
    pub warning: Warning,
    pub message: String,
}

/// Everything a presentation layer needs to render the current session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub phase: Phase,
    pub candidate: CandidateView,
    pub question: Option<QuestionView>,
    pub progress: ProgressView,
    /// A provider call is outstanding; mutating requests are refused.
    pub busy: bool,
    /// Last evaluation failure; the open question can be submitted again.
    pub pending_error: Option<String>,
    pub result: Option<ResultView>,
    pub warnings: Vec<WarningView>,
    pub created_at: DateTime<Utc>,
}

impl SessionView {
    pub fn build(
        session: &InterviewSession,
        config: &InterviewConfig,
        busy: bool,
        pending_error: Option<String>,
        result: Option<&CandidateResult>,
        warnings: &[Warning],
    ) -> Self {
        let total_questions = config.question_count();
        let question = match (&session.current_question, config.slot(session.current_question_index)) {
            (Some(text), Some(slot)) if session.phase == Phase::Interviewing => Some(QuestionView {
                question_number: slot.question_number,
                total_questions,
                difficulty: slot.difficulty,
                text: text.clone(),
                time_limit: slot.time_limit,
                time_remaining: session.time_remaining,
                time_display: format_time(session.time_remaining),
                time_critical: is_time_critical(session.time_remaining, slot.time_limit),
            }),
            _ => None,
        };

        Self {
            session_id: session.id,
            phase: session.phase,
            candidate: CandidateView {
                name: session.candidate.name.clone(),
                email: session.candidate.email.clone(),
                phone: session.candidate.phone.clone(),
                has_resume: !session.candidate.resume_text.trim().is_empty(),
            },
            question,
            progress: ProgressView {
                answered: session.records.len(),
                total_questions,
                total_score: session.total_score,
                max_score: max_points(total_questions),
            },
            busy,
            pending_error,
            result: result.map(|r| ResultView {
                result: r.clone(),
                category: score_category(r.score_percent),
            }),
            warnings: warnings
                .iter()
                .map(|w| WarningView {
                    warning: w.clone(),
                    message: w.message(),
                })
                .collect(),
            created_at: session.created_at,
        }
    }
}

/// What a "welcome back" prompt shows about a saved session.
#[derive(Debug, Clone, Serialize)]
pub struct SavedSessionSummary {
    pub session_id: Uuid,
    pub candidate_name: String,
    pub question_number: u32,
    pub total_questions: usize,
    pub time_remaining: u32,
    pub time_display: String,
    pub answered: usize,
    pub created_at: DateTime<Utc>,
}

impl SavedSessionSummary {
    pub fn from_session(session: &InterviewSession, config: &InterviewConfig) -> Self {
        let total_questions = config.question_count();
        Self {
            session_id: session.id,
            candidate_name: session.candidate.name.clone(),
            question_number: (session.current_question_index + 1).min(total_questions) as u32,
            total_questions,
            time_remaining: session.time_remaining,
            time_display: format_time(session.time_remaining),
            answered: session.records.len(),
            created_at: session.created_at,
        }
    }
}
