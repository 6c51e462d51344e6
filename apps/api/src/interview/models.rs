use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Difficulty tier of a single question. Each tier carries its own time limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contact fields as returned by the AI provider or typed by the candidate.
/// Unfound fields are empty strings, never absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Candidate data collected before the interview starts.
/// Mutable until `Interviewing`, frozen for the rest of the session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub resume_text: String,
}

impl CandidateProfile {
    pub fn from_contact(contact: ContactInfo, resume_text: String) -> Self {
        Self {
            name: contact.name.trim().to_string(),
            email: contact.email.trim().to_string(),
            phone: contact.phone.trim().to_string(),
            resume_text,
        }
    }
}

/// One resolved question. Appended exactly once, never edited afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub question_number: u32,
    pub difficulty: Difficulty,
    pub question: String,
    pub answer: String,
    /// 0 – 10
    pub score: u32,
    pub feedback: String,
    pub time_used_seconds: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Upload,
    CollectInfo,
    Interviewing,
    Complete,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Upload => "upload",
            Phase::CollectInfo => "collect_info",
            Phase::Interviewing => "interviewing",
            Phase::Complete => "complete",
        };
        f.write_str(s)
    }
}

/// The single active interview session.
///
/// While `Interviewing`: `records.len() == current_question_index` and
/// `total_score == Σ records[].score`. `current_question` is `None` only while
/// the next question is being generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewSession {
    pub id: Uuid,
    pub candidate: CandidateProfile,
    pub phase: Phase,
    pub current_question_index: usize,
    pub current_question: Option<String>,
    pub time_remaining: u32,
    /// Current content of the answer field. Submitted verbatim on expiry.
    pub draft_answer: String,
    pub records: Vec<QuestionRecord>,
    pub total_score: u32,
    pub created_at: DateTime<Utc>,
}

impl InterviewSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            candidate: CandidateProfile::default(),
            phase: Phase::Upload,
            current_question_index: 0,
            current_question: None,
            time_remaining: 0,
            draft_answer: String::new(),
            records: Vec::new(),
            total_score: 0,
            created_at: Utc::now(),
        }
    }

    pub fn prior_questions(&self) -> Vec<String> {
        self.records.iter().map(|r| r.question.clone()).collect()
    }
}

impl Default for InterviewSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Archived outcome of a completed interview. Created once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateResult {
    pub id: Uuid,
    pub candidate: CandidateProfile,
    pub records: Vec<QuestionRecord>,
    pub score_percent: u32,
    pub total_points: u32,
    pub max_points: u32,
    pub ai_summary: String,
    pub completed_at: DateTime<Utc>,
}
