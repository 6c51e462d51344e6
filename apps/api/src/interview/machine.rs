//! Session transitions as pure functions.
//!
//! `apply` never mutates its input: it returns the next session or the reason
//! the event is not allowed. The controller owns sequencing, timers and I/O.

use tracing::debug;

use crate::interview::error::InterviewError;
use crate::interview::models::{CandidateProfile, InterviewSession, Phase, QuestionRecord};
use crate::interview::orchestrator::InterviewConfig;
use crate::interview::scoring::MAX_SCORE_PER_QUESTION;
use crate::interview::validation::validate_profile;

#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Contact data extracted from an uploaded document. Goes straight to
    /// `Interviewing` when complete, otherwise to `CollectInfo`.
    UploadProcessed { profile: CandidateProfile },
    /// Contact data typed by the candidate. Rejected unless complete.
    ManualInfoSubmitted { profile: CandidateProfile },
    QuestionReady { question: String, time_limit: u32 },
    Tick { remaining: u32 },
    DraftUpdated { text: String },
    AnswerResolved { record: QuestionRecord },
    Completed,
    Reset,
}

impl SessionEvent {
    fn name(&self) -> &'static str {
        match self {
            SessionEvent::UploadProcessed { .. } => "upload_processed",
            SessionEvent::ManualInfoSubmitted { .. } => "manual_info_submitted",
            SessionEvent::QuestionReady { .. } => "question_ready",
            SessionEvent::Tick { .. } => "tick",
            SessionEvent::DraftUpdated { .. } => "draft_updated",
            SessionEvent::AnswerResolved { .. } => "answer_resolved",
            SessionEvent::Completed => "completed",
            SessionEvent::Reset => "reset",
        }
    }
}

/// Computes the session that follows `event`. `question_count` is N, the
/// schedule length.
pub fn apply(
    session: &InterviewSession,
    event: SessionEvent,
    question_count: usize,
) -> Result<InterviewSession, InterviewError> {
    let from = session.phase;
    let event_name = event.name();

    let next = match event {
        SessionEvent::Reset => InterviewSession::new(),

        SessionEvent::UploadProcessed { profile } => {
            require_phase(session, &[Phase::Upload, Phase::CollectInfo])?;
            let mut next = InterviewSession::new();
            next.phase = if validate_profile(&profile).is_valid {
                Phase::Interviewing
            } else {
                Phase::CollectInfo
            };
            next.candidate = profile;
            next
        }

        SessionEvent::ManualInfoSubmitted { mut profile } => {
            require_phase(session, &[Phase::Upload, Phase::CollectInfo])?;
            let validation = validate_profile(&profile);
            if !validation.is_valid {
                return Err(InterviewError::Validation {
                    missing_fields: validation.missing_fields,
                });
            }
            let mut next = if session.phase == Phase::CollectInfo {
                session.clone()
            } else {
                InterviewSession::new()
            };
            if profile.resume_text.is_empty() {
                profile.resume_text = next.candidate.resume_text.clone();
            }
            next.candidate = profile;
            next.phase = Phase::Interviewing;
            next
        }

        SessionEvent::QuestionReady {
            question,
            time_limit,
        } => {
            require_phase(session, &[Phase::Interviewing])?;
            if session.current_question.is_some() {
                return Err(InterviewError::Busy);
            }
            if session.current_question_index >= question_count {
                return Err(InterviewError::InvalidSnapshot(
                    "question index past the schedule".to_string(),
                ));
            }
            let mut next = session.clone();
            next.current_question = Some(question);
            next.time_remaining = time_limit;
            next.draft_answer.clear();
            next
        }

        SessionEvent::Tick { remaining } => {
            require_phase(session, &[Phase::Interviewing])?;
            let mut next = session.clone();
            next.time_remaining = remaining;
            next
        }

        SessionEvent::DraftUpdated { text } => {
            require_phase(session, &[Phase::Interviewing])?;
            let mut next = session.clone();
            next.draft_answer = text;
            next
        }

        SessionEvent::AnswerResolved { record } => {
            require_phase(session, &[Phase::Interviewing])?;
            if session.current_question.is_none() {
                return Err(InterviewError::NoActiveQuestion);
            }
            let expected = session.current_question_index as u32 + 1;
            if record.question_number != expected {
                return Err(InterviewError::InvalidSnapshot(format!(
                    "record for question {} while question {} is active",
                    record.question_number, expected
                )));
            }
            let mut next = session.clone();
            next.total_score += record.score;
            next.records.push(record);
            next.current_question_index += 1;
            next.current_question = None;
            next.time_remaining = 0;
            next.draft_answer.clear();
            next
        }

        SessionEvent::Completed => {
            require_phase(session, &[Phase::Interviewing])?;
            if session.current_question_index < question_count {
                return Err(InterviewError::InvalidSnapshot(format!(
                    "{} of {} questions resolved",
                    session.current_question_index, question_count
                )));
            }
            let mut next = session.clone();
            next.phase = Phase::Complete;
            next.current_question = None;
            next.time_remaining = 0;
            next
        }
    };

    if next.phase != from {
        debug!("Session {}: {} -> {} ({})", next.id, from, next.phase, event_name);
    }
    Ok(next)
}

pub fn require_phase(session: &InterviewSession, allowed: &[Phase]) -> Result<(), InterviewError> {
    if allowed.contains(&session.phase) {
        Ok(())
    } else {
        Err(InterviewError::InvalidPhase {
            actual: session.phase,
        })
    }
}

/// Checks the structural invariants of a restored session against the
/// schedule it will continue on.
pub fn check_invariants(
    session: &InterviewSession,
    config: &InterviewConfig,
) -> Result<(), InterviewError> {
    let fail = |reason: String| Err(InterviewError::InvalidSnapshot(reason));
    let question_count = config.question_count();

    if session.phase != Phase::Interviewing {
        return fail(format!("phase is {}, expected interviewing", session.phase));
    }
    if session.current_question_index > question_count {
        return fail(format!(
            "question index {} exceeds schedule of {}",
            session.current_question_index, question_count
        ));
    }
    if session.records.len() != session.current_question_index {
        return fail(format!(
            "{} records for question index {}",
            session.records.len(),
            session.current_question_index
        ));
    }

    let mut sum: u64 = 0;
    for (index, record) in session.records.iter().enumerate() {
        if record.score > MAX_SCORE_PER_QUESTION {
            return fail(format!(
                "record {} has score {} above {}",
                record.question_number, record.score, MAX_SCORE_PER_QUESTION
            ));
        }
        match config.slot(index) {
            Some(slot)
                if slot.question_number == record.question_number
                    && slot.difficulty == record.difficulty => {}
            _ => {
                return fail(format!(
                    "record {} ({}) does not match schedule position {}",
                    record.question_number,
                    record.difficulty,
                    index + 1
                ))
            }
        }
        sum += u64::from(record.score);
    }
    if sum != u64::from(session.total_score) {
        return fail(format!(
            "total score {} does not match record sum {}",
            session.total_score, sum
        ));
    }

    if session.current_question.is_some() {
        let Some(slot) = config.slot(session.current_question_index) else {
            return fail("active question after the last slot".to_string());
        };
        if session.time_remaining > slot.time_limit {
            return fail(format!(
                "{}s remaining exceeds the {}s limit of question {}",
                session.time_remaining, slot.time_limit, slot.question_number
            ));
        }
    }
    Ok(())
}
