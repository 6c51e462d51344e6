//! Session Controller: the only way the outside world changes the interview.
//!
//! All state lives behind one async mutex. The lock is never held across a
//! provider call: an operation marks the session busy, releases the lock,
//! awaits the provider, then re-locks and checks that the session epoch is
//! unchanged before applying the result. `reset` and `resume` bump the epoch,
//! so late responses for a discarded session are dropped.
//!
//! The countdown is cancelled under the lock before an evaluation starts, and
//! expiry callbacks are matched against the ticket of the live timer, so an
//! expiry can never resolve a question that a manual submission already took.

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::documents::{TextExtractor, UploadedDocument};
use crate::interview::error::InterviewError;
use crate::interview::evaluator::AnswerEvaluator;
use crate::interview::machine::{self, check_invariants, require_phase, SessionEvent};
use crate::interview::models::{
    CandidateProfile, CandidateResult, ContactInfo, InterviewSession, Phase, QuestionRecord,
};
use crate::interview::orchestrator::{InterviewConfig, QuestionOrchestrator};
use crate::interview::persistence::{encode_snapshot, SessionPersistence};
use crate::interview::scoring::{final_percent, max_points, total_score};
use crate::interview::summary::SummaryGenerator;
use crate::interview::timer::{CountdownListener, CountdownTimer};
use crate::interview::validation::is_valid_answer;
use crate::interview::view::{SavedSessionSummary, SessionView, Stage, Warning};
use crate::provider::{AiProvider, ProviderError, ProviderErrorKind};
use crate::store::{KeyValueStore, StoreError};

/// Recorded as the answer when the countdown runs out on an empty field.
pub const EXPIRED_PLACEHOLDER: &str = "No answer provided (time expired)";

struct SessionSlot {
    session: InterviewSession,
    /// Bumped by `reset` and `resume`; in-flight work for an older epoch is discarded.
    epoch: u64,
    /// A provider call is outstanding for this epoch.
    busy: bool,
    timer: Option<CountdownTimer>,
    next_ticket: u64,
    pending_error: Option<String>,
    result: Option<CandidateResult>,
    warnings: Vec<Warning>,
}

impl SessionSlot {
    fn cancel_timer(&mut self) -> Option<u32> {
        self.timer.take().map(|timer| {
            timer.cancel();
            timer.remaining()
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum Origin {
    Manual { remaining: u32 },
    Expiry,
}

pub struct SessionController {
    provider: Arc<dyn AiProvider>,
    extractor: Arc<dyn TextExtractor>,
    orchestrator: QuestionOrchestrator,
    evaluator: AnswerEvaluator,
    summarizer: SummaryGenerator,
    persistence: SessionPersistence,
    config: InterviewConfig,
    slot: Mutex<SessionSlot>,
    this: Weak<SessionController>,
}

impl SessionController {
    pub fn new(
        provider: Arc<dyn AiProvider>,
        extractor: Arc<dyn TextExtractor>,
        store: Arc<dyn KeyValueStore>,
        config: InterviewConfig,
    ) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            orchestrator: QuestionOrchestrator::new(provider.clone(), config.clone()),
            evaluator: AnswerEvaluator::new(provider.clone()),
            summarizer: SummaryGenerator::new(provider.clone()),
            persistence: SessionPersistence::new(store),
            provider,
            extractor,
            config,
            slot: Mutex::new(SessionSlot {
                session: InterviewSession::new(),
                epoch: 0,
                busy: false,
                timer: None,
                next_ticket: 0,
                pending_error: None,
                result: None,
                warnings: Vec::new(),
            }),
            this: this.clone(),
        })
    }

    pub fn config(&self) -> &InterviewConfig {
        &self.config
    }

    pub fn persistence(&self) -> &SessionPersistence {
        &self.persistence
    }

    pub async fn view(&self) -> SessionView {
        let slot = self.slot.lock().await;
        self.view_of(&slot)
    }

    pub async fn session(&self) -> InterviewSession {
        self.slot.lock().await.session.clone()
    }

    /// Encoded snapshot of the live session, in the same form that is persisted.
    pub async fn snapshot(&self) -> Result<String, StoreError> {
        encode_snapshot(&self.slot.lock().await.session)
    }

    /// Summary of the persisted session, for a "welcome back" prompt.
    pub async fn saved_session(&self) -> Option<SavedSessionSummary> {
        self.persistence
            .load_snapshot()
            .await
            .map(|s| SavedSessionSummary::from_session(&s, &self.config))
    }

    // ── Upload & contact info ──────────────────────────────────────────────

    /// Extracts text from a document, asks the provider for contact details
    /// and continues as [`submit_upload`](Self::submit_upload).
    pub async fn upload_document(&self, doc: UploadedDocument) -> Result<SessionView, InterviewError> {
        let epoch = self.begin(&[Phase::Upload, Phase::CollectInfo]).await?;

        let text = match self.extractor.extract(&doc).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Extraction failed for '{}': {}", doc.file_name, e);
                self.release(epoch).await;
                return Err(e.into());
            }
        };
        info!("Extracted {} chars from '{}'", text.len(), doc.file_name);

        let mut warnings = Vec::new();
        let contact = match self.provider.extract_contact_info(&text).await {
            Ok(contact) => contact,
            Err(e) => {
                warn!("Contact extraction failed ({:?}): {}", e.kind, e.message);
                warnings.push(provider_warning(
                    Stage::ContactExtraction,
                    &e,
                    "Could not read contact details. Please enter them manually.",
                ));
                ContactInfo::default()
            }
        };

        self.apply_upload(epoch, CandidateProfile::from_contact(contact, text), warnings)
            .await
    }

    /// Accepts extracted contact data. A complete profile starts the interview
    /// immediately; anything else waits in `CollectInfo`.
    pub async fn submit_upload(&self, profile: CandidateProfile) -> Result<SessionView, InterviewError> {
        let epoch = self.begin(&[Phase::Upload, Phase::CollectInfo]).await?;
        self.apply_upload(epoch, profile, Vec::new()).await
    }

    async fn apply_upload(
        &self,
        epoch: u64,
        profile: CandidateProfile,
        mut warnings: Vec<Warning>,
    ) -> Result<SessionView, InterviewError> {
        let mut slot = self.slot.lock().await;
        self.ensure_current(&slot, epoch)?;
        self.transition(&mut slot, SessionEvent::UploadProcessed { profile })?;
        slot.result = None;
        slot.pending_error = None;
        info!("Session {} created in phase {}", slot.session.id, slot.session.phase);

        if slot.session.phase == Phase::CollectInfo {
            slot.busy = false;
            slot.warnings = warnings;
            return Ok(self.view_of(&slot));
        }

        self.persist(&slot, &mut warnings).await;
        drop(slot);
        self.run_next_question(epoch, warnings).await
    }

    /// Accepts contact data typed by the candidate. Fails with the list of
    /// missing fields and leaves the session untouched when incomplete.
    pub async fn submit_manual_info(&self, contact: ContactInfo) -> Result<SessionView, InterviewError> {
        let mut warnings = Vec::new();
        let epoch = {
            let mut slot = self.slot.lock().await;
            if slot.busy {
                return Err(InterviewError::Busy);
            }
            let profile = CandidateProfile::from_contact(contact, String::new());
            let next = machine::apply(
                &slot.session,
                SessionEvent::ManualInfoSubmitted { profile },
                self.config.question_count(),
            )?;
            slot.session = next;
            slot.result = None;
            slot.pending_error = None;
            slot.busy = true;
            info!("Contact details accepted for session {}", slot.session.id);
            self.persist(&slot, &mut warnings).await;
            slot.epoch
        };
        self.run_next_question(epoch, warnings).await
    }

    // ── Answering ──────────────────────────────────────────────────────────

    /// Records the current content of the answer field.
    pub async fn update_draft(&self, text: String) -> Result<SessionView, InterviewError> {
        let mut slot = self.slot.lock().await;
        self.transition(&mut slot, SessionEvent::DraftUpdated { text })?;
        let mut warnings = Vec::new();
        self.persist(&slot, &mut warnings).await;
        if !warnings.is_empty() {
            slot.warnings = warnings;
        }
        Ok(self.view_of(&slot))
    }

    pub async fn submit_answer(&self, text: String) -> Result<SessionView, InterviewError> {
        let (epoch, remaining) = {
            let mut slot = self.slot.lock().await;
            require_phase(&slot.session, &[Phase::Interviewing])?;
            if slot.busy {
                return Err(InterviewError::Busy);
            }
            if !is_valid_answer(&text) {
                return Err(InterviewError::EmptyAnswer);
            }
            if slot.session.current_question.is_none() {
                return Err(InterviewError::NoActiveQuestion);
            }

            // Stop the clock before anything else can observe it.
            let remaining = slot
                .cancel_timer()
                .unwrap_or(slot.session.time_remaining);
            self.transition(&mut slot, SessionEvent::Tick { remaining })?;
            slot.busy = true;
            slot.pending_error = None;
            (slot.epoch, remaining)
        };

        self.resolve_current(epoch, text, Origin::Manual { remaining }).await
    }

    /// Resolves the current question as timed out, submitting the draft answer.
    /// Ignored while a provider call is outstanding or no question is active.
    pub async fn on_timer_expiry(&self) -> Result<SessionView, InterviewError> {
        self.handle_expiry(None).await
    }

    async fn handle_expiry(&self, ticket: Option<u64>) -> Result<SessionView, InterviewError> {
        let (epoch, answer) = {
            let mut slot = self.slot.lock().await;
            if slot.session.phase != Phase::Interviewing
                || slot.busy
                || slot.session.current_question.is_none()
            {
                debug!("Ignoring timer expiry for session {}", slot.session.id);
                return Ok(self.view_of(&slot));
            }
            if let Some(ticket) = ticket {
                if slot.timer.as_ref().map(|t| t.ticket()) != Some(ticket) {
                    debug!("Ignoring expiry from replaced timer {}", ticket);
                    return Ok(self.view_of(&slot));
                }
            }

            slot.cancel_timer();
            self.transition(&mut slot, SessionEvent::Tick { remaining: 0 })?;
            let answer = if is_valid_answer(&slot.session.draft_answer) {
                slot.session.draft_answer.clone()
            } else {
                EXPIRED_PLACEHOLDER.to_string()
            };
            slot.busy = true;
            slot.pending_error = None;
            info!(
                "Time expired on question {} of session {}",
                slot.session.current_question_index + 1,
                slot.session.id
            );
            (slot.epoch, answer)
        };

        self.resolve_current(epoch, answer, Origin::Expiry).await
    }

    async fn resolve_current(
        &self,
        epoch: u64,
        answer: String,
        origin: Origin,
    ) -> Result<SessionView, InterviewError> {
        let mut warnings = Vec::new();

        let (question, question_slot) = {
            let mut slot = self.slot.lock().await;
            self.ensure_current(&slot, epoch)?;
            let index = slot.session.current_question_index;
            match (slot.session.current_question.clone(), self.config.slot(index)) {
                (Some(question), Some(question_slot)) => (question, question_slot),
                _ => {
                    slot.busy = false;
                    return Err(InterviewError::NoActiveQuestion);
                }
            }
        };

        let time_used = match origin {
            Origin::Manual { remaining } => question_slot.time_limit.saturating_sub(remaining),
            Origin::Expiry => question_slot.time_limit,
        };

        match self
            .evaluator
            .evaluate(&question, &answer, question_slot.difficulty)
            .await
        {
            Ok(evaluation) => {
                if evaluation.quota_fallback {
                    warnings.push(Warning::QuotaExceeded {
                        stage: Stage::Evaluation,
                    });
                }
                let record = QuestionRecord {
                    question_number: question_slot.question_number,
                    difficulty: question_slot.difficulty,
                    question,
                    answer,
                    score: evaluation.score,
                    feedback: evaluation.feedback,
                    time_used_seconds: time_used,
                };

                {
                    let mut slot = self.slot.lock().await;
                    self.ensure_current(&slot, epoch)?;
                    self.transition(&mut slot, SessionEvent::AnswerResolved { record })?;
                    info!(
                        "Question {}/{} scored {} ({}s used)",
                        question_slot.question_number,
                        self.config.question_count(),
                        evaluation.score,
                        time_used
                    );
                    self.persist(&slot, &mut warnings).await;
                }
                self.run_next_question(epoch, warnings).await
            }
            Err(e) => {
                let mut slot = self.slot.lock().await;
                self.ensure_current(&slot, epoch)?;
                slot.busy = false;
                slot.pending_error = Some(format!("Failed to evaluate answer: {}", e.message));
                if let Origin::Manual { remaining } = origin {
                    if remaining > 0 {
                        self.arm_timer(&mut slot, question_slot.time_limit, remaining);
                    }
                }
                self.persist(&slot, &mut warnings).await;
                slot.warnings = warnings;
                Err(InterviewError::Evaluation(e))
            }
        }
    }

    // ── Question loop ──────────────────────────────────────────────────────

    /// Generates the question at the current index, or completes the interview
    /// when the schedule is exhausted. Expects `busy` to be set for `epoch`.
    async fn run_next_question(
        &self,
        epoch: u64,
        mut warnings: Vec<Warning>,
    ) -> Result<SessionView, InterviewError> {
        let next = {
            let slot = self.slot.lock().await;
            self.ensure_current(&slot, epoch)?;
            self.config
                .slot(slot.session.current_question_index)
                .map(|question_slot| {
                    (
                        question_slot,
                        slot.session.candidate.clone(),
                        slot.session.prior_questions(),
                    )
                })
        };

        let Some((question_slot, profile, prior)) = next else {
            return self.complete(epoch, warnings).await;
        };

        let generated = self
            .orchestrator
            .generate(question_slot, &profile, &prior)
            .await;
        if let Some(e) = &generated.fallback {
            warnings.push(provider_warning(
                Stage::QuestionGeneration,
                e,
                "Could not generate a tailored question. Using a standard question.",
            ));
        }

        let mut slot = self.slot.lock().await;
        self.ensure_current(&slot, epoch)?;
        self.transition(
            &mut slot,
            SessionEvent::QuestionReady {
                question: generated.question,
                time_limit: generated.time_limit,
            },
        )?;
        slot.busy = false;
        self.persist(&slot, &mut warnings).await;
        self.arm_timer(&mut slot, generated.time_limit, generated.time_limit);
        slot.warnings = warnings;
        Ok(self.view_of(&slot))
    }

    async fn complete(
        &self,
        epoch: u64,
        mut warnings: Vec<Warning>,
    ) -> Result<SessionView, InterviewError> {
        let (profile, records) = {
            let slot = self.slot.lock().await;
            self.ensure_current(&slot, epoch)?;
            (slot.session.candidate.clone(), slot.session.records.clone())
        };

        let question_count = self.config.question_count();
        let total = total_score(&records);
        let percent = final_percent(total, question_count);

        let summary = self.summarizer.summarize(&profile, &records, percent).await;
        if let Some(kind) = summary.fallback {
            warnings.push(match kind {
                ProviderErrorKind::QuotaExceeded => Warning::QuotaExceeded {
                    stage: Stage::Summary,
                },
                ProviderErrorKind::Generic => Warning::ProviderFallback {
                    stage: Stage::Summary,
                    message: "Could not generate a detailed summary.".to_string(),
                },
            });
        }

        let mut slot = self.slot.lock().await;
        self.ensure_current(&slot, epoch)?;
        self.transition(&mut slot, SessionEvent::Completed)?;

        let result = CandidateResult {
            id: slot.session.id,
            candidate: slot.session.candidate.clone(),
            records: slot.session.records.clone(),
            score_percent: percent,
            total_points: total,
            max_points: max_points(question_count),
            ai_summary: summary.text,
            completed_at: Utc::now(),
        };
        if let Err(e) = self.persistence.append_result(&result).await {
            error!("Failed to archive result {}: {}", result.id, e);
            warnings.push(Warning::ArchiveNotSaved);
        }
        self.persistence.clear_snapshot().await;
        info!(
            "Interview {} complete for {}: {}% ({}/{})",
            result.id, result.candidate.name, percent, total, result.max_points
        );

        slot.result = Some(result);
        slot.busy = false;
        slot.warnings = warnings;
        Ok(self.view_of(&slot))
    }

    // ── Resume & reset ─────────────────────────────────────────────────────

    /// Restores a session verbatim, including the remaining time on the open
    /// question. A session saved between questions continues with generation.
    pub async fn resume(&self, session: InterviewSession) -> Result<SessionView, InterviewError> {
        check_invariants(&session, &self.config)?;

        let epoch = {
            let mut slot = self.slot.lock().await;
            slot.cancel_timer();
            slot.epoch += 1;
            slot.busy = false;
            slot.pending_error = None;
            slot.result = None;
            slot.warnings.clear();
            slot.session = session;
            info!(
                "Resumed session {} at question {} with {}s remaining",
                slot.session.id,
                slot.session.current_question_index + 1,
                slot.session.time_remaining
            );

            let mut warnings = Vec::new();
            self.persist(&slot, &mut warnings).await;

            let open = slot
                .session
                .current_question
                .as_ref()
                .and(self.config.slot(slot.session.current_question_index));
            if let Some(question_slot) = open {
                let remaining = slot.session.time_remaining;
                self.arm_timer(&mut slot, question_slot.time_limit, remaining);
                slot.warnings = warnings;
                return Ok(self.view_of(&slot));
            }
            slot.busy = true;
            slot.epoch
        };

        self.run_next_question(epoch, Vec::new()).await
    }

    /// Resumes whatever session is persisted.
    pub async fn resume_saved(&self) -> Result<SessionView, InterviewError> {
        let session = self
            .persistence
            .load_snapshot()
            .await
            .ok_or(InterviewError::NothingToResume)?;
        self.resume(session).await
    }

    /// Discards the active session from any phase. Never waits for in-flight
    /// provider calls; their responses are dropped when they arrive.
    pub async fn reset(&self) -> Result<SessionView, InterviewError> {
        let mut slot = self.slot.lock().await;
        slot.cancel_timer();
        let previous = slot.session.id;
        let was_busy = slot.busy;
        self.transition(&mut slot, SessionEvent::Reset)?;
        slot.epoch += 1;
        slot.busy = false;
        slot.pending_error = None;
        slot.result = None;
        slot.warnings.clear();
        self.persistence.clear_snapshot().await;
        if was_busy {
            info!("Session {} reset with a request in flight", previous);
        } else {
            info!("Session {} reset", previous);
        }
        Ok(self.view_of(&slot))
    }

    // ── Internals ──────────────────────────────────────────────────────────

    /// Marks the session busy for a new operation and returns its epoch.
    async fn begin(&self, allowed: &[Phase]) -> Result<u64, InterviewError> {
        let mut slot = self.slot.lock().await;
        require_phase(&slot.session, allowed)?;
        if slot.busy {
            return Err(InterviewError::Busy);
        }
        slot.busy = true;
        Ok(slot.epoch)
    }

    async fn release(&self, epoch: u64) {
        let mut slot = self.slot.lock().await;
        if slot.epoch == epoch {
            slot.busy = false;
        }
    }

    fn ensure_current(&self, slot: &SessionSlot, epoch: u64) -> Result<(), InterviewError> {
        if slot.epoch == epoch {
            Ok(())
        } else {
            warn!(
                "Discarding provider response for a superseded session (epoch {} != {})",
                epoch, slot.epoch
            );
            Err(InterviewError::Superseded)
        }
    }

    /// Applies `event` to the live session. Clears `busy` on failure.
    fn transition(&self, slot: &mut SessionSlot, event: SessionEvent) -> Result<(), InterviewError> {
        match machine::apply(&slot.session, event, self.config.question_count()) {
            Ok(next) => {
                slot.session = next;
                Ok(())
            }
            Err(e) => {
                slot.busy = false;
                Err(e)
            }
        }
    }

    async fn persist(&self, slot: &SessionSlot, warnings: &mut Vec<Warning>) {
        if slot.session.phase != Phase::Interviewing {
            return;
        }
        if !self.persistence.save_snapshot(&slot.session).await
            && !warnings.contains(&Warning::SnapshotNotSaved)
        {
            warnings.push(Warning::SnapshotNotSaved);
        }
    }

    fn arm_timer(&self, slot: &mut SessionSlot, limit: u32, remaining: u32) {
        slot.cancel_timer();
        slot.next_ticket += 1;
        let listener = Arc::new(TimerBridge {
            controller: self.this.clone(),
        });
        slot.timer = Some(CountdownTimer::start(slot.next_ticket, limit, remaining, listener));
    }

    async fn record_tick(&self, ticket: u64, remaining: u32) {
        let mut slot = self.slot.lock().await;
        if slot.busy || slot.timer.as_ref().map(|t| t.ticket()) != Some(ticket) {
            return;
        }
        if self
            .transition(&mut slot, SessionEvent::Tick { remaining })
            .is_ok()
        {
            let mut warnings = Vec::new();
            self.persist(&slot, &mut warnings).await;
        }
    }

    fn view_of(&self, slot: &SessionSlot) -> SessionView {
        SessionView::build(
            &slot.session,
            &self.config,
            slot.busy,
            slot.pending_error.clone(),
            slot.result.as_ref(),
            &slot.warnings,
        )
    }
}

fn provider_warning(stage: Stage, e: &ProviderError, message: &str) -> Warning {
    if e.is_quota_exceeded() {
        Warning::QuotaExceeded { stage }
    } else {
        Warning::ProviderFallback {
            stage,
            message: message.to_string(),
        }
    }
}

/// Routes countdown callbacks back into the controller without keeping it alive.
struct TimerBridge {
    controller: Weak<SessionController>,
}

#[async_trait]
impl CountdownListener for TimerBridge {
    async fn on_tick(&self, ticket: u64, remaining: u32) {
        if let Some(controller) = self.controller.upgrade() {
            controller.record_tick(ticket, remaining).await;
        }
    }

    async fn on_expiry(&self, ticket: u64) {
        if let Some(controller) = self.controller.upgrade() {
            if let Err(e) = controller.handle_expiry(Some(ticket)).await {
                warn!("Timed-out question could not be resolved: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::documents::ExtractionError;
    use crate::interview::evaluator::QUOTA_FALLBACK_FEEDBACK;
    use crate::interview::models::Difficulty;
    use crate::interview::orchestrator::TierLimits;
    use crate::interview::testing::{FailingStore, ScriptedProvider, StaticExtractor};
    use crate::interview::validation::MissingField;
    use crate::store::MemoryStore;

    fn complete_profile() -> CandidateProfile {
        CandidateProfile {
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            phone: "555-0100".to_string(),
            resume_text: "Five years of React and Node.js.".to_string(),
        }
    }

    fn short_config() -> InterviewConfig {
        InterviewConfig {
            schedule: vec![Difficulty::Easy, Difficulty::Medium, Difficulty::Hard],
            limits: TierLimits::default(),
        }
    }

    struct Harness {
        provider: Arc<ScriptedProvider>,
        extractor: Arc<StaticExtractor>,
        store: Arc<MemoryStore>,
        controller: Arc<SessionController>,
    }

    fn harness(config: InterviewConfig) -> Harness {
        let provider = Arc::new(ScriptedProvider::new());
        let extractor = Arc::new(StaticExtractor::new(
            "Ada Lovelace\nada@example.com\n555-0100",
        ));
        let store = Arc::new(MemoryStore::new());
        let controller = SessionController::new(
            provider.clone(),
            extractor.clone(),
            store.clone(),
            config,
        );
        Harness {
            provider,
            extractor,
            store,
            controller,
        }
    }

    async fn settle() {
        for _ in 0..50 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_complete_upload_goes_straight_to_first_question() {
        let h = harness(InterviewConfig::default());

        let view = h.controller.submit_upload(complete_profile()).await.unwrap();

        assert_eq!(view.phase, Phase::Interviewing);
        let q = view.question.unwrap();
        assert_eq!(q.question_number, 1);
        assert_eq!(q.difficulty, Difficulty::Easy);
        assert_eq!(q.time_remaining, 45);
        assert_eq!(q.text, "Question 1?");
        assert!(!view.busy);
        assert!(h.controller.saved_session().await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_incomplete_upload_waits_for_manual_info() {
        let h = harness(InterviewConfig::default());
        let mut partial = complete_profile();
        partial.phone.clear();

        let view = h.controller.submit_upload(partial).await.unwrap();
        assert_eq!(view.phase, Phase::CollectInfo);
        assert_eq!(view.candidate.email, "ada@example.com");
        assert!(view.question.is_none());

        let err = h
            .controller
            .submit_manual_info(ContactInfo {
                name: "Ada Lovelace".to_string(),
                email: "ada-at-example".to_string(),
                phone: "555-0100".to_string(),
            })
            .await
            .unwrap_err();
        match err {
            InterviewError::Validation { missing_fields } => {
                assert_eq!(missing_fields, vec![MissingField::ValidEmail])
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(h.controller.session().await.phase, Phase::CollectInfo);

        let view = h
            .controller
            .submit_manual_info(ContactInfo {
                name: "Ada Lovelace".to_string(),
                email: "ada@example.com".to_string(),
                phone: "555-0100".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(view.phase, Phase::Interviewing);
        assert!(view.question.is_some());
        assert_eq!(
            h.controller.session().await.candidate.resume_text,
            "Five years of React and Node.js."
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_quota_evaluation_assigns_default_and_advances() {
        let h = harness(InterviewConfig::default());
        h.controller.submit_upload(complete_profile()).await.unwrap();
        h.provider
            .push_evaluation(Err(ProviderError::quota("429 Too Many Requests")));

        let view = h
            .controller
            .submit_answer("Components are functions of props.".to_string())
            .await
            .unwrap();

        let session = h.controller.session().await;
        assert_eq!(session.current_question_index, 1);
        assert_eq!(session.records[0].score, 5);
        assert_eq!(session.records[0].feedback, QUOTA_FALLBACK_FEEDBACK);
        assert!(view.warnings.iter().any(|w| w.warning
            == Warning::QuotaExceeded {
                stage: Stage::Evaluation
            }));
        assert_eq!(view.question.unwrap().question_number, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_with_empty_field_records_placeholder_and_full_limit() {
        let h = harness(InterviewConfig::default());
        h.controller.submit_upload(complete_profile()).await.unwrap();

        tokio::time::sleep(Duration::from_millis(45_500)).await;
        settle().await;

        let session = h.controller.session().await;
        assert_eq!(session.records.len(), 1);
        assert_eq!(session.records[0].answer, EXPIRED_PLACEHOLDER);
        assert_eq!(session.records[0].time_used_seconds, 45);
        assert_eq!(session.current_question_index, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_submits_draft_verbatim() {
        let h = harness(InterviewConfig::default());
        h.controller.submit_upload(complete_profile()).await.unwrap();
        h.controller
            .update_draft("useState holds local state ".to_string())
            .await
            .unwrap();

        let view = h.controller.on_timer_expiry().await.unwrap();

        let session = h.controller.session().await;
        assert_eq!(session.records[0].answer, "useState holds local state ");
        assert_eq!(session.records[0].time_used_seconds, 45);
        assert_eq!(view.question.unwrap().question_number, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_submission_records_elapsed_time() {
        let h = harness(InterviewConfig::default());
        h.controller.submit_upload(complete_profile()).await.unwrap();

        tokio::time::sleep(Duration::from_millis(12_500)).await;
        settle().await;
        h.controller
            .submit_answer("Props flow down.".to_string())
            .await
            .unwrap();

        let session = h.controller.session().await;
        assert_eq!(session.records[0].time_used_seconds, 12);
        assert_eq!(session.records[0].score, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_question_resolved_completes_and_archives() {
        let h = harness(short_config());
        h.controller.submit_upload(complete_profile()).await.unwrap();

        let mut view = None;
        for n in 1..=3 {
            view = Some(
                h.controller
                    .submit_answer(format!("Answer {n}"))
                    .await
                    .unwrap(),
            );
        }
        let view = view.unwrap();

        assert_eq!(view.phase, Phase::Complete);
        let result = view.result.unwrap().result;
        assert_eq!(result.records.len(), 3);
        assert_eq!(result.total_points, 21);
        assert_eq!(result.max_points, 30);
        assert_eq!(result.score_percent, 70);
        assert_eq!(result.ai_summary, "Strong candidate. Recommend.");

        let archive = h.controller.persistence().load_archive().await;
        assert_eq!(archive.len(), 1);
        assert_eq!(archive[0].id, result.id);
        assert!(h.controller.saved_session().await.is_none());

        let err = h
            .controller
            .submit_answer("late".to_string())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            InterviewError::InvalidPhase {
                actual: Phase::Complete
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_prior_questions_are_passed_to_generation() {
        let h = harness(short_config());
        h.controller.submit_upload(complete_profile()).await.unwrap();
        h.controller.submit_answer("a".to_string()).await.unwrap();

        let calls = h.provider.question_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1], (2, vec!["Question 1?".to_string()]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_generic_evaluation_failure_keeps_question_open_and_resumes_clock() {
        let h = harness(InterviewConfig::default());
        h.controller.submit_upload(complete_profile()).await.unwrap();

        tokio::time::sleep(Duration::from_millis(10_500)).await;
        settle().await;
        h.provider
            .push_evaluation(Err(ProviderError::generic("upstream connect error")));

        let err = h
            .controller
            .submit_answer("first try".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, InterviewError::Evaluation(_)));

        let view = h.controller.view().await;
        assert!(!view.busy);
        assert!(view.pending_error.is_some());
        assert_eq!(view.progress.answered, 0);
        assert_eq!(view.question.as_ref().unwrap().time_remaining, 35);

        tokio::time::sleep(Duration::from_millis(5_200)).await;
        settle().await;
        assert_eq!(h.controller.session().await.time_remaining, 30);

        h.controller
            .submit_answer("second try".to_string())
            .await
            .unwrap();
        let session = h.controller.session().await;
        assert_eq!(session.records.len(), 1);
        assert_eq!(session.records[0].answer, "second try");
        assert_eq!(session.records[0].time_used_seconds, 15);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_cannot_fire_while_evaluation_in_flight() {
        let h = harness(InterviewConfig::default());
        h.controller.submit_upload(complete_profile()).await.unwrap();
        let gate = h.provider.gate_evaluations();

        let controller = h.controller.clone();
        let submit =
            tokio::spawn(async move { controller.submit_answer("typed".to_string()).await });
        while h.provider.evaluation_calls().is_empty() {
            tokio::task::yield_now().await;
        }

        assert!(matches!(
            h.controller.submit_answer("again".to_string()).await,
            Err(InterviewError::Busy)
        ));
        h.controller.on_timer_expiry().await.unwrap();

        tokio::time::sleep(Duration::from_secs(120)).await;
        settle().await;
        gate.add_permits(1);
        submit.await.unwrap().unwrap();

        let session = h.controller.session().await;
        assert_eq!(session.records.len(), 1);
        assert_eq!(session.records[0].answer, "typed");
        assert_eq!(h.provider.evaluation_calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_discards_late_evaluation() {
        let h = harness(InterviewConfig::default());
        h.controller.submit_upload(complete_profile()).await.unwrap();
        let gate = h.provider.gate_evaluations();

        let controller = h.controller.clone();
        let submit =
            tokio::spawn(async move { controller.submit_answer("typed".to_string()).await });
        while h.provider.evaluation_calls().is_empty() {
            tokio::task::yield_now().await;
        }

        let view = h.controller.reset().await.unwrap();
        assert_eq!(view.phase, Phase::Upload);
        assert!(!view.busy);

        gate.add_permits(1);
        let late = submit.await.unwrap();
        assert!(matches!(late, Err(InterviewError::Superseded)));

        let session = h.controller.session().await;
        assert_eq!(session.phase, Phase::Upload);
        assert!(session.records.is_empty());
        assert!(h.controller.saved_session().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_resume_then_snapshot_is_byte_identical() {
        let h = harness(InterviewConfig::default());
        h.controller.submit_upload(complete_profile()).await.unwrap();
        h.controller.submit_answer("first".to_string()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(7_500)).await;
        settle().await;
        h.controller
            .update_draft("half an answer".to_string())
            .await
            .unwrap();
        let saved = h.controller.snapshot().await.unwrap();

        let restarted = SessionController::new(
            h.provider.clone(),
            Arc::new(StaticExtractor::new("unused")),
            h.store.clone(),
            InterviewConfig::default(),
        );
        let summary = restarted.saved_session().await.unwrap();
        assert_eq!(summary.candidate_name, "Ada Lovelace");
        assert_eq!(summary.question_number, 2);
        assert_eq!(summary.time_remaining, 38);

        let view = restarted.resume_saved().await.unwrap();
        assert_eq!(view.question.unwrap().time_remaining, 38);
        assert_eq!(restarted.snapshot().await.unwrap(), saved);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resume_rejects_inconsistent_snapshot() {
        let h = harness(InterviewConfig::default());
        let mut session = InterviewSession::new();
        session.phase = Phase::Interviewing;
        session.current_question_index = 2;

        let err = h.controller.resume(session).await.unwrap_err();
        assert!(matches!(err, InterviewError::InvalidSnapshot(_)));
        assert!(matches!(
            h.controller.resume_saved().await,
            Err(InterviewError::NothingToResume)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_resume_rejects_out_of_range_scores_and_time() {
        let h = harness(InterviewConfig::default());
        let mut session = InterviewSession::new();
        session.phase = Phase::Interviewing;
        session.candidate = complete_profile();
        session.records.push(QuestionRecord {
            question_number: 1,
            difficulty: Difficulty::Easy,
            question: "Question 1?".to_string(),
            answer: "answer".to_string(),
            score: 250,
            feedback: "ok".to_string(),
            time_used_seconds: 5,
        });
        session.current_question_index = 1;
        session.total_score = 250;
        session.current_question = Some("Question 2?".to_string());
        session.time_remaining = 9999;

        let err = h.controller.resume(session.clone()).await.unwrap_err();
        assert!(matches!(err, InterviewError::InvalidSnapshot(_)));

        session.records[0].score = 7;
        session.total_score = 7;
        let err = h.controller.resume(session.clone()).await.unwrap_err();
        assert!(matches!(err, InterviewError::InvalidSnapshot(_)));
        assert_eq!(h.controller.view().await.phase, Phase::Upload);

        session.time_remaining = 30;
        let view = h.controller.resume(session).await.unwrap();
        assert_eq!(view.question.unwrap().time_remaining, 30);
        assert_eq!(view.progress.total_score, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_answer_is_rejected_without_side_effects() {
        let h = harness(InterviewConfig::default());
        h.controller.submit_upload(complete_profile()).await.unwrap();

        let err = h
            .controller
            .submit_answer("   \n".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, InterviewError::EmptyAnswer));
        assert!(h.provider.evaluation_calls().is_empty());
        assert_eq!(h.controller.view().await.question.unwrap().time_remaining, 45);
    }

    #[tokio::test(start_paused = true)]
    async fn test_upload_with_quota_contact_extraction_collects_info() {
        let h = harness(InterviewConfig::default());
        h.provider
            .set_contact(Err(ProviderError::quota("quota exceeded")));

        let view = h
            .controller
            .upload_document(UploadedDocument::new("cv.pdf", None, b"%PDF".to_vec()))
            .await
            .unwrap();

        assert_eq!(view.phase, Phase::CollectInfo);
        assert!(view.candidate.has_resume);
        assert!(view.warnings.iter().any(|w| w.warning
            == Warning::QuotaExceeded {
                stage: Stage::ContactExtraction
            }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_extraction_failure_blocks_upload_until_retry() {
        let h = harness(InterviewConfig::default());
        h.extractor.fail_next(ExtractionError::EmptyOrImageOnly);

        let err = h
            .controller
            .upload_document(UploadedDocument::new("scan.pdf", None, b"%PDF".to_vec()))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            InterviewError::Extraction(ExtractionError::EmptyOrImageOnly)
        ));

        let view = h.controller.view().await;
        assert_eq!(view.phase, Phase::Upload);
        assert!(!view.busy);
        assert!(h.controller.saved_session().await.is_none());

        let view = h
            .controller
            .upload_document(UploadedDocument::new("cv.pdf", None, b"%PDF".to_vec()))
            .await
            .unwrap();
        assert_eq!(view.phase, Phase::Interviewing);
        assert_eq!(view.candidate.name, "Ada Lovelace");
    }

    #[tokio::test(start_paused = true)]
    async fn test_upload_with_extracted_contact_starts_interview() {
        let h = harness(InterviewConfig::default());

        let view = h
            .controller
            .upload_document(UploadedDocument::new("cv.docx", None, b"PK".to_vec()))
            .await
            .unwrap();

        assert_eq!(view.phase, Phase::Interviewing);
        assert_eq!(view.candidate.name, "Ada Lovelace");
    }

    #[tokio::test(start_paused = true)]
    async fn test_question_generation_failure_uses_fallback_with_warning() {
        let h = harness(InterviewConfig::default());
        h.provider.fail_questions(ProviderErrorKind::QuotaExceeded);

        let view = h.controller.submit_upload(complete_profile()).await.unwrap();

        assert_eq!(
            view.question.unwrap().text,
            crate::interview::orchestrator::FALLBACK_QUESTION
        );
        assert_eq!(view.warnings.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_failure_does_not_block_transition() {
        let provider = Arc::new(ScriptedProvider::new());
        let controller = SessionController::new(
            provider,
            Arc::new(StaticExtractor::new("text")),
            Arc::new(FailingStore),
            InterviewConfig::default(),
        );

        let view = controller.submit_upload(complete_profile()).await.unwrap();

        assert_eq!(view.phase, Phase::Interviewing);
        assert!(view
            .warnings
            .iter()
            .any(|w| w.warning == Warning::SnapshotNotSaved));
    }
}
