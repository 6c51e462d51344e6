//! In-process collaborators for controller and component tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::documents::{ExtractionError, TextExtractor, UploadedDocument};
use crate::interview::models::{CandidateProfile, ContactInfo, Difficulty, QuestionRecord};
use crate::provider::{AiProvider, ProviderError, ProviderErrorKind};
use crate::store::{KeyValueStore, StoreError};

const DEFAULT_VERDICT: &str = "Score: 7\nFeedback: Solid answer.";
const DEFAULT_SUMMARY: &str = "Strong candidate. Recommend.";

/// Provider with scripted answers. Questions are `"Question {n}?"`; evaluations
/// pop from a queue and default to a 7/10 verdict.
pub struct ScriptedProvider {
    contact: Mutex<Result<ContactInfo, ProviderError>>,
    question_failure: Mutex<Option<ProviderErrorKind>>,
    evaluations: Mutex<VecDeque<Result<String, ProviderError>>>,
    summary: Mutex<Result<String, ProviderError>>,
    question_calls: Mutex<Vec<(u32, Vec<String>)>>,
    evaluation_calls: Mutex<Vec<(String, String)>>,
    evaluation_gate: Mutex<Option<Arc<Semaphore>>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            contact: Mutex::new(Ok(ContactInfo {
                name: "Ada Lovelace".to_string(),
                email: "ada@example.com".to_string(),
                phone: "555-0100".to_string(),
            })),
            question_failure: Mutex::new(None),
            evaluations: Mutex::new(VecDeque::new()),
            summary: Mutex::new(Ok(DEFAULT_SUMMARY.to_string())),
            question_calls: Mutex::new(Vec::new()),
            evaluation_calls: Mutex::new(Vec::new()),
            evaluation_gate: Mutex::new(None),
        }
    }

    pub fn set_contact(&self, contact: Result<ContactInfo, ProviderError>) {
        *self.contact.lock().unwrap() = contact;
    }

    pub fn fail_questions(&self, kind: ProviderErrorKind) {
        *self.question_failure.lock().unwrap() = Some(kind);
    }

    pub fn push_evaluation(&self, verdict: Result<String, ProviderError>) {
        self.evaluations.lock().unwrap().push_back(verdict);
    }

    pub fn set_summary(&self, summary: Result<String, ProviderError>) {
        *self.summary.lock().unwrap() = summary;
    }

    /// Holds every evaluation until a permit is added to the returned semaphore.
    pub fn gate_evaluations(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.evaluation_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn question_calls(&self) -> Vec<(u32, Vec<String>)> {
        self.question_calls.lock().unwrap().clone()
    }

    pub fn evaluation_calls(&self) -> Vec<(String, String)> {
        self.evaluation_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AiProvider for ScriptedProvider {
    async fn extract_contact_info(&self, _resume_text: &str) -> Result<ContactInfo, ProviderError> {
        self.contact.lock().unwrap().clone()
    }

    async fn generate_question(
        &self,
        _difficulty: Difficulty,
        question_number: u32,
        _resume_text: &str,
        prior_questions: &[String],
    ) -> Result<String, ProviderError> {
        self.question_calls
            .lock()
            .unwrap()
            .push((question_number, prior_questions.to_vec()));
        match *self.question_failure.lock().unwrap() {
            Some(ProviderErrorKind::QuotaExceeded) => Err(ProviderError::quota("quota exceeded")),
            Some(ProviderErrorKind::Generic) => Err(ProviderError::generic("bad gateway")),
            None => Ok(format!("Question {question_number}?")),
        }
    }

    async fn evaluate_answer(
        &self,
        question: &str,
        answer: &str,
        _difficulty: Difficulty,
    ) -> Result<String, ProviderError> {
        self.evaluation_calls
            .lock()
            .unwrap()
            .push((question.to_string(), answer.to_string()));
        let gate = self.evaluation_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            let _permit = gate.acquire().await;
        }
        self.evaluations
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(DEFAULT_VERDICT.to_string()))
    }

    async fn generate_summary(
        &self,
        _profile: &CandidateProfile,
        _records: &[QuestionRecord],
        _final_percent: u32,
    ) -> Result<String, ProviderError> {
        self.summary.lock().unwrap().clone()
    }
}

/// Store whose every operation fails.
pub struct FailingStore;

fn unavailable() -> StoreError {
    StoreError::Io {
        context: "test store".to_string(),
        source: std::io::Error::new(std::io::ErrorKind::Other, "store unavailable"),
    }
}

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(unavailable())
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(unavailable())
    }

    async fn remove(&self, _key: &str) -> Result<(), StoreError> {
        Err(unavailable())
    }

    fn backend(&self) -> &'static str {
        "failing"
    }
}

/// Extractor that returns fixed text for any document, unless a failure has
/// been queued with [`fail_next`](Self::fail_next).
pub struct StaticExtractor {
    text: String,
    failures: Mutex<VecDeque<ExtractionError>>,
}

impl StaticExtractor {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            failures: Mutex::new(VecDeque::new()),
        }
    }

    pub fn fail_next(&self, error: ExtractionError) {
        self.failures.lock().unwrap().push_back(error);
    }
}

#[async_trait]
impl TextExtractor for StaticExtractor {
    async fn extract(&self, _doc: &UploadedDocument) -> Result<String, ExtractionError> {
        match self.failures.lock().unwrap().pop_front() {
            Some(error) => Err(error),
            None => Ok(self.text.clone()),
        }
    }
}
