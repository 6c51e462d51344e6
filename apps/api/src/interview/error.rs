use thiserror::Error;

use crate::documents::ExtractionError;
use crate::interview::models::Phase;
use crate::interview::validation::{describe_missing, MissingField};
use crate::provider::ProviderError;

/// Everything an interview entry point can refuse or fail with.
///
/// Quota exhaustion never shows up here: every call site substitutes its
/// fallback and reports a warning on the view instead.
#[derive(Debug, Error)]
pub enum InterviewError {
    #[error("{0}")]
    Extraction(#[from] ExtractionError),

    #[error("Please fill in the missing fields: {}", describe_missing(.missing_fields))]
    Validation { missing_fields: Vec<MissingField> },

    /// Non-quota evaluation failure. No record was produced; the question stays open.
    #[error("Failed to evaluate answer: {0}")]
    Evaluation(ProviderError),

    #[error("Not allowed while the session is in phase '{actual}'")]
    InvalidPhase { actual: Phase },

    #[error("Another request is still in progress")]
    Busy,

    #[error("Answer must not be empty")]
    EmptyAnswer,

    #[error("No question is currently active")]
    NoActiveQuestion,

    /// The session was reset or replaced while this request was waiting on the provider.
    #[error("The session changed while the request was in progress")]
    Superseded,

    #[error("No saved session to resume")]
    NothingToResume,

    #[error("Saved session is not resumable: {0}")]
    InvalidSnapshot(String),
}
