use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::interview::models::CandidateProfile;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// A contact field that blocks the CollectInfo → Interviewing transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingField {
    Name,
    Email,
    /// Email present but not of the form local@domain.tld
    ValidEmail,
    Phone,
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MissingField::Name => "Name",
            MissingField::Email => "Email",
            MissingField::ValidEmail => "Valid Email",
            MissingField::Phone => "Phone",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileValidation {
    pub is_valid: bool,
    pub missing_fields: Vec<MissingField>,
}

/// Checks that name, email and phone are present and the email is well-formed.
/// Fields are reported in form order: name, email, phone.
pub fn validate_profile(profile: &CandidateProfile) -> ProfileValidation {
    let mut missing_fields = Vec::new();

    if profile.name.trim().is_empty() {
        missing_fields.push(MissingField::Name);
    }

    if profile.email.trim().is_empty() {
        missing_fields.push(MissingField::Email);
    } else if !is_valid_email(&profile.email) {
        missing_fields.push(MissingField::ValidEmail);
    }

    if profile.phone.trim().is_empty() {
        missing_fields.push(MissingField::Phone);
    }

    ProfileValidation {
        is_valid: missing_fields.is_empty(),
        missing_fields,
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

/// An answer counts only if it has at least one non-whitespace character.
pub fn is_valid_answer(answer: &str) -> bool {
    !answer.trim().is_empty()
}

/// Joins missing fields for user-facing messages: "Name, Valid Email".
pub fn describe_missing(fields: &[MissingField]) -> String {
    fields
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
