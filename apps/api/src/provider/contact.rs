//! Deterministic contact extraction used to backfill what the model misses.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::interview::models::ContactInfo;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("valid email regex")
});

static PHONE_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\+?1?[-.\s]?\(?([0-9]{3})\)?[-.\s]?([0-9]{3})[-.\s]?([0-9]{4})",
        r"\(?([0-9]{3})\)?[-.\s]?([0-9]{3})[-.\s]?([0-9]{4})",
        r"\+[1-9][0-9]{3,14}",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid phone regex"))
    .collect()
});

static PHONE_LIKE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{3}[-.\s]?\d{3}[-.\s]?\d{4}").expect("valid phone-like regex"));

static NAME_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z\s.'-]+$").expect("valid name regex"));

/// Number of leading non-empty lines considered when guessing the name.
const NAME_SCAN_LINES: usize = 5;

pub fn extract_with_regex(text: &str) -> ContactInfo {
    let mut result = ContactInfo::default();
    if text.trim().is_empty() {
        return result;
    }

    if let Some(m) = EMAIL_RE.find(text) {
        result.email = m.as_str().to_string();
    }

    for re in PHONE_RES.iter() {
        if let Some(m) = re.find(text) {
            result.phone = m
                .as_str()
                .chars()
                .filter(|c| c.is_ascii_digit() || matches!(c, '+' | '(' | ')' | '-'))
                .collect();
            break;
        }
    }

    result.name = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .take(NAME_SCAN_LINES)
        .find(|line| looks_like_name(line))
        .map(String::from)
        .unwrap_or_default();

    result
}

fn looks_like_name(line: &str) -> bool {
    let lower = line.to_lowercase();
    !line.contains('@')
        && !PHONE_LIKE_RE.is_match(line)
        && !lower.contains("resume")
        && !lower.contains("curriculum")
        && line.len() > 2
        && line.len() < 50
        && NAME_LINE_RE.is_match(line)
}

/// Model answer wins field by field; the heuristic fills the blanks.
pub fn merge_contact(primary: ContactInfo, fallback: ContactInfo) -> ContactInfo {
    fn pick(a: String, b: String) -> String {
        let a = a.trim().to_string();
        if a.is_empty() {
            b
        } else {
            a
        }
    }
    ContactInfo {
        name: pick(primary.name, fallback.name),
        email: pick(primary.email, fallback.email),
        phone: pick(primary.phone, fallback.phone),
    }
}
