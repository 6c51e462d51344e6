//! Read model over the completed-candidate archive: search, sort, stats.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::interview::models::CandidateResult;
use crate::interview::scoring::{score_category, ScoreCategory, QUALIFIED_PERCENTAGE};

pub mod handlers;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    #[default]
    ScoreDesc,
    ScoreAsc,
    NameAsc,
    NameDesc,
    DateDesc,
    DateAsc,
}

/// One row of the candidate list.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub score_percent: u32,
    pub category: ScoreCategory,
    pub questions_answered: usize,
    pub completed_at: DateTime<Utc>,
}

impl From<&CandidateResult> for CandidateSummary {
    fn from(r: &CandidateResult) -> Self {
        Self {
            id: r.id,
            name: r.candidate.name.clone(),
            email: r.candidate.email.clone(),
            phone: r.candidate.phone.clone(),
            score_percent: r.score_percent,
            category: score_category(r.score_percent),
            questions_answered: r.records.len(),
            completed_at: r.completed_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_candidates: usize,
    /// Candidates scoring at least [`QUALIFIED_PERCENTAGE`].
    pub qualified_candidates: usize,
    pub average_score: u32,
}

/// Case-insensitive match of `query` against name, email or phone.
/// A blank query matches everything.
pub fn matches_query(result: &CandidateResult, query: &str) -> bool {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return true;
    }
    [
        &result.candidate.name,
        &result.candidate.email,
        &result.candidate.phone,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(&query))
}

fn compare(a: &CandidateResult, b: &CandidateResult, order: SortOrder) -> Ordering {
    match order {
        SortOrder::ScoreDesc => b.score_percent.cmp(&a.score_percent),
        SortOrder::ScoreAsc => a.score_percent.cmp(&b.score_percent),
        SortOrder::NameAsc => a
            .candidate
            .name
            .to_lowercase()
            .cmp(&b.candidate.name.to_lowercase()),
        SortOrder::NameDesc => b
            .candidate
            .name
            .to_lowercase()
            .cmp(&a.candidate.name.to_lowercase()),
        SortOrder::DateDesc => b.completed_at.cmp(&a.completed_at),
        SortOrder::DateAsc => a.completed_at.cmp(&b.completed_at),
    }
}

/// Filters and sorts the archive. The sort is stable, so ties keep archive order.
pub fn list_candidates(
    results: &[CandidateResult],
    query: &str,
    order: SortOrder,
) -> Vec<CandidateSummary> {
    let mut matching: Vec<&CandidateResult> =
        results.iter().filter(|r| matches_query(r, query)).collect();
    matching.sort_by(|a, b| compare(a, b, order));
    matching.into_iter().map(CandidateSummary::from).collect()
}

pub fn dashboard_stats(results: &[CandidateResult]) -> DashboardStats {
    let total = results.len();
    let qualified = results
        .iter()
        .filter(|r| r.score_percent >= QUALIFIED_PERCENTAGE)
        .count();
    let average = if total == 0 {
        0
    } else {
        let sum: u64 = results.iter().map(|r| r.score_percent as u64).sum();
        let total = total as u64;
        ((2 * sum + total) / (2 * total)) as u32
    };
    DashboardStats {
        total_candidates: total,
        qualified_candidates: qualified,
        average_score: average,
    }
}
