use serde::{Deserialize, Serialize};

use crate::interview::models::QuestionRecord;

pub const MAX_SCORE_PER_QUESTION: u32 = 10;
pub const PASSING_PERCENTAGE: u32 = 60;
pub const EXCELLENT_PERCENTAGE: u32 = 80;
/// Dashboard threshold for counting a candidate as qualified.
pub const QUALIFIED_PERCENTAGE: u32 = 70;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreCategory {
    Excellent,
    Good,
    NeedsImprovement,
}

/// Σ records[].score
pub fn total_score(records: &[QuestionRecord]) -> u32 {
    records.iter().map(|r| r.score).sum()
}

pub fn max_points(question_count: usize) -> u32 {
    question_count as u32 * MAX_SCORE_PER_QUESTION
}

/// round(total / (N × 10) × 100), rounding halves up. Returns 0 for an empty schedule.
pub fn final_percent(total: u32, question_count: usize) -> u32 {
    let max = max_points(question_count) as u64;
    if max == 0 {
        return 0;
    }
    let total = total as u64;
    ((total * 200 + max) / (2 * max)) as u32
}

pub fn score_category(percent: u32) -> ScoreCategory {
    if percent >= EXCELLENT_PERCENTAGE {
        ScoreCategory::Excellent
    } else if percent >= PASSING_PERCENTAGE {
        ScoreCategory::Good
    } else {
        ScoreCategory::NeedsImprovement
    }
}

pub fn is_passing(percent: u32) -> bool {
    percent >= PASSING_PERCENTAGE
}
