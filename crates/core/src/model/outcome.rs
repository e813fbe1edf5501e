use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{Category, QuestionId};

/// Terminal result handed to the results collaborator.
///
/// Serializes to exactly `{ "score", "total", "percentage" }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOutcome {
    pub score: u32,
    pub total: u32,
    pub percentage: u8,
}

impl SessionOutcome {
    /// Builds an outcome, rounding the percentage half-up. A zero total yields
    /// zero percent.
    #[must_use]
    pub fn new(score: u32, total: u32) -> Self {
        Self {
            score,
            total,
            percentage: percentage(score, total),
        }
    }

    #[must_use]
    pub fn band(&self) -> PerformanceBand {
        PerformanceBand::for_percentage(self.percentage)
    }
}

/// `round(100 * part / whole)` clamped to 0..=100, with `whole == 0` giving 0.
#[must_use]
pub fn percentage(part: u32, whole: u32) -> u8 {
    if whole == 0 {
        return 0;
    }
    let part = u64::from(part.min(whole));
    let whole = u64::from(whole);
    let rounded = (200 * part + whole) / (2 * whole);
    u8::try_from(rounded).unwrap_or(100)
}

/// Coarse grading of a result for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PerformanceBand {
    /// 70% or more.
    Excellent,
    /// 40% to 69%.
    Average,
    NeedsWork,
}

impl PerformanceBand {
    #[must_use]
    pub fn for_percentage(percentage: u8) -> Self {
        match percentage {
            70.. => Self::Excellent,
            40..=69 => Self::Average,
            _ => Self::NeedsWork,
        }
    }
}

/// How a session reached its end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    /// Submitted with every question answered.
    Completed,
    /// Submitted with unanswered questions after confirmation.
    Confirmed,
    /// The countdown reached zero (auto-submit).
    TimedOut,
}

/// Per-question line of the final report, in catalog order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionReview {
    pub id: QuestionId,
    pub prompt: String,
    pub chosen: Option<String>,
    pub correct: String,
    pub is_correct: bool,
    pub answerable: bool,
    pub explanation: Option<String>,
}

/// Everything known about a session once it has ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionReport {
    pub outcome: SessionOutcome,
    pub reason: EndReason,
    pub category: Category,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub remaining_secs: u32,
    pub reviews: Vec<QuestionReview>,
}
