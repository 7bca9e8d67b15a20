// src/models/progress.rs

use serde::Serialize;
use sqlx::FromRow;

/// Represents the 'user_progress' table in the database.
/// At most one row per (user_id, topic); a resubmission replaces it.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserTopicProgress {
    pub user_id: String,
    pub topic: String,
    pub correct_answers: i64,
    pub incorrect_answers: i64,

    /// Percentage in [0, 100].
    pub accuracy: f64,

    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Difficulty tier derived from accuracy. Always one of 2, 3, 4, 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Difficulty(u8);

impl Difficulty {
    pub fn from_accuracy(accuracy: f64) -> Self {
        let tier = if accuracy >= 90.0 {
            5
        } else if accuracy >= 80.0 {
            4
        } else if accuracy >= 70.0 {
            3
        } else {
            2
        };
        Difficulty(tier)
    }

    /// Wraps a raw tier, used for the default hint on a fresh topic.
    pub(crate) const fn new_unchecked(tier: u8) -> Self {
        Difficulty(tier)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

/// `100 * correct / (correct + incorrect)`, or 0 when nothing was scored.
pub fn accuracy(correct: i64, incorrect: i64) -> f64 {
    let total = correct + incorrect;
    if total > 0 {
        (correct as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

/// Outcome of scoring one submission batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreResult {
    #[serde(rename = "correct_answers")]
    pub correct_count: i64,
    #[serde(rename = "incorrect_answers")]
    pub incorrect_count: i64,
    pub accuracy: f64,
    pub difficulty: Difficulty,
}

/// Per-topic state shown on the topic listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TopicState {
    #[serde(rename = "Retake Quiz")]
    Retake,
    #[serde(rename = "Take Quiz")]
    Available,
    #[serde(rename = "Locked")]
    Locked,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopicStatus {
    pub topic: String,
    pub status: TopicState,
}

/// DTO for the topic listing endpoint.
#[derive(Debug, Serialize)]
pub struct TopicsResponse {
    pub unlocked_index: usize,
    pub topics: Vec<TopicStatus>,
}
