use serde::{Deserialize, Serialize};

use crate::models::domain::{Quiz, QuizAttempt, QuizQuestion, TimeLimit};
use crate::services::grading_service::QuestionStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub username: String,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_taken: Option<TimeLimit>,
}

/// A leaderboard row after ranking. Equal score and time share a rank.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry {
    pub rank: usize,
    pub entry: LeaderboardEntry,
}

/// Catalog row. Both lookups fail soft, so either may be missing.
#[derive(Debug, Clone, Serialize)]
pub struct QuizSummary {
    pub quiz: Quiz,
    pub question_count: Option<usize>,
    pub author_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionReview {
    pub question: QuizQuestion,
    pub selected_option_ids: Vec<i64>,
    pub status: QuestionStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttemptReview {
    pub attempt: QuizAttempt,
    pub quiz: Quiz,
    pub questions: Vec<QuestionReview>,
}

impl AttemptReview {
    pub fn count_with_status(&self, status: QuestionStatus) -> usize {
        self.questions.iter().filter(|q| q.status == status).count()
    }
}
