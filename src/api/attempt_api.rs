use async_trait::async_trait;

use crate::{
    errors::AppResult,
    models::{
        domain::{QuizAttempt, QuizAttemptAnswer},
        dto::{request::SubmitAnswersRequest, response::LeaderboardEntry},
    },
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttemptApi: Send + Sync {
    async fn start_attempt(&self, quiz_id: i64) -> AppResult<QuizAttempt>;
    async fn stop_attempt(
        &self,
        attempt_id: i64,
        request: &SubmitAnswersRequest,
    ) -> AppResult<QuizAttempt>;
    async fn get_attempt(&self, attempt_id: i64) -> AppResult<QuizAttempt>;
    async fn get_attempt_answers(&self, attempt_id: i64) -> AppResult<Vec<QuizAttemptAnswer>>;
    async fn get_leaderboard(&self, quiz_id: i64) -> AppResult<Vec<LeaderboardEntry>>;
}
