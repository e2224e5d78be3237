use async_trait::async_trait;

use crate::{
    errors::AppResult,
    models::{
        domain::{Quiz, QuizQuestion},
        dto::request::{QuestionRequest, QuizListQuery, QuizRequest},
    },
};

/// Quizzes and their questions on the remote service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuizApi: Send + Sync {
    async fn list_quizzes(&self, query: &QuizListQuery) -> AppResult<Vec<Quiz>>;
    async fn get_quiz(&self, quiz_id: i64) -> AppResult<Quiz>;
    async fn create_quiz(&self, request: &QuizRequest) -> AppResult<Quiz>;
    async fn update_quiz(&self, quiz_id: i64, request: &QuizRequest) -> AppResult<Quiz>;
    async fn delete_quiz(&self, quiz_id: i64) -> AppResult<()>;
    async fn get_questions(
        &self,
        quiz_id: i64,
        access_key: Option<String>,
    ) -> AppResult<Vec<QuizQuestion>>;
    async fn create_question(&self, request: &QuestionRequest) -> AppResult<QuizQuestion>;
    async fn update_question(
        &self,
        question_id: i64,
        request: &QuestionRequest,
    ) -> AppResult<QuizQuestion>;
    async fn delete_question(&self, question_id: i64) -> AppResult<()>;
}
