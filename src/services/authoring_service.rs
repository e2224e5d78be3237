use std::sync::Arc;

use validator::Validate;

use crate::{
    api::QuizApi,
    auth::SessionContext,
    errors::AppResult,
    models::{
        domain::{Quiz, QuizQuestion},
        dto::request::{QuestionRequest, QuizRequest},
    },
};

/// Quiz and question authoring. Payloads are validated before anything is sent.
pub struct AuthoringService {
    quiz_api: Arc<dyn QuizApi>,
    context: Arc<SessionContext>,
}

impl AuthoringService {
    pub fn new(quiz_api: Arc<dyn QuizApi>, context: Arc<SessionContext>) -> Self {
        Self { quiz_api, context }
    }

    pub async fn create_quiz(&self, request: QuizRequest) -> AppResult<Quiz> {
        request.validate()?;
        self.context.require_token()?;

        let quiz = self.quiz_api.create_quiz(&request).await?;
        log::info!("Created quiz {} '{}'", quiz.id, quiz.title);
        Ok(quiz)
    }

    pub async fn update_quiz(&self, quiz_id: i64, request: QuizRequest) -> AppResult<Quiz> {
        request.validate()?;
        self.context.require_token()?;

        let quiz = self.quiz_api.update_quiz(quiz_id, &request).await?;
        log::info!("Updated quiz {}", quiz_id);
        Ok(quiz)
    }

    pub async fn delete_quiz(&self, quiz_id: i64) -> AppResult<()> {
        self.context.require_token()?;
        self.quiz_api.delete_quiz(quiz_id).await?;
        log::info!("Deleted quiz {}", quiz_id);
        Ok(())
    }

    pub async fn create_question(&self, request: QuestionRequest) -> AppResult<QuizQuestion> {
        request.validate()?;
        self.context.require_token()?;

        let question = self.quiz_api.create_question(&request).await?;
        log::info!("Added question {} to quiz {}", question.id, request.quiz_id);
        Ok(question)
    }

    pub async fn update_question(
        &self,
        question_id: i64,
        request: QuestionRequest,
    ) -> AppResult<QuizQuestion> {
        request.validate()?;
        self.context.require_token()?;
        self.quiz_api.update_question(question_id, &request).await
    }

    pub async fn delete_question(&self, question_id: i64) -> AppResult<()> {
        self.context.require_token()?;
        self.quiz_api.delete_question(question_id).await
    }
}
