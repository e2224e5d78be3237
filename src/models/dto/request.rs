use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::domain::{QuizAttemptAnswer, QuizQuestionType, TimeLimit};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 50))]
    pub username: String,

    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 50))]
    pub username: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Body of `POST /Quiz` and `PUT /Quiz/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_time_limit"))]
pub struct QuizRequest {
    #[validate(length(min = 1, max = 100))]
    pub title: String,

    #[validate(length(max = 1000))]
    pub description: String,

    pub is_public: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<String>,

    #[validate(length(min = 1, max = 50))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Body of `POST /Question` and `PUT /Question/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_correct_options"))]
pub struct QuestionRequest {
    pub quiz_id: i64,

    #[validate(length(min = 1, max = 500))]
    pub text: String,

    pub question_type: QuizQuestionType,

    #[validate(
        length(min = 2, max = 10, message = "A question needs between 2 and 10 options"),
        nested
    )]
    pub options: Vec<OptionRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OptionRequest {
    #[validate(length(min = 1, max = 200))]
    pub text: String,

    pub is_correct: bool,
}

/// Body of `POST /Attempt/{attemptId}/stop`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitAnswersRequest {
    pub answers: Vec<QuizAttemptAnswer>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuizListQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

fn validate_time_limit(request: &QuizRequest) -> Result<(), ValidationError> {
    let Some(raw) = request.time_limit.as_deref() else {
        return Ok(());
    };

    raw.parse::<TimeLimit>().map(|_| ()).map_err(|_| {
        let mut err = ValidationError::new("time_limit_format");
        err.message = Some(Cow::from("Time limit must look like HH:MM:SS"));
        err
    })
}

fn validate_correct_options(request: &QuestionRequest) -> Result<(), ValidationError> {
    let correct = request.options.iter().filter(|o| o.is_correct).count();

    let message = match request.question_type {
        QuizQuestionType::SingleChoice if correct != 1 => {
            "Single-choice questions need exactly one correct option"
        }
        QuizQuestionType::MultiChoice if correct == 0 => {
            "Multi-choice questions need at least one correct option"
        }
        _ => return Ok(()),
    };

    let mut err = ValidationError::new("correct_options");
    err.message = Some(Cow::from(message));
    Err(err)
}
