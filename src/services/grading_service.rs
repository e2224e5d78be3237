use std::collections::BTreeSet;

use serde::Serialize;

use crate::models::domain::{QuizQuestion, QuizQuestionType};

/// Display status of one reviewed question. The score itself always comes from the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QuestionStatus {
    Correct,
    Incorrect,
    Unanswered,
    Unknown, // correctness flags were not exposed
}

pub struct GradingService;

impl GradingService {
    /// Status of one question given the options the taker chose.
    pub fn question_status(question: &QuizQuestion, selected_option_ids: &[i64]) -> QuestionStatus {
        if selected_option_ids.is_empty() {
            return QuestionStatus::Unanswered;
        }

        let Some(correct_option_ids) = question.correct_option_ids() else {
            return QuestionStatus::Unknown;
        };

        let selected: BTreeSet<i64> = selected_option_ids.iter().copied().collect();
        let correct: BTreeSet<i64> = correct_option_ids.into_iter().collect();

        let is_correct = match question.question_type {
            QuizQuestionType::SingleChoice => {
                selected.len() == 1 && correct.len() == 1 && selected == correct
            }
            QuizQuestionType::MultiChoice => {
                // extra picks make the whole question wrong
                !correct.is_empty() && selected == correct
            }
        };

        if is_correct {
            QuestionStatus::Correct
        } else {
            QuestionStatus::Incorrect
        }
    }
}
