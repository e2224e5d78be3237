#[cfg(test)]
pub mod fixtures {
    use crate::models::domain::{
        Quiz, QuizAttempt, QuizQuestion, QuizQuestionOption, QuizQuestionType, TimeLimit,
    };

    /// Creates a public quiz, optionally timed ("HH:MM:SS")
    pub fn test_quiz(id: i64, time_limit: Option<&str>) -> Quiz {
        Quiz {
            id,
            title: format!("Quiz {}", id),
            description: "A quiz used in tests".to_string(),
            is_public: true,
            time_limit: time_limit.map(|t| t.parse::<TimeLimit>().expect("valid time limit")),
            category: Some("testing".to_string()),
            author_id: Some(1),
            created_at: None,
        }
    }

    /// Creates a question whose options are `id * 10 + 1 ..= id * 10 + option_count`
    pub fn test_question(
        id: i64,
        quiz_id: i64,
        question_type: QuizQuestionType,
        option_count: i64,
    ) -> QuizQuestion {
        QuizQuestion {
            id,
            quiz_id,
            text: format!("Question {}", id),
            question_type,
            options: (1..=option_count)
                .map(|n| QuizQuestionOption {
                    id: id * 10 + n,
                    text: format!("Option {}", n),
                    is_correct: None,
                })
                .collect(),
        }
    }

    /// Creates `count` single-choice questions with ids 1..=count
    pub fn test_questions(quiz_id: i64, count: i64) -> Vec<QuizQuestion> {
        (1..=count)
            .map(|id| test_question(id, quiz_id, QuizQuestionType::SingleChoice, 3))
            .collect()
    }

    pub fn test_attempt(id: i64, quiz_id: i64) -> QuizAttempt {
        QuizAttempt {
            id,
            quiz_id,
            user_id: None,
            guest_session_id: None,
            started_at: None,
            completed_at: None,
            time_taken: None,
            score: None,
        }
    }

    pub fn test_completed_attempt(id: i64, quiz_id: i64, score: f64) -> QuizAttempt {
        QuizAttempt {
            completed_at: Some(chrono::Utc::now()),
            time_taken: Some(TimeLimit::from_secs(42)),
            score: Some(score),
            ..test_attempt(id, quiz_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use crate::models::domain::QuizQuestionType;

    #[test]
    fn test_fixtures_question_option_ids() {
        let question = test_question(2, 1, QuizQuestionType::MultiChoice, 3);
        let ids: Vec<i64> = question.options.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![21, 22, 23]);
    }

    #[test]
    fn test_fixtures_timed_quiz() {
        assert_eq!(test_quiz(1, Some("00:00:05")).countdown_secs(), Some(5));
        assert_eq!(test_quiz(1, None).countdown_secs(), None);
    }
}
