use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub id: i64,
    pub quiz_id: i64,
    pub text: String,
    pub question_type: QuizQuestionType,
    #[serde(default)]
    pub options: Vec<QuizQuestionOption>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestionOption {
    pub id: i64,
    pub text: String,
    // Only exposed by the service outside of a running attempt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Copy)]
#[serde(rename_all = "camelCase")]
pub enum QuizQuestionType {
    SingleChoice, // Exactly one option may be chosen
    MultiChoice,  // Any number of options may be chosen
}

impl QuizQuestion {
    pub fn has_option(&self, option_id: i64) -> bool {
        self.options.iter().any(|o| o.id == option_id)
    }

    /// Option ids flagged correct, `None` when the service withheld the flags.
    pub fn correct_option_ids(&self) -> Option<Vec<i64>> {
        if self.options.iter().any(|o| o.is_correct.is_none()) {
            return None;
        }

        Some(
            self.options
                .iter()
                .filter(|o| o.is_correct == Some(true))
                .map(|o| o.id)
                .collect(),
        )
    }
}
