pub mod quiz;
pub mod quiz_attempt;
pub mod quiz_question;
pub mod time_limit;
pub mod user;
pub use quiz::Quiz;
pub use quiz_attempt::{QuizAttempt, QuizAttemptAnswer};
pub use quiz_question::{QuizQuestion, QuizQuestionOption, QuizQuestionType};
pub use time_limit::TimeLimit;
pub use user::User;
