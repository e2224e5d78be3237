pub mod attempt_api;
pub mod http_client;
pub mod quiz_api;
pub mod status;
pub mod user_api;

pub use attempt_api::AttemptApi;
pub use http_client::HttpApiClient;
pub use quiz_api::QuizApi;
pub use user_api::UserApi;

#[cfg(test)]
pub use attempt_api::MockAttemptApi;
#[cfg(test)]
pub use quiz_api::MockQuizApi;
#[cfg(test)]
pub use user_api::MockUserApi;
