pub mod attempt_session;
pub mod auth_service;
pub mod authoring_service;
pub mod catalog_service;
pub mod countdown;
pub mod grading_service;
pub mod result_service;

pub use attempt_session::{AttemptSession, Navigation, SessionPhase, SessionSnapshot};
pub use auth_service::AuthService;
pub use authoring_service::AuthoringService;
pub use catalog_service::CatalogService;
pub use grading_service::{GradingService, QuestionStatus};
pub use result_service::ResultService;
