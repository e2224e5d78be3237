use std::sync::Arc;

use secrecy::ExposeSecret;

use crate::{
    api::{AttemptApi, HttpApiClient, QuizApi, UserApi},
    auth::{CredentialStore, FileCredentialStore, SessionContext},
    config::Config,
    errors::AppResult,
    services::{AttemptSession, AuthService, AuthoringService, CatalogService, ResultService},
};

#[derive(Clone)]
pub struct AppState {
    pub context: Arc<SessionContext>,
    pub quiz_api: Arc<dyn QuizApi>,
    pub attempt_api: Arc<dyn AttemptApi>,
    pub auth_service: Arc<AuthService>,
    pub authoring_service: Arc<AuthoringService>,
    pub catalog_service: Arc<CatalogService>,
    pub result_service: Arc<ResultService>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> AppResult<Self> {
        config.validate()?;
        let store = Arc::new(FileCredentialStore::new(config.credentials_path.clone()));
        Self::with_store(config, store)
    }

    pub fn with_store(config: Config, store: Arc<dyn CredentialStore>) -> AppResult<Self> {
        let context = Arc::new(SessionContext::new(store)?);
        if let Some(token) = config.bootstrap_token.as_ref() {
            if !context.is_authenticated() {
                log::info!("Using token from QUIZ_API_TOKEN");
                context.set_token(token.expose_secret())?;
            }
        }

        let client = Arc::new(HttpApiClient::new(&config, context.clone())?);
        let quiz_api: Arc<dyn QuizApi> = client.clone();
        let attempt_api: Arc<dyn AttemptApi> = client.clone();
        let user_api: Arc<dyn UserApi> = client;

        Ok(Self {
            auth_service: Arc::new(AuthService::new(user_api.clone(), context.clone())),
            authoring_service: Arc::new(AuthoringService::new(quiz_api.clone(), context.clone())),
            catalog_service: Arc::new(CatalogService::new(quiz_api.clone(), user_api)),
            result_service: Arc::new(ResultService::new(quiz_api.clone(), attempt_api.clone())),
            context,
            quiz_api,
            attempt_api,
            config: Arc::new(config),
        })
    }

    /// A fresh, idle attempt session sharing this client's identity.
    pub fn new_attempt_session(&self) -> Arc<AttemptSession> {
        AttemptSession::new(
            self.quiz_api.clone(),
            self.attempt_api.clone(),
            self.context.clone(),
        )
    }
}
