use std::sync::Arc;

use validator::Validate;

use crate::{
    api::UserApi,
    auth::{SessionContext, TokenClaims},
    errors::{AppError, AppResult},
    models::{
        domain::User,
        dto::request::{LoginRequest, RegisterRequest},
    },
};

pub struct AuthService {
    user_api: Arc<dyn UserApi>,
    context: Arc<SessionContext>,
}

impl AuthService {
    pub fn new(user_api: Arc<dyn UserApi>, context: Arc<SessionContext>) -> Self {
        Self { user_api, context }
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<TokenClaims> {
        request.validate()?;

        let response = self.user_api.login(&request).await?;
        self.store_token(&response.token)
    }

    pub async fn register(&self, request: RegisterRequest) -> AppResult<TokenClaims> {
        request.validate()?;

        let response = self.user_api.register(&request).await?;
        self.store_token(&response.token)
    }

    fn store_token(&self, token: &str) -> AppResult<TokenClaims> {
        if token.trim().is_empty() {
            return Err(AppError::Unauthorized(
                "Service returned an empty token".to_string(),
            ));
        }

        self.context.set_token(token)?;
        let claims = TokenClaims::decode_unverified(token).unwrap_or_default();
        log::info!(
            "Logged in as {}",
            claims.username().unwrap_or("<unknown user>")
        );
        Ok(claims)
    }

    pub fn logout(&self) -> AppResult<()> {
        self.context.clear_token()?;
        log::info!("Logged out");
        Ok(())
    }

    pub fn current_claims(&self) -> Option<TokenClaims> {
        self.context.claims()
    }

    /// Profile of the logged-in user, resolved from the token's user id.
    pub async fn current_user(&self) -> AppResult<User> {
        let user_id = self
            .current_claims()
            .and_then(|claims| claims.user_id())
            .ok_or_else(|| AppError::Unauthorized("Not logged in".to_string()))?;

        self.user_api.get_user(user_id).await
    }
}
