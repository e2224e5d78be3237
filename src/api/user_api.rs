use async_trait::async_trait;

use crate::{
    errors::AppResult,
    models::{
        domain::User,
        dto::{
            request::{LoginRequest, RegisterRequest},
            response::AuthResponse,
        },
    },
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserApi: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> AppResult<AuthResponse>;
    async fn register(&self, request: &RegisterRequest) -> AppResult<AuthResponse>;
    async fn get_user(&self, user_id: i64) -> AppResult<User>;
}
