use std::sync::{Arc, RwLock};

use secrecy::{ExposeSecret, SecretString};

use crate::{
    auth::{
        claims::TokenClaims,
        credentials::{CredentialStore, Credentials},
    },
    errors::{AppError, AppResult},
};

/// Shared identity for one client: cached credentials with write-through to a store.
pub struct SessionContext {
    store: Arc<dyn CredentialStore>,
    cached: RwLock<Credentials>,
}

impl SessionContext {
    pub fn new(store: Arc<dyn CredentialStore>) -> AppResult<Self> {
        let cached = store.load()?;
        Ok(Self {
            store,
            cached: RwLock::new(cached),
        })
    }

    fn read(&self) -> AppResult<Credentials> {
        self.cached
            .read()
            .map(|c| c.clone())
            .map_err(|_| AppError::Storage("credential cache poisoned".to_string()))
    }

    fn update(&self, apply: impl FnOnce(&mut Credentials)) -> AppResult<()> {
        let mut cached = self
            .cached
            .write()
            .map_err(|_| AppError::Storage("credential cache poisoned".to_string()))?;
        let mut next = cached.clone();
        apply(&mut next);
        self.store.save(&next)?;
        *cached = next;
        Ok(())
    }

    /// Bearer token, or `None` when absent or expired.
    pub fn bearer_token(&self) -> Option<String> {
        let token = self.read().ok()?.token?;
        let token = token.expose_secret().to_string();

        match TokenClaims::decode_unverified(&token) {
            Ok(claims) if claims.is_expired() => {
                log::debug!("Stored token has expired, sending request anonymously");
                None
            }
            _ => Some(token),
        }
    }

    pub fn guest_session_id(&self) -> Option<String> {
        self.read().ok()?.guest_session_id
    }

    pub fn claims(&self) -> Option<TokenClaims> {
        self.bearer_token()
            .and_then(|token| TokenClaims::decode_unverified(&token).ok())
    }

    pub fn is_authenticated(&self) -> bool {
        self.bearer_token().is_some()
    }

    /// Fails with `Unauthorized` before any network call when no usable token is held.
    pub fn require_token(&self) -> AppResult<String> {
        self.bearer_token().ok_or_else(|| {
            AppError::Unauthorized("Log in to perform this action".to_string())
        })
    }

    pub fn set_token(&self, token: &str) -> AppResult<()> {
        let token = SecretString::from(token.to_string());
        self.update(|c| c.token = Some(token))
    }

    pub fn set_guest_session_id(&self, guest_session_id: &str) -> AppResult<()> {
        let guest_session_id = guest_session_id.to_string();
        self.update(|c| c.guest_session_id = Some(guest_session_id))
    }

    /// Drops the login token. The guest session survives so anonymous attempts stay reviewable.
    pub fn clear_token(&self) -> AppResult<()> {
        self.update(|c| c.token = None)
    }
}
