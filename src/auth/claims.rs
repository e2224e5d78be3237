use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};

/// Claims read out of the bearer token issued by `/User/login`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nameid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>, // Expiration time (as UTC timestamp)
}

impl TokenClaims {
    /// Reads the payload without checking the signature; the service stays the authority.
    pub fn decode_unverified(token: &str) -> AppResult<Self> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        decode::<TokenClaims>(token, &DecodingKey::from_secret(&[]), &validation)
            .map(|data| data.claims)
            .map_err(|e| AppError::Unauthorized(format!("Unreadable token: {}", e)))
    }

    pub fn user_id(&self) -> Option<i64> {
        self.nameid
            .as_deref()
            .or(self.sub.as_deref())
            .and_then(|id| id.parse().ok())
    }

    pub fn username(&self) -> Option<&str> {
        self.unique_name.as_deref().or(self.name.as_deref())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp.is_some_and(|exp| exp <= now.timestamp())
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

#[cfg(test)]
pub(crate) fn sign_test_token(claims: &TokenClaims) -> String {
    use jsonwebtoken::{encode, EncodingKey, Header};

    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(b"server-side-secret"),
    )
    .expect("test token should encode")
}
