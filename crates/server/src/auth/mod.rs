//! Bearer tokens issued by the identity provider.
//!
//! Tokens are HS256 JWTs signed with the backend-scoped secret from the config. Only
//! `sub` (the user id) is required; `name` is a display name when the provider sets one.

mod middleware;

use std::collections::HashSet;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use middleware::{CurrentUser, require_user};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,
    #[error("invalid token")]
    InvalidToken,
    #[error("jwt error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub exp: i64,
}

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub name: Option<String>,
    pub expires_at: DateTime<Utc>,
}

pub struct JwtService {
    secret: SecretString,
}

impl JwtService {
    pub fn new(secret: &str) -> Self {
        Self {
            secret: SecretString::from(secret.to_string()),
        }
    }

    /// Sign a token for `user_id` valid for `ttl`. Used by tooling and tests; production
    /// tokens come from the identity provider.
    pub fn issue(
        &self,
        user_id: &str,
        name: Option<&str>,
        ttl: ChronoDuration,
    ) -> Result<String, AuthError> {
        let claims = Claims {
            sub: user_id.to_string(),
            name: name.map(str::to_string),
            exp: (Utc::now() + ttl).timestamp(),
        };
        let key = EncodingKey::from_secret(self.secret.expose_secret().as_bytes());
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &key)?)
    }

    pub fn verify(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        if token.trim().is_empty() {
            return Err(AuthError::MissingToken);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::from(["sub".to_string(), "exp".to_string()]);
        validation.leeway = 30;

        let key = DecodingKey::from_secret(self.secret.expose_secret().as_bytes());
        let claims = decode::<Claims>(token, &key, &validation)?.claims;
        if claims.sub.trim().is_empty() {
            return Err(AuthError::InvalidToken);
        }
        let expires_at = DateTime::from_timestamp(claims.exp, 0).ok_or(AuthError::InvalidToken)?;

        Ok(AuthenticatedUser {
            user_id: claims.sub,
            name: claims.name,
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_tokens_verify() {
        let service = JwtService::new("test-secret");
        let token = service
            .issue("user_2abc", Some("Ada"), ChronoDuration::minutes(5))
            .unwrap();

        let user = service.verify(&token).unwrap();
        assert_eq!(user.user_id, "user_2abc");
        assert_eq!(user.name.as_deref(), Some("Ada"));
        assert!(user.expires_at > Utc::now());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = JwtService::new("one")
            .issue("user_2abc", None, ChronoDuration::minutes(5))
            .unwrap();
        assert!(matches!(
            JwtService::new("two").verify(&token),
            Err(AuthError::Jwt(_))
        ));
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let service = JwtService::new("test-secret");
        let token = service
            .issue("user_2abc", None, ChronoDuration::minutes(-10))
            .unwrap();
        assert!(service.verify(&token).is_err());
    }

    #[test]
    fn empty_token_is_missing() {
        let service = JwtService::new("test-secret");
        assert!(matches!(service.verify("  "), Err(AuthError::MissingToken)));
    }
}
