//! Access-token verification.
//!
//! Tokens are minted elsewhere; this side only checks them. The server holds a
//! `dyn TokenValidator` so tests and alternative identity providers can plug in.

use actix_web::HttpRequest;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::errors::GameError;

/// The authenticated user behind a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
}

pub trait TokenValidator: Send + Sync {
    fn validate(&self, token: &str) -> Result<Identity, GameError>;
}

/// Claims carried by access and refresh tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub username: String,
    pub exp: usize,
}

/// HS256 JWT validator.
pub struct JwtValidator {
    key: DecodingKey,
    validation: Validation,
}

impl JwtValidator {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }
}

impl TokenValidator for JwtValidator {
    fn validate(&self, token: &str) -> Result<Identity, GameError> {
        if token.is_empty() {
            return Err(GameError::Auth("missing token".into()));
        }
        let data = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| GameError::Auth(e.to_string()))?;
        if data.claims.username.is_empty() {
            return Err(GameError::Auth("token carries no username".into()));
        }
        Ok(Identity {
            username: data.claims.username,
        })
    }
}

/// Extracts the token from an `Authorization` header, with or without the
/// `Bearer ` prefix.
pub fn bearer_token(req: &HttpRequest) -> Option<&str> {
    let header = req.headers().get("Authorization")?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ").unwrap_or(header).trim();
    (!token.is_empty()).then_some(token)
}

/// Validates the bearer token of an HTTP request.
pub fn authenticate(req: &HttpRequest, validator: &dyn TokenValidator) -> Result<Identity, GameError> {
    let token = bearer_token(req).ok_or_else(|| GameError::Auth("missing token".into()))?;
    validator.validate(token)
}
