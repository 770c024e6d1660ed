pub mod password;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("JWT secret not configured")]
    InvalidSecret,

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("token expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("wrong token type for this operation")]
    WrongTokenUse,

    #[error("password hashing error: {0}")]
    Hash(String),
}

/// Distinguishes the short-lived access credential from the longer-lived
/// refresh credential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenUse {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User document id, hex encoded
    pub sub: String,
    pub token_use: TokenUse,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    fn new(user_id: &str, token_use: TokenUse, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id.to_string(),
            token_use,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        }
    }
}

/// Issue a short-lived access token for the given user id
pub fn issue_access_token(user_id: &str) -> Result<String, AuthError> {
    let hours = config::config().security.access_token_ttl_hours;
    sign(Claims::new(user_id, TokenUse::Access, Duration::hours(hours as i64)))
}

/// Issue a longer-lived refresh token for the given user id
pub fn issue_refresh_token(user_id: &str) -> Result<String, AuthError> {
    let days = config::config().security.refresh_token_ttl_days;
    sign(Claims::new(user_id, TokenUse::Refresh, Duration::days(days as i64)))
}

fn sign(claims: Claims) -> Result<String, AuthError> {
    let secret = &config::config().security.jwt_secret;
    if secret.is_empty() {
        return Err(AuthError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), &claims, &encoding_key)
        .map_err(|e| AuthError::TokenGeneration(e.to_string()))
}

/// Validate a token's signature and expiry and return its claims
pub fn decode_token(token: &str) -> Result<Claims, AuthError> {
    let secret = &config::config().security.jwt_secret;
    if secret.is_empty() {
        return Err(AuthError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::default();

    decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::TokenInvalid(e.to_string()),
        })
}

/// Validate an access token specifically; refresh tokens are rejected so a
/// stolen long-lived credential cannot be used against protected routes
pub fn decode_access_token(token: &str) -> Result<Claims, AuthError> {
    let claims = decode_token(token)?;
    if claims.token_use != TokenUse::Access {
        return Err(AuthError::WrongTokenUse);
    }
    Ok(claims)
}

/// Validate a refresh token specifically, for the token-refresh endpoint
pub fn decode_refresh_token(token: &str) -> Result<Claims, AuthError> {
    let claims = decode_token(token)?;
    if claims.token_use != TokenUse::Refresh {
        return Err(AuthError::WrongTokenUse);
    }
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_token_round_trip() {
        let token = issue_access_token("64b0c1f2a3d4e5f60718293a").unwrap();
        let claims = decode_access_token(&token).unwrap();
        assert_eq!(claims.sub, "64b0c1f2a3d4e5f60718293a");
        assert_eq!(claims.token_use, TokenUse::Access);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn refresh_token_is_rejected_on_access_paths() {
        let token = issue_refresh_token("64b0c1f2a3d4e5f60718293a").unwrap();
        assert!(matches!(
            decode_access_token(&token),
            Err(AuthError::WrongTokenUse)
        ));
        // But it is fine where a refresh token is expected
        assert!(decode_refresh_token(&token).is_ok());
    }

    #[test]
    fn garbage_tokens_are_invalid() {
        assert!(matches!(
            decode_token("not-a-jwt"),
            Err(AuthError::TokenInvalid(_))
        ));
    }
}
