use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::SecurityConfig;
use crate::database::models::User;

pub mod password;

pub use password::{hash_password, verify_password};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub token_type: TokenType,
    pub user_id: i64,
    pub username: String,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(token_type: TokenType, user: &User, config: &SecurityConfig) -> Self {
        let now = Utc::now();
        let lifetime = match token_type {
            TokenType::Access => Duration::minutes(config.access_token_minutes),
            TokenType::Refresh => Duration::days(config.refresh_token_days),
        };

        Self {
            token_type,
            user_id: user.id,
            username: user.username.clone(),
            jti: Uuid::new_v4().simple().to_string(),
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No active account found with the given credentials")]
    InvalidCredentials,

    #[error("Authorization header must use Bearer token format")]
    MalformedHeader,

    #[error("Given token not valid for any token type")]
    InvalidToken,

    #[error("Token has wrong type")]
    WrongTokenType,

    #[error("User not found or inactive")]
    InactiveUser,

    #[error("JWT signing failed: {0}")]
    Signing(jsonwebtoken::errors::Error),

    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

/// Access/refresh pair returned by the token endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

pub fn generate_jwt(claims: &Claims, config: &SecurityConfig) -> Result<String, AuthError> {
    let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
    encode(&Header::new(Algorithm::HS256), claims, &encoding_key).map_err(AuthError::Signing)
}

pub fn issue_access(user: &User, config: &SecurityConfig) -> Result<String, AuthError> {
    generate_jwt(&Claims::new(TokenType::Access, user, config), config)
}

pub fn issue_token_pair(user: &User, config: &SecurityConfig) -> Result<TokenPair, AuthError> {
    Ok(TokenPair {
        access: issue_access(user, config)?,
        refresh: generate_jwt(&Claims::new(TokenType::Refresh, user, config), config)?,
    })
}

/// Validate signature and expiry, then require the expected token type
pub fn validate_jwt(token: &str, expected: TokenType, config: &SecurityConfig) -> Result<Claims, AuthError> {
    let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    let claims = decode::<Claims>(token, &decoding_key, &validation)
        .map_err(|e| {
            tracing::debug!("Rejected JWT: {}", e);
            AuthError::InvalidToken
        })?
        .claims;

    if claims.token_type != expected {
        return Err(AuthError::WrongTokenType);
    }
    Ok(claims)
}
