// handlers/public/token.rs - POST /api/token/ and POST /api/token/refresh/

use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::auth::{issue_access, issue_token_pair, validate_jwt, verify_password, AuthError, TokenPair, TokenType};
use crate::error::{ApiError, FieldErrors};
use crate::middleware::{ApiResponse, ApiResult, JsonBody};

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AccessToken {
    pub access: String,
}

/// Presence check without trimming; passwords are taken verbatim
fn required(errors: &mut FieldErrors, field: &str, value: Option<String>) -> Option<String> {
    match value {
        Some(v) if !v.is_empty() => Some(v),
        Some(_) => {
            errors.insert(field.to_string(), "This field may not be blank.".to_string());
            None
        }
        None => {
            errors.insert(field.to_string(), "This field is required.".to_string());
            None
        }
    }
}

/// Exchange credentials for an access/refresh pair
pub async fn obtain(
    State(state): State<AppState>,
    body: Result<JsonBody<TokenRequest>, ApiError>,
) -> ApiResult<TokenPair> {
    let JsonBody(request) = body?;

    let mut errors = FieldErrors::new();
    let username = required(&mut errors, "username", request.username);
    let password = required(&mut errors, "password", request.password);
    let (Some(username), Some(password)) = (username, password) else {
        return Err(ApiError::invalid_fields(errors));
    };

    let user = state
        .users
        .find_user_by_username(&username)
        .await?
        .filter(|user| user.is_active);

    let Some(user) = user else {
        tracing::warn!("Token request for unknown or inactive user '{}'", username);
        return Err(AuthError::InvalidCredentials.into());
    };

    if !verify_password(&password, &user.password_hash)? {
        tracing::warn!("Token request with wrong password for user '{}'", username);
        return Err(AuthError::InvalidCredentials.into());
    }

    let pair = issue_token_pair(&user, &state.config.security)?;
    tracing::info!("Issued token pair for user '{}' (id {})", user.username, user.id);
    Ok(ApiResponse::success(pair))
}

/// Exchange a refresh token for a new access token
pub async fn refresh(
    State(state): State<AppState>,
    body: Result<JsonBody<RefreshRequest>, ApiError>,
) -> ApiResult<AccessToken> {
    let JsonBody(request) = body?;

    let mut errors = FieldErrors::new();
    let Some(token) = required(&mut errors, "refresh", request.refresh) else {
        return Err(ApiError::invalid_fields(errors));
    };

    let claims = validate_jwt(&token, TokenType::Refresh, &state.config.security)?;
    let user = state
        .users
        .find_user_by_id(claims.user_id)
        .await?
        .filter(|user| user.is_active)
        .ok_or(AuthError::InactiveUser)?;

    let access = issue_access(&user, &state.config.security)?;
    tracing::debug!("Refreshed access token for user {}", user.id);
    Ok(ApiResponse::success(AccessToken { access }))
}
