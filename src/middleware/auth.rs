use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::auth::{validate_jwt, AuthError, TokenType};
use crate::error::ApiError;
use crate::policy::Actor;

/// Resolve the requester and attach it to the request as an [`Actor`].
///
/// No `Authorization` header means anonymous. A header that is present but
/// unusable is rejected outright rather than downgraded to anonymous.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let actor = match extract_bearer(request.headers())? {
        None => Actor::Anonymous,
        Some(token) => {
            let claims = validate_jwt(&token, TokenType::Access, &state.config.security)?;

            // Token outlives account changes; re-check the user on every request
            let user = state
                .users
                .find_user_by_id(claims.user_id)
                .await?
                .filter(|user| user.is_active)
                .ok_or_else(|| {
                    tracing::warn!("Token for user {} rejected: not found or inactive", claims.user_id);
                    AuthError::InactiveUser
                })?;

            Actor::user(user.id, user.username)
        }
    };

    tracing::debug!("Request actor: {}", actor.identity());
    request.extensions_mut().insert(actor);
    Ok(next.run(request).await)
}

/// Extract the bearer token, if an Authorization header was sent at all
fn extract_bearer(headers: &HeaderMap) -> Result<Option<String>, AuthError> {
    let Some(auth_header) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let auth_str = auth_header.to_str().map_err(|_| AuthError::MalformedHeader)?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(Some(token.trim().to_string())),
        _ => Err(AuthError::MalformedHeader),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn missing_header_is_anonymous() {
        assert_eq!(extract_bearer(&HeaderMap::new()).unwrap(), None);
    }

    #[test]
    fn bearer_token_extracted() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(extract_bearer(&headers).unwrap().as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn other_schemes_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic YWxpY2U6cHc="));
        assert!(matches!(extract_bearer(&headers), Err(AuthError::MalformedHeader)));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(matches!(extract_bearer(&headers), Err(AuthError::MalformedHeader)));
    }
}
