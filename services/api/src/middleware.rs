//! Authentication middleware for bearer-token validation
//!
//! The Authorization header carries the opaque session token directly; a
//! `Bearer ` prefix is tolerated. Protected routes reject requests whose
//! token does not resolve; the optional variant lets anonymous requests
//! through without an identity.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use tracing::error;

use crate::error::ApiError;
use crate::models::CurrentUser;
use crate::state::AppState;

/// Opaque token from the Authorization header, if any
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    Some(value.strip_prefix("Bearer ").unwrap_or(value))
}

/// Resolve a token to its user. Tokens whose account has disappeared are
/// revoked on sight.
async fn resolve_user(state: &AppState, token: &str) -> Result<Option<CurrentUser>, ApiError> {
    let Some(user_id) = state.sessions.resolve(token).await else {
        return Ok(None);
    };

    match state.user_repository.find_by_id(user_id).await {
        Ok(Some(user)) => Ok(Some(CurrentUser::from(&user))),
        Ok(None) => {
            // The account is gone; the token must not keep working.
            state.sessions.revoke(token).await;
            Ok(None)
        }
        Err(e) => {
            error!("Failed to load user for session token: {}", e);
            Err(ApiError::Internal)
        }
    }
}

/// Authentication middleware for protected routes
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers())
        .ok_or(ApiError::Unauthenticated)?
        .to_string();

    let user = resolve_user(&state, &token)
        .await?
        .ok_or(ApiError::Unauthenticated)?;

    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

/// Optional authentication for routes that personalize but never require
/// an identity
pub async fn optional_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    if let Some(token) = bearer_token(req.headers()).map(str::to_string) {
        if let Ok(Some(user)) = resolve_user(&state, &token).await {
            req.extensions_mut().insert(user);
        }
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_accepts_raw_and_prefixed() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("campus-token-abc123"),
        );
        assert_eq!(bearer_token(&headers), Some("campus-token-abc123"));

        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer campus-token-abc123"),
        );
        assert_eq!(bearer_token(&headers), Some("campus-token-abc123"));
    }

    #[test]
    fn test_bearer_token_absent_without_header() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
