use super::state::ServerState;
use crate::user::auth::AuthTokenValue;

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::IntoResponse,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{debug, error};

#[derive(Debug)]
pub struct Session {
    pub user_id: usize,
    pub token: String,
}

pub const COOKIE_SESSION_TOKEN_KEY: &str = "session_token";

pub enum SessionExtractionError {
    AccessDenied,
}

impl IntoResponse for SessionExtractionError {
    fn into_response(self) -> axum::response::Response {
        match self {
            SessionExtractionError::AccessDenied => StatusCode::FORBIDDEN.into_response(),
        }
    }
}

fn extract_session_token_from_cookies(parts: &Parts) -> Option<String> {
    CookieJar::from_headers(&parts.headers)
        .get(COOKIE_SESSION_TOKEN_KEY)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

/// Accepts both `Bearer <token>` and the bare token.
fn extract_session_token_from_headers(parts: &Parts) -> Option<String> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

fn extract_session_from_request_parts(parts: &Parts, ctx: &ServerState) -> Option<Session> {
    let token = match extract_session_token_from_cookies(parts)
        .or_else(|| extract_session_token_from_headers(parts))
    {
        None => {
            debug!("No token in cookies nor headers.");
            return None;
        }
        Some(x) => x,
    };

    let auth_token_value = AuthTokenValue(token);
    let auth_token = match ctx.user_manager.get_auth_token(&auth_token_value) {
        Ok(Some(token)) => token,
        Ok(None) => {
            debug!("Auth token not found");
            return None;
        }
        Err(err) => {
            error!("Failed to read auth token: {:#}", err);
            return None;
        }
    };

    if let Err(err) = ctx.user_manager.touch_auth_token(&auth_token_value) {
        debug!("Failed to update auth token last used timestamp: {}", err);
    }

    debug!("Authenticated user_id={}", auth_token.user_id);
    Some(Session {
        user_id: auth_token.user_id,
        token: auth_token.value.0,
    })
}

impl FromRequestParts<ServerState> for Session {
    type Rejection = SessionExtractionError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        extract_session_from_request_parts(parts, ctx).ok_or(SessionExtractionError::AccessDenied)
    }
}

impl OptionalFromRequestParts<ServerState> for Session {
    type Rejection = SessionExtractionError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(extract_session_from_request_parts(parts, ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_header(name: &str, value: &str) -> Parts {
        let (parts, _) = Request::builder()
            .header(name, value)
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    #[test]
    fn reads_bearer_and_raw_tokens() {
        let parts = parts_with_header("Authorization", "Bearer abc123");
        assert_eq!(
            extract_session_token_from_headers(&parts),
            Some("abc123".to_string())
        );

        let parts = parts_with_header("Authorization", "abc123");
        assert_eq!(
            extract_session_token_from_headers(&parts),
            Some("abc123".to_string())
        );

        let parts = parts_with_header("Authorization", "Bearer ");
        assert_eq!(extract_session_token_from_headers(&parts), None);
    }

    #[test]
    fn reads_cookie_token() {
        let parts = parts_with_header("Cookie", "theme=dark; session_token=xyz");
        assert_eq!(
            extract_session_token_from_cookies(&parts),
            Some("xyz".to_string())
        );

        let parts = parts_with_header("Cookie", "session_token=");
        assert_eq!(extract_session_token_from_cookies(&parts), None);
    }
}
