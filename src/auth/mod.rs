//! Session verification.
//!
//! Sessions are issued by the external sign-in integration and stored in the
//! `session` table. Requests carry the token either as a bearer token or in
//! the `session_token` cookie. The extractors below gate handlers on being
//! signed in, confirmed by an admin, or an admin.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, HeaderMap};
use uuid::Uuid;

use crate::models::user::User;
use crate::services::sessions;
use crate::state::AppState;
use crate::utils::error::AppError;

pub const SESSION_COOKIE: &str = "session_token";

/// Pulls the session token from `Authorization: Bearer` or the session cookie.
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Any signed-in user, confirmed or not.
#[derive(Debug, Clone)]
pub struct CurrentSession {
    pub session_id: Uuid,
    pub user: User,
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let token = extract_session_token(&parts.headers)
            .ok_or_else(|| AppError::AuthError("Not authenticated".to_string()))?;

        let found = sessions::find_session_user(&state.pool, &token)
            .await?
            .ok_or_else(|| AppError::AuthError("Session is invalid or has expired".to_string()))?;

        Ok(Self {
            session_id: found.session_id,
            user: found.user,
        })
    }
}

/// A signed-in user whose account an admin has confirmed.
#[derive(Debug, Clone)]
pub struct ConfirmedUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for ConfirmedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let CurrentSession { user, .. } = CurrentSession::from_request_parts(parts, state).await?;
        require_confirmed(user).map(Self)
    }
}

#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let ConfirmedUser(user) = ConfirmedUser::from_request_parts(parts, state).await?;
        require_admin(user).map(Self)
    }
}

pub fn require_confirmed(user: User) -> Result<User, AppError> {
    if user.is_confirmed {
        Ok(user)
    } else {
        Err(AppError::PendingConfirmation)
    }
}

pub fn require_admin(user: User) -> Result<User, AppError> {
    if user.is_admin {
        Ok(user)
    } else {
        Err(AppError::Forbidden(
            "Only administrators can perform this action".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use chrono::Utc;

    fn user(is_admin: bool, is_confirmed: bool) -> User {
        User {
            id: Uuid::new_v4(),
            name: "guest".to_string(),
            first_name: None,
            last_name: None,
            email: "guest@example.com".to_string(),
            image: None,
            is_admin,
            is_confirmed,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        assert_eq!(extract_session_token(&headers).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_cookie_token() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; session_token=tok-42; lang=de"),
        );
        assert_eq!(extract_session_token(&headers).as_deref(), Some("tok-42"));
    }

    #[test]
    fn test_bearer_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        headers.insert(header::COOKIE, HeaderValue::from_static("session_token=from-cookie"));
        assert_eq!(extract_session_token(&headers).as_deref(), Some("from-header"));
    }

    #[test]
    fn test_missing_or_malformed_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_session_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwdw=="));
        headers.insert(header::COOKIE, HeaderValue::from_static("session_token="));
        assert_eq!(extract_session_token(&headers), None);
    }

    #[test]
    fn test_gates() {
        assert!(matches!(
            require_confirmed(user(false, false)),
            Err(AppError::PendingConfirmation)
        ));
        assert!(require_confirmed(user(false, true)).is_ok());
        assert!(matches!(require_admin(user(false, true)), Err(AppError::Forbidden(_))));
        assert!(require_admin(user(true, true)).is_ok());
    }
}
