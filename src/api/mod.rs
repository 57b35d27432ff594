//! API handlers for the Book Swap endpoints

pub mod accounts;
pub mod admin;
pub mod catalog;
pub mod health;
pub mod openapi;
pub mod profile;
mod routes;
pub mod store;

pub use routes::router;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{
        header::{AUTHORIZATION, COOKIE, LOCATION},
        request::Parts,
        HeaderMap, StatusCode,
    },
    response::IntoResponse,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppError,
    models::{author::Author, book::BookShort, user::SessionClaims},
    AppState,
};

/// Where `/` sends visitors
pub const HOME_PATH: &str = "/catalog/";

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "sessionid";

/// Paginated response wrapper
#[derive(Serialize, ToSchema)]
#[aliases(BookPage = PaginatedResponse<BookShort>, AuthorPage = PaginatedResponse<Author>)]
pub struct PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    /// List of items
    pub items: Vec<T>,
    /// Total number of items
    pub total: i64,
    /// Current page number
    pub page: i64,
    /// Items per page
    pub per_page: i64,
}

/// Confirmation message returned by form endpoints
#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Permanent redirect from the site root to the catalog
pub async fn root_redirect() -> impl IntoResponse {
    (StatusCode::MOVED_PERMANENTLY, [(LOCATION, HOME_PATH)])
}

/// Extractor for the logged in user, from a Bearer token or the session cookie
pub struct AuthenticatedUser(pub SessionClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers)?
            .ok_or_else(|| AppError::Authentication("Authentication credentials were not provided".to_string()))?;

        let claims = state.services.accounts.verify_session(&token).await?;
        Ok(AuthenticatedUser(claims))
    }
}

/// Like [`AuthenticatedUser`] but anonymous requests pass through
pub struct MaybeUser(pub Option<SessionClaims>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(token) = session_token(&parts.headers)? else {
            return Ok(MaybeUser(None));
        };

        // A stale or logged out cookie counts as anonymous
        match state.services.accounts.verify_session(&token).await {
            Ok(claims) => Ok(MaybeUser(Some(claims))),
            Err(AppError::Authentication(_)) => Ok(MaybeUser(None)),
            Err(e) => Err(e),
        }
    }
}

/// Bearer token first, then the session cookie
fn session_token(headers: &HeaderMap) -> Result<Option<String>, AppError> {
    if let Some(value) = headers.get(AUTHORIZATION) {
        let value = value
            .to_str()
            .map_err(|_| AppError::Authentication("Invalid authorization header".to_string()))?;
        let token = value
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;
        return Ok(Some(token.trim().to_string()));
    }

    Ok(headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|header| get_cookie(header, SESSION_COOKIE))
        .filter(|token| !token.is_empty()))
}

pub fn get_cookie(cookie_header: &str, name: &str) -> Option<String> {
    for part in cookie_header.split(';') {
        if let Some((k, v)) = part.trim().split_once('=') {
            if k.trim() == name {
                return Some(v.trim().to_string());
            }
        }
    }
    None
}

/// Session cookie; without `max_age` it is dropped when the browser closes
pub fn session_cookie(token: &str, max_age: Option<u64>, secure: bool) -> String {
    let mut cookie = format!("{}={}; HttpOnly; Path=/; SameSite=Lax", SESSION_COOKIE, token);
    if let Some(max_age) = max_age {
        cookie.push_str(&format!("; Max-Age={}", max_age));
    }
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn clear_session_cookie(secure: bool) -> String {
    session_cookie("", Some(0), secure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[tokio::test]
    async fn test_root_redirects_permanently() {
        let response = root_redirect().await.into_response();
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers().get(LOCATION).unwrap(), "/catalog/");
    }

    #[test]
    fn test_browser_session_cookie_has_no_max_age() {
        let cookie = session_cookie("abc", None, false);
        assert_eq!(cookie, "sessionid=abc; HttpOnly; Path=/; SameSite=Lax");
    }

    #[test]
    fn test_remembered_cookie() {
        let cookie = session_cookie("abc", Some(1_209_600), true);
        assert!(cookie.contains("Max-Age=1209600"));
        assert!(cookie.ends_with("; Secure"));
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        assert_eq!(
            clear_session_cookie(false),
            "sessionid=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0"
        );
    }

    #[test]
    fn test_get_cookie() {
        let header = "csrftoken=x; sessionid=tok123 ; theme=dark";
        assert_eq!(get_cookie(header, "sessionid").as_deref(), Some("tok123"));
        assert_eq!(get_cookie(header, "missing"), None);
    }

    #[test]
    fn test_session_token_prefers_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        headers.insert(COOKIE, HeaderValue::from_static("sessionid=from-cookie"));
        assert_eq!(session_token(&headers).unwrap().as_deref(), Some("from-header"));
    }

    #[test]
    fn test_session_token_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("sessionid=from-cookie"));
        assert_eq!(session_token(&headers).unwrap().as_deref(), Some("from-cookie"));

        headers.insert(COOKIE, HeaderValue::from_static("sessionid="));
        assert_eq!(session_token(&headers).unwrap(), None);
    }

    #[test]
    fn test_malformed_authorization_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        assert!(matches!(session_token(&headers), Err(AppError::Authentication(_))));
    }
}
