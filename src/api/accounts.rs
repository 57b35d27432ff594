//! Registration, login and password endpoints

use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::user::{
        LoginRequest, PasswordChangeRequest, PasswordResetConfirm, PasswordResetRequest, RegisterRequest, User,
    },
    services::accounts::{Session, PASSWORD_RESET_MESSAGE},
    AppState,
};

use super::{clear_session_cookie, session_cookie, AuthenticatedUser, MaybeUser, MessageResponse};

pub const PROFILE_PATH: &str = "/accounts/profile/";
pub const PASSWORD_CHANGE_DONE_PATH: &str = "/accounts/password_change/done/";

/// Registration response
#[derive(Serialize, ToSchema)]
pub struct RegisterResponse {
    pub message: String,
    pub user: User,
}

/// Login response
#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    /// Session token, also set as the `sessionid` cookie
    pub token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
    /// Whether the session survives closing the browser
    pub remember_me: bool,
    pub user: User,
}

fn cookie_header(cookie: &str) -> AppResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    let value = HeaderValue::from_str(cookie)
        .map_err(|e| AppError::Internal(format!("Invalid cookie value: {}", e)))?;
    headers.insert(SET_COOKIE, value);
    Ok(headers)
}

fn login_cookie(session: &Session, secure: bool) -> String {
    let max_age = session.persistent.then(|| session.max_age_seconds());
    session_cookie(&session.token, max_age, secure)
}

/// Create an account
#[utoipa::path(
    post,
    path = "/accounts/register/",
    tag = "accounts",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = RegisterResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Username or email already in use")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(form): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    let user = state.services.accounts.register(form).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: format!("Account created for {}", user.username),
            user,
        }),
    ))
}

/// Log in with username and password
///
/// Already authenticated callers are sent to their profile.
#[utoipa::path(
    post,
    path = "/accounts/login/",
    tag = "accounts",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 303, description = "Already logged in, redirect to the profile"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    MaybeUser(current): MaybeUser,
    Json(form): Json<LoginRequest>,
) -> AppResult<Response> {
    if current.is_some() {
        return Ok(Redirect::to(PROFILE_PATH).into_response());
    }

    let (session, user) = state.services.accounts.authenticate(&form).await?;
    let headers = cookie_header(&login_cookie(&session, state.config.secure_cookies()))?;
    let expires_at = Utc
        .timestamp_opt(session.claims.exp, 0)
        .single()
        .ok_or_else(|| AppError::Internal("Invalid session expiry".to_string()))?;

    let body = LoginResponse {
        token: session.token,
        token_type: "Bearer".to_string(),
        expires_at,
        remember_me: session.persistent,
        user,
    };
    Ok((headers, Json(body)).into_response())
}

/// Log out and clear the session cookie
#[utoipa::path(
    post,
    path = "/accounts/logout/",
    tag = "accounts",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<(HeaderMap, Json<MessageResponse>)> {
    state.services.accounts.logout(&claims).await?;
    let headers = cookie_header(&clear_session_cookie(state.config.secure_cookies()))?;
    Ok((headers, Json(MessageResponse::new("You have been logged out"))))
}

/// Request a password reset email
///
/// The answer is the same whether or not the address is registered.
#[utoipa::path(
    post,
    path = "/accounts/password-reset/",
    tag = "accounts",
    request_body = PasswordResetRequest,
    responses(
        (status = 200, description = "Reset instructions sent if the account exists", body = MessageResponse),
        (status = 400, description = "Invalid email")
    )
)]
pub async fn password_reset(
    State(state): State<AppState>,
    Json(form): Json<PasswordResetRequest>,
) -> AppResult<Json<MessageResponse>> {
    form.validate()?;
    state.services.accounts.request_password_reset(&form.email).await?;
    Ok(Json(MessageResponse::new(PASSWORD_RESET_MESSAGE)))
}

/// Set a new password with a reset token
#[utoipa::path(
    post,
    path = "/accounts/password-reset/confirm/",
    tag = "accounts",
    request_body = PasswordResetConfirm,
    responses(
        (status = 200, description = "Password set", body = MessageResponse),
        (status = 400, description = "Invalid or expired token, or password rejected")
    )
)]
pub async fn password_reset_confirm(
    State(state): State<AppState>,
    Json(form): Json<PasswordResetConfirm>,
) -> AppResult<Json<MessageResponse>> {
    state.services.accounts.confirm_password_reset(&form).await?;
    Ok(Json(MessageResponse::new(
        "Your password has been set. You may go ahead and log in now.",
    )))
}

/// Change the password of the logged in user
#[utoipa::path(
    post,
    path = "/accounts/password-change/",
    tag = "accounts",
    security(("bearer_auth" = [])),
    request_body = PasswordChangeRequest,
    responses(
        (status = 303, description = "Password changed, redirect to the confirmation"),
        (status = 400, description = "Wrong old password or password rejected"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn password_change(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(form): Json<PasswordChangeRequest>,
) -> AppResult<Redirect> {
    state.services.accounts.change_password(claims.user_id, &form).await?;
    Ok(Redirect::to(PASSWORD_CHANGE_DONE_PATH))
}

#[utoipa::path(
    get,
    path = "/accounts/password_change/done/",
    tag = "accounts",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Password change confirmation", body = MessageResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn password_change_done(_user: AuthenticatedUser) -> Json<MessageResponse> {
    Json(MessageResponse::new("Your password was changed."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::SessionClaims;

    fn session(persistent: bool) -> Session {
        Session {
            token: "tok".to_string(),
            claims: SessionClaims {
                sub: "reader".to_string(),
                user_id: 1,
                is_staff: false,
                jti: "j".to_string(),
                exp: 1_000 + 3_600,
                iat: 1_000,
            },
            persistent,
        }
    }

    #[test]
    fn test_browser_session_cookie() {
        let cookie = login_cookie(&session(false), false);
        assert!(!cookie.contains("Max-Age"));
    }

    #[test]
    fn test_remembered_session_cookie() {
        let cookie = login_cookie(&session(true), false);
        assert!(cookie.contains("Max-Age=3600"));
    }

    #[test]
    fn test_cookie_header() {
        let headers = cookie_header("sessionid=tok; Path=/").unwrap();
        assert_eq!(headers.get(SET_COOKIE).unwrap(), "sessionid=tok; Path=/");
    }
}
