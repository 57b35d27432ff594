//! User, profile and session models

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::error::AppError;

/// Letters, digits and @/./+/-/_ only
pub static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.@+-]+$").expect("valid username pattern"));

pub const PASSWORD_MIN_LEN: usize = 8;

/// Full user model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    /// Hashed password (argon2)
    #[serde(skip_serializing)]
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// Profile attached to each user
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Profile {
    pub user_id: i32,
    pub bio: String,
    /// Path of the avatar relative to the media root
    pub avatar: Option<String>,
}

impl Profile {
    pub fn avatar_url(&self) -> Option<String> {
        self.avatar.as_ref().map(|path| format!("/media/{}", path))
    }
}

/// User with their profile, as shown on the profile page
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub user: User,
    pub bio: String,
    pub avatar_url: Option<String>,
}

impl ProfileResponse {
    pub fn new(user: User, profile: Profile) -> Self {
        Self {
            avatar_url: profile.avatar_url(),
            bio: profile.bio,
            user,
        }
    }
}

/// Registration form
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(
        length(min = 1, max = 150, message = "Username must be between 1 and 150 characters"),
        regex(path = *USERNAME_RE, message = "Username may contain only letters, numbers, and @/./+/-/_ characters")
    )]
    pub username: String,
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    pub password1: String,
    pub password2: String,
    #[validate(length(max = 150))]
    #[serde(default)]
    pub first_name: String,
    #[validate(length(max = 150))]
    #[serde(default)]
    pub last_name: String,
}

/// Login form
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    /// Keep the session after the browser is closed
    #[serde(default)]
    pub remember_me: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PasswordResetRequest {
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PasswordResetConfirm {
    pub token: String,
    pub new_password1: String,
    pub new_password2: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PasswordChangeRequest {
    pub old_password: String,
    pub new_password1: String,
    pub new_password2: String,
}

/// Update own profile request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfile {
    #[validate(
        length(min = 1, max = 150, message = "Username must be between 1 and 150 characters"),
        regex(path = *USERNAME_RE, message = "Username may contain only letters, numbers, and @/./+/-/_ characters")
    )]
    pub username: Option<String>,
    #[validate(email(message = "Enter a valid email address"))]
    pub email: Option<String>,
    #[validate(length(max = 150))]
    pub first_name: Option<String>,
    #[validate(length(max = 150))]
    pub last_name: Option<String>,
    pub bio: Option<String>,
}

/// Check a new password pair against the password rules
pub fn validate_new_password(password1: &str, password2: &str, username: &str) -> Result<(), AppError> {
    if password1 != password2 {
        return Err(AppError::Validation(
            "password2: The two password fields didn't match".to_string(),
        ));
    }
    if password1.chars().count() < PASSWORD_MIN_LEN {
        return Err(AppError::Validation(format!(
            "password: This password is too short. It must contain at least {} characters",
            PASSWORD_MIN_LEN
        )));
    }
    if password1.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::Validation(
            "password: This password is entirely numeric".to_string(),
        ));
    }
    if !username.is_empty() && password1.eq_ignore_ascii_case(username) {
        return Err(AppError::Validation(
            "password: The password is too similar to the username".to_string(),
        ));
    }
    Ok(())
}

/// JWT claims of a login session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub user_id: i32,
    pub is_staff: bool,
    /// Session id, used for revocation on logout
    pub jti: String,
    pub exp: i64,
    pub iat: i64,
}

impl SessionClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    /// Seconds left before the session expires
    pub fn remaining_seconds(&self, now: i64) -> u64 {
        (self.exp - now).max(0) as u64
    }

    /// Require staff privileges (admin site)
    pub fn require_staff(&self) -> Result<(), AppError> {
        if self.is_staff {
            Ok(())
        } else {
            Err(AppError::Authorization("Staff privileges required".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(exp_offset: i64) -> SessionClaims {
        let now = Utc::now().timestamp();
        SessionClaims {
            sub: "reader".to_string(),
            user_id: 3,
            is_staff: false,
            jti: "abc".to_string(),
            exp: now + exp_offset,
            iat: now,
        }
    }

    #[test]
    fn test_token_round_trip() {
        let token = claims(3600).create_token("secret").unwrap();
        let parsed = SessionClaims::from_token(&token, "secret").unwrap();
        assert_eq!(parsed.user_id, 3);
        assert_eq!(parsed.jti, "abc");
        assert!(SessionClaims::from_token(&token, "other").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let token = claims(-3600).create_token("secret").unwrap();
        assert!(SessionClaims::from_token(&token, "secret").is_err());
    }

    #[test]
    fn test_require_staff() {
        let mut c = claims(60);
        assert!(c.require_staff().is_err());
        c.is_staff = true;
        assert!(c.require_staff().is_ok());
    }

    #[test]
    fn test_remaining_seconds_never_negative() {
        let c = claims(100);
        assert_eq!(c.remaining_seconds(c.exp + 5), 0);
        assert_eq!(c.remaining_seconds(c.exp - 10), 10);
    }

    #[test]
    fn test_password_rules() {
        assert!(validate_new_password("correct horse", "correct horse", "bob").is_ok());
        assert!(validate_new_password("correct horse", "correct house", "bob").is_err());
        assert!(validate_new_password("short", "short", "bob").is_err());
        assert!(validate_new_password("12345678901", "12345678901", "bob").is_err());
        assert!(validate_new_password("Bobbybobby", "Bobbybobby", "bobbybobby").is_err());
    }

    #[test]
    fn test_register_validation() {
        let mut form = RegisterRequest {
            username: "jane.doe+swap".to_string(),
            email: "jane@example.com".to_string(),
            password1: "p".to_string(),
            password2: "p".to_string(),
            first_name: String::new(),
            last_name: String::new(),
        };
        assert!(form.validate().is_ok());

        form.username = "jane doe".to_string();
        assert!(form.validate().is_err());

        form.username = "jane".to_string();
        form.email = "not-an-email".to_string();
        assert!(form.validate().is_err());
    }

    #[test]
    fn test_avatar_url() {
        let profile = Profile {
            user_id: 1,
            bio: String::new(),
            avatar: Some("avatars/1.png".to_string()),
        };
        assert_eq!(profile.avatar_url().as_deref(), Some("/media/avatars/1.png"));
    }
}
