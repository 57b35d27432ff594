//! Registration, authentication, password and profile management

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::{AuthConfig, MediaConfig},
    error::{AppError, AppResult},
    models::user::{
        validate_new_password, LoginRequest, PasswordChangeRequest, PasswordResetConfirm,
        ProfileResponse, RegisterRequest, SessionClaims, UpdateProfile, User,
    },
    repository::Repository,
    services::{email::EmailService, redis::RedisService},
};

/// Message shown after a reset request, whether or not the account exists
pub const PASSWORD_RESET_MESSAGE: &str = "We've emailed you instructions for setting your password, \
if an account exists with the email you entered. You should receive them shortly. \
If you don't receive an email, please make sure you've entered the address you registered with, \
and check your spam folder.";

/// A freshly opened login session
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub claims: SessionClaims,
    /// Whether the cookie should outlive the browser ("remember me")
    pub persistent: bool,
}

impl Session {
    pub fn max_age_seconds(&self) -> u64 {
        (self.claims.exp - self.claims.iat).max(0) as u64
    }
}

/// Random URL-safe token and the hash that is stored server side
pub fn generate_reset_token() -> (String, String) {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    let token = hex::encode(bytes);
    let hash = hash_reset_token(&token);
    (token, hash)
}

pub fn hash_reset_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

fn invalid_reset_link() -> AppError {
    AppError::BadRequest(
        "The password reset link was invalid, possibly because it has already been used".to_string(),
    )
}

/// File extension for accepted avatar content types
pub fn avatar_extension(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/png" => Some("png"),
        "image/jpeg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

#[derive(Clone)]
pub struct AccountsService {
    repository: Repository,
    config: AuthConfig,
    media: MediaConfig,
    redis: RedisService,
    email: EmailService,
}

impl AccountsService {
    pub fn new(
        repository: Repository,
        config: AuthConfig,
        media: MediaConfig,
        redis: RedisService,
        email: EmailService,
    ) -> Self {
        Self {
            repository,
            config,
            media,
            redis,
            email,
        }
    }

    /// Register a new account with an empty profile
    pub async fn register(&self, form: RegisterRequest) -> AppResult<User> {
        form.validate()?;
        validate_new_password(&form.password1, &form.password2, &form.username)?;

        if self.repository.users.username_exists(form.username.trim(), None).await? {
            return Err(AppError::Conflict("A user with that username already exists".to_string()));
        }
        if self.repository.users.email_exists(form.email.trim(), None).await? {
            return Err(AppError::Conflict("A user with that email already exists".to_string()));
        }

        let password = self.hash_password(&form.password1)?;
        let user = self.repository.users.create(&form, &password).await?;

        tracing::info!(user_id = user.id, username = %user.username, "Account created");
        Ok(user)
    }

    /// Authenticate by username and open a session
    pub async fn authenticate(&self, form: &LoginRequest) -> AppResult<(Session, User)> {
        let invalid = || {
            AppError::Authentication(
                "Please enter a correct username and password. Note that both fields may be case-sensitive."
                    .to_string(),
            )
        };

        let user = self
            .repository
            .users
            .get_by_username(form.username.trim())
            .await?
            .ok_or_else(invalid)?;

        if !self.verify_password(&user, &form.password)? {
            return Err(invalid());
        }
        if !user.is_active {
            return Err(AppError::Authentication("This account is inactive".to_string()));
        }

        let session = self.open_session(&user, form.remember_me)?;
        self.repository.users.touch_last_login(user.id).await?;

        tracing::info!(user_id = user.id, remember_me = form.remember_me, "User logged in");
        Ok((session, user))
    }

    fn open_session(&self, user: &User, remember_me: bool) -> AppResult<Session> {
        let hours = if remember_me {
            self.config.session_age_hours
        } else {
            self.config.browser_session_hours
        };
        let now = Utc::now().timestamp();

        let claims = SessionClaims {
            sub: user.username.clone(),
            user_id: user.id,
            is_staff: user.is_staff,
            jti: Uuid::new_v4().to_string(),
            exp: now + (hours as i64 * 3600),
            iat: now,
        };

        let token = claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;

        Ok(Session {
            token,
            claims,
            persistent: remember_me,
        })
    }

    /// Decode a session token and make sure it was not logged out
    pub async fn verify_session(&self, token: &str) -> AppResult<SessionClaims> {
        let claims = SessionClaims::from_token(token, &self.config.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        if self.redis.is_session_revoked(&claims.jti).await? {
            return Err(AppError::Authentication("Session has been logged out".to_string()));
        }
        Ok(claims)
    }

    /// Close a session
    pub async fn logout(&self, claims: &SessionClaims) -> AppResult<()> {
        let ttl = claims.remaining_seconds(Utc::now().timestamp());
        self.redis.revoke_session(&claims.jti, ttl).await?;
        tracing::info!(user_id = claims.user_id, "User logged out");
        Ok(())
    }

    /// Email a reset link if an active account uses this address
    pub async fn request_password_reset(&self, email: &str) -> AppResult<()> {
        let Some(user) = self.repository.users.get_active_by_email(email.trim()).await? else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(());
        };

        let (token, hash) = generate_reset_token();
        self.redis
            .store_password_reset(&hash, user.id, self.config.password_reset_ttl_minutes * 60)
            .await?;

        let link = format!(
            "{}/accounts/password-reset/confirm/?token={}",
            self.config.public_url.trim_end_matches('/'),
            token
        );
        self.email
            .send_password_reset(&user.email, &user.username, &link)
            .await?;

        tracing::info!(user_id = user.id, "Password reset email sent");
        Ok(())
    }

    /// Set a new password using a reset token
    pub async fn confirm_password_reset(&self, form: &PasswordResetConfirm) -> AppResult<()> {
        let token_hash = hash_reset_token(form.token.trim());

        // The token is only used up once the new password is accepted
        let user_id = self
            .redis
            .peek_password_reset(&token_hash)
            .await?
            .ok_or_else(invalid_reset_link)?;

        let user = self.repository.users.get_by_id(user_id).await?;
        validate_new_password(&form.new_password1, &form.new_password2, &user.username)?;

        // Another request may have used the link in the meantime
        if self.redis.take_password_reset(&token_hash).await? != Some(user_id) {
            return Err(invalid_reset_link());
        }

        let password = self.hash_password(&form.new_password1)?;
        self.repository.users.set_password(user_id, &password).await?;

        tracing::info!(user_id, "Password reset completed");
        Ok(())
    }

    /// Change own password after checking the old one
    pub async fn change_password(&self, user_id: i32, form: &PasswordChangeRequest) -> AppResult<()> {
        let user = self.repository.users.get_by_id(user_id).await?;

        if !self.verify_password(&user, &form.old_password)? {
            return Err(AppError::Validation(
                "old_password: Your old password was entered incorrectly".to_string(),
            ));
        }
        validate_new_password(&form.new_password1, &form.new_password2, &user.username)?;

        let password = self.hash_password(&form.new_password1)?;
        self.repository.users.set_password(user_id, &password).await?;

        tracing::info!(user_id, "Password changed");
        Ok(())
    }

    pub async fn get_profile(&self, user_id: i32) -> AppResult<ProfileResponse> {
        let user = self.repository.users.get_by_id(user_id).await?;
        let profile = self.repository.users.get_profile(user_id).await?;
        Ok(ProfileResponse::new(user, profile))
    }

    /// Update own account fields and bio
    pub async fn update_profile(&self, user_id: i32, form: UpdateProfile) -> AppResult<ProfileResponse> {
        form.validate()?;

        if let Some(ref username) = form.username {
            if self.repository.users.username_exists(username.trim(), Some(user_id)).await? {
                return Err(AppError::Conflict("A user with that username already exists".to_string()));
            }
        }
        if let Some(ref email) = form.email {
            if self.repository.users.email_exists(email.trim(), Some(user_id)).await? {
                return Err(AppError::Conflict("A user with that email already exists".to_string()));
            }
        }

        let (user, profile) = self.repository.users.update_profile(user_id, &form).await?;
        Ok(ProfileResponse::new(user, profile))
    }

    /// Store an uploaded avatar under the media root
    pub async fn set_avatar(&self, user_id: i32, content_type: &str, data: &[u8]) -> AppResult<ProfileResponse> {
        let extension = avatar_extension(content_type).ok_or_else(|| {
            AppError::Validation("avatar: Upload a valid image (PNG, JPEG, GIF or WebP)".to_string())
        })?;
        if data.is_empty() {
            return Err(AppError::Validation("avatar: The submitted file is empty".to_string()));
        }
        if data.len() > self.media.max_avatar_bytes {
            return Err(AppError::Validation(format!(
                "avatar: File too large (max {} bytes)",
                self.media.max_avatar_bytes
            )));
        }

        let relative = format!("avatars/{}-{}.{}", user_id, Uuid::new_v4(), extension);
        let root = PathBuf::from(&self.media.root);
        let path = root.join(&relative);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Internal(format!("Failed to create media directory: {}", e)))?;
        }
        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to store avatar: {}", e)))?;

        if let Some(previous) = self.repository.users.set_avatar(user_id, &relative).await? {
            if let Err(e) = tokio::fs::remove_file(root.join(&previous)).await {
                tracing::warn!(user_id, "Failed to remove previous avatar {}: {}", previous, e);
            }
        }

        self.get_profile(user_id).await
    }

    /// Verify user password
    fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(&user.password)
            .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash a password using Argon2
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        hash_password(password)
    }
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_token_hash_matches() {
        let (token, hash) = generate_reset_token();
        assert_eq!(token.len(), 64);
        assert_eq!(hash_reset_token(&token), hash);
        assert_ne!(token, hash);
    }

    #[test]
    fn test_reset_tokens_are_unique() {
        let (a, _) = generate_reset_token();
        let (b, _) = generate_reset_token();
        assert_ne!(a, b);
    }

    #[test]
    fn test_avatar_extension() {
        assert_eq!(avatar_extension("image/jpeg"), Some("jpg"));
        assert_eq!(avatar_extension("image/svg+xml"), None);
        assert_eq!(avatar_extension("application/pdf"), None);
    }

    #[test]
    fn test_hash_password_verifies() {
        let hash = hash_password("correct horse").unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(Argon2::default()
            .verify_password(b"correct horse", &parsed)
            .is_ok());
        assert!(Argon2::default().verify_password(b"wrong", &parsed).is_err());
    }

    #[test]
    fn test_session_max_age() {
        let session = Session {
            token: String::new(),
            claims: SessionClaims {
                sub: "a".to_string(),
                user_id: 1,
                is_staff: false,
                jti: "j".to_string(),
                exp: 7200,
                iat: 0,
            },
            persistent: false,
        };
        assert_eq!(session.max_age_seconds(), 7200);
    }
}
