//! Users repository for database operations

use chrono::Utc;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::user::{Profile, RegisterRequest, UpdateProfile, User},
};

const USER_COLUMNS: &str = "id, username, email, password, first_name, last_name, is_staff, is_active, date_joined, last_login";

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Get user by username (case-insensitive)
    pub async fn get_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE LOWER(username) = LOWER($1)",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Get an active user by email (case-insensitive)
    pub async fn get_active_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE LOWER(email) = LOWER($1) AND is_active",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Check if username already exists
    pub async fn username_exists(&self, username: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(username) = LOWER($1) AND ($2::int IS NULL OR id != $2))",
        )
        .bind(username)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Check if email already exists
    pub async fn email_exists(&self, email: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1) AND ($2::int IS NULL OR id != $2))",
        )
        .bind(email)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Create a user together with an empty profile
    pub async fn create(&self, data: &RegisterRequest, password_hash: &str) -> AppResult<User> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, email, password, first_name, last_name, date_joined)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(data.username.trim())
        .bind(data.email.trim())
        .bind(password_hash)
        .bind(data.first_name.trim())
        .bind(data.last_name.trim())
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::from_constraint(e, "A user with that username or email already exists"))?;

        sqlx::query("INSERT INTO profiles (user_id) VALUES ($1)")
            .bind(user.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(user)
    }

    pub async fn touch_last_login(&self, id: i32) -> AppResult<()> {
        sqlx::query("UPDATE users SET last_login = $1 WHERE id = $2")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_password(&self, id: i32, password_hash: &str) -> AppResult<()> {
        let result = sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User with id {} not found", id)));
        }
        Ok(())
    }

    /// Get a user's profile, creating it if missing
    pub async fn get_profile(&self, user_id: i32) -> AppResult<Profile> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (user_id) VALUES ($1)
            ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING user_id, bio, avatar
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from_constraint(e, format!("User with id {} not found", user_id)))?;
        Ok(profile)
    }

    /// Update own account fields and profile bio
    pub async fn update_profile(&self, user_id: i32, data: &UpdateProfile) -> AppResult<(User, Profile)> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET
                username = COALESCE($1, username),
                email = COALESCE($2, email),
                first_name = COALESCE($3, first_name),
                last_name = COALESCE($4, last_name)
            WHERE id = $5
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(data.username.as_deref().map(str::trim))
        .bind(data.email.as_deref().map(str::trim))
        .bind(data.first_name.as_deref().map(str::trim))
        .bind(data.last_name.as_deref().map(str::trim))
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::from_constraint(e, "A user with that username or email already exists"))?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", user_id)))?;

        let profile = sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (user_id, bio) VALUES ($1, COALESCE($2, ''))
            ON CONFLICT (user_id) DO UPDATE SET bio = COALESCE($2, profiles.bio)
            RETURNING user_id, bio, avatar
            "#,
        )
        .bind(user_id)
        .bind(&data.bio)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((user, profile))
    }

    /// Store a new avatar path, returning the previous one
    pub async fn set_avatar(&self, user_id: i32, avatar: &str) -> AppResult<Option<String>> {
        let previous: Option<Option<String>> = sqlx::query_scalar(
            "SELECT avatar FROM profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO profiles (user_id, avatar) VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET avatar = EXCLUDED.avatar
            "#,
        )
        .bind(user_id)
        .bind(avatar)
        .execute(&self.pool)
        .await?;

        Ok(previous.flatten())
    }
}
