//! Redis service for revoked sessions and password reset tokens

use redis::{AsyncCommands, Client};

use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct RedisService {
    client: Client,
}

fn revoked_key(jti: &str) -> String {
    format!("session:revoked:{}", jti)
}

fn reset_key(token_hash: &str) -> String {
    format!("password_reset:{}", token_hash)
}

impl RedisService {
    /// Client only; connections are opened on first use
    pub fn from_url(url: &str) -> AppResult<Self> {
        let client = Client::open(url)
            .map_err(|e| AppError::Internal(format!("Failed to create Redis client: {}", e)))?;
        Ok(Self { client })
    }

    /// Create a new Redis service
    pub async fn new(url: &str) -> AppResult<Self> {
        let service = Self::from_url(url)?;

        // Test connection
        let mut conn = service
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to connect to Redis: {}", e)))?;

        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Redis connection test failed: {}", e)))?;

        Ok(service)
    }

    async fn connection(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to get Redis connection: {}", e)))
    }

    /// Check Redis connectivity
    pub async fn ping(&self) -> AppResult<()> {
        let mut conn = self.connection().await?;
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Redis ping failed: {}", e)))?;
        Ok(())
    }

    /// Mark a session as logged out until its token would have expired
    pub async fn revoke_session(&self, jti: &str, ttl_seconds: u64) -> AppResult<()> {
        if ttl_seconds == 0 {
            return Ok(());
        }
        let mut conn = self.connection().await?;
        conn.set_ex::<_, _, ()>(revoked_key(jti), "1", ttl_seconds)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to revoke session in Redis: {}", e)))?;
        Ok(())
    }

    pub async fn is_session_revoked(&self, jti: &str) -> AppResult<bool> {
        let mut conn = self.connection().await?;
        let exists: bool = conn
            .exists(revoked_key(jti))
            .await
            .map_err(|e| AppError::Internal(format!("Failed to check session in Redis: {}", e)))?;
        Ok(exists)
    }

    /// Store the hash of a password reset token for a user
    pub async fn store_password_reset(&self, token_hash: &str, user_id: i32, ttl_seconds: u64) -> AppResult<()> {
        let mut conn = self.connection().await?;
        conn.set_ex::<_, _, ()>(reset_key(token_hash), user_id, ttl_seconds)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to store reset token in Redis: {}", e)))?;
        Ok(())
    }

    /// User a password reset token belongs to, without using it up
    pub async fn peek_password_reset(&self, token_hash: &str) -> AppResult<Option<i32>> {
        let mut conn = self.connection().await?;
        let user_id: Option<i32> = conn
            .get(reset_key(token_hash))
            .await
            .map_err(|e| AppError::Internal(format!("Failed to read reset token from Redis: {}", e)))?;
        Ok(user_id)
    }

    /// Consume a password reset token (one-time use), returning its user
    pub async fn take_password_reset(&self, token_hash: &str) -> AppResult<Option<i32>> {
        let mut conn = self.connection().await?;
        let user_id: Option<i32> = redis::cmd("GETDEL")
            .arg(reset_key(token_hash))
            .query_async(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to read reset token from Redis: {}", e)))?;
        Ok(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_namespaced() {
        assert_eq!(revoked_key("abc"), "session:revoked:abc");
        assert_eq!(reset_key("ff00"), "password_reset:ff00");
    }

    fn redis_url() -> String {
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string())
    }

    #[tokio::test]
    #[ignore] // Needs a Redis server
    async fn test_reset_token_survives_peek_and_is_used_once() {
        let redis = RedisService::new(&redis_url()).await.unwrap();
        let hash = format!("test-{}", uuid::Uuid::new_v4());

        redis.store_password_reset(&hash, 42, 60).await.unwrap();

        assert_eq!(redis.peek_password_reset(&hash).await.unwrap(), Some(42));
        assert_eq!(redis.peek_password_reset(&hash).await.unwrap(), Some(42));
        assert_eq!(redis.take_password_reset(&hash).await.unwrap(), Some(42));
        assert_eq!(redis.take_password_reset(&hash).await.unwrap(), None);
        assert_eq!(redis.peek_password_reset(&hash).await.unwrap(), None);
    }

    #[test]
    fn test_client_is_created_without_connecting() {
        assert!(RedisService::from_url("redis://127.0.0.1:1").is_ok());
        assert!(RedisService::from_url("not a url").is_err());
    }
}
