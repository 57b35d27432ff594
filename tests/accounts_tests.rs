//! Account service tests against a real database and Redis

use bookswap_server::{
    config::AppConfig,
    error::AppError,
    models::user::{LoginRequest, PasswordResetConfirm, RegisterRequest},
    repository::Repository,
    services::{
        accounts::{generate_reset_token, AccountsService},
        redis::RedisService,
        Services,
    },
};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

const PASSWORD: &str = "swap-books-42";

async fn services() -> (Services, RedisService) {
    let config = AppConfig::default();
    let database_url = std::env::var("DATABASE_URL").unwrap_or(config.database.url.clone());
    let redis_url = std::env::var("REDIS_URL").unwrap_or(config.redis.url.clone());

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .expect("Failed to connect to database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    let redis = RedisService::new(&redis_url).await.expect("Failed to connect to Redis");
    let services = Services::new(
        Repository::new(pool),
        config.auth.clone(),
        config.email.clone(),
        config.media.clone(),
        redis.clone(),
    )
    .await
    .expect("Failed to create services");
    (services, redis)
}

async fn register(accounts: &AccountsService) -> (i32, String) {
    let username = format!("reset_{}", &Uuid::new_v4().simple().to_string()[..12]);
    let user = accounts
        .register(RegisterRequest {
            username: username.clone(),
            email: format!("{}@example.com", username),
            password1: PASSWORD.to_string(),
            password2: PASSWORD.to_string(),
            first_name: String::new(),
            last_name: String::new(),
        })
        .await
        .expect("Failed to register");
    (user.id, username)
}

#[tokio::test]
#[ignore] // Needs PostgreSQL and Redis
async fn test_rejected_reset_password_keeps_the_link_usable() {
    let (services, redis) = services().await;
    let (user_id, username) = register(&services.accounts).await;

    let (token, hash) = generate_reset_token();
    redis.store_password_reset(&hash, user_id, 600).await.unwrap();

    // Same as the username, so refused
    let result = services
        .accounts
        .confirm_password_reset(&PasswordResetConfirm {
            token: token.clone(),
            new_password1: username.clone(),
            new_password2: username.clone(),
        })
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));
    assert_eq!(redis.peek_password_reset(&hash).await.unwrap(), Some(user_id));

    let new_password = "another-shelf-77";
    services
        .accounts
        .confirm_password_reset(&PasswordResetConfirm {
            token: token.clone(),
            new_password1: new_password.to_string(),
            new_password2: new_password.to_string(),
        })
        .await
        .expect("Reset should succeed");

    // One use only
    let again = services
        .accounts
        .confirm_password_reset(&PasswordResetConfirm {
            token,
            new_password1: new_password.to_string(),
            new_password2: new_password.to_string(),
        })
        .await;
    assert!(matches!(again, Err(AppError::BadRequest(_))));

    let (_, user) = services
        .accounts
        .authenticate(&LoginRequest {
            username,
            password: new_password.to_string(),
            remember_me: false,
        })
        .await
        .expect("New password should log in");
    assert_eq!(user.id, user_id);
}
