//! Business logic services

pub mod accounts;
pub mod catalog;
pub mod email;
pub mod redis;
pub mod store;

use std::sync::Arc;

use crate::{
    config::{AuthConfig, EmailConfig, MediaConfig},
    error::AppResult,
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub accounts: accounts::AccountsService,
    pub catalog: catalog::CatalogService,
    pub store: store::StoreService,
    pub redis: redis::RedisService,
    pub repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub async fn new(
        repository: Repository,
        auth_config: AuthConfig,
        email_config: EmailConfig,
        media_config: MediaConfig,
        redis_service: redis::RedisService,
    ) -> AppResult<Self> {
        let mailer = email::SmtpMailer::new(&email_config)?;
        let email = email::EmailService::new(email_config, Arc::new(mailer));

        Ok(Self {
            accounts: accounts::AccountsService::new(
                repository.clone(),
                auth_config,
                media_config,
                redis_service.clone(),
                email,
            ),
            catalog: catalog::CatalogService::new(repository.clone()),
            store: store::StoreService::new(repository.clone()),
            redis: redis_service,
            repository,
        })
    }
}
