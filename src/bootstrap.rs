//! Wires the production implementations together.

use crate::config::AppConfig;
use crate::notifier::SmtpNotifier;
use crate::telemetry::init_tracing;
use anyhow::Context;
use auth_data::repositories::{MongoTokenRepository, MongoUserRepository};
use auth_domain::{
    CredentialService, CredentialServiceImpl, DefaultTokenService, JwtTokenCodec,
    Pbkdf2HashingService, TokenService,
};
use mongodb::Client;
use std::num::NonZeroU32;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

const USERS_COLLECTION: &str = "users";
const TOKENS_COLLECTION: &str = "user_tokens";

pub struct AuthContext {
    pub credential_service: Arc<dyn CredentialService>,
    pub token_service: Arc<dyn TokenService>,
}

/// Read the environment, install tracing at `LOG_LEVEL` and build the services.
pub async fn bootstrap_from_env() -> anyhow::Result<AuthContext> {
    let config = AppConfig::from_env().context("Invalid configuration")?;
    init_tracing(config.log_level);
    info!(?config, "configuration loaded");

    build_credential_service(&config).await
}

pub async fn build_credential_service(config: &AppConfig) -> anyhow::Result<AuthContext> {
    let client = Client::with_uri_str(&config.mongo_uri)
        .await
        .context("Failed to connect to MongoDB")?;
    let db = Arc::new(RwLock::new(client.database(&config.mongo_db_name)));

    let user_repository = Arc::new(MongoUserRepository::new(
        db.clone(),
        USERS_COLLECTION.to_string(),
    ));
    user_repository
        .ensure_indexes()
        .await
        .context("Failed to create user indexes")?;

    let token_repository = Arc::new(MongoTokenRepository::new(
        db,
        TOKENS_COLLECTION.to_string(),
    ));
    token_repository
        .ensure_indexes()
        .await
        .context("Failed to create token indexes")?;

    let token_service: Arc<dyn TokenService> = Arc::new(DefaultTokenService::new(
        Arc::new(JwtTokenCodec::new(config.token_config())),
        token_repository.clone(),
        config.token_lifetimes(),
        config.operation_timeout,
    ));

    let iterations = NonZeroU32::new(config.password_hash_iterations)
        .context("PASSWORD_HASH_ITERATIONS must be positive")?;
    let notifier = SmtpNotifier::new(&config.smtp).context("Failed to configure SMTP")?;

    let credential_service = Arc::new(CredentialServiceImpl::new(
        user_repository,
        token_repository,
        token_service.clone(),
        Arc::new(Pbkdf2HashingService::new(iterations)),
        Arc::new(notifier),
        config.operation_timeout,
    ));

    info!(
        database = %config.mongo_db_name,
        issuer = %config.issuer,
        "credential service ready"
    );

    Ok(AuthContext {
        credential_service,
        token_service,
    })
}
