use crate::deadline::store_call;
use crate::error::AuthError;
use crate::models::{DecodedToken, TokenPair};
use crate::token_codec::{TokenClass, TokenCodec};
use async_trait::async_trait;
use auth_data::repositories::TokenRepository;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

/// How long each token class stays valid after issuance
#[derive(Debug, Clone, Copy)]
pub struct TokenLifetimes {
    pub access: Duration,
    pub refresh: Duration,
    pub email: Duration,
}

impl Default for TokenLifetimes {
    fn default() -> Self {
        Self {
            access: Duration::minutes(15),
            refresh: Duration::days(7),
            email: Duration::minutes(30),
        }
    }
}

/// Token service for creating and validating tokens
#[async_trait]
pub trait TokenService: Send + Sync {
    /// Mint an access/refresh pair for a user. Does not persist anything.
    fn generate_token_pair(&self, user_id: &str) -> Result<TokenPair, AuthError>;

    /// Short-lived password reset token bound to an email address.
    fn generate_email_token(&self, email: &str) -> Result<String, AuthError>;

    fn get_email_from_token(&self, token: &str) -> Result<String, AuthError>;

    fn decode_email_token(&self, token: &str) -> Result<DecodedToken, AuthError>;

    fn decode_access_token(&self, token: &str) -> Result<DecodedToken, AuthError>;

    fn decode_refresh_token(&self, token: &str) -> Result<DecodedToken, AuthError>;

    /// Signature, expiry and the issued-token record must all hold.
    /// Returns the user id.
    async fn resolve_access_token(&self, token: &str) -> Result<String, AuthError>;
}

pub struct DefaultTokenService {
    codec: Arc<dyn TokenCodec>,
    token_repository: Arc<dyn TokenRepository>,
    lifetimes: TokenLifetimes,
    operation_timeout: std::time::Duration,
}

impl DefaultTokenService {
    pub fn new(
        codec: Arc<dyn TokenCodec>,
        token_repository: Arc<dyn TokenRepository>,
        lifetimes: TokenLifetimes,
        operation_timeout: std::time::Duration,
    ) -> Self {
        Self {
            codec,
            token_repository,
            lifetimes,
            operation_timeout,
        }
    }
}

#[async_trait]
impl TokenService for DefaultTokenService {
    fn generate_token_pair(&self, user_id: &str) -> Result<TokenPair, AuthError> {
        let now = Utc::now();
        let access_token_id = Uuid::new_v4().to_string();
        let refresh_token_id = Uuid::new_v4().to_string();

        let access_token = self.codec.encode(
            TokenClass::Access,
            user_id,
            &access_token_id,
            now + self.lifetimes.access,
        )?;
        let refresh_token = self.codec.encode(
            TokenClass::Refresh,
            user_id,
            &refresh_token_id,
            now + self.lifetimes.refresh,
        )?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            access_token_id,
            refresh_token_id,
        })
    }

    fn generate_email_token(&self, email: &str) -> Result<String, AuthError> {
        self.codec.encode(
            TokenClass::EmailVerification,
            email,
            &Uuid::new_v4().to_string(),
            Utc::now() + self.lifetimes.email,
        )
    }

    fn get_email_from_token(&self, token: &str) -> Result<String, AuthError> {
        self.decode_email_token(token).map(|decoded| decoded.subject)
    }

    fn decode_email_token(&self, token: &str) -> Result<DecodedToken, AuthError> {
        self.codec.decode(TokenClass::EmailVerification, token)
    }

    fn decode_access_token(&self, token: &str) -> Result<DecodedToken, AuthError> {
        self.codec.decode(TokenClass::Access, token)
    }

    fn decode_refresh_token(&self, token: &str) -> Result<DecodedToken, AuthError> {
        self.codec.decode(TokenClass::Refresh, token)
    }

    async fn resolve_access_token(&self, token: &str) -> Result<String, AuthError> {
        let decoded = self.decode_access_token(token)?;

        let record = store_call(
            Instant::now() + self.operation_timeout,
            "find_by_access_token_id",
            self.token_repository
                .find_by_access_token_id(&decoded.token_id),
        )
        .await?;

        match record {
            Some(record) if record.user_id == decoded.subject => Ok(decoded.subject),
            Some(_) => {
                debug!("access token subject does not match its record");
                Err(AuthError::TokenInvalid)
            }
            None => {
                debug!(user_id = %decoded.subject, "access token has been revoked");
                Err(AuthError::TokenInvalid)
            }
        }
    }
}
