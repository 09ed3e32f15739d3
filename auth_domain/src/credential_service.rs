use crate::deadline::{flow_deadline, notify, store_call, within};
use crate::error::{AuthError, AuthResult};
use crate::hashing_service::HashingService;
use crate::mappers::user_entity_to_user;
use crate::models::{
    ForgotPasswordData, LoginData, RegistrationData, ResetPasswordData, SessionResult, TokenPair,
};
use crate::notifier::Notifier;
use crate::password_strength::ensure_acceptable;
use crate::profile_colour::default_profile_colour;
use crate::token_service::TokenService;
use crate::utils::{is_valid_email, is_valid_phone, normalize_email};
use async_trait::async_trait;
use auth_data::repositories::{TokenRepository, UserRepository};
use auth_data::{IssuedTokenEntity, UserCreationData};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tokio::time::Instant;
use tracing::{debug, error, info};

/// Hashed on first use and verified against for unknown emails, so a login
/// costs one password verification whether or not the account exists.
const DUMMY_PASSWORD: &str = "unknown-account-placeholder";

/// Register, login and password recovery flows, plus the session flows
/// built on the issued-token store.
#[async_trait]
pub trait CredentialService: Send + Sync {
    /// Create an account and log it in
    async fn register(&self, data: RegistrationData) -> AuthResult<SessionResult>;

    /// Log in a user
    async fn login(&self, data: LoginData) -> AuthResult<SessionResult>;

    /// Email a password reset token to a registered address
    async fn forgot_password(&self, data: ForgotPasswordData) -> AuthResult<()>;

    /// Set a new password using a reset token and end every session of the
    /// user. A token issued before the last password change is rejected.
    ///
    /// Sessions are revoked before the new password is stored. If either step
    /// fails the call returns `InternalError` and can be repeated with the
    /// same token.
    async fn reset_password(&self, data: ResetPasswordData) -> AuthResult<()>;

    /// Revoke the session an access token belongs to
    async fn logout(&self, access_token: &str) -> AuthResult<()>;

    /// Exchange a refresh token for a new pair. The old pair is revoked.
    async fn refresh(&self, refresh_token: &str) -> AuthResult<TokenPair>;

    /// Validate an access token against the store and return the user id
    async fn validate_token(&self, access_token: &str) -> AuthResult<String>;
}

/// Implementation of CredentialService
///
/// Every flow runs against one deadline: `operation_timeout` from its start,
/// or the caller's deadline set through [`CredentialServiceImpl::with_deadline`]
/// when that comes first.
#[derive(Clone)]
pub struct CredentialServiceImpl {
    user_repository: Arc<dyn UserRepository>,
    token_repository: Arc<dyn TokenRepository>,
    token_service: Arc<dyn TokenService>,
    hashing_service: Arc<dyn HashingService>,
    notifier: Arc<dyn Notifier>,
    operation_timeout: Duration,
    deadline: Option<Instant>,
    dummy_hash: Arc<OnceCell<String>>,
}

impl CredentialServiceImpl {
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        token_repository: Arc<dyn TokenRepository>,
        token_service: Arc<dyn TokenService>,
        hashing_service: Arc<dyn HashingService>,
        notifier: Arc<dyn Notifier>,
        operation_timeout: Duration,
    ) -> Self {
        Self {
            user_repository,
            token_repository,
            token_service,
            hashing_service,
            notifier,
            operation_timeout,
            deadline: None,
            dummy_hash: Arc::new(OnceCell::new()),
        }
    }

    /// A handle whose flows also stop at `deadline`, for transports that
    /// carry a per-request deadline.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            ..self.clone()
        }
    }

    fn flow_deadline(&self) -> Instant {
        flow_deadline(self.operation_timeout, self.deadline)
    }

    async fn hash_password(&self, password: String) -> AuthResult<String> {
        let hasher = self.hashing_service.clone();
        tokio::task::spawn_blocking(move || hasher.hash_password(&password))
            .await
            .map_err(|e| AuthError::InternalError(format!("hashing task failed: {e}")))?
    }

    async fn verify_password(&self, hash: String, password: String) -> AuthResult<()> {
        let hasher = self.hashing_service.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&hash, &password))
            .await
            .map_err(|e| AuthError::InternalError(format!("hashing task failed: {e}")))?
    }

    async fn dummy_hash(&self) -> AuthResult<String> {
        self.dummy_hash
            .get_or_try_init(|| self.hash_password(DUMMY_PASSWORD.to_string()))
            .await
            .cloned()
    }

    /// Mint a pair and record it so it can be revoked later.
    async fn issue_session(&self, user_id: &str, deadline: Instant) -> AuthResult<TokenPair> {
        let pair = self.token_service.generate_token_pair(user_id)?;

        let record = IssuedTokenEntity::new(
            user_id.to_string(),
            pair.access_token.clone(),
            pair.refresh_token.clone(),
            pair.access_token_id.clone(),
            pair.refresh_token_id.clone(),
        );
        store_call(
            deadline,
            "create_token_record",
            self.token_repository.create(record),
        )
        .await?;

        Ok(pair)
    }

    async fn login_until(&self, data: LoginData, deadline: Instant) -> AuthResult<SessionResult> {
        if data.email.trim().is_empty() || data.password.is_empty() {
            return Err(AuthError::BadRequest(
                "email and password are required".to_string(),
            ));
        }
        let email = normalize_email(&data.email);

        let user = store_call(
            deadline,
            "find_by_email",
            self.user_repository.find_by_email(&email),
        )
        .await?;

        let Some(user) = user else {
            let hash = self.dummy_hash().await?;
            let _ = self.verify_password(hash, data.password).await;
            debug!("login rejected: unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        self.verify_password(user.password_hash.clone(), data.password)
            .await
            .inspect_err(|e| {
                if matches!(e, AuthError::InvalidCredentials) {
                    debug!(user_id = %user.id_hex(), "login rejected: wrong password");
                }
            })?;

        let user_id = user.id_hex();
        let pair = self.issue_session(&user_id, deadline).await?;

        info!(user_id = %user_id, "user logged in");

        Ok(SessionResult {
            user: user_entity_to_user(user),
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        })
    }
}

fn required(value: &str, field: &str) -> AuthResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AuthError::BadRequest(format!("{field} is required")));
    }
    Ok(value.to_string())
}

fn valid_email(email: &str) -> AuthResult<String> {
    let email = normalize_email(email);
    if !is_valid_email(&email) {
        return Err(AuthError::BadRequest("invalid email address".to_string()));
    }
    Ok(email)
}

#[async_trait]
impl CredentialService for CredentialServiceImpl {
    async fn register(&self, data: RegistrationData) -> AuthResult<SessionResult> {
        let deadline = self.flow_deadline();
        let first_name = required(&data.first_name, "first name")?;
        let last_name = required(&data.last_name, "last name")?;
        let email = valid_email(&data.email)?;
        let phone_number = match data.phone_number.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(phone) if is_valid_phone(phone) => Some(phone.to_string()),
            Some(_) => return Err(AuthError::BadRequest("invalid phone number".to_string())),
        };
        ensure_acceptable(&data.password)?;

        let taken = store_call(
            deadline,
            "email_exists",
            self.user_repository.email_exists(&email),
        )
        .await?;
        if taken {
            return Err(AuthError::Conflict("email already registered".to_string()));
        }

        let colour = default_profile_colour(&first_name, &last_name)?;
        let password_hash = self.hash_password(data.password.clone()).await?;

        let user = store_call(
            deadline,
            "create_user",
            self.user_repository.create_user(UserCreationData {
                first_name,
                last_name,
                email: email.clone(),
                phone_number,
                password_hash,
                colour,
            }),
        )
        .await?;

        info!(user_id = %user.id_hex(), "user registered");

        self.login_until(
            LoginData {
                email,
                password: data.password,
            },
            deadline,
        )
        .await
    }

    async fn login(&self, data: LoginData) -> AuthResult<SessionResult> {
        self.login_until(data, self.flow_deadline()).await
    }

    async fn forgot_password(&self, data: ForgotPasswordData) -> AuthResult<()> {
        let deadline = self.flow_deadline();
        let email = valid_email(&data.email)?;
        let redirect_to = required(&data.redirect_to, "redirect target")?;

        let user = store_call(
            deadline,
            "find_by_email",
            self.user_repository.find_by_email(&email),
        )
        .await?
        .ok_or_else(|| AuthError::NotFound("user not found".to_string()))?;

        let token = self.token_service.generate_email_token(&user.email)?;

        notify(
            deadline,
            "send_forgot_password_email",
            &user.email,
            self.notifier
                .send_forgot_password_email(&user.first_name, &user.email, &token, &redirect_to),
        )
        .await;

        info!(user_id = %user.id_hex(), "password reset requested");
        Ok(())
    }

    async fn reset_password(&self, data: ResetPasswordData) -> AuthResult<()> {
        let deadline = self.flow_deadline();
        let token = required(&data.token, "reset token")?;
        ensure_acceptable(&data.new_password)?;

        let decoded = self.token_service.decode_email_token(&token)?;

        let mut user = store_call(
            deadline,
            "find_by_email",
            self.user_repository.find_by_email(&decoded.subject),
        )
        .await?
        .ok_or_else(|| AuthError::NotFound("user not found".to_string()))?;

        // Tokens carry whole seconds, so one issued in the same second as the
        // last change still passes.
        let superseded = user
            .password_last_changed
            .is_some_and(|changed| decoded.issued_at.timestamp() < changed.timestamp());
        if superseded {
            debug!(user_id = %user.id_hex(), "reset token predates the last password change");
            return Err(AuthError::TokenInvalid);
        }

        let user_id = user.id_hex();
        let password_hash = self.hash_password(data.new_password).await?;

        // Sessions end before the new password is stored: a failure here
        // leaves the account untouched and the token still usable.
        let mut revoked = store_call(
            deadline,
            "revoke_all_for_user",
            self.token_repository.revoke_all_for_user(&user_id),
        )
        .await?;

        let now = Utc::now();
        user.password_hash = password_hash;
        user.password_last_changed = Some(now);
        user.updated_at = now;

        store_call(deadline, "save_user", self.user_repository.save(&user)).await?;

        // Sessions opened with the old password while saving.
        match store_call(
            deadline,
            "revoke_all_for_user",
            self.token_repository.revoke_all_for_user(&user_id),
        )
        .await
        {
            Ok(late) => revoked += late,
            Err(_) => error!(user_id = %user_id, "sessions opened during the reset may survive"),
        }

        info!(user_id = %user_id, revoked_sessions = revoked, "password reset");

        notify(
            deadline,
            "send_password_reset_confirmation",
            &user.email,
            self.notifier
                .send_password_reset_confirmation(&user.first_name, &user.email),
        )
        .await;

        Ok(())
    }

    async fn logout(&self, access_token: &str) -> AuthResult<()> {
        let deadline = self.flow_deadline();
        let decoded = self.token_service.decode_access_token(access_token)?;

        let revoked = store_call(
            deadline,
            "revoke_token",
            self.token_repository.revoke(&decoded.token_id),
        )
        .await?;
        if !revoked {
            return Err(AuthError::TokenInvalid);
        }

        info!(user_id = %decoded.subject, "user logged out");
        Ok(())
    }

    async fn refresh(&self, refresh_token: &str) -> AuthResult<TokenPair> {
        let deadline = self.flow_deadline();
        let decoded = self.token_service.decode_refresh_token(refresh_token)?;

        let record = store_call(
            deadline,
            "find_by_refresh_token_id",
            self.token_repository
                .find_by_refresh_token_id(&decoded.token_id),
        )
        .await?
        .filter(|record| record.user_id == decoded.subject)
        .ok_or(AuthError::TokenInvalid)?;

        // Losing a concurrent refresh for the same pair means the token was
        // already spent.
        let revoked = store_call(
            deadline,
            "revoke_token",
            self.token_repository.revoke(&record.access_token_id),
        )
        .await?;
        if !revoked {
            return Err(AuthError::TokenInvalid);
        }

        let pair = self.issue_session(&decoded.subject, deadline).await?;
        info!(user_id = %decoded.subject, "session refreshed");
        Ok(pair)
    }

    async fn validate_token(&self, access_token: &str) -> AuthResult<String> {
        within(
            self.flow_deadline(),
            "validate_token",
            self.token_service.resolve_access_token(access_token),
        )
        .await
    }
}
