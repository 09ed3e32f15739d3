use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Send failed: {0}")]
    SendFailed(String),
}

/// Outbound delivery of account emails.
///
/// Callers treat every failure as non-fatal; the result only feeds logging.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_forgot_password_email(
        &self,
        display_name: &str,
        email: &str,
        token: &str,
        redirect_to: &str,
    ) -> Result<(), NotifierError>;

    async fn send_password_reset_confirmation(
        &self,
        display_name: &str,
        email: &str,
    ) -> Result<(), NotifierError>;
}
