//! Test doubles for the domain's collaborator traits.

use crate::notifier::{Notifier, NotifierError};
use crate::token_codec::TokenConfig;
use async_trait::async_trait;
use std::sync::Mutex;

/// Signing configuration with fixed, distinct secrets.
pub fn test_token_config() -> TokenConfig {
    TokenConfig::new(
        "access-secret".to_owned(),
        "refresh-secret".to_owned(),
        "email-secret".to_owned(),
        "issuer".to_owned(),
        "audience".to_owned(),
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentNotification {
    ForgotPassword {
        display_name: String,
        email: String,
        token: String,
        redirect_to: String,
    },
    ResetConfirmation {
        display_name: String,
        email: String,
    },
}

/// Records every notification. Reports failure after recording when built
/// with [`RecordingNotifier::failing`].
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentNotification>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<SentNotification> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }

    fn record(&self, notification: SentNotification) -> Result<(), NotifierError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(notification);
        }
        if self.fail {
            return Err(NotifierError::SendFailed("smtp relay unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_forgot_password_email(
        &self,
        display_name: &str,
        email: &str,
        token: &str,
        redirect_to: &str,
    ) -> Result<(), NotifierError> {
        self.record(SentNotification::ForgotPassword {
            display_name: display_name.to_string(),
            email: email.to_string(),
            token: token.to_string(),
            redirect_to: redirect_to.to_string(),
        })
    }

    async fn send_password_reset_confirmation(
        &self,
        display_name: &str,
        email: &str,
    ) -> Result<(), NotifierError> {
        self.record(SentNotification::ResetConfirmation {
            display_name: display_name.to_string(),
            email: email.to_string(),
        })
    }
}
