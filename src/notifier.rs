//! SMTP delivery of password reset emails.

use crate::config::SmtpConfig;
use async_trait::async_trait;
use auth_domain::{Notifier, NotifierError};
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

pub struct SmtpNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotifier {
    pub fn new(config: &SmtpConfig) -> Result<Self, NotifierError> {
        let from = parse_mailbox(&config.from)?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|e| NotifierError::SendFailed(e.to_string()))?
            .port(config.port);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            mailer: builder.build(),
            from,
        })
    }

    async fn deliver(&self, message: Message) -> Result<(), NotifierError> {
        self.mailer
            .send(message)
            .await
            .map_err(|e| NotifierError::SendFailed(e.to_string()))?;
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotifierError> {
    address
        .parse()
        .map_err(|e| NotifierError::InvalidAddress(format!("{address}: {e}")))
}

/// Link the user follows to pick a new password.
pub fn reset_link(redirect_to: &str, token: &str) -> String {
    let separator = if redirect_to.contains('?') { '&' } else { '?' };
    format!("{redirect_to}{separator}token={token}")
}

pub fn forgot_password_body(display_name: &str, link: &str) -> String {
    format!(
        "Hi {display_name},\n\n\
         We received a request to reset your password. Use the link below to choose a new one:\n\n\
         {link}\n\n\
         The link expires shortly. If you did not ask for a reset you can ignore this email.\n"
    )
}

pub fn reset_confirmation_body(display_name: &str) -> String {
    format!(
        "Hi {display_name},\n\n\
         Your password was just changed and every signed-in session was ended.\n\
         If this was not you, reset your password again immediately.\n"
    )
}

fn build_message(
    from: &Mailbox,
    to: &str,
    subject: &str,
    body: String,
) -> Result<Message, NotifierError> {
    Message::builder()
        .from(from.clone())
        .to(parse_mailbox(to)?)
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(body)
        .map_err(|e| NotifierError::SendFailed(e.to_string()))
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send_forgot_password_email(
        &self,
        display_name: &str,
        email: &str,
        token: &str,
        redirect_to: &str,
    ) -> Result<(), NotifierError> {
        let body = forgot_password_body(display_name, &reset_link(redirect_to, token));
        let message = build_message(&self.from, email, "Reset your password", body)?;

        self.deliver(message).await?;
        info!(email, "forgot password email sent");
        Ok(())
    }

    async fn send_password_reset_confirmation(
        &self,
        display_name: &str,
        email: &str,
    ) -> Result<(), NotifierError> {
        let message = build_message(
            &self.from,
            email,
            "Your password has been changed",
            reset_confirmation_body(display_name),
        )?;

        self.deliver(message).await?;
        info!(email, "password reset confirmation sent");
        Ok(())
    }
}
