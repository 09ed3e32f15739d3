//! Process configuration read once at startup.

use auth_domain::{TokenConfig, TokenLifetimes};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::Level;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },

    #[error("token secrets must be distinct for each token class")]
    SharedSecret,
}

#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
}

#[derive(Clone)]
pub struct AppConfig {
    pub mongo_uri: String,
    pub mongo_db_name: String,
    pub access_secret: String,
    pub refresh_secret: String,
    pub email_secret: String,
    pub issuer: String,
    pub audience: String,
    pub access_ttl: chrono::Duration,
    pub refresh_ttl: chrono::Duration,
    pub email_ttl: chrono::Duration,
    pub operation_timeout: Duration,
    pub password_hash_iterations: u32,
    pub smtp: SmtpConfig,
    pub log_level: Level,
}

fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .filter(|value| !value.trim().is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn parsed<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

fn positive<F>(lookup: &F, name: &'static str, default: i64) -> Result<i64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value: i64 = parsed(lookup, name, default)?;
    if value <= 0 {
        return Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
        });
    }
    Ok(value)
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let access_secret = required(&lookup, "JWT_ACCESS_SECRET")?;
        let refresh_secret = required(&lookup, "JWT_REFRESH_SECRET")?;
        let email_secret = required(&lookup, "JWT_EMAIL_SECRET")?;
        if access_secret == refresh_secret
            || access_secret == email_secret
            || refresh_secret == email_secret
        {
            return Err(ConfigError::SharedSecret);
        }

        let iterations = positive(&lookup, "PASSWORD_HASH_ITERATIONS", 100_000)?;
        let password_hash_iterations =
            u32::try_from(iterations).map_err(|_| ConfigError::Invalid {
                name: "PASSWORD_HASH_ITERATIONS",
                value: iterations.to_string(),
            })?;

        Ok(Self {
            mongo_uri: required(&lookup, "MONGO_DB_URI")?,
            mongo_db_name: lookup("MONGO_DB_NAME").unwrap_or_else(|| "auth".to_string()),
            access_secret,
            refresh_secret,
            email_secret,
            issuer: lookup("JWT_ISSUER").unwrap_or_else(|| "account-auth".to_string()),
            audience: lookup("JWT_AUDIENCE").unwrap_or_else(|| "account-clients".to_string()),
            access_ttl: chrono::Duration::minutes(positive(&lookup, "ACCESS_TOKEN_TTL_MINUTES", 15)?),
            refresh_ttl: chrono::Duration::days(positive(&lookup, "REFRESH_TOKEN_TTL_DAYS", 7)?),
            email_ttl: chrono::Duration::minutes(positive(&lookup, "EMAIL_TOKEN_TTL_MINUTES", 30)?),
            operation_timeout: Duration::from_millis(
                positive(&lookup, "OPERATION_TIMEOUT_MS", 5_000)? as u64,
            ),
            password_hash_iterations,
            smtp: SmtpConfig {
                host: required(&lookup, "SMTP_HOST")?,
                port: parsed(&lookup, "SMTP_PORT", 587)?,
                username: lookup("SMTP_USERNAME"),
                password: lookup("SMTP_PASSWORD"),
                from: required(&lookup, "MAIL_FROM")?,
            },
            log_level: parsed(&lookup, "LOG_LEVEL", Level::INFO)?,
        })
    }

    pub fn token_config(&self) -> TokenConfig {
        TokenConfig::new(
            self.access_secret.clone(),
            self.refresh_secret.clone(),
            self.email_secret.clone(),
            self.issuer.clone(),
            self.audience.clone(),
        )
    }

    pub fn token_lifetimes(&self) -> TokenLifetimes {
        TokenLifetimes {
            access: self.access_ttl,
            refresh: self.refresh_ttl,
            email: self.email_ttl,
        }
    }
}

const REDACTED: &str = "<redacted>";

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("mongo_uri", &REDACTED)
            .field("mongo_db_name", &self.mongo_db_name)
            .field("access_secret", &REDACTED)
            .field("refresh_secret", &REDACTED)
            .field("email_secret", &REDACTED)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("email_ttl", &self.email_ttl)
            .field("operation_timeout", &self.operation_timeout)
            .field("password_hash_iterations", &self.password_hash_iterations)
            .field("smtp", &self.smtp)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| REDACTED))
            .field("from", &self.from)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("MONGO_DB_URI", "mongodb://localhost:27017"),
            ("JWT_ACCESS_SECRET", "access-secret"),
            ("JWT_REFRESH_SECRET", "refresh-secret"),
            ("JWT_EMAIL_SECRET", "email-secret"),
            ("SMTP_HOST", "smtp.example.com"),
            ("MAIL_FROM", "Accounts <no-reply@example.com>"),
        ])
    }

    fn load(env: &HashMap<&'static str, &'static str>) -> Result<AppConfig, ConfigError> {
        AppConfig::from_lookup(|name| env.get(name).map(|value| value.to_string()))
    }

    #[test]
    fn defaults_are_applied() {
        let config = load(&base_env()).unwrap();

        assert_eq!(config.mongo_db_name, "auth");
        assert_eq!(config.access_ttl, chrono::Duration::minutes(15));
        assert_eq!(config.refresh_ttl, chrono::Duration::days(7));
        assert_eq!(config.email_ttl, chrono::Duration::minutes(30));
        assert_eq!(config.operation_timeout, Duration::from_secs(5));
        assert_eq!(config.password_hash_iterations, 100_000);
        assert_eq!(config.smtp.port, 587);
        assert_eq!(config.log_level, Level::INFO);
    }

    #[test]
    fn overrides_are_parsed() {
        let mut env = base_env();
        env.insert("ACCESS_TOKEN_TTL_MINUTES", "5");
        env.insert("OPERATION_TIMEOUT_MS", "250");
        env.insert("SMTP_PORT", "2525");
        env.insert("LOG_LEVEL", "debug");

        let config = load(&env).unwrap();

        assert_eq!(config.token_lifetimes().access, chrono::Duration::minutes(5));
        assert_eq!(config.operation_timeout, Duration::from_millis(250));
        assert_eq!(config.smtp.port, 2525);
        assert_eq!(config.log_level, Level::DEBUG);
    }

    #[test]
    fn missing_secret_is_reported() {
        let mut env = base_env();
        env.remove("JWT_EMAIL_SECRET");

        assert!(matches!(
            load(&env),
            Err(ConfigError::Missing("JWT_EMAIL_SECRET"))
        ));
    }

    #[test]
    fn secrets_must_differ_per_class() {
        let mut env = base_env();
        env.insert("JWT_REFRESH_SECRET", "access-secret");

        assert!(matches!(load(&env), Err(ConfigError::SharedSecret)));
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let mut env = base_env();
        env.insert("REFRESH_TOKEN_TTL_DAYS", "0");
        assert!(matches!(load(&env), Err(ConfigError::Invalid { .. })));

        let mut env = base_env();
        env.insert("SMTP_PORT", "not-a-port");
        assert!(matches!(load(&env), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let mut env = base_env();
        env.insert("SMTP_PASSWORD", "smtp-password");
        let rendered = format!("{:?}", load(&env).unwrap());

        for secret in ["access-secret", "refresh-secret", "email-secret", "smtp-password"] {
            assert!(!rendered.contains(secret), "{secret} leaked");
        }
    }
}
