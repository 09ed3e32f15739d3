//! Composition root for the credential and session core: configuration,
//! tracing, SMTP delivery, MongoDB wiring and boundary error mapping.

pub mod bootstrap;
pub mod config;
pub mod mapper;
pub mod notifier;
pub mod telemetry;

pub use bootstrap::{bootstrap_from_env, build_credential_service, AuthContext};
pub use config::{AppConfig, ConfigError};
pub use mapper::IntoStatus;
pub use telemetry::init_tracing;
