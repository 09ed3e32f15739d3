pub mod credential_service;
mod deadline;
pub mod error;
pub mod hashing_service;
mod mappers;
pub mod models;
pub mod notifier;
pub mod password_strength;
pub mod profile_colour;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
pub mod token_codec;
pub mod token_service;
mod utils;

pub use credential_service::{CredentialService, CredentialServiceImpl};
pub use error::{AuthError, AuthResult};
pub use hashing_service::{HashingService, Pbkdf2HashingService};
pub use models::{SessionResult, TokenPair, User};
pub use notifier::{Notifier, NotifierError};
pub use token_codec::{JwtTokenCodec, TokenClass, TokenCodec, TokenConfig};
pub use token_service::{DefaultTokenService, TokenLifetimes, TokenService};
