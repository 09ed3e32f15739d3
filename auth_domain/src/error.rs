use auth_data::AuthDataError;
use thiserror::Error;

/// Domain-specific authentication errors
///
/// Every variant is safe to surface at the boundary: none carries a secret,
/// a password hash or a raw token.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Login failure. Says nothing about which factor failed or whether the
    /// account exists.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Token is invalid")]
    TokenInvalid,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<AuthDataError> for AuthError {
    fn from(err: AuthDataError) -> Self {
        match err {
            AuthDataError::EmailTaken => Self::Conflict("email already registered".to_string()),
            AuthDataError::UserNotFound => Self::NotFound("user not found".to_string()),
            other => Self::InternalError(other.to_string()),
        }
    }
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_errors_map_to_domain_kinds() {
        assert!(matches!(
            AuthError::from(AuthDataError::EmailTaken),
            AuthError::Conflict(_)
        ));
        assert!(matches!(
            AuthError::from(AuthDataError::UserNotFound),
            AuthError::NotFound(_)
        ));
        assert!(matches!(
            AuthError::from(AuthDataError::MongoError("socket closed".into())),
            AuthError::InternalError(_)
        ));
    }
}
