use auth_domain::AuthError;
use tonic::Status;

/// Boundary mapping of domain errors. Messages are fixed strings so nothing
/// internal reaches the caller.
pub trait IntoStatus {
    fn into_status(self) -> Status;
}

impl IntoStatus for AuthError {
    fn into_status(self) -> Status {
        match self {
            AuthError::BadRequest(reason) => Status::invalid_argument(reason),
            AuthError::InvalidCredentials => Status::unauthenticated("Invalid credentials"),
            AuthError::Conflict(_) => Status::already_exists("Account already exists"),
            AuthError::NotFound(_) => Status::not_found("Account not found"),
            AuthError::TokenInvalid => Status::unauthenticated("Invalid token"),
            AuthError::TokenExpired => Status::unauthenticated("Token has expired"),
            AuthError::InternalError(_) => Status::internal("Internal server error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonic::Code;

    #[test]
    fn each_error_kind_maps_to_a_status_code() {
        let cases = [
            (AuthError::BadRequest("invalid email address".into()), Code::InvalidArgument),
            (AuthError::InvalidCredentials, Code::Unauthenticated),
            (AuthError::Conflict("email already registered".into()), Code::AlreadyExists),
            (AuthError::NotFound("user not found".into()), Code::NotFound),
            (AuthError::TokenInvalid, Code::Unauthenticated),
            (AuthError::TokenExpired, Code::Unauthenticated),
            (AuthError::InternalError("insert failed".into()), Code::Internal),
        ];

        for (error, code) in cases {
            assert_eq!(error.into_status().code(), code);
        }
    }

    #[test]
    fn internal_details_are_not_exposed() {
        let status =
            AuthError::InternalError("MongoDB error: connection refused to 10.0.0.4".into())
                .into_status();

        assert_eq!(status.message(), "Internal server error");
    }

    #[test]
    fn expiry_is_distinguishable_from_tampering() {
        let expired = AuthError::TokenExpired.into_status();
        let invalid = AuthError::TokenInvalid.into_status();

        assert_eq!(expired.code(), invalid.code());
        assert_ne!(expired.message(), invalid.message());
    }
}
