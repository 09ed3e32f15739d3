//! Error type for the data layer

use mongodb::error::{ErrorKind, WriteFailure};
use thiserror::Error;

const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Debug, Error)]
pub enum AuthDataError {
    /// Unique email index violated
    #[error("Email already taken")]
    EmailTaken,

    #[error("User not found")]
    UserNotFound,

    #[error("MongoDB error: {0}")]
    MongoError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AuthDataError {
    /// Map a failed write, turning a unique-index violation into `on_duplicate`.
    pub(crate) fn from_write(err: mongodb::error::Error, on_duplicate: Self) -> Self {
        let duplicate = matches!(
            err.kind.as_ref(),
            ErrorKind::Write(WriteFailure::WriteError(write_error))
                if write_error.code == DUPLICATE_KEY_CODE
        );
        if duplicate {
            on_duplicate
        } else {
            err.into()
        }
    }
}

impl From<mongodb::error::Error> for AuthDataError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::MongoError(err.to_string())
    }
}

impl From<bson::ser::Error> for AuthDataError {
    fn from(err: bson::ser::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

impl From<bson::de::Error> for AuthDataError {
    fn from(err: bson::de::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}
