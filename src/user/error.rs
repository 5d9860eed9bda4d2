//! User pipeline errors.

use validator::ValidationErrors;

use crate::user::StoreError;

pub type Result<T> = std::result::Result<T, UserError>;

pub const ERR_EMAIL_IN_USE: &str = "The provided email is already in use";
pub const ERR_EMAIL_BLANK: &str = "The email must not be empty";
pub const ERR_ID_OUT_OF_RANGE: &str = "The id is out of range";
pub const ERR_ID_MISSING: &str = "The id must be provided";

/// What made an argument invalid.
#[derive(Debug, thiserror::Error)]
pub enum ArgumentError {
    #[error("{0}")]
    Message(&'static str),

    #[error("validation error occurred")]
    Fields(#[from] ValidationErrors),
}

/// Errors surfaced by the user orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error(transparent)]
    InvalidArgument(ArgumentError),

    #[error("{0}")]
    Conflict(&'static str),

    #[error(transparent)]
    Storage(StoreError),
}

impl UserError {
    /// Invalid argument described by `message`.
    pub fn invalid(message: &'static str) -> Self {
        Self::InvalidArgument(ArgumentError::Message(message))
    }
}

impl From<ValidationErrors> for UserError {
    fn from(errors: ValidationErrors) -> Self {
        Self::InvalidArgument(ArgumentError::Fields(errors))
    }
}

impl From<StoreError> for UserError {
    fn from(err: StoreError) -> Self {
        match err {
            // A racing write lost against the unique index.
            StoreError::UniqueViolation => Self::Conflict(ERR_EMAIL_IN_USE),
            err => Self::Storage(err),
        }
    }
}
