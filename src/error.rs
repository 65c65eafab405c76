//! Error types for mmiv.

use thiserror::Error;

use crate::upload::UploadError;

/// Common error type for mmiv.
#[derive(Error, Debug)]
pub enum MmivError {
    /// Database error.
    ///
    /// The store could not be reached or a statement failed. Errors from sqlx
    /// are converted automatically.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Authentication error.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Permission denied error.
    #[error("permission denied: {0}")]
    Permission(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Rejected image upload.
    #[error("upload error: {0}")]
    Upload(#[from] UploadError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for MmivError {
    fn from(e: sqlx::Error) -> Self {
        MmivError::Database(e.to_string())
    }
}

/// Result type alias for mmiv operations.
pub type Result<T> = std::result::Result<T, MmivError>;

/// Result of a guarded operation.
///
/// A denial and a validation failure are ordinary outcomes, not errors: the
/// store is untouched in both cases. The surrounding `Result` only carries
/// store or file-system failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The operation was performed.
    Done(T),
    /// The actor lacks the rank or ownership required.
    Denied(String),
    /// The request was malformed or referenced something absent.
    Invalid(String),
}

impl<T> Outcome<T> {
    /// Shorthand for a denial.
    pub fn denied(reason: impl Into<String>) -> Self {
        Outcome::Denied(reason.into())
    }

    /// Shorthand for a validation failure.
    pub fn invalid(reason: impl Into<String>) -> Self {
        Outcome::Invalid(reason.into())
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Outcome::Done(_))
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, Outcome::Denied(_))
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Outcome::Invalid(_))
    }

    /// Map the value of a completed operation.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Outcome<U> {
        match self {
            Outcome::Done(v) => Outcome::Done(f(v)),
            Outcome::Denied(r) => Outcome::Denied(r),
            Outcome::Invalid(r) => Outcome::Invalid(r),
        }
    }

    /// Fold into the crate error type, for callers that want `?`.
    pub fn into_result(self) -> Result<T> {
        match self {
            Outcome::Done(v) => Ok(v),
            Outcome::Denied(r) => Err(MmivError::Permission(r)),
            Outcome::Invalid(r) => Err(MmivError::Validation(r)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_display() {
        let err = MmivError::Auth("invalid password".to_string());
        assert_eq!(err.to_string(), "authentication error: invalid password");
    }

    #[test]
    fn test_permission_error_display() {
        let err = MmivError::Permission("moderator rank required".to_string());
        assert_eq!(err.to_string(), "permission denied: moderator rank required");
    }

    #[test]
    fn test_not_found_error_display() {
        let err = MmivError::NotFound("post".to_string());
        assert_eq!(err.to_string(), "post not found");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: MmivError = io_err.into();
        assert!(matches!(err, MmivError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_upload_error_conversion() {
        let err: MmivError = UploadError::UnsupportedExtension("bmp".to_string()).into();
        assert!(matches!(err, MmivError::Upload(_)));
        assert!(err.to_string().starts_with("upload error:"));
    }

    #[test]
    fn test_outcome_into_result() {
        assert_eq!(Outcome::Done(3).into_result().unwrap(), 3);

        let denied: Outcome<i32> = Outcome::denied("nope");
        assert!(matches!(denied.into_result(), Err(MmivError::Permission(_))));

        let invalid: Outcome<i32> = Outcome::invalid("bad id");
        assert!(matches!(
            invalid.into_result(),
            Err(MmivError::Validation(msg)) if msg == "bad id"
        ));
    }

    #[test]
    fn test_outcome_map_keeps_reason() {
        let out: Outcome<i32> = Outcome::denied("rank");
        assert_eq!(out.map(|v| v + 1), Outcome::Denied("rank".to_string()));
        assert_eq!(Outcome::Done(1).map(|v| v + 1), Outcome::Done(2));
    }
}
