//! `twoface::Error` wraps a Rust error type with a user-facing description. Storage failures,
//! file paths and SQL errors stay in the logs; the caller only sees the external half.

mod extensions;
pub mod externalerror;
mod integrations;

pub use extensions::*;
pub use externalerror::{Cause, ExternalError};
use std::fmt;
use std::fmt::{Display, Formatter};

/// Wraps a Rust error type with a user-facing description.
#[derive(Debug)]
pub struct TfError {
    /// The underlying error, from some function. May contain sensitive information, so it should
    /// not be shown to users.
    pub internal: anyhow::Error,
    /// A user-friendly error that doesn't contain any sensitive information.
    pub external: ExternalError,
}

impl TfError {
    /// An error that has no interesting internal cause, e.g. a rejected request field.
    pub fn user(external: ExternalError) -> Self {
        Self {
            internal: anyhow::anyhow!("{}", external),
            external,
        }
    }
}

/// Displaying a twoface::Error will only display the external section. The internal error remains
/// private.
impl Display for TfError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::result::Result<(), fmt::Error> {
        write!(f, "{}", self.external)
    }
}

/// Return type of a function that could fail. If it fails, it includes a twoface error (an error with
/// both internal- and external-facing values).
pub type Fallible<T> = Result<T, TfError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_external_part_is_shown() {
        let io_err = std::fs::read("data/secret-flaggedPosts.json").unwrap_err();
        let err = io_err.describe(ExternalError {
            cause: Cause::ServerError,
            text: "Could not load moderation records",
        });
        assert_eq!(
            err.to_string(),
            "ServerError: Could not load moderation records"
        );
        assert!(err.internal.to_string().len() > 0);
    }

    #[test]
    fn test_user_errors_keep_their_cause() {
        let err = TfError::user(ExternalError::MISSING_TEXT);
        assert_eq!(err.external.cause, Cause::UserInvalidField);
        assert_eq!(
            err.to_string(),
            "UserInvalidField: Missing required field: text"
        );
    }
}
