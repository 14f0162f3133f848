use actix_web::http::StatusCode;
use std::fmt;

/// Used to create HTTP responses with the given text and status code.
#[derive(Debug, Clone, Copy)]
pub struct ExternalError {
    /// A user-facing explanation of what caused the error.
    pub cause: Cause,
    /// Error text that will describe the problem to the user.
    pub text: &'static str,
}

/// A user-facing explanation of what caused the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cause {
    ServerError,
    UserInvalidField,
    UserBadAuth,
    NotFound,
    RateLimited,
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        // Make fmt::Display the same as fmt::Debug, i.e. each variant's name.
        write!(f, "{:?}", self)
    }
}

impl Into<StatusCode> for Cause {
    /// Causes can be mapped to HTTP status codes. ExternalError doesn't use status codes directly,
    /// because the stores and ledgers shouldn't need to know about HTTP codes.
    fn into(self) -> StatusCode {
        match self {
            Self::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::UserInvalidField => StatusCode::BAD_REQUEST,
            Self::UserBadAuth => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl ExternalError {
    pub const UNAUTHORIZED: Self = Self {
        cause: Cause::UserBadAuth,
        text: "Unauthorized",
    };
    pub const MISSING_TEXT: Self = Self {
        cause: Cause::UserInvalidField,
        text: "Missing required field: text",
    };
    pub const INVALID_BODY: Self = Self {
        cause: Cause::UserInvalidField,
        text: "Request body is not valid JSON",
    };
    pub const MISSING_REPORT_FIELDS: Self = Self {
        cause: Cause::UserInvalidField,
        text: "Missing required fields: postId, reason",
    };
    pub const REPORT_NOT_FOUND: Self = Self {
        cause: Cause::NotFound,
        text: "Report not found",
    };
    pub const FLAG_NOT_FOUND: Self = Self {
        cause: Cause::NotFound,
        text: "Flagged post not found",
    };
    pub const RATE_LIMITED: Self = Self {
        cause: Cause::RateLimited,
        text: "Rate limit exceeded: maximum 1 post per day per IP",
    };
    pub const RECORDS_UNAVAILABLE: Self = Self {
        cause: Cause::ServerError,
        text: "Could not persist moderation records",
    };
}

impl fmt::Display for ExternalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{}: {}", self.cause, self.text)
    }
}

impl Default for ExternalError {
    // Default to ServerError and a very vague generic message.
    fn default() -> Self {
        Self {
            cause: Cause::ServerError,
            text: "Internal server error",
        }
    }
}
