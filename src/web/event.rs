//! Pipeline notifications the gate reacts to.

use std::fmt;

use http::StatusCode;

/// Distinguishes top-level requests from internal re-dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// The request as sent by the client
    Main,
    /// An internal re-dispatch, e.g. rendering a custom error page
    Sub,
}

/// An error thrown while handling a request.
///
/// Only `NotFound` and `AccessDenied` trigger the exception hook; anything
/// else is left to the host's error handling.
///
/// # Examples
///
/// ```
/// use auth_gate::HttpError;
/// use http::StatusCode;
///
/// assert_eq!(HttpError::from_status(StatusCode::NOT_FOUND), HttpError::NotFound);
/// assert!(HttpError::AccessDenied.is_gated());
/// assert!(!HttpError::from_status(StatusCode::BAD_GATEWAY).is_gated());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpError {
    /// 404
    NotFound,
    /// 403
    AccessDenied,
    /// Any other failure status
    Status(StatusCode),
}

impl HttpError {
    /// Classifies a failure status.
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::NOT_FOUND => HttpError::NotFound,
            StatusCode::FORBIDDEN => HttpError::AccessDenied,
            other => HttpError::Status(other),
        }
    }

    /// Returns the status this error renders as.
    pub fn status(&self) -> StatusCode {
        match self {
            HttpError::NotFound => StatusCode::NOT_FOUND,
            HttpError::AccessDenied => StatusCode::FORBIDDEN,
            HttpError::Status(status) => *status,
        }
    }

    /// Returns true if the exception hook should evaluate the principal.
    pub fn is_gated(&self) -> bool {
        matches!(self, HttpError::NotFound | HttpError::AccessDenied)
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpError::NotFound => write!(f, "not found"),
            HttpError::AccessDenied => write!(f, "access denied"),
            HttpError::Status(status) => write!(f, "request failed with {}", status),
        }
    }
}

impl std::error::Error for HttpError {}
