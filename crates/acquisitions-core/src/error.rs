//! Error types for `acquisitions-core`.
//!
//! Every gate in the request pipeline reports its expected failures as a
//! [`CoreError`] variant so callers can match on the kind instead of on
//! message text.

use std::fmt;

use crate::identity::UserId;

/// Why the Authentication Gate refused a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// Neither the `token` cookie nor a bearer header was present.
    NoCredential,
    /// The credential failed signature, format, expiry or revocation checks.
    InvalidOrExpired,
    /// The credential was valid but its subject no longer exists.
    UserNotFound,
    /// An authorization check ran without a resolved identity.
    MissingIdentity,
}

impl AuthFailure {
    /// The client-facing message for this failure.
    pub fn message(self) -> &'static str {
        match self {
            AuthFailure::NoCredential => "No access token provided",
            AuthFailure::InvalidOrExpired => "Invalid or expired token",
            AuthFailure::UserNotFound => "Invalid token - user not found",
            AuthFailure::MissingIdentity => "Authentication required",
        }
    }
}

impl fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Unified error type for all core operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The caller could not be identified.
    #[error("unauthenticated: {0}")]
    Unauthenticated(AuthFailure),

    /// The caller is identified but policy disallows the operation.
    /// The payload is the client-facing message.
    #[error("{0}")]
    Forbidden(String),

    /// A business rule rejected the operation (e.g. removing the last admin).
    #[error("{0}")]
    InvalidOperation(String),

    /// No user record with this id exists.
    #[error("user not found: {0}")]
    UserNotFound(UserId),

    /// Another account already uses this email address.
    #[error("email already exists: {0}")]
    EmailTaken(String),

    /// The rate-limit oracle could not produce a verdict.
    #[error("rate limiter unavailable: {0}")]
    Oracle(String),
}

/// Convenience alias used throughout `acquisitions-core`.
pub type CoreResult<T> = Result<T, CoreError>;
