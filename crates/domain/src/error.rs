//! Domain error types

use thiserror::Error;

use crate::identity::Identity;

/// A required field is missing or malformed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    /// Name of the offending field.
    pub field: &'static str,
    /// Human-readable reason, suitable for a form hint.
    pub reason: String,
}

impl ValidationError {
    /// Creates a validation error for `field`.
    #[must_use]
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Errors raised by authentication flows and identity providers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Email/password pair was rejected.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// An account already exists for this email.
    #[error("email already in use")]
    EmailInUse,

    /// Input failed client-side validation; no provider call was made.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// No profile record exists for the identity.
    #[error("profile not found: {0}")]
    NotFound(String),

    /// Transport or service failure with an opaque cause.
    #[error("provider error: {0}")]
    Provider(String),

    /// The auth record was created but the profile record was not.
    #[error("account created, profile incomplete: {cause}")]
    PartialSignupFailure {
        /// Best-effort identity built from the auth record and the submitted fields.
        identity: Box<Identity>,
        /// Why the profile write failed.
        cause: String,
    },

    /// Another login or signup is already in flight.
    #[error("another authentication request is in progress")]
    Busy,

    /// The session changed (e.g. logout) while this flow was in flight.
    #[error("session changed while the request was in flight")]
    Superseded,

    /// The provider did not answer within the configured timeout.
    #[error("provider request timed out")]
    Timeout,
}

impl AuthError {
    /// Creates a provider error from any displayable cause.
    #[must_use]
    pub fn provider(cause: impl std::fmt::Display) -> Self {
        Self::Provider(cause.to_string())
    }

    /// Returns true for failures caused by the user's input rather than the provider.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials | Self::EmailInUse | Self::Validation(_)
        )
    }

    /// Message suitable for a notification description.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidCredentials => "Invalid email or password".to_string(),
            Self::EmailInUse => "Email already in use".to_string(),
            Self::Validation(err) => err.reason.clone(),
            Self::NotFound(_) => "No profile was found for this account".to_string(),
            Self::Provider(cause) => cause.clone(),
            Self::PartialSignupFailure { .. } => {
                "Your account was created, but your profile is incomplete".to_string()
            }
            Self::Busy => "Please wait for the current request to finish".to_string(),
            Self::Superseded => "The session changed while signing in".to_string(),
            Self::Timeout => "The server did not respond in time".to_string(),
        }
    }
}

/// Result type alias for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new("email", "Email is required");
        assert_eq!(err.to_string(), "email: Email is required");
    }

    #[test]
    fn test_validation_converts_into_auth_error() {
        let err: AuthError = ValidationError::new("role", "Please select a role").into();
        assert!(matches!(err, AuthError::Validation(ref v) if v.field == "role"));
        assert!(err.is_user_error());
    }

    #[test]
    fn test_provider_errors_are_not_user_errors() {
        assert!(!AuthError::provider("connection reset").is_user_error());
        assert!(!AuthError::Timeout.is_user_error());
        assert!(AuthError::InvalidCredentials.is_user_error());
    }

    #[test]
    fn test_user_messages() {
        assert_eq!(
            AuthError::InvalidCredentials.user_message(),
            "Invalid email or password"
        );
        assert_eq!(AuthError::EmailInUse.user_message(), "Email already in use");
        let err: AuthError = ValidationError::new("role", "Please select a role").into();
        assert_eq!(err.user_message(), "Please select a role");
    }
}
