//! Front-end errors.

use quoteconnect_domain::{AccessDecision, AuthError};
use quoteconnect_infrastructure::{ConfigError, RemoteProviderError};

/// Errors reported by the command-line front-end.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Invalid or incomplete configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The remote provider could not be set up.
    #[error(transparent)]
    Remote(#[from] RemoteProviderError),

    /// An auth flow failed.
    #[error("{}", .0.user_message())]
    Auth(#[from] AuthError),

    /// The route guard did not allow the path.
    #[error("{path}: {}", .decision.describe())]
    AccessDenied {
        /// Requested path.
        path: String,
        /// What the guard decided.
        decision: AccessDecision,
    },
}
