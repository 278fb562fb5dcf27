//! User-facing notifications emitted by auth flows.

use serde::{Deserialize, Serialize};

/// Visual weight of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    /// Operation succeeded.
    Success,
    /// Neutral information.
    Info,
    /// Operation failed.
    Error,
}

/// A toast-style message for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Short headline.
    pub title: String,
    /// One-sentence detail.
    pub description: String,
    /// Visual weight.
    pub level: NotificationLevel,
}

impl Notification {
    /// Creates a notification.
    #[must_use]
    pub fn new(
        level: NotificationLevel,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            level,
        }
    }

    /// Successful sign-in.
    #[must_use]
    pub fn login_succeeded(name: &str) -> Self {
        Self::new(
            NotificationLevel::Success,
            "Login Successful",
            format!("Welcome back, {name}!"),
        )
    }

    /// Failed sign-in.
    #[must_use]
    pub fn login_failed(description: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, "Login Failed", description)
    }

    /// Account and profile created.
    #[must_use]
    pub fn account_created(name: &str) -> Self {
        Self::new(
            NotificationLevel::Success,
            "Account Created",
            format!("Welcome to Quote-Connect, {name}!"),
        )
    }

    /// Account created but the profile write failed.
    #[must_use]
    pub fn profile_incomplete() -> Self {
        Self::new(
            NotificationLevel::Error,
            "Profile Incomplete",
            "Your account was created, but your profile could not be saved. Please complete it later.",
        )
    }

    /// Failed sign-up.
    #[must_use]
    pub fn signup_failed(description: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, "Signup Failed", description)
    }

    /// Form rejected before submission.
    #[must_use]
    pub fn validation_failed(description: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, "Validation Error", description)
    }

    /// Local sign-out.
    #[must_use]
    pub fn logged_out() -> Self {
        Self::new(
            NotificationLevel::Info,
            "Logged Out",
            "You have been successfully logged out",
        )
    }

    /// Provider could not confirm the sign-out.
    #[must_use]
    pub fn logout_failed(description: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, "Logout Incomplete", description)
    }

    /// Provider ended the session out of band.
    #[must_use]
    pub fn session_expired() -> Self {
        Self::new(
            NotificationLevel::Info,
            "Session Expired",
            "You have been signed out. Please sign in again.",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_welcome_messages_use_name() {
        assert_eq!(
            Notification::login_succeeded("Demo Customer").description,
            "Welcome back, Demo Customer!"
        );
        let created = Notification::account_created("Ada");
        assert_eq!(created.title, "Account Created");
        assert_eq!(created.level, NotificationLevel::Success);
    }

    #[test]
    fn test_failure_levels() {
        assert_eq!(
            Notification::login_failed("Invalid email or password").level,
            NotificationLevel::Error
        );
        assert_eq!(Notification::logged_out().level, NotificationLevel::Info);
    }
}
