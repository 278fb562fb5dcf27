//! Outcome of a route access check.

/// What the presentation layer should do for a protected view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    /// Session is still being established; show a loading indicator and re-check.
    Loading,
    /// Nobody is signed in; navigate to the entry point.
    Redirect {
        /// Route to navigate to.
        to: String,
    },
    /// Signed in, but the role may not see this view.
    Forbidden,
    /// Render the view.
    Allow,
}

impl AccessDecision {
    /// True when the view may be rendered.
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// True for the transient loading outcome.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Short label for logs and CLI output.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Loading => "loading".to_string(),
            Self::Redirect { to } => format!("redirect to {to}"),
            Self::Forbidden => "forbidden".to_string(),
            Self::Allow => "allow".to_string(),
        }
    }
}
