//! Process-wide session state.

use chrono::{DateTime, Utc};

use crate::identity::Identity;
use crate::role::Role;

/// The current user's authentication state.
///
/// Fields are private so that "authenticated" and "identity present" can
/// never disagree: there is no separate flag to get out of sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    identity: Option<Identity>,
    is_loading: bool,
    established_at: Option<DateTime<Utc>>,
}

impl Session {
    /// State at process start: loading, nobody signed in.
    #[must_use]
    pub const fn initial() -> Self {
        Self {
            identity: None,
            is_loading: true,
            established_at: None,
        }
    }

    /// Settled state with nobody signed in.
    #[must_use]
    pub const fn signed_out() -> Self {
        Self {
            identity: None,
            is_loading: false,
            established_at: None,
        }
    }

    /// Settled state for `identity`, established at `at`.
    #[must_use]
    pub const fn signed_in(identity: Identity, at: DateTime<Utc>) -> Self {
        Self {
            identity: Some(identity),
            is_loading: false,
            established_at: Some(at),
        }
    }

    /// Returns a copy with the loading flag replaced.
    #[must_use]
    pub fn with_loading(mut self, is_loading: bool) -> Self {
        self.is_loading = is_loading;
        self
    }

    /// The signed-in identity, if any.
    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// True while a restore or an auth flow is in progress.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// True iff an identity is present.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// Role of the signed-in identity.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.identity.as_ref().and_then(|identity| identity.role)
    }

    /// When the current identity was established.
    #[must_use]
    pub const fn established_at(&self) -> Option<DateTime<Utc>> {
        self.established_at
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::initial()
    }
}
