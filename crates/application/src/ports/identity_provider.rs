//! Identity provider port
//!
//! Wraps an external auth/profile service. Two strategies exist in
//! infrastructure: a local directory of demo accounts and a remote
//! backend-as-a-service reached over REST.

use async_trait::async_trait;
use quoteconnect_domain::{
    AuthAccount, AuthResult, Credentials, Identity, ProfileRecord, SignupRequest,
};

use super::subscription::{Listener, Subscription};

/// Result of a successful password sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSession {
    /// The authenticated account.
    pub account: AuthAccount,
    /// Profile, when the provider returns it with the account.
    ///
    /// `None` means the provider keeps profiles separately and the caller
    /// must resolve it with [`IdentityProvider::fetch_profile`].
    pub profile: Option<ProfileRecord>,
}

/// Session change detected by the provider outside of an explicit call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionChange {
    /// A session was established elsewhere (e.g. another tab or device).
    SignedIn(Identity),
    /// The provider refreshed its access token; the identity is unchanged.
    TokenRefreshed,
    /// The provider ended the session (expiry, revocation, remote sign-out).
    SignedOut,
}

/// Capability set of an external identity service.
///
/// Every method may suspend on I/O. No method may leave partial state
/// behind on failure, except [`IdentityProvider::signup`], which reports a
/// created-but-incomplete account through
/// [`AuthError::PartialSignupFailure`](quoteconnect_domain::AuthError::PartialSignupFailure).
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Short adapter name for logs.
    fn name(&self) -> &'static str;

    /// Recovers a session from prior persisted state.
    ///
    /// # Returns
    /// `None` when there is nothing to restore or the stored state is unusable.
    ///
    /// # Errors
    /// `Provider` on transport failure.
    async fn restore_session(&self) -> AuthResult<Option<Identity>>;

    /// Signs in with an email/password pair.
    ///
    /// # Errors
    /// `InvalidCredentials` when rejected, `Provider` on transport failure.
    async fn login(&self, credentials: &Credentials) -> AuthResult<ProviderSession>;

    /// Creates the auth record and the profile record.
    ///
    /// # Errors
    /// `EmailInUse`, `Validation`, `Provider`, or `PartialSignupFailure`
    /// when the auth record exists but the profile write failed.
    async fn signup(&self, request: &SignupRequest) -> AuthResult<Identity>;

    /// Invalidates the current session with the provider.
    ///
    /// # Errors
    /// `Provider` on transport failure.
    async fn logout(&self) -> AuthResult<()>;

    /// Resolves role and display attributes for an account id.
    ///
    /// # Errors
    /// `NotFound` when no profile exists, `Provider` on transport failure.
    async fn fetch_profile(&self, identity_id: &str) -> AuthResult<ProfileRecord>;

    /// Registers a listener for out-of-band session changes.
    fn subscribe(&self, listener: Listener<SessionChange>) -> Subscription;
}
