//! Auth controller: login, signup and logout flows.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use quoteconnect_domain::{
    AuthError, AuthResult, Credentials, Identity, Notification, Session, SignupRequest,
};
use tokio::sync::{Mutex, MutexGuard, mpsc};
use tracing::{debug, info, warn};

use super::watch::ProviderWatch;
use crate::ports::{IdentityProvider, NotificationSink, ProviderSession, SessionChange};
use crate::session::SessionStore;

/// Tunables for the auth flows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthSettings {
    /// Upper bound for every provider call; `None` waits indefinitely.
    pub request_timeout: Option<Duration>,
}

/// How a signup ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignupOutcome {
    /// Account and profile were both created.
    Complete(Identity),
    /// The account exists and the user is signed in, but the profile
    /// record could not be written. A later profile-completion step has to
    /// reconcile it.
    ProfileIncomplete {
        /// Best-effort identity.
        identity: Identity,
        /// Why the profile write failed.
        cause: String,
    },
}

impl SignupOutcome {
    /// The identity now signed in.
    #[must_use]
    pub const fn identity(&self) -> &Identity {
        match self {
            Self::Complete(identity) | Self::ProfileIncomplete { identity, .. } => identity,
        }
    }

    /// True when the profile was written.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self, Self::Complete(_))
    }
}

/// Sets the loading flag for the lifetime of a flow.
struct LoadingGuard<'a> {
    store: &'a SessionStore,
}

impl<'a> LoadingGuard<'a> {
    fn engage(store: &'a SessionStore) -> Self {
        store.set_loading(true);
        Self { store }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.store.set_loading(false);
    }
}

/// Orchestrates authentication against an identity provider.
///
/// Only one login or signup may be in flight at a time; a duplicate
/// submission fails fast with [`AuthError::Busy`]. A flow whose session
/// was replaced while it waited on the provider (for example by a logout)
/// does not write its result and fails with [`AuthError::Superseded`].
pub struct AuthController {
    provider: Arc<dyn IdentityProvider>,
    store: SessionStore,
    notifier: Arc<dyn NotificationSink>,
    settings: AuthSettings,
    in_flight: Mutex<()>,
}

impl AuthController {
    /// Creates a controller writing to `store`.
    #[must_use]
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        store: SessionStore,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            provider,
            store,
            notifier,
            settings: AuthSettings::default(),
            in_flight: Mutex::new(()),
        }
    }

    /// Replaces the flow settings.
    #[must_use]
    pub const fn with_settings(mut self, settings: AuthSettings) -> Self {
        self.settings = settings;
        self
    }

    /// The session store this controller writes to.
    #[must_use]
    pub const fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Current session snapshot.
    #[must_use]
    pub fn session(&self) -> Session {
        self.store.get()
    }

    /// Startup restore.
    ///
    /// Never fails: an unusable snapshot or a provider error leaves the
    /// session signed out. The loading flag is cleared on return.
    pub async fn restore(&self) -> Session {
        let epoch = self.store.epoch();
        self.store.set_loading(true);

        let restored = match self.call(self.provider.restore_session()).await {
            Ok(identity) => identity,
            Err(e) => {
                warn!(provider = self.provider.name(), error = %e, "session restore failed");
                None
            }
        };
        match &restored {
            Some(identity) => info!(user_id = %identity.id, role = ?identity.role, "session restored"),
            None => debug!(provider = self.provider.name(), "no session to restore"),
        }

        if !self.store.set_if_current(epoch, restored).await {
            debug!("session changed during restore; keeping the newer session");
        }
        self.store.set_loading(false);
        self.store.get()
    }

    /// Signs in with email and password.
    ///
    /// # Errors
    /// `Validation` before any provider call, `Busy` if another flow is in
    /// flight, then whatever the provider reports. On error the session is
    /// unchanged.
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<Identity> {
        let credentials = Credentials::new(email, password);
        if let Err(e) = credentials.validate() {
            self.notifier
                .notify(Notification::validation_failed(e.reason.clone()));
            return Err(e.into());
        }

        let _flight = self.begin_flight()?;
        let epoch = self.store.epoch();
        let _loading = LoadingGuard::engage(&self.store);

        match self.sign_in(&credentials, epoch).await {
            Ok(identity) => {
                info!(user_id = %identity.id, role = ?identity.role, "signed in");
                self.notifier
                    .notify(Notification::login_succeeded(&identity.display_name()));
                Ok(identity)
            }
            Err(e) => {
                log_failure("login", &credentials.email, &e);
                if let Some(message) = failure_message(&e) {
                    self.notifier.notify(Notification::login_failed(message));
                }
                Err(e)
            }
        }
    }

    async fn sign_in(&self, credentials: &Credentials, epoch: u64) -> AuthResult<Identity> {
        let ProviderSession { account, profile } =
            self.call(self.provider.login(credentials)).await?;

        let profile = match profile {
            Some(profile) => profile,
            None => match self.call(self.provider.fetch_profile(&account.id)).await {
                Ok(profile) => profile,
                Err(e) => {
                    self.abandon_provider_session().await;
                    return Err(e);
                }
            },
        };

        let identity = Identity::from_parts(account, Some(profile));
        self.commit(epoch, identity.clone()).await?;
        Ok(identity)
    }

    /// Creates an account and signs it in.
    ///
    /// If the provider created the account but not its profile, the user is
    /// still signed in and [`SignupOutcome::ProfileIncomplete`] is returned.
    ///
    /// # Errors
    /// `Validation` before any provider call, `Busy` if another flow is in
    /// flight, then `EmailInUse` or `Provider` when nothing was created.
    pub async fn signup(&self, request: &SignupRequest) -> AuthResult<SignupOutcome> {
        if let Err(e) = request.validate() {
            self.notifier
                .notify(Notification::validation_failed(e.reason.clone()));
            return Err(e.into());
        }

        let _flight = self.begin_flight()?;
        let epoch = self.store.epoch();
        let _loading = LoadingGuard::engage(&self.store);

        match self.call(self.provider.signup(request)).await {
            Ok(identity) => {
                self.commit(epoch, identity.clone()).await?;
                info!(user_id = %identity.id, role = ?identity.role, "account created");
                self.notifier
                    .notify(Notification::account_created(&identity.display_name()));
                Ok(SignupOutcome::Complete(identity))
            }
            Err(AuthError::PartialSignupFailure { identity, cause }) => {
                let identity = fill_display_fields(*identity, request);
                warn!(user_id = %identity.id, cause = %cause, "account created but profile write failed");
                self.commit(epoch, identity.clone()).await?;
                self.notifier.notify(Notification::profile_incomplete());
                Ok(SignupOutcome::ProfileIncomplete { identity, cause })
            }
            Err(e) => {
                log_failure("signup", &request.email, &e);
                if let Some(message) = failure_message(&e) {
                    self.notifier.notify(Notification::signup_failed(message));
                }
                Err(e)
            }
        }
    }

    /// Signs out.
    ///
    /// The local session is cleared first, then the provider is told. The
    /// session is signed out on return whether or not the provider
    /// confirmed.
    ///
    /// # Errors
    /// Returns the provider error if it could not invalidate its session.
    pub async fn logout(&self) -> AuthResult<()> {
        let user_id = self.store.get().identity().map(|identity| identity.id.clone());
        self.store.set(None).await;
        info!(user_id = ?user_id, "signed out");
        self.notifier.notify(Notification::logged_out());

        match self.call(self.provider.logout()).await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(provider = self.provider.name(), error = %e, "provider did not confirm logout");
                self.notifier
                    .notify(Notification::logout_failed(e.user_message()));
                Err(e)
            }
        }
    }

    /// Applies a session change the provider detected on its own.
    pub async fn apply_provider_change(&self, change: SessionChange) {
        match change {
            SessionChange::SignedOut => {
                if self.store.get().is_authenticated() {
                    self.store.set(None).await;
                    info!(provider = self.provider.name(), "provider ended the session");
                    self.notifier.notify(Notification::session_expired());
                }
            }
            SessionChange::SignedIn(identity) => {
                if self.store.get().identity() != Some(&identity) {
                    info!(user_id = %identity.id, "provider reported a new session");
                    self.store.set(Some(identity)).await;
                }
            }
            SessionChange::TokenRefreshed => {
                debug!(provider = self.provider.name(), "provider refreshed its session token");
            }
        }
    }

    /// Subscribes to provider session changes and applies them in order.
    ///
    /// Changes are forwarded over a channel to a task, so provider
    /// callbacks never block on the store.
    pub fn watch_provider(self: &Arc<Self>) -> ProviderWatch {
        let (sender, mut receiver) = mpsc::unbounded_channel::<SessionChange>();
        let subscription = self.provider.subscribe(Arc::new(move |change: &SessionChange| {
            if sender.send(change.clone()).is_err() {
                debug!("session change dropped: watcher stopped");
            }
        }));

        let controller = Arc::clone(self);
        let task = tokio::spawn(async move {
            while let Some(change) = receiver.recv().await {
                controller.apply_provider_change(change).await;
            }
        });
        ProviderWatch::new(subscription, task)
    }

    fn begin_flight(&self) -> AuthResult<MutexGuard<'_, ()>> {
        self.in_flight.try_lock().map_err(|_| {
            debug!("rejecting duplicate submission");
            AuthError::Busy
        })
    }

    async fn commit(&self, epoch: u64, identity: Identity) -> AuthResult<()> {
        if self.store.set_if_current(epoch, Some(identity)).await {
            return Ok(());
        }
        debug!("session changed while the flow was in flight; discarding result");
        self.abandon_provider_session().await;
        Err(AuthError::Superseded)
    }

    async fn abandon_provider_session(&self) {
        if let Err(e) = self.call(self.provider.logout()).await {
            debug!(error = %e, "could not release provider session");
        }
    }

    async fn call<T, F>(&self, request: F) -> AuthResult<T>
    where
        F: Future<Output = AuthResult<T>>,
    {
        match self.settings.request_timeout {
            Some(limit) => tokio::time::timeout(limit, request)
                .await
                .unwrap_or(Err(AuthError::Timeout)),
            None => request.await,
        }
    }
}

impl std::fmt::Debug for AuthController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthController")
            .field("provider", &self.provider.name())
            .field("store", &self.store)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// Notification text for a failed flow, or `None` when the failure is not
/// the user's concern (duplicate submission, superseded flow).
fn failure_message(err: &AuthError) -> Option<String> {
    match err {
        AuthError::Busy | AuthError::Superseded => None,
        other => Some(other.user_message()),
    }
}

/// Rejected input is routine; anything else is worth a warning.
fn log_failure(flow: &'static str, email: &str, err: &AuthError) {
    if err.is_user_error() {
        info!(flow, email, error = %err, "request rejected");
    } else {
        warn!(flow, email, error = %err, "request failed");
    }
}

/// Fills name and contact fields the provider could not return from what
/// the user submitted. The role is left as the provider reported it.
fn fill_display_fields(mut identity: Identity, request: &SignupRequest) -> Identity {
    if identity.first_name.trim().is_empty() {
        identity.first_name.clone_from(&request.first_name);
    }
    if identity.last_name.trim().is_empty() {
        identity.last_name.clone_from(&request.last_name);
    }
    if identity.phone.is_none() {
        identity.phone.clone_from(&request.phone);
    }
    if identity.company.is_none() {
        identity.company.clone_from(&request.company);
    }
    identity
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::significant_drop_tightening
)]
mod tests {
    use super::*;
    use crate::session::SessionSnapshotStore;
    use crate::test_support::{FixedClock, MemoryStore, MockProvider, RecordingSink, customer};
    use pretty_assertions::assert_eq;
    use quoteconnect_domain::Role;
    use std::sync::Mutex as StdMutex;

    struct Harness {
        provider: Arc<MockProvider>,
        sink: Arc<RecordingSink>,
        controller: Arc<AuthController>,
    }

    fn harness(provider: MockProvider) -> Harness {
        harness_with(provider, AuthSettings::default())
    }

    fn harness_with(provider: MockProvider, settings: AuthSettings) -> Harness {
        let provider = Arc::new(provider);
        let sink = Arc::new(RecordingSink::default());
        let store = SessionStore::new(Arc::new(FixedClock::default()));
        let controller = Arc::new(
            AuthController::new(provider.clone(), store, sink.clone()).with_settings(settings),
        );
        Harness {
            provider,
            sink,
            controller,
        }
    }

    fn signup_request() -> SignupRequest {
        SignupRequest {
            email: "a@b.com".to_string(),
            password: "secret1".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Byron".to_string(),
            role: Some(Role::Customer),
            phone: Some("555-0100".to_string()),
            company: None,
        }
    }

    #[tokio::test]
    async fn test_login_with_valid_credentials() {
        let h = harness(MockProvider::default());
        h.controller.restore().await;

        let identity = h
            .controller
            .login("customer@example.com", "password")
            .await
            .unwrap();

        let session = h.controller.session();
        assert_eq!(identity.role, Some(Role::Customer));
        assert_eq!(session.role(), Some(Role::Customer));
        assert!(!session.is_loading());
        assert_eq!(h.sink.titles(), vec!["Login Successful"]);
        assert_eq!(h.sink.all()[0].description, "Welcome back, Demo Customer!");
    }

    #[tokio::test]
    async fn test_login_with_invalid_credentials_leaves_session_unchanged() {
        let h = harness(MockProvider::default());
        h.controller.restore().await;

        let err = h
            .controller
            .login("customer@example.com", "wrong")
            .await
            .unwrap_err();

        assert_eq!(err, AuthError::InvalidCredentials);
        let session = h.controller.session();
        assert!(session.identity().is_none());
        assert!(!session.is_loading());
        assert_eq!(h.sink.titles(), vec!["Login Failed"]);
        assert_eq!(h.sink.all()[0].description, "Invalid email or password");
    }

    #[tokio::test]
    async fn test_login_validation_fails_before_provider_call() {
        let h = harness(MockProvider::default());

        let err = h.controller.login("not-an-email", "password").await.unwrap_err();

        assert!(matches!(err, AuthError::Validation(_)));
        assert!(h.provider.calls().is_empty());
        assert_eq!(h.sink.titles(), vec!["Validation Error"]);
    }

    #[tokio::test]
    async fn test_login_fetches_profile_when_provider_separates_it() {
        let h = harness(MockProvider {
            separate_profiles: true,
            ..MockProvider::default()
        });

        let identity = h
            .controller
            .login("vendor@example.com", "password")
            .await
            .unwrap();

        assert_eq!(identity.role, Some(Role::Vendor));
        assert_eq!(h.provider.calls(), vec!["login", "fetch_profile"]);
    }

    #[tokio::test]
    async fn test_login_profile_failure_releases_provider_session() {
        let h = harness(MockProvider {
            separate_profiles: true,
            profile_error: Some(AuthError::provider("profiles table unavailable")),
            ..MockProvider::default()
        });
        h.controller.restore().await;

        let err = h
            .controller
            .login("vendor@example.com", "password")
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::Provider(_)));
        assert!(!h.controller.session().is_authenticated());
        assert_eq!(
            h.provider.calls(),
            vec!["restore_session", "login", "fetch_profile", "logout"]
        );
    }

    #[tokio::test]
    async fn test_loading_is_raised_during_flow_and_cleared_after() {
        let h = harness(MockProvider::default());
        h.controller.restore().await;

        let seen = Arc::new(StdMutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        let _subscription = h.controller.store().subscribe(Arc::new(move |s: &Session| {
            log.lock().unwrap().push((s.is_loading(), s.is_authenticated()));
        }));

        h.controller
            .login("customer@example.com", "password")
            .await
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![(true, false), (false, true)]);
    }

    #[tokio::test]
    async fn test_signup_creates_account_and_signs_in() {
        let h = harness(MockProvider::default());

        let outcome = h.controller.signup(&signup_request()).await.unwrap();

        assert!(outcome.is_complete());
        assert_eq!(outcome.identity().role, Some(Role::Customer));
        assert!(h.controller.session().is_authenticated());
        assert_eq!(h.sink.titles(), vec!["Account Created"]);
        assert_eq!(h.sink.all()[0].description, "Welcome to Quote-Connect, Ada Byron!");
    }

    #[tokio::test]
    async fn test_signup_profile_failure_still_signs_in() {
        let h = harness(MockProvider {
            fail_profile_write: true,
            ..MockProvider::default()
        });
        h.controller.restore().await;

        let outcome = h.controller.signup(&signup_request()).await.unwrap();

        let SignupOutcome::ProfileIncomplete { identity, cause } = outcome else {
            panic!("expected a partial signup");
        };
        assert_eq!(identity.email, "a@b.com");
        assert_eq!(identity.role, None);
        assert_eq!(identity.phone.as_deref(), Some("555-0100"));
        assert_eq!(cause, "connection reset");

        let session = h.controller.session();
        assert!(session.is_authenticated());
        assert!(!session.is_loading());
        let partial = h
            .sink
            .titles()
            .into_iter()
            .filter(|t| t == "Profile Incomplete")
            .count();
        assert_eq!(partial, 1);
    }

    #[tokio::test]
    async fn test_signup_email_in_use_leaves_session_unchanged() {
        let h = harness(MockProvider {
            signup_error: Some(AuthError::EmailInUse),
            ..MockProvider::default()
        });
        h.controller.restore().await;

        let err = h.controller.signup(&signup_request()).await.unwrap_err();

        assert_eq!(err, AuthError::EmailInUse);
        assert!(!h.controller.session().is_authenticated());
        assert!(!h.controller.session().is_loading());
        assert_eq!(h.sink.all()[0].description, "Email already in use");
    }

    #[tokio::test]
    async fn test_signup_without_role_is_rejected_locally() {
        let h = harness(MockProvider::default());
        let request = SignupRequest {
            role: None,
            ..signup_request()
        };

        let err = h.controller.signup(&request).await.unwrap_err();

        assert!(matches!(err, AuthError::Validation(ref v) if v.field == "role"));
        assert!(h.provider.calls().is_empty());
        assert_eq!(h.sink.all()[0].description, "Please select a role");
    }

    #[tokio::test]
    async fn test_logout_clears_session() {
        let h = harness(MockProvider::default());
        h.controller
            .login("customer@example.com", "password")
            .await
            .unwrap();

        h.controller.logout().await.unwrap();

        let session = h.controller.session();
        assert!(session.identity().is_none());
        assert!(!session.is_loading());
        assert_eq!(h.sink.titles().last().map(String::as_str), Some("Logged Out"));
    }

    #[tokio::test]
    async fn test_logout_clears_session_even_when_provider_fails() {
        let h = harness(MockProvider {
            logout_error: Some(AuthError::provider("network unreachable")),
            ..MockProvider::default()
        });
        h.controller
            .login("customer@example.com", "password")
            .await
            .unwrap();

        let err = h.controller.logout().await.unwrap_err();

        assert!(matches!(err, AuthError::Provider(_)));
        let session = h.controller.session();
        assert!(session.identity().is_none());
        assert!(!session.is_loading());
        assert_eq!(
            h.sink.titles(),
            vec!["Login Successful", "Logged Out", "Logout Incomplete"]
        );
    }

    #[tokio::test]
    async fn test_duplicate_submission_is_rejected() {
        let h = harness(MockProvider {
            delay: Some(Duration::from_millis(50)),
            ..MockProvider::default()
        });

        let (first, second) = tokio::join!(
            h.controller.login("customer@example.com", "password"),
            h.controller.login("customer@example.com", "password"),
        );

        assert!(first.is_ok());
        assert_eq!(second.unwrap_err(), AuthError::Busy);
        assert_eq!(h.provider.calls(), vec!["login"]);
        assert_eq!(h.sink.titles(), vec!["Login Successful"]);
    }

    #[tokio::test]
    async fn test_logout_supersedes_in_flight_login() {
        let h = harness(MockProvider {
            delay: Some(Duration::from_millis(50)),
            ..MockProvider::default()
        });
        h.controller.restore().await;

        let (login, logout) = tokio::join!(
            h.controller.login("customer@example.com", "password"),
            async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                h.controller.logout().await
            },
        );

        assert_eq!(login.unwrap_err(), AuthError::Superseded);
        assert!(logout.is_ok());
        let session = h.controller.session();
        assert!(!session.is_authenticated());
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn test_logout_during_slow_snapshot_write_stays_signed_out() {
        let kv = Arc::new(MemoryStore::slow_writes(Duration::from_millis(50)));
        let store = SessionStore::with_snapshot(
            Arc::new(FixedClock::default()),
            SessionSnapshotStore::new(kv.clone()),
        );
        let controller = AuthController::new(
            Arc::new(MockProvider::default()),
            store,
            Arc::new(RecordingSink::default()),
        );
        controller.restore().await;

        let (login, logout) = tokio::join!(
            controller.login("customer@example.com", "password"),
            async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                controller.logout().await
            },
        );

        assert!(login.is_ok());
        assert!(logout.is_ok());
        assert!(!controller.session().is_authenticated());
        assert_eq!(SessionSnapshotStore::new(kv).load().await, None);
    }

    #[tokio::test]
    async fn test_provider_timeout() {
        let h = harness_with(
            MockProvider {
                delay: Some(Duration::from_millis(200)),
                ..MockProvider::default()
            },
            AuthSettings {
                request_timeout: Some(Duration::from_millis(20)),
            },
        );
        h.controller.restore().await;

        let err = h
            .controller
            .login("customer@example.com", "password")
            .await
            .unwrap_err();

        assert_eq!(err, AuthError::Timeout);
        assert!(!h.controller.session().is_authenticated());
        assert!(!h.controller.session().is_loading());
    }

    #[tokio::test]
    async fn test_restore_outcomes() {
        let h = harness(MockProvider::default());
        *h.provider.restore.lock().unwrap() = Ok(Some(customer()));
        let session = h.controller.restore().await;
        assert_eq!(session.identity(), Some(&customer()));
        assert!(!session.is_loading());

        let h = harness(MockProvider::default());
        *h.provider.restore.lock().unwrap() = Err(AuthError::provider("offline"));
        let session = h.controller.restore().await;
        assert!(!session.is_authenticated());
        assert!(!session.is_loading());
        assert!(h.sink.all().is_empty());
    }

    #[tokio::test]
    async fn test_provider_sign_out_is_applied() {
        let h = harness(MockProvider::default());
        h.controller
            .login("customer@example.com", "password")
            .await
            .unwrap();
        let watch = h.controller.watch_provider();
        assert_eq!(h.provider.listeners.len(), 1);

        h.provider.listeners.emit(&SessionChange::TokenRefreshed);
        h.provider.listeners.emit(&SessionChange::SignedOut);

        let mut receiver = h.controller.store().watch();
        tokio::time::timeout(
            Duration::from_secs(1),
            receiver.wait_for(|s| !s.is_authenticated()),
        )
        .await
        .expect("session was not cleared")
        .unwrap();
        assert_eq!(h.sink.titles().last().map(String::as_str), Some("Session Expired"));

        drop(watch);
        assert!(h.provider.listeners.is_empty());
    }

    #[tokio::test]
    async fn test_provider_sign_out_when_signed_out_is_silent() {
        let h = harness(MockProvider::default());
        h.controller.restore().await;

        h.controller
            .apply_provider_change(SessionChange::SignedOut)
            .await;

        assert!(h.sink.all().is_empty());
    }
}
