//! In-process identity provider backed by a fixed demo directory.

use async_trait::async_trait;
use quoteconnect_application::ports::{
    IdentityProvider, Listener, ListenerRegistry, ProviderSession, SessionChange, Subscription,
};
use quoteconnect_application::session::SessionSnapshotStore;
use quoteconnect_domain::{
    AuthAccount, AuthError, AuthResult, Credentials, Identity, ProfileRecord, Role,
    SignupRequest, generate_id,
};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Password shared by the built-in demo accounts.
pub const DEMO_PASSWORD: &str = "password";

struct LocalAccount {
    identity: Identity,
    password: String,
}

impl LocalAccount {
    fn demo(id: &str, role: Role) -> Self {
        let label = role.label();
        Self {
            identity: Identity {
                id: id.to_string(),
                email: format!("{}@example.com", role.as_str()),
                role: Some(role),
                first_name: "Demo".to_string(),
                last_name: label.to_string(),
                phone: None,
                company: None,
            },
            password: DEMO_PASSWORD.to_string(),
        }
    }
}

/// Identity provider backed by an in-process account directory.
///
/// Starts with one demo account per role (`customer@example.com`,
/// `vendor@example.com`, `intern@example.com`). Accounts created by signup
/// live only as long as the provider. Sessions survive restarts through
/// the session snapshot.
pub struct LocalIdentityProvider {
    accounts: RwLock<Vec<LocalAccount>>,
    snapshot: Option<SessionSnapshotStore>,
    listeners: ListenerRegistry<SessionChange>,
}

impl LocalIdentityProvider {
    /// Provider with the demo directory and no session persistence.
    #[must_use]
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(vec![
                LocalAccount::demo("1", Role::Customer),
                LocalAccount::demo("2", Role::Vendor),
                LocalAccount::demo("3", Role::Intern),
            ]),
            snapshot: None,
            listeners: ListenerRegistry::new(),
        }
    }

    /// Restores sessions from `snapshot`.
    #[must_use]
    pub fn with_snapshot(mut self, snapshot: SessionSnapshotStore) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    /// Ends the current session as if it had expired.
    pub fn expire_session(&self) {
        info!("local session expired");
        self.listeners.emit(&SessionChange::SignedOut);
    }

    /// Number of known accounts.
    pub async fn account_count(&self) -> usize {
        self.accounts.read().await.len()
    }
}

impl Default for LocalIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn restore_session(&self) -> AuthResult<Option<Identity>> {
        match &self.snapshot {
            Some(snapshot) => Ok(snapshot.load().await),
            None => Ok(None),
        }
    }

    async fn login(&self, credentials: &Credentials) -> AuthResult<ProviderSession> {
        let accounts = self.accounts.read().await;
        let account = accounts
            .iter()
            .find(|a| {
                a.identity.email.eq_ignore_ascii_case(&credentials.email)
                    && a.password == credentials.password
            })
            .ok_or(AuthError::InvalidCredentials)?;
        debug!(user_id = %account.identity.id, "local credentials accepted");
        Ok(ProviderSession {
            account: account.identity.account(),
            profile: Some(account.identity.profile()),
        })
    }

    async fn signup(&self, request: &SignupRequest) -> AuthResult<Identity> {
        let mut accounts = self.accounts.write().await;
        if accounts
            .iter()
            .any(|a| a.identity.email.eq_ignore_ascii_case(&request.email))
        {
            return Err(AuthError::EmailInUse);
        }

        let id = generate_id();
        let identity = Identity::from_parts(
            AuthAccount {
                id: id.clone(),
                email: request.email.clone(),
            },
            Some(ProfileRecord {
                id,
                role: request.role,
                first_name: request.first_name.clone(),
                last_name: request.last_name.clone(),
                phone: request.phone.clone(),
                company: request.company.clone(),
            }),
        );
        accounts.push(LocalAccount {
            identity: identity.clone(),
            password: request.password.clone(),
        });
        debug!(user_id = %identity.id, "local account created");
        Ok(identity)
    }

    async fn logout(&self) -> AuthResult<()> {
        Ok(())
    }

    async fn fetch_profile(&self, identity_id: &str) -> AuthResult<ProfileRecord> {
        self.accounts
            .read()
            .await
            .iter()
            .find(|a| a.identity.id == identity_id)
            .map(|a| a.identity.profile())
            .ok_or_else(|| AuthError::NotFound(identity_id.to_string()))
    }

    fn subscribe(&self, listener: Listener<SessionChange>) -> Subscription {
        self.listeners.register(listener)
    }
}
