//! Test doubles shared by the unit tests of this crate.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::significant_drop_tightening)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use quoteconnect_domain::{
    AuthAccount, AuthError, AuthResult, Credentials, Identity, Notification, ProfileRecord, Role,
    SignupRequest,
};

use crate::ports::{
    Clock, IdentityProvider, KeyValueStore, Listener, ListenerRegistry, NotificationSink,
    PersistenceError, ProviderSession, SessionChange, Subscription,
};

/// In-memory key-value store.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
    fail_writes: bool,
    write_delay: Option<Duration>,
}

impl MemoryStore {
    pub fn failing_writes() -> Self {
        Self {
            values: Mutex::default(),
            fail_writes: true,
            write_delay: None,
        }
    }

    /// Store whose `set` sleeps for `delay` before writing.
    pub fn slow_writes(delay: Duration) -> Self {
        Self {
            values: Mutex::default(),
            fail_writes: false,
            write_delay: Some(delay),
        }
    }

    pub fn insert(&self, key: &str, value: &str) {
        self.values
            .lock()
            .expect("Lock poisoned")
            .insert(key.to_string(), value.to_string());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.lock().expect("Lock poisoned").contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.lock().expect("Lock poisoned").is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.values.lock().expect("Lock poisoned").get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        if self.fail_writes {
            return Err(PersistenceError::Serialization("disk full".to_string()));
        }
        if let Some(delay) = self.write_delay {
            tokio::time::sleep(delay).await;
        }
        self.insert(key, value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        self.values.lock().expect("Lock poisoned").remove(key);
        Ok(())
    }
}

/// Clock pinned to 2024-01-01T00:00:00Z.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Default for FixedClock {
    fn default() -> Self {
        Self(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Notification sink that keeps everything it receives.
#[derive(Default)]
pub struct RecordingSink {
    received: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn titles(&self) -> Vec<String> {
        self.received
            .lock()
            .expect("Lock poisoned")
            .iter()
            .map(|n| n.title.clone())
            .collect()
    }

    pub fn all(&self) -> Vec<Notification> {
        self.received.lock().expect("Lock poisoned").clone()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, notification: Notification) {
        self.received
            .lock()
            .expect("Lock poisoned")
            .push(notification);
    }
}

fn identity(id: &str, email: &str, role: Role, first: &str, last: &str) -> Identity {
    Identity::from_parts(
        AuthAccount {
            id: id.to_string(),
            email: email.to_string(),
        },
        Some(ProfileRecord {
            id: id.to_string(),
            role: Some(role),
            first_name: first.to_string(),
            last_name: last.to_string(),
            phone: None,
            company: None,
        }),
    )
}

pub fn customer() -> Identity {
    identity("1", "customer@example.com", Role::Customer, "Demo", "Customer")
}

pub fn vendor() -> Identity {
    identity("2", "vendor@example.com", Role::Vendor, "Demo", "Vendor")
}

/// Scriptable identity provider.
///
/// Knows `customer()` and `vendor()` with password `password`.
pub struct MockProvider {
    /// Return profiles only through `fetch_profile`.
    pub separate_profiles: bool,
    /// Error returned by `fetch_profile`.
    pub profile_error: Option<AuthError>,
    /// Error returned by `signup` before anything is created.
    pub signup_error: Option<AuthError>,
    /// Simulate the profile write failing after the auth record was created.
    pub fail_profile_write: bool,
    /// Error returned by `logout`.
    pub logout_error: Option<AuthError>,
    /// Result of `restore_session`.
    pub restore: Mutex<AuthResult<Option<Identity>>>,
    /// Delay applied to `login` and `signup`.
    pub delay: Option<Duration>,
    pub calls: Mutex<Vec<&'static str>>,
    pub listeners: ListenerRegistry<SessionChange>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            separate_profiles: false,
            profile_error: None,
            signup_error: None,
            fail_profile_write: false,
            logout_error: None,
            restore: Mutex::new(Ok(None)),
            delay: None,
            calls: Mutex::default(),
            listeners: ListenerRegistry::new(),
        }
    }
}

impl MockProvider {
    fn record(&self, call: &'static str) {
        self.calls.lock().expect("Lock poisoned").push(call);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().expect("Lock poisoned").clone()
    }

    fn directory() -> Vec<Identity> {
        vec![customer(), vendor()]
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl IdentityProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn restore_session(&self) -> AuthResult<Option<Identity>> {
        self.record("restore_session");
        self.restore.lock().expect("Lock poisoned").clone()
    }

    async fn login(&self, credentials: &Credentials) -> AuthResult<ProviderSession> {
        self.record("login");
        self.pause().await;
        let identity = Self::directory()
            .into_iter()
            .find(|i| i.email == credentials.email && credentials.password == "password")
            .ok_or(AuthError::InvalidCredentials)?;
        Ok(ProviderSession {
            account: identity.account(),
            profile: (!self.separate_profiles).then(|| identity.profile()),
        })
    }

    async fn signup(&self, request: &SignupRequest) -> AuthResult<Identity> {
        self.record("signup");
        self.pause().await;
        if let Some(err) = &self.signup_error {
            return Err(err.clone());
        }
        let account = AuthAccount {
            id: "new-user".to_string(),
            email: request.email.clone(),
        };
        if self.fail_profile_write {
            let mut identity = Identity::from_parts(account, None);
            identity.first_name.clone_from(&request.first_name);
            identity.last_name.clone_from(&request.last_name);
            return Err(AuthError::PartialSignupFailure {
                identity: Box::new(identity),
                cause: "connection reset".to_string(),
            });
        }
        Ok(Identity::from_parts(
            account,
            Some(ProfileRecord {
                id: "new-user".to_string(),
                role: request.role,
                first_name: request.first_name.clone(),
                last_name: request.last_name.clone(),
                phone: request.phone.clone(),
                company: request.company.clone(),
            }),
        ))
    }

    async fn logout(&self) -> AuthResult<()> {
        self.record("logout");
        self.logout_error.clone().map_or(Ok(()), Err)
    }

    async fn fetch_profile(&self, identity_id: &str) -> AuthResult<ProfileRecord> {
        self.record("fetch_profile");
        if let Some(err) = &self.profile_error {
            return Err(err.clone());
        }
        Self::directory()
            .into_iter()
            .find(|i| i.id == identity_id)
            .map(|i| i.profile())
            .ok_or_else(|| AuthError::NotFound(identity_id.to_string()))
    }

    fn subscribe(&self, listener: Listener<SessionChange>) -> Subscription {
        self.listeners.register(listener)
    }
}
