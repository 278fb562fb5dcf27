//! Session store: single owner of the current `Session`.

use std::sync::{Arc, Mutex, PoisonError};

use quoteconnect_domain::{Identity, Session};
use tokio::sync::{Mutex as AsyncMutex, watch};
use tracing::warn;

use super::snapshot::SessionSnapshotStore;
use crate::ports::{Clock, Listener, ListenerRegistry, Subscription};

struct StoreInner {
    state: watch::Sender<Session>,
    /// Bumped on every identity replacement; flows compare it to detect
    /// that the session changed underneath them.
    epoch: Mutex<u64>,
    /// Held across the state swap and the snapshot write so snapshot
    /// writes land in epoch order.
    writes: AsyncMutex<()>,
    observers: ListenerRegistry<Session>,
    snapshot: Option<SessionSnapshotStore>,
    clock: Arc<dyn Clock>,
}

/// Handle to the process-wide session.
///
/// Cloning is cheap and yields a handle to the same state. Reads never
/// block writers: every write replaces the whole snapshot.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<StoreInner>,
}

impl SessionStore {
    /// Creates an in-memory store in the initial (loading) state.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::build(clock, None)
    }

    /// Creates a store that mirrors every identity change into `snapshot`.
    #[must_use]
    pub fn with_snapshot(clock: Arc<dyn Clock>, snapshot: SessionSnapshotStore) -> Self {
        Self::build(clock, Some(snapshot))
    }

    fn build(clock: Arc<dyn Clock>, snapshot: Option<SessionSnapshotStore>) -> Self {
        let (state, _) = watch::channel(Session::initial());
        Self {
            inner: Arc::new(StoreInner {
                state,
                epoch: Mutex::new(0),
                writes: AsyncMutex::new(()),
                observers: ListenerRegistry::new(),
                snapshot,
                clock,
            }),
        }
    }

    /// Current snapshot.
    #[must_use]
    pub fn get(&self) -> Session {
        self.inner.state.borrow().clone()
    }

    /// Current identity epoch.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        *self.inner.epoch.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the identity and clears the loading flag.
    pub async fn set(&self, identity: Option<Identity>) {
        self.replace(None, identity).await;
    }

    /// Replaces the identity only if no other replacement happened since
    /// `epoch` was read.
    ///
    /// # Returns
    /// `false` if the store was changed in the meantime and nothing was written.
    pub async fn set_if_current(&self, epoch: u64, identity: Option<Identity>) -> bool {
        self.replace(Some(epoch), identity).await
    }

    async fn replace(&self, expected: Option<u64>, identity: Option<Identity>) -> bool {
        let _write = self.inner.writes.lock().await;
        let session = {
            let mut epoch = self.inner.epoch.lock().unwrap_or_else(PoisonError::into_inner);
            if expected.is_some_and(|expected| expected != *epoch) {
                return false;
            }
            *epoch += 1;
            let session = match identity {
                Some(identity) => Session::signed_in(identity, self.inner.clock.now()),
                None => Session::signed_out(),
            };
            self.inner.state.send_replace(session.clone());
            session
        };
        self.inner.observers.emit(&session);

        if let Some(snapshot) = &self.inner.snapshot
            && let Err(e) = snapshot.save(session.identity()).await
        {
            warn!(error = %e, "failed to persist session snapshot");
        }
        true
    }

    /// Sets the loading flag, leaving the identity untouched.
    ///
    /// Observers are only notified when the flag actually changes.
    pub fn set_loading(&self, is_loading: bool) {
        let mut changed = None;
        self.inner.state.send_if_modified(|session| {
            if session.is_loading() == is_loading {
                return false;
            }
            *session = session.clone().with_loading(is_loading);
            changed = Some(session.clone());
            true
        });
        if let Some(session) = changed {
            self.inner.observers.emit(&session);
        }
    }

    /// Registers an observer called once per session change.
    pub fn subscribe(&self, listener: Listener<Session>) -> Subscription {
        self.inner.observers.register(listener)
    }

    /// Receiver that always holds the latest session.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<Session> {
        self.inner.state.subscribe()
    }

    /// Waits until the session is no longer loading and returns it.
    pub async fn wait_ready(&self) -> Session {
        let mut receiver = self.watch();
        match receiver.wait_for(|session| !session.is_loading()).await {
            Ok(session) => session.clone(),
            Err(_) => self.get(),
        }
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let epoch = self.epoch();
        f.debug_struct("SessionStore")
            .field("session", &self.get())
            .field("epoch", &epoch)
            .finish_non_exhaustive()
    }
}
