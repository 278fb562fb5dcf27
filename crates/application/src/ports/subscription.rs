//! Observer registration with explicit disposal.
//!
//! Both identity providers and the session store publish changes to
//! registered listeners. Registration hands back a [`Subscription`]; the
//! listener stays registered until the subscription is disposed or dropped.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, Weak};

/// Shared callback invoked with each published value.
pub type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Handle to a registered listener.
///
/// Dropping the handle unsubscribes; [`Subscription::dispose`] does the same
/// explicitly. Disposal runs at most once.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    disposer: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Creates a subscription that runs `disposer` when disposed.
    pub fn new(disposer: impl FnOnce() + Send + 'static) -> Self {
        Self {
            disposer: Some(Box::new(disposer)),
        }
    }

    /// A subscription with nothing to release.
    pub const fn noop() -> Self {
        Self { disposer: None }
    }

    /// Unsubscribes now.
    pub fn dispose(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(disposer) = self.disposer.take() {
            disposer();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.disposer.is_some())
            .finish()
    }
}

struct Registry<T> {
    next_id: u64,
    listeners: BTreeMap<u64, Listener<T>>,
}

/// Set of listeners for values of type `T`.
///
/// Cloning yields another handle to the same set.
pub struct ListenerRegistry<T> {
    inner: Arc<Mutex<Registry<T>>>,
}

impl<T: 'static> ListenerRegistry<T> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Registry {
                next_id: 0,
                listeners: BTreeMap::new(),
            })),
        }
    }

    /// Registers `listener` until the returned subscription is disposed.
    pub fn register(&self, listener: Listener<T>) -> Subscription {
        let id = {
            let mut registry = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            let id = registry.next_id;
            registry.next_id += 1;
            registry.listeners.insert(id, listener);
            id
        };
        let weak: Weak<Mutex<Registry<T>>> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .listeners
                    .remove(&id);
            }
        })
    }

    /// Calls every registered listener once with `value`.
    ///
    /// Listeners run outside the registry lock, so a listener may register
    /// or dispose subscriptions.
    pub fn emit(&self, value: &T) {
        let listeners: Vec<Listener<T>> = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .listeners
            .values()
            .cloned()
            .collect();
        for listener in listeners {
            listener(value);
        }
    }

    /// Number of live listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .listeners
            .len()
    }

    /// True when nobody is listening.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: 'static> Default for ListenerRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for ListenerRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for ListenerRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = self
            .inner
            .lock()
            .map_or(0, |registry| registry.listeners.len());
        f.debug_struct("ListenerRegistry")
            .field("listeners", &len)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter(registry: &ListenerRegistry<u32>) -> (Arc<AtomicUsize>, Subscription) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let subscription = registry.register(Arc::new(move |_: &u32| {
            seen.fetch_add(1, Ordering::SeqCst);
        }));
        (count, subscription)
    }

    #[test]
    fn test_each_listener_receives_each_value_once() {
        let registry = ListenerRegistry::new();
        let (first, _a) = counter(&registry);
        let (second, _b) = counter(&registry);

        registry.emit(&1);
        registry.emit(&2);

        assert_eq!(first.load(Ordering::SeqCst), 2);
        assert_eq!(second.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_dispose_unregisters() {
        let registry = ListenerRegistry::new();
        let (count, subscription) = counter(&registry);
        assert_eq!(registry.len(), 1);

        subscription.dispose();
        registry.emit(&1);

        assert!(registry.is_empty());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_drop_unregisters() {
        let registry = ListenerRegistry::new();
        {
            let (_count, _subscription) = counter(&registry);
            assert_eq!(registry.len(), 1);
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_subscription_outliving_registry_is_harmless() {
        let registry = ListenerRegistry::new();
        let (_count, subscription) = counter(&registry);
        drop(registry);
        subscription.dispose();
    }

    #[test]
    fn test_noop_subscription() {
        let subscription = Subscription::noop();
        assert!(format!("{subscription:?}").contains("false"));
        subscription.dispose();
    }
}
