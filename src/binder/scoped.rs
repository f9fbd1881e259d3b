use super::subscription::{Subscription, subscription_keys};
use crate::client::{ConnectionManager, ConnectionState};
use crate::infrastructure::TaskManager;
use crate::messaging::SubscriptionKey;
use std::sync::Arc;
use tokio::sync::watch;

type Notify = Arc<dyn Fn() + Send + Sync + 'static>;

/// Best-effort connection notifications for a bound unit, e.g. to show a
/// "live" indicator. Quick successive transitions may be coalesced.
#[derive(Clone, Default)]
pub struct BindCallbacks {
    on_connect: Option<Notify>,
    on_disconnect: Option<Notify>,
}

impl BindCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_connect<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_connect = Some(Arc::new(f));
        self
    }

    pub fn on_disconnect<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_disconnect = Some(Arc::new(f));
        self
    }

    fn is_empty(&self) -> bool {
        self.on_connect.is_none() && self.on_disconnect.is_none()
    }
}

/// Where a bound unit is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingPhase {
    /// Disposed, nothing registered
    Unbound,
    /// Subscriptions registered, connection not open yet
    Connecting,
    /// Subscriptions registered and the connection is open
    Subscribed,
}

/// Hands out [`ScopedBinding`]s over a shared [`ConnectionManager`].
#[derive(Clone)]
pub struct SubscriptionBinder {
    manager: ConnectionManager,
}

impl SubscriptionBinder {
    pub fn new(manager: ConnectionManager) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    /// Binds a unit to the connection and registers `subscriptions`.
    ///
    /// Every value of `auth` (the current one included) drives the manager:
    /// `connect(true)` when true, `disconnect()` when false. The returned
    /// binding unregisters everything when disposed or dropped.
    ///
    /// Must be called from within a tokio runtime.
    pub fn bind(
        &self,
        auth: watch::Receiver<bool>,
        subscriptions: Vec<Subscription>,
        callbacks: BindCallbacks,
    ) -> ScopedBinding {
        let mut binding = ScopedBinding {
            manager: self.manager.clone(),
            registered: Vec::new(),
            keys: Vec::new(),
            tasks: TaskManager::new(),
            disposed: false,
        };

        binding.register(subscriptions);
        binding.follow_auth(auth);
        if !callbacks.is_empty() {
            binding.follow_connection(callbacks);
        }
        binding
    }
}

/// Subscriptions and watchers owned by one bound unit.
///
/// Teardown runs exactly once, through [`dispose`](Self::dispose) or on drop,
/// whatever the authentication signal says at that point.
pub struct ScopedBinding {
    manager: ConnectionManager,
    registered: Vec<Subscription>,
    keys: Vec<SubscriptionKey>,
    tasks: TaskManager,
    disposed: bool,
}

impl ScopedBinding {
    pub fn is_connected(&self) -> bool {
        self.manager.is_connected()
    }

    pub async fn connect(&self) {
        self.manager.connect(true).await;
    }

    pub async fn disconnect(&self) {
        self.manager.disconnect().await;
    }

    pub fn phase(&self) -> BindingPhase {
        if self.disposed {
            BindingPhase::Unbound
        } else if self.manager.current_state() == ConnectionState::Connected {
            BindingPhase::Subscribed
        } else {
            BindingPhase::Connecting
        }
    }

    /// Identity of the registered subscription list
    pub fn subscription_keys(&self) -> &[SubscriptionKey] {
        &self.keys
    }

    /// Replaces the registered subscriptions when their `kind:name` list
    /// differs from the current one. Returns whether anything was re-registered.
    ///
    /// A list with the same keys but new handler references is ignored, so
    /// callers rebuilding the list on every render do not churn the registry.
    pub fn update_subscriptions(&mut self, subscriptions: Vec<Subscription>) -> bool {
        if self.disposed || subscription_keys(&subscriptions) == self.keys {
            return false;
        }

        self.unregister();
        self.register(subscriptions);
        true
    }

    /// Unregisters every subscription and stops the watchers. Later calls,
    /// and the drop that follows, do nothing.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.tasks.abort_all();
        self.unregister();
        tracing::debug!("Binding disposed");
    }

    fn register(&mut self, subscriptions: Vec<Subscription>) {
        let registry = self.manager.registry();
        for subscription in subscriptions.iter() {
            registry.subscribe(subscription.key.clone(), Arc::clone(&subscription.handler));
        }
        self.keys = subscription_keys(&subscriptions);
        self.registered = subscriptions;
    }

    fn unregister(&mut self) {
        let registry = self.manager.registry();
        for subscription in self.registered.drain(..) {
            if !registry.unsubscribe(&subscription.key, &subscription.handler) {
                tracing::warn!("Subscription {} was already removed", subscription.key);
            }
        }
        self.keys.clear();
    }

    fn follow_auth(&mut self, mut auth: watch::Receiver<bool>) {
        let manager = self.manager.clone();
        self.tasks.spawn(async move {
            loop {
                let authenticated = *auth.borrow_and_update();
                if authenticated {
                    manager.connect(true).await;
                } else {
                    manager.disconnect().await;
                }

                if auth.changed().await.is_err() {
                    tracing::debug!("Authentication signal closed");
                    break;
                }
            }
        });
    }

    fn follow_connection(&mut self, callbacks: BindCallbacks) {
        let mut states = self.manager.state_changes();
        self.tasks.spawn(async move {
            let mut was_connected = false;
            loop {
                let connected = *states.borrow_and_update() == ConnectionState::Connected;
                if connected != was_connected {
                    let notify = if connected {
                        &callbacks.on_connect
                    } else {
                        &callbacks.on_disconnect
                    };
                    if let Some(notify) = notify {
                        notify();
                    }
                    was_connected = connected;
                }

                if states.changed().await.is_err() {
                    break;
                }
            }
        });
    }
}

impl Drop for ScopedBinding {
    fn drop(&mut self) {
        self.dispose();
    }
}
