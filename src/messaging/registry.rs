use crate::messaging::MessageType;
use serde_json::Value;
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Callback invoked with a message payload.
pub type Handler = Arc<dyn Fn(Value) + Send + Sync + 'static>;

/// Wraps a closure into a [`Handler`].
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(Value) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Dispatch key of a registration
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SubscriptionKey {
    /// Envelope `type`
    Message(MessageType),
    /// Channel name read from the payload
    Channel(String),
}

impl SubscriptionKey {
    pub fn message(r#type: impl Into<MessageType>) -> Self {
        Self::Message(r#type.into())
    }

    pub fn channel(name: impl Into<String>) -> Self {
        Self::Channel(name.into())
    }
}

impl std::fmt::Display for SubscriptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Message(t) => write!(f, "message:{}", t),
            Self::Channel(name) => write!(f, "channel:{}", name),
        }
    }
}

/// Ordered handler lists keyed by message type or channel name.
///
/// Registrations are appended, never deduplicated. Removal takes out the
/// first registration holding the same `Arc`. Handlers are cloned out of the
/// lock before they run, so a handler may itself subscribe or unsubscribe.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: Mutex<HashMap<SubscriptionKey, Vec<Handler>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SubscriptionKey, Vec<Handler>>> {
        self.handlers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe(&self, key: SubscriptionKey, handler: Handler) {
        tracing::debug!("Registering handler for {}", key);
        self.lock().entry(key).or_default().push(handler);
    }

    /// Removes the first registration of `handler` under `key`.
    /// Returns false when nothing matched.
    pub fn unsubscribe(&self, key: &SubscriptionKey, handler: &Handler) -> bool {
        let mut handlers = self.lock();
        let Some(list) = handlers.get_mut(key) else {
            return false;
        };

        let Some(position) = list.iter().position(|h| same_handler(h, handler)) else {
            return false;
        };
        list.remove(position);
        if list.is_empty() {
            handlers.remove(key);
        }

        tracing::debug!("Removed handler for {}", key);
        true
    }

    pub fn handler_count(&self, key: &SubscriptionKey) -> usize {
        self.lock().get(key).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Invokes every handler under `key` in registration order.
    /// Returns the number of handlers invoked.
    ///
    /// A panicking handler is logged and skipped; the remaining handlers
    /// still run and the caller's loop keeps going.
    pub fn dispatch(&self, key: &SubscriptionKey, payload: &Value) -> usize {
        let snapshot = match self.lock().get(key) {
            Some(list) => list.clone(),
            None => return 0,
        };

        for handler in snapshot.iter() {
            let value = payload.clone();
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| handler(value))) {
                tracing::error!("Handler for {} panicked: {}", key, panic_message(&*panic));
            }
        }
        snapshot.len()
    }
}

fn same_handler(a: &Handler, b: &Handler) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn recorder(log: &Arc<Mutex<Vec<&'static str>>>, name: &'static str) -> Handler {
        let log = Arc::clone(log);
        handler(move |_| log.lock().unwrap().push(name))
    }

    #[test]
    fn test_dispatch_runs_in_subscription_order() {
        let registry = HandlerRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let key = SubscriptionKey::message("notification");

        registry.subscribe(key.clone(), recorder(&log, "A"));
        registry.subscribe(key.clone(), recorder(&log, "B"));
        registry.subscribe(key.clone(), recorder(&log, "C"));

        assert_eq!(registry.dispatch(&key, &json!({})), 3);
        assert_eq!(*log.lock().unwrap(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_symmetric_unsubscribe_leaves_registry_empty() {
        let registry = HandlerRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let message_key = SubscriptionKey::message("broadcast");
        let channel_key = SubscriptionKey::channel("exercise_progress_1");
        let a = recorder(&log, "A");
        let b = recorder(&log, "B");

        registry.subscribe(message_key.clone(), Arc::clone(&a));
        registry.subscribe(channel_key.clone(), Arc::clone(&b));
        assert!(registry.unsubscribe(&message_key, &a));
        assert!(registry.unsubscribe(&channel_key, &b));

        assert!(registry.is_empty());
        assert_eq!(registry.handler_count(&message_key), 0);
    }

    #[test]
    fn test_unsubscribe_removes_only_first_identical_registration() {
        let registry = HandlerRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let key = SubscriptionKey::message("ping");
        let a = recorder(&log, "A");
        let b = recorder(&log, "B");

        registry.subscribe(key.clone(), Arc::clone(&a));
        registry.subscribe(key.clone(), Arc::clone(&b));
        registry.subscribe(key.clone(), Arc::clone(&a));

        assert!(registry.unsubscribe(&key, &a));
        registry.dispatch(&key, &Value::Null);

        assert_eq!(*log.lock().unwrap(), vec!["B", "A"]);
    }

    #[test]
    fn test_unsubscribe_unknown_handler_is_noop() {
        let registry = HandlerRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let key = SubscriptionKey::channel("school_3");
        let registered = recorder(&log, "A");
        let stranger = recorder(&log, "A");

        registry.subscribe(key.clone(), Arc::clone(&registered));

        assert!(!registry.unsubscribe(&key, &stranger));
        assert!(!registry.unsubscribe(&SubscriptionKey::channel("other"), &registered));
        assert_eq!(registry.handler_count(&key), 1);
    }

    #[test]
    fn test_handler_may_unsubscribe_itself_during_dispatch() {
        let registry = Arc::new(HandlerRegistry::new());
        let key = SubscriptionKey::message("notification");
        let slot: Arc<Mutex<Option<Handler>>> = Arc::new(Mutex::new(None));

        let registry_for_handler = Arc::clone(&registry);
        let slot_for_handler = Arc::clone(&slot);
        let key_for_handler = key.clone();
        let once = handler(move |_| {
            if let Some(me) = slot_for_handler.lock().unwrap().take() {
                registry_for_handler.unsubscribe(&key_for_handler, &me);
            }
        });
        *slot.lock().unwrap() = Some(Arc::clone(&once));
        registry.subscribe(key.clone(), once);

        assert_eq!(registry.dispatch(&key, &Value::Null), 1);
        assert_eq!(registry.dispatch(&key, &Value::Null), 0);
    }

    #[test]
    fn test_panicking_handler_does_not_stop_the_rest() {
        let registry = HandlerRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let key = SubscriptionKey::message("boom");

        registry.subscribe(key.clone(), handler(|_| panic!("handler failed")));
        registry.subscribe(key.clone(), recorder(&log, "after"));

        assert_eq!(registry.dispatch(&key, &Value::Null), 2);
        assert_eq!(*log.lock().unwrap(), vec!["after"]);
        assert_eq!(registry.handler_count(&key), 2);
    }
}
