use crate::infrastructure::Debouncer;
use crate::messaging::{Handler, MessageType, SubscriptionKey};

/// One registration requested by a bound UI unit
#[derive(Clone)]
pub struct Subscription {
    pub key: SubscriptionKey,
    pub handler: Handler,
}

impl Subscription {
    /// Subscription keyed by envelope `type`
    pub fn message(r#type: impl Into<MessageType>, handler: Handler) -> Self {
        Self {
            key: SubscriptionKey::message(r#type),
            handler,
        }
    }

    /// Subscription keyed by channel name
    pub fn channel(name: impl Into<String>, handler: Handler) -> Self {
        Self {
            key: SubscriptionKey::channel(name),
            handler,
        }
    }

    /// Routes calls through `debouncer` before they reach the handler
    pub fn debounced(mut self, debouncer: &Debouncer) -> Self {
        self.handler = debouncer.wrap(self.handler);
        self
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

/// Identity of a subscription list: its keys in order.
/// Handler references are left out.
pub fn subscription_keys(subscriptions: &[Subscription]) -> Vec<SubscriptionKey> {
    subscriptions.iter().map(|s| s.key.clone()).collect()
}
