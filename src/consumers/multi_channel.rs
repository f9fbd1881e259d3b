use crate::binder::{BindCallbacks, ScopedBinding, Subscription, SubscriptionBinder};
use crate::infrastructure::Debouncer;
use crate::messaging::handler;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Generic feed over several channels at once, e.g. every group of a school.
///
/// Each channel gets its own debounce window, so a burst on one channel does
/// not hide an update on another.
pub struct MultiChannelFeed;

impl MultiChannelFeed {
    pub fn bind<F>(
        binder: &SubscriptionBinder,
        auth: watch::Receiver<bool>,
        channels: &[String],
        window: Duration,
        callbacks: BindCallbacks,
        on_update: F,
    ) -> ScopedBinding
    where
        F: Fn(&str, Value) + Send + Sync + 'static,
    {
        binder.bind(auth, Self::subscriptions(channels, window, on_update), callbacks)
    }

    /// One debounced channel subscription per name, in the given order.
    /// Feed the result to [`ScopedBinding::update_subscriptions`] when the
    /// channel list changes.
    pub fn subscriptions<F>(channels: &[String], window: Duration, on_update: F) -> Vec<Subscription>
    where
        F: Fn(&str, Value) + Send + Sync + 'static,
    {
        let on_update = Arc::new(on_update);
        channels
            .iter()
            .map(|channel| {
                let on_update = Arc::clone(&on_update);
                let name = channel.clone();
                Subscription::channel(
                    channel.clone(),
                    handler(move |payload| on_update(&name, payload)),
                )
                .debounced(&Debouncer::new(window))
            })
            .collect()
    }
}
