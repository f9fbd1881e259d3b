// Binder module - Ties a UI unit's lifecycle to manager subscriptions
mod scoped;
mod subscription;

pub use scoped::{BindCallbacks, BindingPhase, ScopedBinding, SubscriptionBinder};
pub use subscription::{Subscription, subscription_keys};
