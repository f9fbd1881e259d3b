use crate::binder::{BindCallbacks, ScopedBinding, Subscription, SubscriptionBinder};
use crate::infrastructure::Debouncer;
use crate::messaging::handler;
use crate::types::constants::EXERCISE_PROGRESS_CHANNEL_PREFIX;
use serde_json::Value;
use std::fmt::Display;
use tokio::sync::watch;

/// Channel carrying progress updates for one exercise
pub fn exercise_progress_channel(exercise_id: impl Display) -> String {
    format!("{}{}", EXERCISE_PROGRESS_CHANNEL_PREFIX, exercise_id)
}

/// Exercise id embedded in a progress channel name
pub fn parse_exercise_id(channel: &str) -> Option<&str> {
    channel
        .strip_prefix(EXERCISE_PROGRESS_CHANNEL_PREFIX)
        .filter(|id| !id.is_empty())
}

/// Live progress for the exercise currently on screen.
///
/// Students submitting answers produce bursts of updates; the callback is
/// debounced so it can trigger a refetch of the results table directly.
pub struct ExerciseProgressFeed;

impl ExerciseProgressFeed {
    pub fn bind<F>(
        binder: &SubscriptionBinder,
        auth: watch::Receiver<bool>,
        exercise_id: impl Display,
        on_progress: F,
    ) -> ScopedBinding
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        Self::bind_with(binder, auth, exercise_id, Debouncer::default(), on_progress)
    }

    pub fn bind_with<F>(
        binder: &SubscriptionBinder,
        auth: watch::Receiver<bool>,
        exercise_id: impl Display,
        debouncer: Debouncer,
        on_progress: F,
    ) -> ScopedBinding
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        let channel = exercise_progress_channel(exercise_id);
        tracing::debug!("Binding exercise progress feed on {}", channel);

        let subscription = Subscription::channel(channel, handler(on_progress)).debounced(&debouncer);
        binder.bind(auth, vec![subscription], BindCallbacks::new())
    }
}
