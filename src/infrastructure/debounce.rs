use crate::messaging::{Handler, handler};
use serde_json::Value;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// Leading-edge "ignore within window" rate limiter.
///
/// The first call is accepted immediately. Calls arriving less than `window`
/// after the last accepted one are discarded outright; nothing is queued and
/// nothing runs on the trailing edge.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    last_accepted: Arc<Mutex<Option<Instant>>>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_accepted: Arc::new(Mutex::new(None)),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Returns true when a call arriving now should run.
    pub fn accept(&self) -> bool {
        let now = Instant::now();
        let mut last = self
            .last_accepted
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        match *last {
            Some(previous) if now.duration_since(previous) < self.window => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }

    /// Wraps `inner` so that it only runs for accepted calls.
    pub fn wrap(&self, inner: Handler) -> Handler {
        let debouncer = self.clone();
        handler(move |payload: Value| {
            if debouncer.accept() {
                inner(payload);
            } else {
                tracing::trace!("Debounced update dropped");
            }
        })
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(Duration::from_millis(crate::types::DEBOUNCE_WINDOW))
    }
}
