use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;

/// A one-shot, cancellable delayed task used for reconnection.
///
/// Dropping the handle does not cancel the task; only [`cancel`](Self::cancel)
/// does. The fired task takes its own handle out of the manager state, and
/// detaching must not abort it mid-run.
#[derive(Debug)]
pub struct ReconnectTimer {
    handle: JoinHandle<()>,
}

impl ReconnectTimer {
    /// Schedule `task` to run once after `delay`
    pub fn schedule<F>(delay: Duration, task: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            sleep(delay).await;
            task.await;
        });
        Self { handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Cancel the timer. A task that already fired is aborted at its next
    /// await point.
    pub fn cancel(self) {
        self.handle.abort();
    }
}
