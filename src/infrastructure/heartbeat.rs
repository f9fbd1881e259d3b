use crate::client::ManagerState;
use crate::types::message::Envelope;
use std::sync::Weak;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

/// Periodic `{"type":"ping"}` emitter bound to one connection generation.
///
/// The initial heartbeat is sent by the manager when the connection opens;
/// this task only covers the periodic ones.
pub struct HeartbeatManager {
    interval: Duration,
    generation: u64,
    state: Weak<Mutex<ManagerState>>,
}

impl HeartbeatManager {
    pub fn new(state: Weak<Mutex<ManagerState>>, generation: u64, interval: Duration) -> Self {
        Self {
            interval,
            generation,
            state,
        }
    }

    /// Spawns the heartbeat task that runs periodically
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let start = Instant::now() + self.interval;
            let mut interval_timer = time::interval_at(start, self.interval);
            interval_timer.set_missed_tick_behavior(time::MissedTickBehavior::Skip);

            loop {
                interval_timer.tick().await;

                let Some(shared) = self.state.upgrade() else {
                    // Manager dropped, exit heartbeat task
                    break;
                };

                let mut state = shared.lock().await;
                if state.generation != self.generation || !state.is_connected() {
                    tracing::debug!("Heartbeat task outlived its connection, stopping");
                    break;
                }

                if let Err(e) = state.send_envelope(&Envelope::ping()).await {
                    tracing::error!("[Heartbeat] Failed to send: {}", e);
                } else {
                    tracing::trace!("Sent heartbeat");
                }
            }
        })
    }
}
