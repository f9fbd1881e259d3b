use super::connection::{ConnectionState, Transition};
use crate::infrastructure::{ReconnectTimer, TaskManager};
use crate::types::message::Envelope;
use crate::types::{RealtimeError, Result};
use crate::websocket::FrameSink;
use futures::SinkExt;
use tokio::sync::watch;

/// Consolidated mutable state of a ConnectionManager.
/// Every connection transition happens while this is locked.
pub struct ManagerState {
    /// Current lifecycle state
    pub connection: ConnectionState,

    /// Write half of the open transport
    pub sink: Option<FrameSink>,

    /// Unexpected closes since the last successful open
    pub reconnect_attempts: u32,

    /// Pending reconnect, if one is scheduled
    pub reconnect_timer: Option<ReconnectTimer>,

    /// Read loop and heartbeat of the current connection
    pub task_manager: TaskManager,

    /// Id of the latest connection attempt
    pub generation: u64,

    state_change_tx: watch::Sender<ConnectionState>,
}

impl ManagerState {
    pub fn new(state_change_tx: watch::Sender<ConnectionState>) -> Self {
        Self {
            connection: ConnectionState::Disconnected,
            sink: None,
            reconnect_attempts: 0,
            reconnect_timer: None,
            task_manager: TaskManager::new(),
            generation: 0,
            state_change_tx,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection == ConnectionState::Connected
    }

    /// Applies `transition` and notifies watchers. Returns false, leaving the
    /// state untouched, when the transition does not apply.
    pub fn apply(&mut self, transition: Transition) -> bool {
        let Some(next) = self.connection.next(transition) else {
            tracing::debug!(
                "Ignoring {:?} while {:?}",
                transition,
                self.connection
            );
            return false;
        };

        if next != self.connection {
            tracing::debug!("Connection state {:?} -> {:?}", self.connection, next);
        }
        self.connection = next;
        self.state_change_tx.send_replace(next);
        true
    }

    /// Cancels a pending reconnect, if any
    pub fn cancel_reconnect(&mut self) {
        if let Some(timer) = self.reconnect_timer.take() {
            tracing::debug!("Cancelling pending reconnect");
            timer.cancel();
        }
    }

    /// Serializes and writes an envelope on the open transport
    pub async fn send_envelope(&mut self, envelope: &Envelope) -> Result<()> {
        let json = serde_json::to_string(envelope)?;
        match self.sink.as_mut() {
            Some(sink) if self.connection == ConnectionState::Connected => {
                sink.send(json).await
            }
            _ => Err(RealtimeError::NotConnected),
        }
    }
}
