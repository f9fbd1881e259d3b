use super::{ConnectionManagerBuilder, ConnectionState, ManagerState, RealtimeOptions, Transition};
use crate::infrastructure::{HeartbeatManager, ReconnectTimer};
use crate::messaging::{Handler, HandlerRegistry, MessageRouter, MessageType, SubscriptionKey};
use crate::types::constants::CLOSE_TIMEOUT;
use crate::types::{Envelope, RealtimeError, Result};
use crate::websocket::{Connector, Frame, FrameSink, FrameStream};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, watch};

/// Owner of the single real-time connection of the application.
///
/// `ConnectionManager` keeps one duplex connection to the endpoint, reconnects
/// after unexpected drops with a fixed delay and a bounded number of attempts,
/// and fans inbound envelopes out to handlers registered by message type or by
/// channel name.
///
/// Create it once at startup and hand out clones; clones share the same
/// connection and registry.
///
/// # Example
///
/// ```no_run
/// use classroom_realtime::{ConnectionManager, RealtimeOptions, handler};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let manager = ConnectionManager::new(RealtimeOptions::with_endpoint(
///     "wss://school.example.com/ws/notifications",
/// ))?;
///
/// manager.subscribe("notification", handler(|data| println!("{data}")));
/// manager.connect(true).await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ConnectionManager {
    pub(crate) options: Arc<RealtimeOptions>,
    pub(crate) connector: Arc<dyn Connector>,
    pub(crate) registry: Arc<HandlerRegistry>,

    // Consolidated mutable state
    pub(crate) state: Arc<Mutex<ManagerState>>,
    pub(crate) state_rx: watch::Receiver<ConnectionState>,
}

impl ConnectionManager {
    /// Creates a manager using the WebSocket transport.
    ///
    /// No connection is opened until [`connect()`](Self::connect).
    ///
    /// # Errors
    ///
    /// Returns [`RealtimeError::UrlParse`](crate::RealtimeError::UrlParse) for a
    /// malformed fixed endpoint and
    /// [`RealtimeError::Config`](crate::RealtimeError::Config) for invalid options.
    pub fn new(options: RealtimeOptions) -> Result<Self> {
        ConnectionManagerBuilder::new(options).map(|builder| builder.build())
    }

    pub fn builder(options: RealtimeOptions) -> Result<ConnectionManagerBuilder> {
        ConnectionManagerBuilder::new(options)
    }

    /// Opens the connection when `is_authenticated` is true.
    ///
    /// A no-op when unauthenticated, when already connected, or while a
    /// connection attempt is in flight. Failures are logged, never returned.
    /// On open, one `{"type":"ping"}` is sent right away and the reconnect
    /// counter is reset.
    pub async fn connect(&self, is_authenticated: bool) {
        if !is_authenticated {
            tracing::debug!("Not authenticated, skipping connect");
            return;
        }
        self.open().await;
    }

    /// Closes the connection on purpose. Pending reconnects are cancelled and
    /// nothing is rescheduled. Registered handlers are kept.
    pub async fn disconnect(&self) {
        let mut state = self.state.lock().await;
        let was = state.connection;

        state.apply(Transition::Logout);
        state.cancel_reconnect();
        state.task_manager.abort_all();
        state.reconnect_attempts = 0;
        // Invalidates attempts still waiting on the connector
        state.generation += 1;

        if let Some(sink) = state.sink.take() {
            tracing::info!("Disconnecting from real-time server");
            if let Err(e) = close_sink(sink).await {
                tracing::debug!("Transport did not close cleanly: {}", e);
            }
        } else if was.is_active() {
            tracing::info!("Disconnect requested while {:?}", was);
        }

        state.apply(Transition::Closed);
    }

    pub async fn state(&self) -> ConnectionState {
        self.state.lock().await.connection
    }

    /// Latest state without waiting for the lock
    pub fn current_state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.current_state() == ConnectionState::Connected
    }

    /// Receiver notified on every state transition
    pub fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    pub async fn reconnect_attempts(&self) -> u32 {
        self.state.lock().await.reconnect_attempts
    }

    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }

    pub fn options(&self) -> &RealtimeOptions {
        &self.options
    }

    /// Registers `handler` for envelopes of `type`. Each call appends, so the
    /// same handler registered twice runs twice.
    pub fn subscribe(&self, r#type: impl Into<MessageType>, handler: Handler) {
        self.registry.subscribe(SubscriptionKey::message(r#type), handler);
    }

    /// Removes the first registration of `handler` for `type`.
    pub fn unsubscribe(&self, r#type: impl Into<MessageType>, handler: &Handler) -> bool {
        self.registry
            .unsubscribe(&SubscriptionKey::message(r#type), handler)
    }

    /// Registers `handler` for payloads whose `channel` field equals `channel`.
    /// The handler receives the nested `data` field.
    pub fn subscribe_to_channel(&self, channel: impl Into<String>, handler: Handler) {
        self.registry.subscribe(SubscriptionKey::channel(channel), handler);
    }

    pub fn unsubscribe_from_channel(&self, channel: impl Into<String>, handler: &Handler) -> bool {
        self.registry
            .unsubscribe(&SubscriptionKey::channel(channel), handler)
    }

    /// Sends `envelope` if connected. Otherwise, or on a write failure, the
    /// message is logged and dropped.
    pub async fn send_message(&self, envelope: Envelope) {
        let mut state = self.state.lock().await;
        if !state.is_connected() {
            tracing::warn!(
                "Not connected, dropping outgoing {} message",
                envelope.r#type
            );
            return;
        }

        if let Err(e) = state.send_envelope(&envelope).await {
            tracing::error!("Failed to send {} message: {}", envelope.r#type, e);
        }
    }

    /// Sends `{"type":"ping"}`
    pub async fn send_ping(&self) {
        self.send_message(Envelope::ping()).await;
    }

    /// Sends `{"type":"broadcast","data":payload}`
    pub async fn send_broadcast(&self, payload: Value) {
        self.send_message(Envelope::broadcast(payload)).await;
    }

    /// Explicit open. Replaces any pending reconnect.
    async fn open(&self) {
        let generation = {
            let mut state = self.state.lock().await;
            state.cancel_reconnect();
            match begin_attempt(&mut state) {
                Some(generation) => generation,
                None => return,
            }
        };
        self.attempt(generation).await;
    }

    /// Resolves the endpoint and opens the transport for an attempt already
    /// registered under `generation`.
    async fn attempt(&self, generation: u64) {
        let url = match self.options.endpoint_url() {
            Ok(url) => url,
            Err(e) => {
                tracing::error!("Cannot resolve real-time endpoint: {}", e);
                self.handle_open_failure(generation).await;
                return;
            }
        };

        tracing::info!(attempt = generation, "Connecting to real-time server");
        match self.connector.connect(&url).await {
            Ok((sink, stream)) => self.install(generation, sink, stream).await,
            Err(e) => {
                tracing::error!("Failed to open connection: {}", e);
                self.handle_open_failure(generation).await;
            }
        }
    }

    async fn install(&self, generation: u64, sink: FrameSink, stream: FrameStream) {
        let mut state = self.state.lock().await;
        if state.generation != generation || state.connection != ConnectionState::Connecting {
            tracing::debug!("Discarding connection opened by a stale attempt");
            drop(state);
            if let Err(e) = close_sink(sink).await {
                tracing::debug!("Stale transport did not close cleanly: {}", e);
            }
            return;
        }

        state.sink = Some(sink);
        state.apply(Transition::Opened);
        state.reconnect_attempts = 0;

        let reader = self.clone();
        state.task_manager.spawn(async move {
            reader.read_loop(generation, stream).await;
        });

        if let Some(interval) = self.options.heartbeat_interval {
            let heartbeat = HeartbeatManager::new(Arc::downgrade(&self.state), generation, interval);
            state.task_manager.track(heartbeat.spawn());
        }

        if let Err(e) = state.send_envelope(&Envelope::ping()).await {
            tracing::error!("Failed to send initial heartbeat: {}", e);
        }

        tracing::info!("Connected to real-time server");
    }

    async fn read_loop(&self, generation: u64, mut stream: FrameStream) {
        tracing::debug!("Starting read task");
        let router = MessageRouter::new(Arc::clone(&self.registry));

        while let Some(frame) = stream.next().await {
            match frame {
                Ok(Frame::Text(text)) => router.route_text(&text),
                Ok(Frame::Close(reason)) => {
                    match reason {
                        Some(reason) => tracing::warn!("Server closed connection: {}", reason),
                        None => tracing::warn!("Server closed connection without close frame"),
                    }
                    break;
                }
                // Errors alone never trigger recovery; only the close does.
                Err(e) => tracing::error!("Transport error: {}", e),
            }
        }

        self.handle_close(generation).await;
        tracing::debug!("Read task finished");
    }

    /// The transport of `generation` went away without a logout.
    async fn handle_close(&self, generation: u64) {
        let mut state = self.state.lock().await;
        if state.generation != generation || !state.apply(Transition::Dropped) {
            return;
        }

        tracing::warn!("Connection lost");
        state.sink = None;
        state.task_manager.abort_all();
        self.schedule_reconnect(&mut state);
    }

    /// Opening failed. The platform reports this as an error followed by a
    /// close, so the reconnect policy runs as for any other close.
    async fn handle_open_failure(&self, generation: u64) {
        let mut state = self.state.lock().await;
        if state.generation != generation || !state.apply(Transition::OpenFailed) {
            return;
        }
        self.schedule_reconnect(&mut state);
    }

    fn schedule_reconnect(&self, state: &mut ManagerState) {
        let max = self.options.max_reconnect_attempts;
        if state.reconnect_attempts >= max {
            tracing::warn!(
                "Giving up after {} reconnect attempts, waiting for an explicit connect",
                state.reconnect_attempts
            );
            return;
        }

        state.reconnect_attempts += 1;
        let delay = self.options.reconnect_delay;
        tracing::info!(
            attempt = state.reconnect_attempts,
            max,
            delay_ms = delay.as_millis() as u64,
            "Scheduling reconnect"
        );

        let manager = self.clone();
        let scheduled_in = state.generation;
        state.cancel_reconnect();
        state.reconnect_timer = Some(ReconnectTimer::schedule(delay, async move {
            manager.fire_reconnect(scheduled_in).await;
        }));
    }

    /// Runs when the reconnect timer scheduled during `scheduled_in` fires.
    /// The generation check and the move to `Connecting` share one critical
    /// section, so a `disconnect()` or `connect()` that got the lock first
    /// always wins.
    async fn fire_reconnect(&self, scheduled_in: u64) {
        let generation = {
            let mut state = self.state.lock().await;
            if state.generation != scheduled_in {
                tracing::debug!("Reconnect superseded, not reopening");
                return;
            }

            // Detach our own handle; cancelling it here would abort this task.
            drop(state.reconnect_timer.take());
            match begin_attempt(&mut state) {
                Some(generation) => generation,
                None => return,
            }
        };

        tracing::info!("Attempting to reconnect...");
        self.attempt(generation).await;
    }
}

/// Moves to `Connecting` and starts a new generation.
/// `None` when a connection is already open, opening or closing.
fn begin_attempt(state: &mut ManagerState) -> Option<u64> {
    if !state.apply(Transition::Connect) {
        tracing::debug!("Connect ignored, connection is {:?}", state.connection);
        return None;
    }
    state.generation += 1;
    Some(state.generation)
}

/// Closes the write half, giving up after `CLOSE_TIMEOUT` ms.
async fn close_sink(mut sink: FrameSink) -> Result<()> {
    tokio::time::timeout(Duration::from_millis(CLOSE_TIMEOUT), sink.close())
        .await
        .map_err(|_| RealtimeError::Timeout)?
}
