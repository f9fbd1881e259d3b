//! Scripted in-memory connector for tests.

use super::transport::{Connector, Frame, FrameSink, FrameStream};
use crate::types::{RealtimeError, Result};
use async_trait::async_trait;
use futures::SinkExt;
use futures::channel::mpsc as fmpsc;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Outcome of the next connection attempt
#[derive(Debug, Clone, Copy)]
pub(crate) enum Outcome {
    Accept,
    Refuse,
}

/// Server side of an accepted mock connection.
/// Dropping it (or `outgoing`) ends the client's stream, i.e. an abrupt close.
pub(crate) struct MockServer {
    pub outgoing: fmpsc::UnboundedSender<Result<Frame>>,
    pub received: fmpsc::UnboundedReceiver<String>,
}

impl MockServer {
    pub fn send_text(&self, text: &str) {
        self.outgoing
            .unbounded_send(Ok(Frame::Text(text.to_string())))
            .unwrap();
    }

    pub fn send_json(&self, value: serde_json::Value) {
        self.send_text(&value.to_string());
    }

    pub fn send_error(&self, message: &str) {
        self.outgoing
            .unbounded_send(Err(RealtimeError::Connection(message.to_string())))
            .unwrap();
    }

    pub async fn next_received(&mut self) -> Option<String> {
        use futures::StreamExt;
        self.received.next().await
    }
}

pub(crate) struct MockConnector {
    script: Mutex<VecDeque<Outcome>>,
    urls: Mutex<Vec<String>>,
    attempts_tx: mpsc::UnboundedSender<Instant>,
    servers_tx: mpsc::UnboundedSender<MockServer>,
}

/// Test-side view of a [`MockConnector`]
pub(crate) struct Harness {
    pub attempts: mpsc::UnboundedReceiver<Instant>,
    pub servers: mpsc::UnboundedReceiver<MockServer>,
    pub connector: Arc<MockConnector>,
}

impl Harness {
    pub async fn next_server(&mut self) -> MockServer {
        self.servers.recv().await.expect("connector dropped")
    }

    pub async fn next_attempt(&mut self) -> Instant {
        self.attempts.recv().await.expect("connector dropped")
    }

    /// Attempts recorded so far and not yet consumed
    pub fn drain_attempts(&mut self) -> usize {
        let mut count = 0;
        while self.attempts.try_recv().is_ok() {
            count += 1;
        }
        count
    }
}

impl MockConnector {
    /// Accepts every attempt unless `script` says otherwise.
    pub fn scripted(script: Vec<Outcome>) -> Harness {
        let (attempts_tx, attempts) = mpsc::unbounded_channel();
        let (servers_tx, servers) = mpsc::unbounded_channel();
        let connector = Arc::new(Self {
            script: Mutex::new(script.into()),
            urls: Mutex::new(Vec::new()),
            attempts_tx,
            servers_tx,
        });
        Harness {
            attempts,
            servers,
            connector,
        }
    }

    pub fn accepting() -> Harness {
        Self::scripted(Vec::new())
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, url: &str) -> Result<(FrameSink, FrameStream)> {
        self.urls.lock().unwrap().push(url.to_string());
        let _ = self.attempts_tx.send(Instant::now());

        let outcome = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Outcome::Accept);

        match outcome {
            Outcome::Refuse => Err(RealtimeError::Connection("connection refused".to_string())),
            Outcome::Accept => {
                let (client_tx, server_rx) = fmpsc::unbounded::<String>();
                let (server_tx, client_rx) = fmpsc::unbounded::<Result<Frame>>();

                let sink = client_tx
                    .sink_map_err(|e| RealtimeError::Connection(e.to_string()));

                let _ = self.servers_tx.send(MockServer {
                    outgoing: server_tx,
                    received: server_rx,
                });

                Ok((Box::pin(sink), Box::pin(client_rx)))
            }
        }
    }
}
