use super::{ConnectionManager, ConnectionState, ManagerState};
use crate::messaging::HandlerRegistry;
use crate::types::constants::{
    ENDPOINT_ENV_VAR, MAX_RECONNECT_ATTEMPTS, RECONNECT_DELAY, TOKEN_QUERY_PARAM,
};
use crate::types::{RealtimeError, Result};
use crate::websocket::{Connector, WebSocketFactory};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use url::Url;

/// Where the real-time endpoint comes from. Resolved on every connection
/// attempt, so an environment change is picked up by the next reconnect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Fixed WebSocket URL
    Url(String),
    /// Read from an environment variable
    Env { var: String },
}

impl Endpoint {
    pub fn resolve(&self) -> Result<String> {
        match self {
            Self::Url(url) => Ok(url.clone()),
            Self::Env { var } => std::env::var(var).map_err(|_| {
                RealtimeError::Config(format!("environment variable {} is not set", var))
            }),
        }
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::Env {
            var: ENDPOINT_ENV_VAR.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RealtimeOptions {
    pub endpoint: Endpoint,
    /// Appended to the endpoint as `?token=...`
    pub access_token: Option<String>,
    /// Fixed delay before each reconnect attempt
    pub reconnect_delay: Duration,
    pub max_reconnect_attempts: u32,
    /// Periodic heartbeat. `None` sends only the heartbeat on open.
    pub heartbeat_interval: Option<Duration>,
}

impl Default for RealtimeOptions {
    fn default() -> Self {
        Self {
            endpoint: Endpoint::default(),
            access_token: None,
            reconnect_delay: Duration::from_millis(RECONNECT_DELAY),
            max_reconnect_attempts: MAX_RECONNECT_ATTEMPTS,
            heartbeat_interval: None,
        }
    }
}

impl RealtimeOptions {
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: Endpoint::Url(endpoint.into()),
            ..Default::default()
        }
    }

    /// Options reading the endpoint from `REALTIME_WS_URL`, loading a `.env`
    /// file first when one exists.
    pub fn from_env() -> Self {
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!("No .env file loaded: {}", e);
        }
        Self::default()
    }

    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }

    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = Some(interval);
        self
    }

    /// Build the WebSocket endpoint URL with query parameters
    pub fn endpoint_url(&self) -> Result<String> {
        let mut url = Url::parse(&self.endpoint.resolve()?)?;

        if let Some(token) = &self.access_token {
            url.query_pairs_mut().append_pair(TOKEN_QUERY_PARAM, token);
        }

        Ok(url.to_string())
    }
}

/// Builder for ConnectionManager that validates options
pub struct ConnectionManagerBuilder {
    options: RealtimeOptions,
    connector: Arc<dyn Connector>,
}

impl ConnectionManagerBuilder {
    /// Create a new builder
    pub fn new(options: RealtimeOptions) -> Result<Self> {
        if let Endpoint::Url(url) = &options.endpoint {
            Url::parse(url)?;
        }

        if options.heartbeat_interval.is_some_and(|i| i.is_zero()) {
            return Err(RealtimeError::Config(
                "heartbeat interval must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            options,
            connector: Arc::new(WebSocketFactory),
        })
    }

    /// Replace the transport, e.g. with an in-memory one
    pub fn connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = connector;
        self
    }

    pub fn build(self) -> ConnectionManager {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        let state_rx = state_tx.subscribe();

        ConnectionManager {
            options: Arc::new(self.options),
            connector: self.connector,
            registry: Arc::new(HandlerRegistry::new()),
            state: Arc::new(Mutex::new(ManagerState::new(state_tx))),
            state_rx,
        }
    }
}
