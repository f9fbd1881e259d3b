/// Envelope `type` strings (magic strings layer)
pub mod message_types {
    pub const PING: &str = "ping";
    pub const PONG: &str = "pong";
    pub const BROADCAST: &str = "broadcast";
    pub const NOTIFICATION: &str = "notification";
    pub const EXERCISE_PROGRESS: &str = "exercise_progress";
}

/// Payload field carrying the logical channel name
pub const CHANNEL_FIELD: &str = "channel";

/// Payload field carrying the channel-scoped data
pub const CHANNEL_DATA_FIELD: &str = "data";

/// Prefix of exercise progress channel names
pub const EXERCISE_PROGRESS_CHANNEL_PREFIX: &str = "exercise_progress_";

/// Environment variable holding the real-time endpoint
pub const ENDPOINT_ENV_VAR: &str = "REALTIME_WS_URL";

/// Query parameter used to pass the access token
pub const TOKEN_QUERY_PARAM: &str = "token";

/// Fixed delay between reconnect attempts (milliseconds)
pub const RECONNECT_DELAY: u64 = 3000;

/// Reconnect attempts before giving up
pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Default debounce window for update storms (milliseconds)
pub const DEBOUNCE_WINDOW: u64 = 2000;

/// Upper bound on a graceful close handshake (milliseconds)
pub const CLOSE_TIMEOUT: u64 = 1000;
