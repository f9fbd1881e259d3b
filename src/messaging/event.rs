use crate::types::constants::message_types;
use serde::{Deserialize, Serialize};

/// Type-safe envelope `type` values
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MessageType {
    /// Heartbeat sent by the client (and sometimes echoed by the server)
    Ping,

    /// Heartbeat reply
    Pong,

    /// Generic fan-out message
    Broadcast,

    /// User notification pushed by the server
    Notification,

    /// Progress update for an exercise
    ExerciseProgress,

    /// Any other server-defined type
    Custom(String),
}

impl MessageType {
    /// Parse a string into a MessageType
    pub fn parse(s: &str) -> Self {
        match s {
            message_types::PING => Self::Ping,
            message_types::PONG => Self::Pong,
            message_types::BROADCAST => Self::Broadcast,
            message_types::NOTIFICATION => Self::Notification,
            message_types::EXERCISE_PROGRESS => Self::ExerciseProgress,
            _ => Self::Custom(s.to_string()),
        }
    }

    /// Convert type to string representation
    pub fn as_str(&self) -> &str {
        match self {
            Self::Ping => message_types::PING,
            Self::Pong => message_types::PONG,
            Self::Broadcast => message_types::BROADCAST,
            Self::Notification => message_types::NOTIFICATION,
            Self::ExerciseProgress => message_types::EXERCISE_PROGRESS,
            Self::Custom(s) => s,
        }
    }

    /// Heartbeat traffic, not worth logging above trace level
    pub fn is_heartbeat(&self) -> bool {
        matches!(self, Self::Ping | Self::Pong)
    }
}

impl From<&str> for MessageType {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<String> for MessageType {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<MessageType> for String {
    fn from(t: MessageType) -> Self {
        t.as_str().to_string()
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
