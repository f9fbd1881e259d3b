use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::messaging::MessageType;
use crate::types::constants::{CHANNEL_DATA_FIELD, CHANNEL_FIELD};

/// Wire envelope exchanged with the real-time endpoint: `{"type": ..., "data": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope {
    pub r#type: MessageType,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,
}

impl Envelope {
    pub fn new(r#type: impl Into<MessageType>, data: Value) -> Self {
        Self {
            r#type: r#type.into(),
            data,
        }
    }

    /// Heartbeat envelope, `{"type":"ping"}`
    pub fn ping() -> Self {
        Self::new(MessageType::Ping, Value::Null)
    }

    /// Fan-out request, `{"type":"broadcast","data":...}`
    pub fn broadcast(payload: Value) -> Self {
        Self::new(MessageType::Broadcast, payload)
    }

    /// Channel name carried inside the payload, if any.
    pub fn channel(&self) -> Option<&str> {
        self.data.get(CHANNEL_FIELD).and_then(Value::as_str)
    }

    /// Data delivered to channel handlers: the nested `data` field when
    /// present, the whole payload otherwise.
    pub fn channel_payload(&self) -> Value {
        self.data
            .get(CHANNEL_DATA_FIELD)
            .cloned()
            .unwrap_or_else(|| self.data.clone())
    }
}
