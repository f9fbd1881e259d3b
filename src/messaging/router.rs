use crate::messaging::{HandlerRegistry, SubscriptionKey};
use crate::types::message::Envelope;
use std::sync::Arc;

/// Routes incoming frames to registered handlers
pub struct MessageRouter {
    registry: Arc<HandlerRegistry>,
}

impl MessageRouter {
    pub fn new(registry: Arc<HandlerRegistry>) -> Self {
        Self { registry }
    }

    /// Parses a raw text frame and routes it. Malformed frames are logged
    /// and dropped.
    pub fn route_text(&self, text: &str) {
        match serde_json::from_str::<Envelope>(text) {
            Ok(envelope) => self.route(envelope),
            Err(e) => {
                tracing::error!("Failed to parse message: {} - Raw: {}", e, text);
            }
        }
    }

    /// Routes an envelope to type handlers, then to channel handlers.
    pub fn route(&self, envelope: Envelope) {
        if envelope.r#type.is_heartbeat() {
            tracing::trace!("Received heartbeat frame: {}", envelope.r#type);
        } else {
            tracing::debug!(
                "Routing message: type={}, data={}",
                envelope.r#type,
                envelope.data
            );
        }

        let by_type = self.registry.dispatch(
            &SubscriptionKey::Message(envelope.r#type.clone()),
            &envelope.data,
        );

        let by_channel = match envelope.channel() {
            Some(channel) => self.registry.dispatch(
                &SubscriptionKey::channel(channel),
                &envelope.channel_payload(),
            ),
            None => 0,
        };

        if by_type + by_channel == 0 && !envelope.r#type.is_heartbeat() {
            tracing::debug!("No handlers registered for message type {}", envelope.r#type);
        }
    }
}
