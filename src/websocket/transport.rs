use crate::types::Result;
use async_trait::async_trait;
use futures::{Sink, Stream};
use std::pin::Pin;

/// Inbound frame as seen by the connection manager
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// UTF-8 text frame carrying a JSON envelope
    Text(String),
    /// Close frame with optional reason
    Close(Option<String>),
}

/// Write half of a transport, accepting serialized envelopes
pub type FrameSink = Pin<Box<dyn Sink<String, Error = crate::RealtimeError> + Send>>;

/// Read half of a transport; the stream ending means the peer went away
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<Frame>> + Send>>;

/// Opens duplex connections to the real-time endpoint.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(&self, url: &str) -> Result<(FrameSink, FrameStream)>;
}
