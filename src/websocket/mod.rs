// WebSocket module - Transport seam and the tungstenite-backed connector
mod factory;
#[cfg(test)]
pub(crate) mod mock;
mod transport;

pub use factory::WebSocketFactory;
pub use transport::{Connector, Frame, FrameSink, FrameStream};
