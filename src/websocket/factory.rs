use super::transport::{Connector, Frame, FrameSink, FrameStream};
use crate::types::{RealtimeError, Result};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt, future};
use tokio_tungstenite::tungstenite::Message;

/// Opens WebSocket connections with tokio-tungstenite
#[derive(Debug, Default, Clone, Copy)]
pub struct WebSocketFactory;

impl WebSocketFactory {
    /// Create a new WebSocket connection split into a sink and a stream
    pub async fn create(url: &str) -> Result<(FrameSink, FrameStream)> {
        tracing::debug!("Creating WebSocket connection to: {}", url);
        let (ws_stream, _response) = tokio_tungstenite::connect_async(url).await?;
        let (write_half, read_half) = ws_stream.split();

        let sink = write_half
            .sink_map_err(RealtimeError::from)
            .with(|text: String| future::ready(Ok::<_, RealtimeError>(Message::Text(text.into()))));

        let stream = read_half.filter_map(|msg| future::ready(into_frame(msg)));

        Ok((Box::pin(sink), Box::pin(stream)))
    }
}

#[async_trait]
impl Connector for WebSocketFactory {
    async fn connect(&self, url: &str) -> Result<(FrameSink, FrameStream)> {
        Self::create(url).await
    }
}

fn into_frame(
    msg: std::result::Result<Message, tokio_tungstenite::tungstenite::Error>,
) -> Option<Result<Frame>> {
    match msg {
        Ok(Message::Text(text)) => Some(Ok(Frame::Text(text.as_str().to_owned()))),
        Ok(Message::Close(frame)) => {
            let reason = frame.map(|close_frame| {
                format!("code={:?}, reason='{}'", close_frame.code, close_frame.reason)
            });
            Some(Ok(Frame::Close(reason)))
        }
        Ok(Message::Ping(data)) => {
            tracing::debug!("Received ping ({} bytes)", data.len());
            None
        }
        Ok(Message::Pong(data)) => {
            tracing::debug!("Received pong ({} bytes)", data.len());
            None
        }
        Ok(Message::Binary(data)) => {
            tracing::warn!("Received unexpected binary message ({} bytes)", data.len());
            None
        }
        Ok(Message::Frame(_)) => None,
        Err(e) => Some(Err(e.into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_becomes_frame() {
        let frame = into_frame(Ok(Message::Text(r#"{"type":"pong"}"#.into())));
        assert!(matches!(frame, Some(Ok(Frame::Text(t))) if t == r#"{"type":"pong"}"#));
    }

    #[test]
    fn test_control_frames_are_skipped() {
        assert!(into_frame(Ok(Message::Ping(Default::default()))).is_none());
        assert!(into_frame(Ok(Message::Pong(Default::default()))).is_none());
        assert!(into_frame(Ok(Message::Binary(vec![1u8, 2, 3].into()))).is_none());
    }

    #[test]
    fn test_close_without_frame_has_no_reason() {
        assert!(matches!(
            into_frame(Ok(Message::Close(None))),
            Some(Ok(Frame::Close(None)))
        ));
    }
}
