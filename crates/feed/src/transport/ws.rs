use async_trait::async_trait;
use futures_util::StreamExt;
use log::{debug, info, warn};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use super::{Connector, FrameStream};
use crate::error::FeedError;

/// WebSocket connector for a public depth stream
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    pub fn new(url: impl Into<String>) -> Self {
        WsConnector { url: url.into() }
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self) -> Result<FrameStream, FeedError> {
        let (ws_stream, response) = connect_async(&self.url).await?;
        info!(
            "WebSocket handshake with {} completed ({})",
            self.url,
            response.status()
        );

        // Pings are answered by tungstenite while reading
        let frames = ws_stream.filter_map(|msg| async move {
            match msg {
                Ok(message) => message_text(message).map(Ok),
                Err(e) => Some(Err(FeedError::from(e))),
            }
        });

        Ok(Box::pin(frames))
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}

/// Text payload of a data frame. Control frames and binary frames that are
/// not valid UTF-8 yield nothing.
fn message_text(message: Message) -> Option<String> {
    match message {
        Message::Text(text) => Some(text.as_str().to_owned()),
        Message::Binary(bytes) => match String::from_utf8(bytes.to_vec()) {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("Dropping binary frame that is not UTF-8: {}", e);
                None
            }
        },
        Message::Close(frame) => {
            debug!("Server sent close frame: {:?}", frame);
            None
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_and_utf8_binary_frames_pass() {
        assert_eq!(
            message_text(Message::text(r#"{"b":[]}"#)),
            Some(r#"{"b":[]}"#.to_string())
        );
        assert_eq!(
            message_text(Message::binary(br#"{"a":[]}"#.to_vec())),
            Some(r#"{"a":[]}"#.to_string())
        );
    }

    #[test]
    fn test_invalid_utf8_binary_frame_is_dropped() {
        assert_eq!(message_text(Message::binary(vec![0x7b, 0xff, 0xfe, 0x7d])), None);
    }

    #[test]
    fn test_control_frames_yield_nothing() {
        assert_eq!(message_text(Message::Close(None)), None);
        assert_eq!(message_text(Message::Ping(Vec::<u8>::new().into())), None);
    }
}
