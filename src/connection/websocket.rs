//! Websocket transport on top of tokio-tungstenite.
//!
//! The write half is handed to the connection manager. The read half is
//! drained by a background task so pongs and close frames from the peer are
//! consumed; nothing the peer sends is interpreted.

use super::transport::{Dialer, Frame, FrameSink, TransportError};
use async_trait::async_trait;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async_with_config, MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const MAX_MESSAGE_SIZE: usize = 64 * 1024 * 1024;

#[derive(Debug, Clone, Default)]
pub struct WebSocketDialer;

impl WebSocketDialer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Dialer for WebSocketDialer {
    async fn dial(&self, url: &str) -> Result<Box<dyn FrameSink>, TransportError> {
        let mut config = WebSocketConfig::default();
        config.max_message_size = Some(MAX_MESSAGE_SIZE);
        config.max_frame_size = Some(MAX_MESSAGE_SIZE);

        let (stream, response) = connect_async_with_config(url, Some(config), false).await?;
        debug!(url = %url, status = %response.status(), "Websocket handshake complete");

        let (sink, mut incoming) = stream.split();
        let reader = tokio::spawn(async move {
            while let Some(frame) = incoming.next().await {
                match frame {
                    Ok(WsMessage::Close(reason)) => {
                        debug!(?reason, "Peer closed websocket");
                        break;
                    }
                    Ok(other) => trace!(kind = frame_kind(&other), "Ignoring inbound frame"),
                    Err(e) => {
                        debug!(error = %e, "Websocket read side ended");
                        break;
                    }
                }
            }
        });

        Ok(Box::new(WebSocketSink { sink, reader }))
    }
}

struct WebSocketSink {
    sink: SplitSink<WsStream, WsMessage>,
    reader: JoinHandle<()>,
}

#[async_trait]
impl FrameSink for WebSocketSink {
    async fn send(&mut self, frame: Frame) -> Result<(), TransportError> {
        let message = match frame {
            Frame::Text(text) => WsMessage::Text(text),
            Frame::Ping => WsMessage::Ping(Vec::new()),
        };
        self.sink.send(message).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        let result = self.sink.close().await;
        self.reader.abort();
        result.map_err(TransportError::from)
    }
}

impl Drop for WebSocketSink {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

fn frame_kind(message: &WsMessage) -> &'static str {
    match message {
        WsMessage::Text(_) => "text",
        WsMessage::Binary(_) => "binary",
        WsMessage::Ping(_) => "ping",
        WsMessage::Pong(_) => "pong",
        WsMessage::Close(_) => "close",
        WsMessage::Frame(_) => "frame",
    }
}
