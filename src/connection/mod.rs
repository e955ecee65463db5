mod keepalive;
pub mod transport;
pub mod websocket;

use keepalive::{KeepaliveTask, SharedSink};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub use transport::{Dialer, Frame, FrameSink, TransportError};
pub use websocket::WebSocketDialer;

/// How long a failed connect attempt blocks before returning its error.
pub const CONNECT_COOLDOWN: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
#[error("failed to connect to {url}: {source}")]
pub struct ConnectError {
    pub url: String,
    #[source]
    pub source: TransportError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

struct ActiveConnection {
    sink: SharedSink,
    keepalive: Option<KeepaliveTask>,
}

/// Owns at most one open connection plus its keepalive task.
///
/// Reconnecting is up to the caller: a failed write leaves the manager in
/// `Connected` until it is closed and connected again.
pub struct ConnectionManager {
    url: String,
    ping_interval: Option<Duration>,
    cooldown: Duration,
    dialer: Arc<dyn Dialer>,
    state: ConnectionState,
    active: Option<ActiveConnection>,
}

impl ConnectionManager {
    pub fn new(url: impl Into<String>, ping_interval: Option<Duration>, dialer: Arc<dyn Dialer>) -> Self {
        Self {
            url: url.into(),
            ping_interval,
            cooldown: CONNECT_COOLDOWN,
            dialer,
            state: ConnectionState::Disconnected,
            active: None,
        }
    }

    /// Override the pause after a failed connect.
    #[must_use]
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Whether a keepalive task is currently running for the open connection.
    pub fn keepalive_active(&self) -> bool {
        self.active
            .as_ref()
            .and_then(|active| active.keepalive.as_ref())
            .is_some_and(|task| !task.is_finished())
    }

    /// Dial the target and start keepalive.
    ///
    /// An existing connection is closed first. On failure this waits out the
    /// cool-down before returning, so tight reconnect loops stay throttled.
    pub async fn connect(&mut self) -> Result<(), ConnectError> {
        if self.active.is_some() {
            if let Err(e) = self.close().await {
                debug!(url = %self.url, error = %e, "Error closing previous connection");
            }
        }

        self.state = ConnectionState::Connecting;
        match self.dialer.dial(&self.url).await {
            Ok(sink) => {
                let sink: SharedSink = Arc::new(Mutex::new(sink));
                let keepalive = self
                    .ping_interval
                    .map(|period| KeepaliveTask::spawn(sink.clone(), period));
                self.active = Some(ActiveConnection { sink, keepalive });
                self.state = ConnectionState::Connected;
                info!(url = %self.url, "Connected");
                Ok(())
            }
            Err(source) => {
                self.state = ConnectionState::Disconnected;
                warn!(
                    url = %self.url,
                    error = %source,
                    cooldown_secs = self.cooldown.as_secs(),
                    "Connect failed, cooling down"
                );
                tokio::time::sleep(self.cooldown).await;
                Err(ConnectError {
                    url: self.url.clone(),
                    source,
                })
            }
        }
    }

    /// Stop keepalive and tear the connection down. Closing twice is a no-op.
    pub async fn close(&mut self) -> Result<(), TransportError> {
        self.state = ConnectionState::Disconnected;
        let Some(active) = self.active.take() else {
            return Ok(());
        };

        if let Some(keepalive) = active.keepalive {
            keepalive.stop().await;
        }

        let mut sink = active.sink.lock().await;
        let result = sink.close().await;
        debug!(url = %self.url, "Connection closed");
        result
    }

    /// Write one frame, serialized with the keepalive task.
    pub async fn send(&self, frame: Frame) -> Result<(), TransportError> {
        let active = self.active.as_ref().ok_or(TransportError::NotConnected)?;
        let mut sink = active.sink.lock().await;
        sink.send(frame).await
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("url", &self.url)
            .field("ping_interval", &self.ping_interval)
            .field("state", &self.state)
            .finish()
    }
}
