use crate::connection::{ConnectError, ConnectionManager, Frame, TransportError};
use crate::encode::Encoder;
use crate::event::{Batch, RawEvent};
use crate::observer::Observer;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("transmission failed: {0}")]
    Transmission(#[from] TransportError),

    #[error("publish cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, PublishError>;

/// Counts from a pass over a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishSummary {
    pub sent: usize,
    pub dropped: usize,
}

/// Where a pass over a batch stopped early.
#[derive(Debug)]
pub struct SendFailure {
    /// Index of the first event that was not transmitted
    pub index: usize,
    pub summary: PublishSummary,
    pub error: PublishError,
}

/// One worker's publisher: a connection plus the encoder feeding it.
pub struct Publisher {
    id: usize,
    connection: ConnectionManager,
    encoder: Encoder,
    observer: Arc<dyn Observer>,
}

impl Publisher {
    pub fn new(
        id: usize,
        connection: ConnectionManager,
        encoder: Encoder,
        observer: Arc<dyn Observer>,
    ) -> Self {
        Self {
            id,
            connection,
            encoder,
            observer,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    pub async fn connect(&mut self) -> std::result::Result<(), ConnectError> {
        self.connection.connect().await
    }

    pub async fn close(&mut self) -> std::result::Result<(), TransportError> {
        self.connection.close().await
    }

    /// Send a batch and complete it exactly once.
    ///
    /// The batch is acknowledged when every event was either written or
    /// dropped by the encoder. Otherwise it is retried with the suffix that
    /// starts at the first event whose write failed, and that error is returned.
    pub async fn publish<B: Batch>(&mut self, batch: B, cancel: &CancellationToken) -> Result<()> {
        let count = batch.events().len();
        self.observer.new_batch(count);

        let result = self.publish_events(batch.events(), cancel).await;
        match result {
            Ok(summary) => {
                self.observer.acked(summary.sent);
                trace!(
                    worker = self.id,
                    sent = summary.sent,
                    dropped = summary.dropped,
                    "Batch acknowledged"
                );
                batch.acknowledge();
                Ok(())
            }
            Err(failure) => {
                self.observer.acked(failure.summary.sent);
                let remaining = batch.events()[failure.index..].to_vec();
                debug!(
                    worker = self.id,
                    sent = failure.summary.sent,
                    remaining = remaining.len(),
                    error = %failure.error,
                    "Batch interrupted, handing back unsent events"
                );
                batch.retry(remaining);
                Err(failure.error)
            }
        }
    }

    /// Encode and write events in order, stopping at the first failed write.
    ///
    /// Events the encoder rejects are skipped and counted as dropped.
    pub async fn publish_events(
        &self,
        events: &[RawEvent],
        cancel: &CancellationToken,
    ) -> std::result::Result<PublishSummary, SendFailure> {
        let mut summary = PublishSummary::default();

        for (index, event) in events.iter().enumerate() {
            let text = match self.encoder.encode(event) {
                Ok(text) => text,
                Err(e) => {
                    debug!(worker = self.id, index, error = %e, "Dropping event");
                    self.observer.dropped(1);
                    summary.dropped += 1;
                    continue;
                }
            };

            let written = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(PublishError::Cancelled),
                result = self.connection.send(Frame::Text(text)) => result.map_err(PublishError::from),
            };

            if let Err(error) = written {
                return Err(SendFailure {
                    index,
                    summary,
                    error,
                });
            }
            summary.sent += 1;
        }

        Ok(summary)
    }
}

impl std::fmt::Debug for Publisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher")
            .field("id", &self.id)
            .field("connection", &self.connection)
            .field("encoder", &self.encoder)
            .finish()
    }
}
