use super::batch::PipelineBatch;
use crate::config::RetryBudget;
use crate::event::{BatchOutcome, RawEvent};
use crate::observer::Observer;
use crate::publisher::Publisher;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("retry limit reached with {remaining} events unsent")]
    RetryLimit { remaining: usize },

    #[error("shutdown requested with {remaining} events unsent")]
    Shutdown { remaining: usize },
}

/// Drives one publisher through the batches assigned to it, one at a time.
pub struct Worker {
    publisher: Publisher,
    retry_budget: RetryBudget,
    observer: Arc<dyn Observer>,
    shutdown: CancellationToken,
}

impl Worker {
    pub fn new(
        publisher: Publisher,
        retry_budget: RetryBudget,
        observer: Arc<dyn Observer>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            publisher,
            retry_budget,
            observer,
            shutdown,
        }
    }

    /// Process batches until the channel closes or shutdown is requested,
    /// then close the connection.
    pub async fn run(mut self, mut batches: mpsc::Receiver<Vec<RawEvent>>) {
        let id = self.publisher.id();
        info!(worker = id, "Worker started");

        loop {
            let events = tokio::select! {
                biased;

                _ = self.shutdown.cancelled() => {
                    self.abandon_queued(&mut batches);
                    break;
                }
                next = batches.recv() => match next {
                    Some(events) => events,
                    None => break,
                },
            };

            if let Err(e) = self.deliver(events).await {
                match e {
                    DeliveryError::RetryLimit { .. } => error!(worker = id, error = %e, "Dropping batch"),
                    DeliveryError::Shutdown { .. } => warn!(worker = id, error = %e, "Stopping mid-batch"),
                }
            }
        }

        if let Err(e) = self.publisher.close().await {
            debug!(worker = id, error = %e, "Error closing connection");
        }
        info!(worker = id, "Worker stopped");
    }

    /// Publish a batch, resubmitting its unsent suffix within the retry budget.
    pub async fn deliver(&mut self, events: Vec<RawEvent>) -> Result<(), DeliveryError> {
        let id = self.publisher.id();
        let mut pending = events;
        let mut retries = 0u64;

        loop {
            if !self.publisher.is_connected() && !self.ensure_connected().await {
                self.observer.failed(pending.len());
                return Err(DeliveryError::Shutdown {
                    remaining: pending.len(),
                });
            }

            let (batch, outcome) = PipelineBatch::new(pending);
            let result = self.publisher.publish(batch, &self.shutdown).await;

            let remaining = match outcome.await {
                Ok(BatchOutcome::Acked) => return Ok(()),
                Ok(BatchOutcome::Retry(remaining)) => remaining,
                // Publish always completes the batch, so this is unreachable in practice
                Err(_) => return Ok(()),
            };

            if let Err(e) = &result {
                warn!(
                    worker = id,
                    remaining = remaining.len(),
                    retries,
                    error = %e,
                    "Publish failed"
                );
            }

            // Whatever broke the write, the connection is not trusted again
            if let Err(e) = self.publisher.close().await {
                debug!(worker = id, error = %e, "Error closing failed connection");
            }

            if self.shutdown.is_cancelled() {
                self.observer.failed(remaining.len());
                return Err(DeliveryError::Shutdown {
                    remaining: remaining.len(),
                });
            }

            if !self.retry_budget.allows(retries) {
                self.observer.failed(remaining.len());
                return Err(DeliveryError::RetryLimit {
                    remaining: remaining.len(),
                });
            }

            retries += 1;
            self.observer.retried(remaining.len());
            pending = remaining;
        }
    }

    /// Report batches still waiting in the queue as failed.
    fn abandon_queued(&self, batches: &mut mpsc::Receiver<Vec<RawEvent>>) {
        batches.close();
        let mut abandoned = 0;
        while let Ok(events) = batches.try_recv() {
            abandoned += events.len();
        }
        if abandoned > 0 {
            warn!(worker = self.publisher.id(), abandoned, "Shutdown with queued events");
            self.observer.failed(abandoned);
        }
    }

    /// Reconnect until it works. Returns false if shutdown interrupted it.
    async fn ensure_connected(&mut self) -> bool {
        let id = self.publisher.id();
        loop {
            if self.shutdown.is_cancelled() {
                return false;
            }

            tokio::select! {
                _ = self.shutdown.cancelled() => return false,
                result = self.publisher.connect() => match result {
                    Ok(()) => return true,
                    Err(e) => debug!(worker = id, error = %e, "Reconnect attempt failed"),
                },
            }
        }
    }
}
