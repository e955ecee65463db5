use super::worker::Worker;
use crate::event::RawEvent;
use crate::observer::Observer;
use crate::output::OutputGroup;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Errors that can occur during pipeline operation
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no publishers configured")]
    NoWorkers,

    #[error("worker {0} stopped accepting batches")]
    WorkerGone(usize),

    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Batches waiting per worker before dispatch blocks.
const WORKER_QUEUE_DEPTH: usize = 1;

/// Group incoming events into batches and hand them to workers round-robin.
///
/// A batch is dispatched when it reaches `batch_size`, when `flush_interval`
/// has passed since its first event, or when the input closes. Returns once
/// every worker has drained its queue and closed its connection.
pub async fn run_pipeline(
    group: OutputGroup,
    observer: Arc<dyn Observer>,
    mut input: mpsc::Receiver<RawEvent>,
    flush_interval: Duration,
    shutdown: CancellationToken,
) -> Result<(), PipelineError> {
    if group.publishers.is_empty() {
        return Err(PipelineError::NoWorkers);
    }

    let batch_size = group.batch_size.max(1);
    let mut senders = Vec::with_capacity(group.publishers.len());
    let mut handles: Vec<JoinHandle<()>> = Vec::with_capacity(group.publishers.len());

    for publisher in group.publishers {
        let (tx, rx) = mpsc::channel(WORKER_QUEUE_DEPTH);
        let worker = Worker::new(publisher, group.retry_budget, observer.clone(), shutdown.clone());
        handles.push(tokio::spawn(worker.run(rx)));
        senders.push(tx);
    }

    info!(workers = senders.len(), batch_size, "Pipeline started");

    let mut dispatcher = Dispatcher {
        senders,
        next: 0,
        shutdown: shutdown.clone(),
        observer: observer.clone(),
    };
    let mut buffer: Vec<RawEvent> = Vec::with_capacity(batch_size);
    let mut deadline: Option<Instant> = None;

    let result = loop {
        tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                if !buffer.is_empty() {
                    warn!(count = buffer.len(), "Shutdown with undispatched events");
                    observer.failed(buffer.len());
                }
                break Ok(());
            }

            next = input.recv() => match next {
                Some(event) => {
                    if buffer.is_empty() {
                        // An interval past the clock's range never flushes on time
                        deadline = Instant::now().checked_add(flush_interval);
                    }
                    buffer.push(event);
                    if buffer.len() >= batch_size {
                        deadline = None;
                        if let Err(e) = dispatcher.dispatch(std::mem::take(&mut buffer)).await {
                            break Err(e);
                        }
                    }
                }
                None => {
                    debug!("Input closed");
                    if !buffer.is_empty() {
                        if let Err(e) = dispatcher.dispatch(std::mem::take(&mut buffer)).await {
                            break Err(e);
                        }
                    }
                    break Ok(());
                }
            },

            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                deadline = None;
                debug!(count = buffer.len(), "Flushing partial batch");
                if let Err(e) = dispatcher.dispatch(std::mem::take(&mut buffer)).await {
                    break Err(e);
                }
            }
        }
    };

    // Closing the queues lets each worker finish what it has and exit
    drop(dispatcher);

    for handle in handles {
        handle.await?;
    }

    info!("Pipeline shutdown complete");
    result
}

struct Dispatcher {
    senders: Vec<mpsc::Sender<Vec<RawEvent>>>,
    next: usize,
    shutdown: CancellationToken,
    observer: Arc<dyn Observer>,
}

impl Dispatcher {
    async fn dispatch(&mut self, batch: Vec<RawEvent>) -> Result<(), PipelineError> {
        let worker = self.next;
        self.next = (self.next + 1) % self.senders.len();

        let count = batch.len();
        tokio::select! {
            biased;

            _ = self.shutdown.cancelled() => {
                warn!(worker, count, "Shutdown before batch was dispatched");
                self.observer.failed(count);
                Ok(())
            }
            sent = self.senders[worker].send(batch) => match sent {
                Ok(()) => {
                    debug!(worker, count, "Dispatched batch");
                    Ok(())
                }
                Err(_) => {
                    error!(worker, count, "Worker queue closed");
                    Err(PipelineError::WorkerGone(worker))
                }
            },
        }
    }
}
