use crate::event::{Batch, BatchOutcome, RawEvent};
use tokio::sync::oneshot;

/// Batch whose completion is delivered over a oneshot channel.
#[derive(Debug)]
pub struct PipelineBatch {
    events: Vec<RawEvent>,
    done: oneshot::Sender<BatchOutcome>,
}

impl PipelineBatch {
    pub fn new(events: Vec<RawEvent>) -> (Self, oneshot::Receiver<BatchOutcome>) {
        let (done, outcome) = oneshot::channel();
        (Self { events, done }, outcome)
    }
}

impl Batch for PipelineBatch {
    fn events(&self) -> &[RawEvent] {
        &self.events
    }

    fn acknowledge(self) {
        // The receiver only goes away when the worker is shutting down
        let _ = self.done.send(BatchOutcome::Acked);
    }

    fn retry(self, events: Vec<RawEvent>) {
        let _ = self.done.send(BatchOutcome::Retry(events));
    }
}
