use super::raw::RawEvent;

/// An ordered group of events plus its completion actions.
///
/// Both completion methods consume the batch, so exactly one of them can
/// run. `retry` receives a contiguous suffix of `events()`.
pub trait Batch: Send {
    fn events(&self) -> &[RawEvent];

    /// Every event was handled; the batch is done.
    fn acknowledge(self);

    /// The given events must be resubmitted.
    fn retry(self, events: Vec<RawEvent>);
}

/// Final outcome of one batch, as reported through its completion action.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome {
    Acked,
    Retry(Vec<RawEvent>),
}
