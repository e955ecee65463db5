pub mod batch;
pub mod raw;

pub use batch::{Batch, BatchOutcome};
pub use raw::{EventParseError, RawEvent};
