pub mod ndjson;

pub use ndjson::{read_events, ReadStats, ReaderError};
