pub mod record;
pub mod schema;

use crate::event::RawEvent;
use thiserror::Error;

pub use record::WireRecord;
pub use schema::{FieldError, HostFields, LogFields};

/// Encoding never touches the network, so none of these are worth retrying.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("field extraction failed: {0}")]
    Field(#[from] FieldError),

    #[error("JSON serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EncodeError>;

/// Turns raw events into wire records.
#[derive(Debug, Clone)]
pub struct Encoder {
    max_len: usize,
}

impl Encoder {
    pub fn new(max_len: usize) -> Self {
        Self { max_len }
    }

    pub fn to_record(&self, event: &RawEvent) -> Result<WireRecord> {
        let log = schema::decode_log_fields(event, self.max_len)?;
        let host = schema::decode_host_fields(event);

        Ok(WireRecord {
            timestamp: event.timestamp,
            message: log.message.to_string(),
            file_name: log.file_path.to_string(),
            file_offset: log.offset,
            hostname: host.hostname,
            ip_list: host.ip_list,
            mac_list: host.mac_list,
            arch: host.arch,
        })
    }

    /// Encode an event into the JSON text sent as one frame.
    pub fn encode(&self, event: &RawEvent) -> Result<String> {
        let record = self.to_record(event)?;
        Ok(serde_json::to_string(&record)?)
    }
}
