use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One event as it goes over the wire, serialized as a single JSON text frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireRecord {
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub file_name: String,
    pub file_offset: i64,
    pub hostname: String,
    pub ip_list: Vec<String>,
    pub mac_list: Vec<String>,
    pub arch: String,
}
