use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EventParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("event must be a JSON object")]
    NotAnObject,

    #[error("invalid @timestamp '{value}': {source}")]
    Timestamp {
        value: String,
        source: chrono::ParseError,
    },
}

/// A harvested log event as handed over by the host pipeline.
///
/// Fields are kept untyped; the encoder decides which of them are required.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent {
    pub timestamp: DateTime<Utc>,
    pub fields: Map<String, Value>,
}

impl RawEvent {
    pub fn new(timestamp: DateTime<Utc>, fields: Map<String, Value>) -> Self {
        Self { timestamp, fields }
    }

    /// Parse one NDJSON line in harvester output shape.
    ///
    /// `@timestamp` becomes the event timestamp (now when absent), every
    /// other key stays in the field map.
    pub fn from_json_line(line: &str) -> Result<Self, EventParseError> {
        let value: Value = serde_json::from_str(line)?;
        let mut fields = match value {
            Value::Object(map) => map,
            _ => return Err(EventParseError::NotAnObject),
        };

        let timestamp = match fields.remove("@timestamp") {
            Some(Value::String(raw)) => DateTime::parse_from_rfc3339(&raw)
                .map_err(|source| EventParseError::Timestamp {
                    value: raw.clone(),
                    source,
                })?
                .with_timezone(&Utc),
            Some(other) => {
                // Keep the field around so nothing is silently lost
                fields.insert("@timestamp".to_string(), other);
                Utc::now()
            }
            None => Utc::now(),
        };

        Ok(Self { timestamp, fields })
    }

    /// Look up a dot-separated path (`log.file.path`) in the nested field map.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        lookup_path(&self.fields, path)
    }
}

pub(crate) fn lookup_path<'a>(map: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = map.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}
