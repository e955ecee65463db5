//! Typed extraction of the fields the wire record is built from.
//!
//! Required fields fail with a [`FieldError`] naming the offending path.
//! Host fields are optional and degrade to empty values instead.

use crate::event::raw::lookup_path;
use crate::event::RawEvent;
use serde_json::{Map, Value};
use thiserror::Error;

pub const MESSAGE: &str = "message";
pub const LOG: &str = "log";
pub const LOG_OFFSET: &str = "log.offset";
pub const LOG_FILE_PATH: &str = "log.file.path";
pub const HOST: &str = "host";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("missing field '{field}'")]
    Missing { field: &'static str },

    #[error("field '{field}' is not {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("message length {len} reaches max_len {max_len}")]
    MessageTooLong { len: usize, max_len: usize },
}

/// Fields every transmitted event must carry.
#[derive(Debug, Clone, PartialEq)]
pub struct LogFields<'a> {
    pub message: &'a str,
    pub offset: i64,
    pub file_path: &'a str,
}

/// Best-effort host metadata; anything absent or mistyped is left empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostFields {
    pub hostname: String,
    pub ip_list: Vec<String>,
    pub mac_list: Vec<String>,
    pub arch: String,
}

pub fn decode_log_fields(event: &RawEvent, max_len: usize) -> Result<LogFields<'_>, FieldError> {
    let log = required(event.lookup(LOG), LOG)?
        .as_object()
        .ok_or(FieldError::WrongType {
            field: LOG,
            expected: "an object",
        })?;

    let message = required_str(event.lookup(MESSAGE), MESSAGE)?;
    if message.len() >= max_len {
        return Err(FieldError::MessageTooLong {
            len: message.len(),
            max_len,
        });
    }

    let offset = required(lookup_path(log, "offset"), LOG_OFFSET)?
        .as_i64()
        .ok_or(FieldError::WrongType {
            field: LOG_OFFSET,
            expected: "a 64-bit integer",
        })?;

    let file_path = required_str(lookup_path(log, "file.path"), LOG_FILE_PATH)?;

    Ok(LogFields {
        message,
        offset,
        file_path,
    })
}

pub fn decode_host_fields(event: &RawEvent) -> HostFields {
    let host = match event.lookup(HOST) {
        Some(Value::Object(host)) => host,
        Some(_) => {
            tracing::trace!("host field is not an object, sending without host metadata");
            return HostFields::default();
        }
        None => return HostFields::default(),
    };

    HostFields {
        hostname: optional_str(host, "hostname")
            .or_else(|| optional_str(host, "name"))
            .unwrap_or_default(),
        ip_list: optional_str_list(host, "ip"),
        mac_list: optional_str_list(host, "mac"),
        arch: optional_str(host, "architecture").unwrap_or_default(),
    }
}

fn required<'a>(value: Option<&'a Value>, field: &'static str) -> Result<&'a Value, FieldError> {
    value.ok_or(FieldError::Missing { field })
}

fn required_str<'a>(value: Option<&'a Value>, field: &'static str) -> Result<&'a str, FieldError> {
    required(value, field)?
        .as_str()
        .ok_or(FieldError::WrongType {
            field,
            expected: "a string",
        })
}

fn optional_str(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_string)
}

/// A list only counts when every element is a string.
fn optional_str_list(map: &Map<String, Value>, key: &str) -> Vec<String> {
    let Some(Value::Array(items)) = map.get(key) else {
        return Vec::new();
    };
    items
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect::<Option<Vec<_>>>()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn event(fields: Value) -> RawEvent {
        match fields {
            Value::Object(map) => RawEvent::new(Utc::now(), map),
            _ => panic!("test fields must be an object"),
        }
    }

    fn valid_fields() -> Value {
        json!({
            "message": "GET /index.html 200",
            "log": { "offset": 1024, "file": { "path": "/var/log/nginx/access.log" } }
        })
    }

    #[test]
    fn test_decode_valid_log_fields() {
        let ev = event(valid_fields());
        let fields = decode_log_fields(&ev, 100).unwrap();
        assert_eq!(fields.message, "GET /index.html 200");
        assert_eq!(fields.offset, 1024);
        assert_eq!(fields.file_path, "/var/log/nginx/access.log");
    }

    #[test]
    fn test_message_length_equal_to_max_is_rejected() {
        let mut fields = valid_fields();
        fields["message"] = json!("abcde");
        let ev = event(fields);

        assert_eq!(
            decode_log_fields(&ev, 5),
            Err(FieldError::MessageTooLong { len: 5, max_len: 5 })
        );
        assert!(decode_log_fields(&ev, 6).is_ok());
    }

    #[test]
    fn test_missing_and_mistyped_message() {
        let mut fields = valid_fields();
        fields.as_object_mut().unwrap().remove("message");
        assert_eq!(
            decode_log_fields(&event(fields), 100),
            Err(FieldError::Missing { field: MESSAGE })
        );

        let mut fields = valid_fields();
        fields["message"] = json!(42);
        assert!(matches!(
            decode_log_fields(&event(fields), 100),
            Err(FieldError::WrongType { field: MESSAGE, .. })
        ));
    }

    #[test]
    fn test_offset_must_be_i64() {
        let mut fields = valid_fields();
        fields["log"]["offset"] = json!(1.5);
        assert!(matches!(
            decode_log_fields(&event(fields), 100),
            Err(FieldError::WrongType { field: LOG_OFFSET, .. })
        ));

        let mut fields = valid_fields();
        fields["log"]["offset"] = json!(u64::MAX);
        assert!(matches!(
            decode_log_fields(&event(fields), 100),
            Err(FieldError::WrongType { field: LOG_OFFSET, .. })
        ));

        let mut fields = valid_fields();
        fields["log"].as_object_mut().unwrap().remove("offset");
        assert_eq!(
            decode_log_fields(&event(fields), 100),
            Err(FieldError::Missing { field: LOG_OFFSET })
        );
    }

    #[test]
    fn test_file_path_required() {
        let mut fields = valid_fields();
        fields["log"]["file"] = json!("not-a-map");
        assert_eq!(
            decode_log_fields(&event(fields), 100),
            Err(FieldError::Missing { field: LOG_FILE_PATH })
        );

        let mut fields = valid_fields();
        fields["log"]["file"]["path"] = json!(["a"]);
        assert!(matches!(
            decode_log_fields(&event(fields), 100),
            Err(FieldError::WrongType { field: LOG_FILE_PATH, .. })
        ));
    }

    #[test]
    fn test_log_must_be_object() {
        let mut fields = valid_fields();
        fields["log"] = json!("flat");
        assert!(matches!(
            decode_log_fields(&event(fields), 100),
            Err(FieldError::WrongType { field: LOG, .. })
        ));
    }

    #[test]
    fn test_host_fields_extracted() {
        let mut fields = valid_fields();
        fields["host"] = json!({
            "hostname": "web-01",
            "ip": ["10.0.0.1", "fe80::1"],
            "mac": ["00-11-22-33-44-55"],
            "architecture": "x86_64"
        });
        let host = decode_host_fields(&event(fields));
        assert_eq!(host.hostname, "web-01");
        assert_eq!(host.ip_list, vec!["10.0.0.1", "fe80::1"]);
        assert_eq!(host.mac_list, vec!["00-11-22-33-44-55"]);
        assert_eq!(host.arch, "x86_64");
    }

    #[test]
    fn test_host_fields_degrade_per_field() {
        let mut fields = valid_fields();
        fields["host"] = json!({
            "name": "db-02",
            "ip": ["10.0.0.1", 7],
            "architecture": "aarch64"
        });
        let host = decode_host_fields(&event(fields));
        assert_eq!(host.hostname, "db-02");
        assert!(host.ip_list.is_empty());
        assert!(host.mac_list.is_empty());
        assert_eq!(host.arch, "aarch64");
    }

    #[test]
    fn test_malformed_or_missing_host_is_empty() {
        let mut fields = valid_fields();
        fields["host"] = json!("web-01");
        assert_eq!(decode_host_fields(&event(fields)), HostFields::default());
        assert_eq!(decode_host_fields(&event(valid_fields())), HostFields::default());
    }
}
