#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use logsocket::connection::{Dialer, Frame, FrameSink, TransportError};
use logsocket::event::RawEvent;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Frames written through every connection a [`MockDialer`] handed out.
pub type FrameLog = Arc<Mutex<Vec<Frame>>>;

/// In-memory dialer.
///
/// Each successful dial consumes one entry of `write_failures`: `Some(k)`
/// makes that connection fail its k-th text write (0-based) and every write
/// after it. Dials beyond the planned entries never fail.
#[derive(Clone, Default)]
pub struct MockDialer {
    pub frames: FrameLog,
    pub dials: Arc<AtomicUsize>,
    pub closes: Arc<AtomicUsize>,
    failing_dials: Arc<AtomicUsize>,
    write_failures: Arc<Mutex<VecDeque<Option<usize>>>>,
    text_delay: Duration,
}

impl MockDialer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next `count` dials fail.
    pub fn fail_dials(self, count: usize) -> Self {
        self.failing_dials.store(count, Ordering::SeqCst);
        self
    }

    /// Plan the write failure for the next successful connection.
    pub fn then_fail_text_at(self, index: Option<usize>) -> Self {
        self.write_failures.lock().unwrap().push_back(index);
        self
    }

    /// Every text write on connections dialed afterwards takes `delay`.
    pub fn with_text_delay(mut self, delay: Duration) -> Self {
        self.text_delay = delay;
        self
    }

    pub fn texts(&self) -> Vec<String> {
        self.frames
            .lock()
            .unwrap()
            .iter()
            .filter_map(|frame| match frame {
                Frame::Text(text) => Some(text.clone()),
                Frame::Ping => None,
            })
            .collect()
    }

    pub fn pings(&self) -> usize {
        self.frames
            .lock()
            .unwrap()
            .iter()
            .filter(|frame| **frame == Frame::Ping)
            .count()
    }

    pub fn messages(&self) -> Vec<String> {
        self.texts()
            .iter()
            .map(|text| {
                let value: Value = serde_json::from_str(text).unwrap();
                value["message"].as_str().unwrap().to_string()
            })
            .collect()
    }
}

#[async_trait]
impl Dialer for MockDialer {
    async fn dial(&self, _url: &str) -> Result<Box<dyn FrameSink>, TransportError> {
        let pending_failures = self.failing_dials.load(Ordering::SeqCst);
        if pending_failures > 0 {
            self.failing_dials.store(pending_failures - 1, Ordering::SeqCst);
            return Err(TransportError::Other("connection refused".to_string()));
        }

        self.dials.fetch_add(1, Ordering::SeqCst);
        let fail_at = self.write_failures.lock().unwrap().pop_front().flatten();
        Ok(Box::new(MockSink {
            frames: self.frames.clone(),
            closes: self.closes.clone(),
            text_attempts: 0,
            fail_at,
            text_delay: self.text_delay,
        }))
    }
}

struct MockSink {
    frames: FrameLog,
    closes: Arc<AtomicUsize>,
    text_attempts: usize,
    fail_at: Option<usize>,
    text_delay: Duration,
}

#[async_trait]
impl FrameSink for MockSink {
    async fn send(&mut self, frame: Frame) -> Result<(), TransportError> {
        if let Frame::Text(_) = frame {
            let attempt = self.text_attempts;
            self.text_attempts += 1;
            if self.fail_at.is_some_and(|k| attempt >= k) {
                return Err(TransportError::Closed);
            }
            if !self.text_delay.is_zero() {
                tokio::time::sleep(self.text_delay).await;
            }
        }
        self.frames.lock().unwrap().push(frame);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn event_with(fields: Value) -> RawEvent {
    let ts = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    RawEvent::new(ts, fields.as_object().unwrap().clone())
}

/// A well-formed event carrying `message` at the given file offset.
pub fn log_event(message: &str, offset: i64) -> RawEvent {
    event_with(json!({
        "message": message,
        "log": { "offset": offset, "file": { "path": "/var/log/app.log" } },
        "host": {
            "ip": ["10.0.0.7"],
            "mac": ["02-42-ac-11-00-02"],
            "architecture": "x86_64"
        }
    }))
}
