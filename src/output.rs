//! Builds the set of publishers described by a [`ClientConfig`].

use crate::config::{ClientConfig, RetryBudget};
use crate::connection::{ConnectionManager, Dialer, WebSocketDialer};
use crate::encode::Encoder;
use crate::observer::Observer;
use crate::publisher::Publisher;
use std::sync::Arc;

/// Publishers plus the batch-level policy the host pipeline enforces around them.
#[derive(Debug)]
pub struct OutputGroup {
    pub publishers: Vec<Publisher>,
    pub batch_size: usize,
    pub retry_budget: RetryBudget,
}

/// One publisher per configured worker, each with its own connection.
pub fn build(config: &ClientConfig, dialer: Arc<dyn Dialer>, observer: Arc<dyn Observer>) -> OutputGroup {
    let url = config.target_url();
    let publishers = (0..config.workers)
        .map(|id| {
            let connection = ConnectionManager::new(url.clone(), config.ping_interval(), dialer.clone());
            Publisher::new(id, connection, Encoder::new(config.max_len), observer.clone())
        })
        .collect();

    OutputGroup {
        publishers,
        batch_size: config.batch_size,
        retry_budget: config.retry_budget(),
    }
}

/// [`build`] with the websocket transport.
pub fn websocket(config: &ClientConfig, observer: Arc<dyn Observer>) -> OutputGroup {
    build(config, Arc::new(WebSocketDialer::new()), observer)
}
