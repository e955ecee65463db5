use super::transport::{Frame, FrameSink};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};

/// Write half shared by the publish path and the keepalive task.
pub(crate) type SharedSink = Arc<Mutex<Box<dyn FrameSink>>>;

/// Periodic ping task bound to one connection.
///
/// The task is cancelled when [`KeepaliveTask::stop`] is awaited or when the
/// handle is dropped, so it never outlives its connection.
pub(crate) struct KeepaliveTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl KeepaliveTask {
    pub(crate) fn spawn(sink: SharedSink, period: Duration) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            // First ping goes out one full period after connecting
            let Some(start) = Instant::now().checked_add(period) else {
                warn!(period_secs = period.as_secs(), "Keepalive period out of range, not pinging");
                return;
            };
            let mut ticker = interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let result = tokio::select! {
                    _ = token.cancelled() => break,
                    result = async { sink.lock().await.send(Frame::Ping).await } => result,
                };

                match result {
                    Ok(()) => trace!("Sent keepalive ping"),
                    Err(e) => {
                        // The publish path notices the broken connection on its next write
                        warn!(error = %e, "Keepalive ping failed, stopping keepalive");
                        break;
                    }
                }
            }
        });

        Self { cancel, handle }
    }

    /// Cancel the task and wait for it to finish.
    pub(crate) async fn stop(mut self) {
        self.cancel.cancel();
        if let Err(e) = (&mut self.handle).await {
            if e.is_panic() {
                warn!(error = %e, "Keepalive task panicked");
            }
        }
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for KeepaliveTask {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
