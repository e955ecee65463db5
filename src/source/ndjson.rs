use crate::event::RawEvent;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Counts from one pass over an input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadStats {
    pub lines: u64,
    pub events: u64,
    pub skipped: u64,
}

/// Read newline-delimited JSON events and forward them in order.
///
/// Blank lines are ignored and unparseable lines are logged and skipped.
/// Stops early, without error, if the receiving side goes away.
pub async fn read_events<R>(reader: R, output: mpsc::Sender<RawEvent>) -> Result<ReadStats, ReaderError>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut stats = ReadStats::default();

    while let Some(line) = lines.next_line().await? {
        stats.lines += 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match RawEvent::from_json_line(line) {
            Ok(event) => {
                if output.send(event).await.is_err() {
                    debug!("Event channel closed, stopping reader");
                    break;
                }
                stats.events += 1;
            }
            Err(e) => {
                warn!(line = stats.lines, error = %e, "Skipping unparseable event");
                stats.skipped += 1;
            }
        }
    }

    Ok(stats)
}
