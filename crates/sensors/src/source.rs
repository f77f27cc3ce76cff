//! Background acquisition task.
//!
//! [`SampleSource`] owns the task that blocks on the transport, parses each
//! line, and pushes the result into the unbounded FIFO queue consumed by the
//! pipeline driver. Parse errors drop the line and keep the loop alive;
//! transport errors are forwarded as a terminal [`SourceEvent::Fatal`] so the
//! driver can shut down instead of spinning on an empty queue.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{error, info, warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use emg_types::{SourceEvent, TransportError};

use crate::parser::parse_line;

/// A collaborator that yields decoded, newline-delimited text lines.
///
/// Device discovery and the raw byte-level serial protocol live behind this
/// seam. `Ok(None)` means a clean end of stream; an `Err` is fatal and no
/// further lines will be requested.
#[async_trait]
pub trait LineSource: Send {
    async fn next_line(&mut self) -> Result<Option<String>, TransportError>;

    /// Releases the underlying transport. Called once when the acquisition
    /// task exits, on any path.
    async fn close(&mut self) {}
}

/// Handle to the running acquisition task.
pub struct SampleSource {
    task: Option<JoinHandle<()>>,
    cancel: CancellationToken,
    parse_errors: Arc<AtomicU64>,
}

impl SampleSource {
    /// Spawns the acquisition task over `source` and returns the handle
    /// together with the receiving end of the sample queue.
    pub fn start<S>(
        mut source: S,
        channel_count: usize,
    ) -> (Self, mpsc::UnboundedReceiver<SourceEvent>)
    where
        S: LineSource + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let parse_errors = Arc::new(AtomicU64::new(0));

        let task_cancel = cancel.clone();
        let task_errors = Arc::clone(&parse_errors);
        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = task_cancel.cancelled() => {
                        info!("sample source cancelled");
                        break;
                    }
                    line = source.next_line() => match line {
                        Ok(Some(line)) => match parse_line(&line, channel_count) {
                            Ok(Some(sample)) => {
                                // Receiver gone means the driver stopped first
                                if tx.send(SourceEvent::Sample(sample)).is_err() {
                                    break;
                                }
                            }
                            Ok(None) => {}
                            Err(err) => {
                                task_errors.fetch_add(1, Ordering::Relaxed);
                                warn!("dropping malformed sensor line: {err}");
                            }
                        },
                        Ok(None) => {
                            info!("sensor stream ended");
                            break;
                        }
                        Err(err) => {
                            error!("fatal transport error, stopping acquisition: {err}");
                            let _ = tx.send(SourceEvent::Fatal(err));
                            break;
                        }
                    }
                }
            }
            source.close().await;
        });

        (
            Self {
                task: Some(task),
                cancel,
                parse_errors,
            },
            rx,
        )
    }

    /// Number of malformed lines dropped since the task started.
    pub fn parse_errors(&self) -> u64 {
        self.parse_errors.load(Ordering::Relaxed)
    }

    /// Signals the task to stop and waits briefly for it to exit. Idempotent
    /// and safe to call after the task already exited on its own.
    pub async fn stop(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if tokio::time::timeout(Duration::from_millis(500), task)
                .await
                .is_err()
            {
                warn!("acquisition task did not exit in time");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockLineSource;
    use emg_types::Sample;

    async fn drain(mut rx: mpsc::UnboundedReceiver<SourceEvent>) -> Vec<SourceEvent> {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn delivers_samples_in_order() {
        let source = MockLineSource::new(vec!["0,1,2".into(), "1,3,4".into()]);
        let (_handle, rx) = SampleSource::start(source, 2);
        let events = drain(rx).await;
        assert_eq!(events.len(), 2);
        match &events[0] {
            SourceEvent::Sample(sample) => {
                assert_eq!(*sample, Sample::new(0.0, vec![1.0, 2.0]))
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn drops_bad_lines_and_counts_them() {
        let source = MockLineSource::new(vec![
            "0,1,2".into(),
            "not,numbers,here".into(),
            "1,2".into(),
            "".into(),
            "2,5,6".into(),
        ]);
        let (handle, rx) = SampleSource::start(source, 2);
        let events = drain(rx).await;
        assert_eq!(events.len(), 2);
        assert!(events
            .iter()
            .all(|event| matches!(event, SourceEvent::Sample(_))));
        assert_eq!(handle.parse_errors(), 2);
    }

    #[tokio::test]
    async fn transport_error_is_terminal() {
        let source = MockLineSource::new(vec!["0,1,2".into()])
            .failing_with(TransportError::Disconnected("unplugged".into()));
        let (_handle, rx) = SampleSource::start(source, 2);
        let events = drain(rx).await;
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], SourceEvent::Sample(_)));
        assert!(matches!(events[1], SourceEvent::Fatal(_)));
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let source = MockLineSource::new(vec!["0,1,2".into()]);
        let (mut handle, _rx) = SampleSource::start(source, 2);
        handle.stop().await;
        handle.stop().await;
    }
}
