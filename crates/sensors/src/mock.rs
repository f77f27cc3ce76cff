//! A scripted line source that does not touch any hardware.
//!
//! Plays back a fixed list of lines, optionally paced at a fixed interval to
//! imitate a live device, then either ends the stream or fails with a
//! configured transport error.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;

use emg_types::TransportError;

use crate::source::LineSource;

/// A stubbed-out transport that replays scripted lines.
pub struct MockLineSource {
    lines: VecDeque<String>,
    pacing: Option<Duration>,
    terminal_error: Option<TransportError>,
}

impl MockLineSource {
    pub fn new(lines: Vec<String>) -> Self {
        Self {
            lines: lines.into(),
            pacing: None,
            terminal_error: None,
        }
    }

    /// Sleep this long before yielding each line, imitating device cadence.
    pub fn paced(mut self, interval: Duration) -> Self {
        self.pacing = Some(interval);
        self
    }

    /// Fail with `error` once the scripted lines run out, instead of ending
    /// the stream cleanly.
    pub fn failing_with(mut self, error: TransportError) -> Self {
        self.terminal_error = Some(error);
        self
    }

    /// Formats samples into wire lines, convenient for tests.
    pub fn from_samples(samples: &[(f64, Vec<f64>)]) -> Self {
        let lines = samples
            .iter()
            .map(|(timestamp, channels)| {
                let mut line = timestamp.to_string();
                for value in channels {
                    line.push(',');
                    line.push_str(&value.to_string());
                }
                line
            })
            .collect();
        Self::new(lines)
    }
}

#[async_trait]
impl LineSource for MockLineSource {
    async fn next_line(&mut self) -> Result<Option<String>, TransportError> {
        if let Some(interval) = self.pacing {
            tokio::time::sleep(interval).await;
        }
        match self.lines.pop_front() {
            Some(line) => Ok(Some(line)),
            None => match self.terminal_error.take() {
                Some(err) => Err(err),
                None => Ok(None),
            },
        }
    }

    async fn close(&mut self) {
        debug!("mock line source closed");
    }
}
