//! Core data structures flowing through the pipeline.

/// The symbolic output of arbitration, consumed by a downstream actuator or
/// game. Labels come from the closed set of state names configured at
/// pipeline construction (e.g. "No signal", "Extension", "Flexion").
pub type GestureLabel = String;

/// One timestamped reading across all sensor channels.
///
/// Produced by the sample source, moved through the FIFO queue, and consumed
/// exactly once by the pipeline driver. The channel count is fixed at
/// pipeline construction; the parser rejects lines with any other arity.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Device-reported timestamp, as sent on the wire
    pub timestamp: f64,
    /// Raw channel readings, in wire order
    pub channels: Vec<f64>,
}

impl Sample {
    pub fn new(timestamp: f64, channels: Vec<f64>) -> Self {
        Self { timestamp, channels }
    }

    /// Number of channels in this sample
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}

/// The winning classification bucket for one channel since the last counter
/// reset, as reported to the arbiter.
#[derive(Debug, Clone, PartialEq)]
pub struct DominantState {
    /// Channel index within the sample
    pub channel: usize,
    /// Name of the winning threshold state
    pub label: GestureLabel,
    /// Hit count accumulated in the current majority window
    pub hits: u64,
}
