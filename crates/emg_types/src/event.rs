//! Events emitted by the sample source toward the pipeline driver.

use crate::data::Sample;
use crate::error::TransportError;

/// One event on the source-to-driver queue.
///
/// Samples are delivered in acquisition order. A `Fatal` event is the last
/// thing a source sends before its task exits; the driver reacts by shutting
/// the pipeline down cleanly instead of spinning on an empty queue.
#[derive(Debug, Clone)]
pub enum SourceEvent {
    /// A successfully parsed sample
    Sample(Sample),
    /// The transport failed; no further samples will arrive
    Fatal(TransportError),
}
