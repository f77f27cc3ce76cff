//! Single-slot "latest wins" control mailbox.
//!
//! The pipeline driver publishes the current winning gesture into the slot;
//! the downstream consumer polls it. At most one value is ever resident and
//! every publish overwrites unconditionally. This is deliberately not a
//! queue. Read policy: `try_take` clears the slot, so a label is observed at
//! most once and a second read returns `None` until the next publish.

use std::sync::{Arc, Mutex};

use emg_types::GestureLabel;

/// Shared handle to the mailbox. Clones refer to the same slot.
#[derive(Debug, Clone, Default)]
pub struct ControlMailbox {
    slot: Arc<Mutex<Option<GestureLabel>>>,
}

impl ControlMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a label, replacing any unread value.
    pub fn publish(&self, label: GestureLabel) {
        let mut slot = self.slot.lock().unwrap();
        *slot = Some(label);
    }

    /// Takes the most recent label, if one has been published since the last
    /// take. Non-blocking.
    pub fn try_take(&self) -> Option<GestureLabel> {
        self.slot.lock().unwrap().take()
    }
}
