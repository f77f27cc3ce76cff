//! Per-channel threshold classifier with a sliding majority window.
//!
//! Each channel owns an ordered set of named threshold states. Every filtered
//! sample votes for at most one state: the highest threshold it exceeds in
//! magnitude. A state becomes dominant by strictly beating the incumbent's
//! hit count, and a periodic timer zeroes all counters without touching the
//! dominant, turning the counts into a majority vote over a fixed wall-clock
//! window rather than a fixed sample count.

use emg_types::{validate_threshold, ConfigError, DominantState, StateConfig};

/// One named classification bucket.
#[derive(Debug, Clone)]
pub struct ThresholdState {
    name: String,
    threshold: f64,
    hits: u64,
}

/// Classifier for a single channel.
#[derive(Debug, Clone)]
pub struct StateManager {
    channel: usize,
    states: Vec<ThresholdState>,
    /// Indices into `states`, sorted by descending threshold. Recomputed when
    /// a threshold changes so `update` never sorts on the hot path.
    order: Vec<usize>,
    dominant: Option<usize>,
}

impl StateManager {
    pub fn new(channel: usize, configs: &[StateConfig]) -> Result<Self, ConfigError> {
        if configs.is_empty() {
            return Err(ConfigError::NoStates { channel });
        }
        let states = configs
            .iter()
            .map(|cfg| {
                validate_threshold(cfg.threshold)?;
                Ok(ThresholdState {
                    name: cfg.name.clone(),
                    threshold: cfg.threshold,
                    hits: 0,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        let mut manager = Self {
            channel,
            states,
            order: Vec::new(),
            dominant: None,
        };
        manager.reorder();
        Ok(manager)
    }

    fn reorder(&mut self) {
        let mut order: Vec<usize> = (0..self.states.len()).collect();
        order.sort_by(|&a, &b| {
            self.states[b]
                .threshold
                .total_cmp(&self.states[a].threshold)
        });
        self.order = order;
    }

    /// Feeds one filtered sample into the vote.
    ///
    /// Exactly zero or one counter increments: the states are mutually
    /// exclusive per sample. The incumbent dominant wins ties, so a
    /// challenger has to strictly out-count it.
    pub fn update(&mut self, value: f64) {
        let magnitude = value.abs();
        let hit = self
            .order
            .iter()
            .copied()
            .find(|&idx| magnitude > self.states[idx].threshold);
        if let Some(idx) = hit {
            self.states[idx].hits += 1;
            let challenger = self.states[idx].hits;
            let incumbent = self.dominant.map(|d| self.states[d].hits);
            match incumbent {
                Some(hits) if challenger <= hits => {}
                _ => self.dominant = Some(idx),
            }
        }
    }

    /// Zeroes every hit counter. The dominant state is deliberately left in
    /// place and may report a stale label until new votes accumulate.
    pub fn reset_counters(&mut self) {
        for state in &mut self.states {
            state.hits = 0;
        }
    }

    /// Live-tunes one state's threshold.
    pub fn update_threshold(&mut self, name: &str, threshold: f64) -> Result<(), ConfigError> {
        validate_threshold(threshold)?;
        let state = self
            .states
            .iter_mut()
            .find(|state| state.name == name)
            .ok_or_else(|| ConfigError::UnknownState(name.to_string()))?;
        state.threshold = threshold;
        self.reorder();
        Ok(())
    }

    /// The current dominant, or `None` if no state has ever been hit.
    pub fn dominant(&self) -> Option<DominantState> {
        self.dominant.map(|idx| DominantState {
            channel: self.channel,
            label: self.states[idx].name.clone(),
            hits: self.states[idx].hits,
        })
    }

    /// Hit count of a named state, mainly for tests and diagnostics.
    pub fn hits(&self, name: &str) -> Option<u64> {
        self.states
            .iter()
            .find(|state| state.name == name)
            .map(|state| state.hits)
    }

    pub fn channel(&self) -> usize {
        self.channel
    }
}
