//! Configuration types for the EMG gesture pipeline.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Comb filter tuning for all channels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombConfig {
    /// Sample delay of the comb; 0 disables the stage
    #[serde(default = "default_comb_delay")]
    pub delay: usize,
    /// Gain applied to the delayed sample
    #[serde(default = "default_comb_gain")]
    pub gain: f64,
}

fn default_comb_delay() -> usize {
    25
}
fn default_comb_gain() -> f64 {
    1.0
}

impl Default for CombConfig {
    fn default() -> Self {
        Self {
            delay: default_comb_delay(),
            gain: default_comb_gain(),
        }
    }
}

/// One named classification bucket for a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    /// Gesture label reported when this state dominates
    pub name: String,
    /// Absolute filtered value a sample must exceed to vote for this state
    pub threshold: f64,
}

/// Per-channel classifier configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Threshold states for this channel; order does not matter, the
    /// classifier sorts by descending threshold
    pub states: Vec<StateConfig>,
}

/// Full pipeline configuration, consumed once at construction. Individual
/// values can later be changed through the driver's live-tuning setters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Number of sensor channels expected on the wire
    pub channel_count: usize,
    /// Comb filter tuning, shared by all channels
    #[serde(default)]
    pub comb: CombConfig,
    /// Smoothing factor of the low-pass stage, in [0, 1]
    #[serde(default = "default_alpha")]
    pub low_pass_alpha: f64,
    /// Leak factor of the high-pass stage, in [0, 1]
    #[serde(default = "default_alpha")]
    pub high_pass_alpha: f64,
    /// Tick period of the pipeline driver in milliseconds
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Period of the hit-counter reset timer in milliseconds
    #[serde(default = "default_reset_interval_ms")]
    pub reset_interval_ms: u64,
    /// One entry per channel, in wire order
    pub channels: Vec<ChannelConfig>,
}

fn default_alpha() -> f64 {
    0.05
}
fn default_tick_interval_ms() -> u64 {
    30
}
fn default_reset_interval_ms() -> u64 {
    500
}

impl Default for PipelineConfig {
    /// Mirrors the reference deployment: two forearm sensors, each with a
    /// "No signal" floor state and one gesture state.
    fn default() -> Self {
        Self {
            channel_count: 2,
            comb: CombConfig::default(),
            low_pass_alpha: default_alpha(),
            high_pass_alpha: default_alpha(),
            tick_interval_ms: default_tick_interval_ms(),
            reset_interval_ms: default_reset_interval_ms(),
            channels: vec![
                ChannelConfig {
                    states: vec![
                        StateConfig {
                            name: "No signal".into(),
                            threshold: 0.0,
                        },
                        StateConfig {
                            name: "Extension".into(),
                            threshold: 0.01,
                        },
                    ],
                },
                ChannelConfig {
                    states: vec![
                        StateConfig {
                            name: "No signal".into(),
                            threshold: 0.0,
                        },
                        StateConfig {
                            name: "Flexion".into(),
                            threshold: 0.01,
                        },
                    ],
                },
            ],
        }
    }
}

/// Checks that an alpha value is a valid smoothing factor.
pub fn validate_alpha(alpha: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&alpha) || alpha.is_nan() {
        return Err(ConfigError::AlphaOutOfRange(alpha));
    }
    Ok(())
}

/// Checks that a threshold is usable by the classifier.
pub fn validate_threshold(threshold: f64) -> Result<(), ConfigError> {
    if threshold < 0.0 || threshold.is_nan() {
        return Err(ConfigError::NegativeThreshold(threshold));
    }
    Ok(())
}

impl PipelineConfig {
    /// Validates the whole configuration. Called by the driver before any
    /// resource is created; a failing config leaves nothing running.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channel_count == 0 {
            return Err(ConfigError::NoChannels);
        }
        if self.channels.len() != self.channel_count {
            return Err(ConfigError::ChannelCountMismatch {
                expected: self.channel_count,
                actual: self.channels.len(),
            });
        }
        validate_alpha(self.low_pass_alpha)?;
        validate_alpha(self.high_pass_alpha)?;
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval("tick_interval_ms"));
        }
        if self.reset_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval("reset_interval_ms"));
        }
        for (channel, cfg) in self.channels.iter().enumerate() {
            if cfg.states.is_empty() {
                return Err(ConfigError::NoStates { channel });
            }
            for state in &cfg.states {
                validate_threshold(state.threshold)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_channels() {
        let mut config = PipelineConfig::default();
        config.channel_count = 0;
        config.channels.clear();
        assert_eq!(config.validate(), Err(ConfigError::NoChannels));
    }

    #[test]
    fn rejects_alpha_out_of_range() {
        let mut config = PipelineConfig::default();
        config.low_pass_alpha = 1.5;
        assert_eq!(config.validate(), Err(ConfigError::AlphaOutOfRange(1.5)));
    }

    #[test]
    fn rejects_channel_arity_mismatch() {
        let mut config = PipelineConfig::default();
        config.channels.pop();
        assert_eq!(
            config.validate(),
            Err(ConfigError::ChannelCountMismatch {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn rejects_negative_threshold() {
        let mut config = PipelineConfig::default();
        config.channels[0].states[0].threshold = -1.0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::NegativeThreshold(-1.0))
        );
    }
}
