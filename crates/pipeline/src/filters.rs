//! Per-channel filter cascade: comb → low-pass → high-pass.
//!
//! All three stages are stateful and applied in that fixed order to every
//! sample of a channel. Comb delay/gain and the two alphas are live-tunable;
//! the driver serializes every setter behind the same lock that guards
//! classification, so a parameter change never races a sample.

use std::collections::VecDeque;

use emg_types::{validate_alpha, ConfigError, PipelineConfig};

/// Feed-forward comb filter with a FIFO delay line.
///
/// Warm-up passes the raw input through until `delay` samples have been
/// buffered; from then on `out[i] = in[i] - gain * in[i - delay]`. A delay of
/// zero disables the stage.
#[derive(Debug, Clone)]
pub struct CombFilter {
    delay: usize,
    gain: f64,
    history: VecDeque<f64>,
}

impl CombFilter {
    pub fn new(delay: usize, gain: f64) -> Self {
        Self {
            delay,
            gain,
            history: VecDeque::with_capacity(delay),
        }
    }

    pub fn apply(&mut self, input: f64) -> f64 {
        if self.delay == 0 {
            return input;
        }
        if self.history.len() < self.delay {
            self.history.push_back(input);
            return input;
        }
        let output = match self.history.pop_front() {
            Some(oldest) => input - self.gain * oldest,
            None => input,
        };
        self.history.push_back(input);
        output
    }

    /// Changes the delay and clears the delay line. Old samples were buffered
    /// for a different lag and cannot be reused, so warm-up restarts; the
    /// output shows a brief pass-through discontinuity after each change.
    pub fn set_delay(&mut self, delay: usize) {
        self.delay = delay;
        self.history.clear();
    }

    pub fn set_gain(&mut self, gain: f64) {
        self.gain = gain;
    }
}

/// Exponential moving average: `state = alpha*input + (1-alpha)*state`.
///
/// `alpha = 0` freezes the output at its initial value 0; `alpha = 1` is
/// pass-through.
#[derive(Debug, Clone)]
pub struct LowPassFilter {
    alpha: f64,
    state: f64,
}

impl LowPassFilter {
    pub fn new(alpha: f64) -> Result<Self, ConfigError> {
        validate_alpha(alpha)?;
        Ok(Self { alpha, state: 0.0 })
    }

    pub fn apply(&mut self, input: f64) -> f64 {
        self.state = self.alpha * input + (1.0 - self.alpha) * self.state;
        self.state
    }

    pub fn set_alpha(&mut self, alpha: f64) -> Result<(), ConfigError> {
        validate_alpha(alpha)?;
        self.alpha = alpha;
        Ok(())
    }
}

/// Leaky first difference: `out = alpha*prev_out + alpha*(input - prev_raw)`.
///
/// Not a true high-pass; it attenuates DC and slow drift proportionally to
/// `alpha`. The previous raw input is lazily seeded on the first call, so the
/// first output is exactly zero.
#[derive(Debug, Clone)]
pub struct HighPassFilter {
    alpha: f64,
    prev_raw: Option<f64>,
    prev_out: f64,
}

impl HighPassFilter {
    pub fn new(alpha: f64) -> Result<Self, ConfigError> {
        validate_alpha(alpha)?;
        Ok(Self {
            alpha,
            prev_raw: None,
            prev_out: 0.0,
        })
    }

    pub fn apply(&mut self, input: f64) -> f64 {
        let prev_raw = *self.prev_raw.get_or_insert(input);
        let output = self.alpha * self.prev_out + self.alpha * (input - prev_raw);
        self.prev_raw = Some(input);
        self.prev_out = output;
        output
    }

    pub fn set_alpha(&mut self, alpha: f64) -> Result<(), ConfigError> {
        validate_alpha(alpha)?;
        self.alpha = alpha;
        Ok(())
    }
}

/// The three stages chained for one channel.
#[derive(Debug, Clone)]
pub struct FilterCascade {
    comb: CombFilter,
    low_pass: LowPassFilter,
    high_pass: HighPassFilter,
}

impl FilterCascade {
    pub fn new(
        delay: usize,
        gain: f64,
        low_pass_alpha: f64,
        high_pass_alpha: f64,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            comb: CombFilter::new(delay, gain),
            low_pass: LowPassFilter::new(low_pass_alpha)?,
            high_pass: HighPassFilter::new(high_pass_alpha)?,
        })
    }

    pub fn apply(&mut self, input: f64) -> f64 {
        let combed = self.comb.apply(input);
        let smoothed = self.low_pass.apply(combed);
        self.high_pass.apply(smoothed)
    }
}

/// One cascade per channel, tuned together.
///
/// The reference hardware exposes a single knob per parameter for the whole
/// array, so the setters apply across all channels.
#[derive(Debug, Clone)]
pub struct FilterBank {
    cascades: Vec<FilterCascade>,
}

impl FilterBank {
    pub fn from_config(config: &PipelineConfig) -> Result<Self, ConfigError> {
        let cascades = (0..config.channel_count)
            .map(|_| {
                FilterCascade::new(
                    config.comb.delay,
                    config.comb.gain,
                    config.low_pass_alpha,
                    config.high_pass_alpha,
                )
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { cascades })
    }

    pub fn apply(&mut self, channel: usize, input: f64) -> f64 {
        self.cascades[channel].apply(input)
    }

    pub fn channel_count(&self) -> usize {
        self.cascades.len()
    }

    /// Restarts comb warm-up on every channel.
    pub fn set_comb_delay(&mut self, delay: usize) {
        for cascade in &mut self.cascades {
            cascade.comb.set_delay(delay);
        }
    }

    pub fn set_comb_gain(&mut self, gain: f64) {
        for cascade in &mut self.cascades {
            cascade.comb.set_gain(gain);
        }
    }

    pub fn set_low_pass_alpha(&mut self, alpha: f64) -> Result<(), ConfigError> {
        validate_alpha(alpha)?;
        for cascade in &mut self.cascades {
            cascade.low_pass.set_alpha(alpha)?;
        }
        Ok(())
    }

    pub fn set_high_pass_alpha(&mut self, alpha: f64) -> Result<(), ConfigError> {
        validate_alpha(alpha)?;
        for cascade in &mut self.cascades {
            cascade.high_pass.set_alpha(alpha)?;
        }
        Ok(())
    }
}
