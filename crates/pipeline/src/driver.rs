//! Tick-driven pipeline driver.
//!
//! Owns three tasks: the acquisition task (via [`SampleSource`]), a tick loop
//! that drains the sample queue and runs filter → classify → arbitrate, and
//! an independent reset loop that periodically zeroes the hit counters. The
//! tick loop, the reset loop, and every live-tuning setter all take the same
//! mutex over the shared core, so a counter increment can never race a reset
//! and a parameter change can never race a sample.

use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use emg_sensor::{LineSource, SampleSource};
use emg_types::{
    validate_alpha, ConfigError, DominantState, PipelineConfig, Sample, SourceEvent,
};

use crate::arbiter::arbitrate;
use crate::classifier::StateManager;
use crate::error::PipelineError;
use crate::filters::FilterBank;
use crate::mailbox::ControlMailbox;

/// Lifecycle of the driver. `Stopped` is terminal: a pipeline is built,
/// started once, and torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Running,
    Stopped,
}

/// Everything the tick loop, the reset loop, and the tuning setters share.
struct PipelineCore {
    filters: FilterBank,
    classifiers: Vec<StateManager>,
    mailbox: ControlMailbox,
    samples_processed: u64,
}

impl PipelineCore {
    fn from_config(config: &PipelineConfig, mailbox: ControlMailbox) -> Result<Self, ConfigError> {
        let filters = FilterBank::from_config(config)?;
        let classifiers = config
            .channels
            .iter()
            .enumerate()
            .map(|(channel, cfg)| StateManager::new(channel, &cfg.states))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            filters,
            classifiers,
            mailbox,
            samples_processed: 0,
        })
    }

    /// Filter and classify every channel of one sample, then arbitrate once
    /// over the freshest dominants and publish any winner.
    fn process_sample(&mut self, sample: &Sample) {
        for (channel, &value) in sample.channels.iter().enumerate() {
            let filtered = self.filters.apply(channel, value);
            self.classifiers[channel].update(filtered);
        }
        let dominants: Vec<DominantState> = self
            .classifiers
            .iter()
            .filter_map(|manager| manager.dominant())
            .collect();
        if let Some(label) = arbitrate(&dominants) {
            self.mailbox.publish(label);
        }
        self.samples_processed += 1;
    }

    fn reset_counters(&mut self) {
        for manager in &mut self.classifiers {
            manager.reset_counters();
        }
    }
}

/// The acquisition-to-classification pipeline.
///
/// Construct with a validated [`PipelineConfig`], hand `start` a
/// [`LineSource`], and poll the mailbox from the consumer side. `stop` is
/// idempotent and also safe after the source already died on its own.
pub struct GesturePipeline {
    config: PipelineConfig,
    core: Arc<Mutex<PipelineCore>>,
    mailbox: ControlMailbox,
    state: Arc<StdMutex<PipelineState>>,
    cancel: CancellationToken,
    source: Option<SampleSource>,
    tick_task: Option<JoinHandle<()>>,
    reset_task: Option<JoinHandle<()>>,
}

impl GesturePipeline {
    pub fn new(config: PipelineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mailbox = ControlMailbox::new();
        let core = PipelineCore::from_config(&config, mailbox.clone())?;
        Ok(Self {
            config,
            core: Arc::new(Mutex::new(core)),
            mailbox,
            state: Arc::new(StdMutex::new(PipelineState::Idle)),
            cancel: CancellationToken::new(),
            source: None,
            tick_task: None,
            reset_task: None,
        })
    }

    /// Handle for the downstream consumer. Clones share the slot.
    pub fn mailbox(&self) -> ControlMailbox {
        self.mailbox.clone()
    }

    pub fn state(&self) -> PipelineState {
        *self.state.lock().unwrap()
    }

    /// Number of samples retired by the tick loop so far.
    pub async fn samples_processed(&self) -> u64 {
        self.core.lock().await.samples_processed
    }

    /// Number of malformed lines the source has dropped so far.
    pub fn parse_errors(&self) -> u64 {
        self.source
            .as_ref()
            .map(SampleSource::parse_errors)
            .unwrap_or(0)
    }

    /// Spawns the acquisition task, the tick loop, and the reset loop.
    pub fn start<S>(&mut self, source: S) -> Result<(), PipelineError>
    where
        S: LineSource + 'static,
    {
        {
            let mut state = self.state.lock().unwrap();
            match *state {
                PipelineState::Running => return Err(PipelineError::AlreadyRunning),
                PipelineState::Stopped => return Err(PipelineError::Stopped),
                PipelineState::Idle => *state = PipelineState::Running,
            }
        }

        let (source_handle, rx) = SampleSource::start(source, self.config.channel_count);
        self.source = Some(source_handle);

        self.tick_task = Some(self.spawn_tick_loop(rx));
        self.reset_task = Some(self.spawn_reset_loop());
        info!(
            channels = self.config.channel_count,
            tick_ms = self.config.tick_interval_ms,
            reset_ms = self.config.reset_interval_ms,
            "pipeline running"
        );
        Ok(())
    }

    fn spawn_tick_loop(&self, mut rx: UnboundedReceiver<SourceEvent>) -> JoinHandle<()> {
        let core = Arc::clone(&self.core);
        let state = Arc::clone(&self.state);
        let cancel = self.cancel.clone();
        let tick = Duration::from_millis(self.config.tick_interval_ms);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            'run: loop {
                tokio::select! {
                    _ = cancel.cancelled() => break 'run,
                    _ = interval.tick() => {
                        // Drain everything buffered since the last tick; all
                        // of it is retired before the next tick fires.
                        let mut core = core.lock().await;
                        loop {
                            match rx.try_recv() {
                                Ok(SourceEvent::Sample(sample)) => {
                                    core.process_sample(&sample);
                                }
                                Ok(SourceEvent::Fatal(err)) => {
                                    error!("stopping pipeline on transport error: {err}");
                                    *state.lock().unwrap() = PipelineState::Stopped;
                                    cancel.cancel();
                                    break 'run;
                                }
                                Err(TryRecvError::Empty) => break,
                                Err(TryRecvError::Disconnected) => {
                                    info!("sample queue closed, stopping pipeline");
                                    *state.lock().unwrap() = PipelineState::Stopped;
                                    cancel.cancel();
                                    break 'run;
                                }
                            }
                        }
                    }
                }
            }
            debug!("tick loop exited");
        })
    }

    fn spawn_reset_loop(&self) -> JoinHandle<()> {
        let core = Arc::clone(&self.core);
        let cancel = self.cancel.clone();
        let period = Duration::from_millis(self.config.reset_interval_ms);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // Skip the interval's immediate first fire; counters start at zero
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = interval.tick() => {
                        core.lock().await.reset_counters();
                    }
                }
            }
            debug!("reset loop exited");
        })
    }

    /// Stops the source, the tick loop, and the reset loop. Idempotent, and
    /// safe to call after the source already exited on an I/O error.
    pub async fn stop(&mut self) {
        self.cancel.cancel();
        let dropped_lines = self.parse_errors();
        if let Some(mut source) = self.source.take() {
            source.stop().await;
        }
        for task in [self.tick_task.take(), self.reset_task.take()]
            .into_iter()
            .flatten()
        {
            if tokio::time::timeout(Duration::from_millis(500), task)
                .await
                .is_err()
            {
                warn!("pipeline task did not exit in time");
            }
        }
        *self.state.lock().unwrap() = PipelineState::Stopped;
        let processed = self.core.lock().await.samples_processed;
        info!(
            samples = processed,
            dropped_lines, "pipeline stopped"
        );
    }

    // --- Live tuning -------------------------------------------------------
    //
    // Each setter takes the core lock, so changes are serialized against both
    // the tick loop and the reset loop. Invalid values are rejected and the
    // previous configuration stays in effect.

    pub async fn set_comb_delay(&self, delay: usize) {
        self.core.lock().await.filters.set_comb_delay(delay);
    }

    pub async fn set_comb_gain(&self, gain: f64) {
        self.core.lock().await.filters.set_comb_gain(gain);
    }

    pub async fn set_low_pass_alpha(&self, alpha: f64) -> Result<(), ConfigError> {
        validate_alpha(alpha)?;
        self.core.lock().await.filters.set_low_pass_alpha(alpha)
    }

    pub async fn set_high_pass_alpha(&self, alpha: f64) -> Result<(), ConfigError> {
        validate_alpha(alpha)?;
        self.core.lock().await.filters.set_high_pass_alpha(alpha)
    }

    pub async fn set_threshold(
        &self,
        channel: usize,
        state: &str,
        threshold: f64,
    ) -> Result<(), ConfigError> {
        let mut core = self.core.lock().await;
        let count = core.classifiers.len();
        let manager = core
            .classifiers
            .get_mut(channel)
            .ok_or(ConfigError::ChannelOutOfRange { channel, count })?;
        manager.update_threshold(state, threshold)
    }
}
