//! Integration tests for the full pipeline.

use std::time::Duration;

use async_trait::async_trait;

use emg_sensor::{LineSource, MockLineSource};
use emg_types::{
    ChannelConfig, CombConfig, ConfigError, PipelineConfig, StateConfig, TransportError,
};

use crate::driver::{GesturePipeline, PipelineState};
use crate::error::PipelineError;

/// Two channels, inert filters, channel 0 labelled "Extension" above 500 and
/// channel 1 labelled "Flexion" above 500.
fn inert_config() -> PipelineConfig {
    PipelineConfig {
        channel_count: 2,
        comb: CombConfig {
            delay: 0,
            gain: 0.0,
        },
        low_pass_alpha: 1.0,
        high_pass_alpha: 1.0,
        tick_interval_ms: 5,
        reset_interval_ms: 500,
        channels: vec![
            ChannelConfig {
                states: vec![
                    StateConfig {
                        name: "No signal".into(),
                        threshold: 0.0,
                    },
                    StateConfig {
                        name: "Extension".into(),
                        threshold: 500.0,
                    },
                ],
            },
            ChannelConfig {
                states: vec![StateConfig {
                    name: "Flexion".into(),
                    threshold: 500.0,
                }],
            },
        ],
    }
}

async fn wait_until_stopped(pipeline: &GesturePipeline) {
    for _ in 0..1000 {
        if pipeline.state() == PipelineState::Stopped {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("pipeline did not stop");
}

#[tokio::test(start_paused = true)]
async fn end_to_end_publishes_dominant_gesture() {
    let mut pipeline = GesturePipeline::new(inert_config()).unwrap();
    let mailbox = pipeline.mailbox();

    // A rest sample first so the high-pass difference sees the full step
    let source = MockLineSource::new(vec![
        "0,0,0".into(),
        "1,600,300".into(),
        "2,600,300".into(),
        "3,600,300".into(),
    ]);
    pipeline.start(source).unwrap();
    wait_until_stopped(&pipeline).await;

    assert_eq!(pipeline.samples_processed().await, 4);
    // Channel 0 voted "Extension" three times; channel 1 never crossed 500
    assert_eq!(mailbox.try_take(), Some("Extension".into()));
    // Take-on-read policy: the slot is now empty
    assert_eq!(mailbox.try_take(), None);
}

#[tokio::test(start_paused = true)]
async fn bad_lines_are_dropped_and_counted() {
    let mut pipeline = GesturePipeline::new(inert_config()).unwrap();
    let source = MockLineSource::new(vec![
        "0,0,0".into(),
        "garbage".into(),
        "1,600,300".into(),
        "2,600".into(),
        "3,600,300".into(),
    ]);
    pipeline.start(source).unwrap();

    // Read the counter before stop() releases the source handle
    for _ in 0..1000 {
        if pipeline.parse_errors() == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(pipeline.parse_errors(), 2);

    wait_until_stopped(&pipeline).await;
    assert_eq!(pipeline.samples_processed().await, 3);
}

#[tokio::test(start_paused = true)]
async fn transport_failure_stops_the_pipeline() {
    let mut pipeline = GesturePipeline::new(inert_config()).unwrap();
    let mailbox = pipeline.mailbox();

    let source = MockLineSource::new(vec!["0,0,0".into(), "1,600,300".into()])
        .failing_with(TransportError::Disconnected("device unplugged".into()));
    pipeline.start(source).unwrap();
    wait_until_stopped(&pipeline).await;

    assert_eq!(pipeline.samples_processed().await, 2);
    // The consumer observes the failure as a mailbox that stops updating
    let _ = mailbox.try_take();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(mailbox.try_take(), None);
}

#[tokio::test(start_paused = true)]
async fn start_is_rejected_while_running_and_after_stop() {
    let mut pipeline = GesturePipeline::new(inert_config()).unwrap();
    let source = MockLineSource::new(vec![]).paced(Duration::from_millis(50));
    pipeline.start(source).unwrap();

    let again = MockLineSource::new(vec![]);
    assert!(matches!(
        pipeline.start(again),
        Err(PipelineError::AlreadyRunning)
    ));

    pipeline.stop().await;
    assert_eq!(pipeline.state(), PipelineState::Stopped);

    let after_stop = MockLineSource::new(vec![]);
    assert!(matches!(
        pipeline.start(after_stop),
        Err(PipelineError::Stopped)
    ));

    // stop() is idempotent
    pipeline.stop().await;
}

/// A transport that never yields, to prove cancellation does not hang on a
/// blocked read.
struct StalledSource;

#[async_trait]
impl LineSource for StalledSource {
    async fn next_line(&mut self) -> Result<Option<String>, TransportError> {
        std::future::pending().await
    }
}

#[tokio::test(start_paused = true)]
async fn stop_cancels_a_blocked_source() {
    let mut pipeline = GesturePipeline::new(inert_config()).unwrap();
    pipeline.start(StalledSource).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    pipeline.stop().await;
    assert_eq!(pipeline.state(), PipelineState::Stopped);
}

#[test]
fn invalid_config_is_rejected_up_front() {
    let mut config = inert_config();
    config.high_pass_alpha = 7.0;
    assert!(matches!(
        GesturePipeline::new(config),
        Err(ConfigError::AlphaOutOfRange(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn live_tuning_rejects_bad_values_and_keeps_old_ones() {
    let pipeline = GesturePipeline::new(inert_config()).unwrap();

    assert!(pipeline.set_low_pass_alpha(1.5).await.is_err());
    assert!(pipeline.set_low_pass_alpha(0.2).await.is_ok());
    assert!(pipeline.set_high_pass_alpha(-0.1).await.is_err());
    assert!(pipeline.set_threshold(0, "Extension", 450.0).await.is_ok());
    assert!(pipeline.set_threshold(0, "missing", 1.0).await.is_err());
    assert!(matches!(
        pipeline.set_threshold(9, "Extension", 1.0).await,
        Err(ConfigError::ChannelOutOfRange { channel: 9, count: 2 })
    ));
}

#[tokio::test(start_paused = true)]
async fn counter_reset_does_not_clear_published_gesture() {
    let mut config = inert_config();
    config.reset_interval_ms = 20;
    let mut pipeline = GesturePipeline::new(config).unwrap();
    let mailbox = pipeline.mailbox();

    let source = MockLineSource::new(vec![
        "0,0,0".into(),
        "1,600,300".into(),
        "2,600,300".into(),
    ]);
    pipeline.start(source).unwrap();
    wait_until_stopped(&pipeline).await;

    // Several reset windows have elapsed by now; the last published winner
    // is still resident until taken.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(mailbox.try_take(), Some("Extension".into()));
}
