//! Thin daemon binary: wires a line source into the gesture pipeline and
//! prints each published gesture label, standing in for the game consumer.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use emg_sensor::{LineSource, MockLineSource};
use emg_types::{PipelineConfig, TransportError};
use gesture_pipeline::{GesturePipeline, PipelineState};

#[derive(Parser)]
#[command(name = "emg_daemon", about = "EMG gesture classification daemon")]
struct Cli {
    /// Replay a scripted gesture burst instead of reading sensor lines
    /// from stdin
    #[arg(long)]
    mock: bool,
    /// Path to a JSON pipeline configuration
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Reads decoded sensor lines from stdin, e.g. piped from a serial bridge.
struct StdinLineSource {
    lines: Lines<BufReader<Stdin>>,
}

impl StdinLineSource {
    fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

#[async_trait]
impl LineSource for StdinLineSource {
    async fn next_line(&mut self) -> Result<Option<String>, TransportError> {
        self.lines.next_line().await.map_err(TransportError::from)
    }
}

/// A two-channel burst: rest, an extension burst on channel 1, rest, a
/// flexion burst on channel 2, rest. Paced at roughly the device rate.
fn demo_source() -> MockLineSource {
    let mut samples = Vec::new();
    for t in 0..500u32 {
        let outer = if (100..180).contains(&t) { 600.0 } else { 1.0 };
        let inner = if (300..380).contains(&t) { 550.0 } else { 1.0 };
        samples.push((f64::from(t), vec![outer, inner]));
    }
    MockLineSource::from_samples(&samples).paced(Duration::from_millis(5))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "emg_daemon=info,gesture_pipeline=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config: PipelineConfig = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => PipelineConfig::default(),
    };

    let mut pipeline = GesturePipeline::new(config)?;
    let mailbox = pipeline.mailbox();

    if cli.mock {
        tracing::info!("using scripted mock source");
        pipeline.start(demo_source())?;
    } else {
        tracing::info!("reading sensor lines from stdin");
        pipeline.start(StdinLineSource::new())?;
    }

    // Stand-in consumer: poll the mailbox and print each taken label
    let mut poll = tokio::time::interval(Duration::from_millis(100));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted, shutting down");
                break;
            }
            _ = poll.tick() => {
                if let Some(label) = mailbox.try_take() {
                    println!("{label}");
                }
                if pipeline.state() == PipelineState::Stopped {
                    break;
                }
            }
        }
    }

    pipeline.stop().await;
    Ok(())
}
