mod notifier;
mod protocol;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use transkode_core::{
    load_config, load_config_from_env, validate_config, Config, JobContext, JobRequest,
    QueueManager, TranscodeJob,
};

use notifier::Notifier;
use protocol::Command;

/// Environment variable naming the configuration file
const CONFIG_ENV: &str = "TRANSKODE_CONFIG";

/// Configuration file used when `TRANSKODE_CONFIG` is unset
const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Stdout carries completion lines, so logs go to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = load_configuration()?;
    validate_config(&config).context("Configuration validation failed")?;
    debug!(
        "Effective configuration: {}",
        serde_json::to_string(&config).unwrap_or_default()
    );

    let context = Arc::new(
        JobContext::from_config(&config).context("Failed to set up transcode jobs")?,
    );
    info!(
        "Decoders: {}",
        context.registry().decodable_extensions().join(", ")
    );
    info!(
        "Encoders: {}",
        context.registry().encodable_formats().join(", ")
    );
    info!("Tag reader: {}", context.tag_reader().name());

    let notifier = Notifier::new(&config.notify);
    let mut manager = QueueManager::new(config.queue.max_concurrency, move |job: TranscodeJob| {
        notifier.finish(job)
    });
    info!(
        "Running up to {} job(s) at once",
        manager.max_concurrency()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(Duration::from_millis(config.queue.poll_interval_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => match protocol::parse_line(&line) {
                    Ok(Some(Command::Transcode { source, format })) => {
                        manager.add(TranscodeJob::new(JobRequest::new(source, format), context.clone()));
                        manager.poll().await;
                    }
                    Ok(Some(Command::Quit)) => {
                        info!("Quit requested");
                        break;
                    }
                    Ok(None) => {}
                    Err(e) => warn!("Ignoring input line {:?}: {:#}", line, e),
                },
                Ok(None) => {
                    info!("Input closed");
                    break;
                }
                Err(e) => {
                    error!("Failed to read input: {}", e);
                    break;
                }
            },
            _ = ticker.tick(), if !manager.is_idle() => {
                manager.poll().await;
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    let aborted = manager.abort_all();
    let status = manager.status();
    info!(
        "Shutting down: {} succeeded, {} failed ({} aborted)",
        status.total_succeeded, status.total_failed, aborted
    );

    Ok(())
}

/// Loads `TRANSKODE_CONFIG`, or `config.toml` if present, or defaults.
fn load_configuration() -> Result<Config> {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        let path = PathBuf::from(path);
        info!("Loading configuration from {:?}", path);
        return load_config(&path)
            .with_context(|| format!("Failed to load config from {:?}", path));
    }

    let path = PathBuf::from(DEFAULT_CONFIG_PATH);
    if path.exists() {
        info!("Loading configuration from {:?}", path);
        load_config(&path).with_context(|| format!("Failed to load config from {:?}", path))
    } else {
        info!("No {} found, using defaults", DEFAULT_CONFIG_PATH);
        load_config_from_env().context("Failed to load config from environment")
    }
}

/// Wait for SIGINT, SIGTERM, or SIGHUP.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = unix_signal(signal::unix::SignalKind::terminate());
    #[cfg(unix)]
    let hangup = unix_signal(signal::unix::SignalKind::hangup());

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();
    #[cfg(not(unix))]
    let hangup = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
        _ = hangup => {},
    }
}

#[cfg(unix)]
async fn unix_signal(kind: signal::unix::SignalKind) {
    match signal::unix::signal(kind) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(e) => {
            error!("Failed to install {:?} handler: {}", kind, e);
            std::future::pending::<()>().await;
        }
    }
}
