// GT7 lap telemetry agent: receives the console's encrypted UDP stream,
// segments it into laps, and saves or uploads each completed lap.

use std::sync::Arc;

use clap::Parser;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

use gt7_lap_agent::config::{AgentConfig, Cli};
use gt7_lap_agent::constants::LOCAL_LAPS_DIR;
use gt7_lap_agent::heartbeat;
use gt7_lap_agent::listener::{self, SamplePipeline};
use gt7_lap_agent::sink::{LapSink, LocalSink, RemoteSink};
use gt7_lap_agent::tasks;
use gt7_telemetry_core::{LapSegmenter, TrackRecorder};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    let config = AgentConfig::from_cli(&cli);

    // Remote mode needs a working token before any lap is driven.
    let token = cli
        .token
        .clone()
        .or_else(|| std::env::var("GT_TELEMETRY_TOKEN").ok());
    let mut remote: Option<Arc<RemoteSink>> = None;
    let sink: Arc<dyn LapSink> = if cli.local {
        info!(dir = LOCAL_LAPS_DIR, "laps will be saved locally");
        Arc::new(LocalSink::new(LOCAL_LAPS_DIR))
    } else if let Some(token) = token {
        let candidate = Arc::new(RemoteSink::new(cli.backend_url.clone(), token));
        if let Err(err) = candidate.validate_token().await {
            error!(%err, "bearer token validation failed");
            std::process::exit(1);
        }
        info!(backend = %cli.backend_url, "laps will be uploaded to the backend");
        remote = Some(candidate.clone());
        candidate
    } else {
        warn!("no backend token provided; falling back to local lap storage");
        Arc::new(LocalSink::new(LOCAL_LAPS_DIR))
    };

    let socket = match listener::bind_ingest_socket(config.udp_port).await {
        Ok(socket) => socket,
        Err(err) => {
            error!(?err, port = config.udp_port, "failed to bind telemetry port");
            std::process::exit(1);
        }
    };

    let (stop_tx, stop_rx) = watch::channel(false);
    let (lap_tx, lap_rx) = mpsc::unbounded_channel();

    let ctrl_stop = stop_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("stop requested");
            let _ = ctrl_stop.send(true);
        }
    });

    let heartbeat_config = config.clone();
    let heartbeat_stop = stop_rx.clone();
    tokio::spawn(async move {
        if let Err(err) = heartbeat::run(heartbeat_config, heartbeat_stop).await {
            warn!(?err, "heartbeat task exited");
        }
    });

    if let Some(remote) = remote {
        tokio::spawn(tasks::backend_heartbeat_task(
            remote,
            stop_rx.clone(),
            stop_tx.clone(),
        ));
    }

    let writer = tokio::spawn(tasks::lap_writer_task(lap_rx, sink, stop_tx.clone()));

    let mut pipeline = if config.track_mode {
        info!("track-layout mode: recording positional data only");
        SamplePipeline::Track(TrackRecorder::new(config.outline))
    } else {
        SamplePipeline::Laps(LapSegmenter::new(config.segmenter))
    };

    match listener::run(socket, &config, &mut pipeline, &lap_tx, stop_rx).await {
        Ok(stats) => info!(laps_emitted = stats.laps_emitted, "session finished"),
        Err(err) => error!(%err, "listener terminated on socket fault"),
    }

    // Let the writer drain everything the listener flushed, then shut down.
    let _ = stop_tx.send(true);
    drop(lap_tx);
    if let Err(err) = writer.await {
        warn!(?err, "lap writer join failed");
    }
}
