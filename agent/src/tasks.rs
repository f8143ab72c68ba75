// Background tasks: lap writing and the backend session heartbeat.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time;
use tracing::{debug, error};

use crate::constants::BACKEND_SESSION_HEARTBEAT_SECS;
use crate::sink::{LapRecord, LapSink, RemoteSink};

/// Consumes completed records off the channel and hands them to the sink,
/// keeping sink latency out of the ingestion loop. A sink failure signals
/// stop; records already queued behind the failure are dropped with it.
pub async fn lap_writer_task(
    mut lap_rx: mpsc::UnboundedReceiver<LapRecord>,
    sink: Arc<dyn LapSink>,
    stop_tx: watch::Sender<bool>,
) {
    while let Some(record) = lap_rx.recv().await {
        if let Err(err) = sink.submit(&record).await {
            error!(%err, lap_id = %record.file_name(), "failed to write lap record");
            let _ = stop_tx.send(true);
            return;
        }
    }
    debug!("lap writer drained");
}

/// Keeps the backend session alive in remote mode. A failed heartbeat means
/// the session is gone server-side, so it stops the agent.
pub async fn backend_heartbeat_task(
    sink: Arc<RemoteSink>,
    mut stop_rx: watch::Receiver<bool>,
    stop_tx: watch::Sender<bool>,
) {
    let mut tick = time::interval(Duration::from_secs(BACKEND_SESSION_HEARTBEAT_SECS));
    loop {
        tokio::select! {
            _ = tick.tick() => {
                if let Err(err) = sink.session_heartbeat().await {
                    error!(%err, "backend session heartbeat failed");
                    let _ = stop_tx.send(true);
                    return;
                }
            }
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    return;
                }
            }
        }
    }
}
