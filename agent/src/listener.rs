// UDP session listener: receive, decrypt, decode, segment, synchronously
// per packet so sample order is preserved.
// Invariants: per-packet failures are counted and absorbed; only an explicit
// stop signal or a socket-level fault terminates the run.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, watch};
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

use gt7_telemetry_core::{
    decode_sample, decrypt_packet, LapSegmenter, TelemetrySample, TrackRecorder,
};

use crate::config::AgentConfig;
use crate::constants::RECV_BUFFER_LEN;
use crate::session::SessionStats;
use crate::sink::LapRecord;

/// Unrecoverable transport fault. Surfaced to the caller so it can report
/// and decide on restart; everything below this is count-and-continue.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("udp socket fault: {0}")]
    Socket(#[from] std::io::Error),
}

/// Routes decoded samples into either the lap segmenter or the positional
/// track recorder, depending on the agent mode.
pub enum SamplePipeline {
    Laps(LapSegmenter),
    Track(TrackRecorder),
}

impl SamplePipeline {
    fn push(&mut self, sample: TelemetrySample) -> Option<LapRecord> {
        match self {
            SamplePipeline::Laps(segmenter) => segmenter.push(sample).map(LapRecord::Telemetry),
            SamplePipeline::Track(recorder) => recorder.push(&sample).map(LapRecord::Track),
        }
    }

    fn finish(&mut self) -> Option<LapRecord> {
        match self {
            SamplePipeline::Laps(segmenter) => segmenter.finish().map(LapRecord::Telemetry),
            SamplePipeline::Track(recorder) => recorder.finish().map(LapRecord::Track),
        }
    }
}

pub async fn bind_ingest_socket(port: u16) -> std::io::Result<UdpSocket> {
    let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port);
    let socket = UdpSocket::bind(addr).await?;
    info!(addr = %socket.local_addr()?, "udp ingest started");
    Ok(socket)
}

/// Drives the receive loop until the stop signal flips or the socket
/// faults. Buffered samples are flushed as a partial record on either exit
/// path, exactly once.
pub async fn run(
    socket: UdpSocket,
    config: &AgentConfig,
    pipeline: &mut SamplePipeline,
    lap_tx: &mpsc::UnboundedSender<LapRecord>,
    mut stop_rx: watch::Receiver<bool>,
) -> Result<SessionStats, ListenerError> {
    let mut stats = SessionStats::default();
    let mut buf = [0u8; RECV_BUFFER_LEN];
    let mut diag_tick = time::interval(config.diagnostics_interval);
    diag_tick.set_missed_tick_behavior(time::MissedTickBehavior::Skip);
    let mut last_packet: Option<Instant> = None;
    let mut stale_warned = false;

    loop {
        tokio::select! {
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
            }
            _ = diag_tick.tick() => {
                stats.log_diagnostics();
                if let Some(last) = last_packet {
                    let quiet = last.elapsed();
                    if quiet >= config.stale_grace && !stale_warned {
                        warn!(quiet_ms = quiet.as_millis() as u64, "telemetry stream stale; still listening");
                        stale_warned = true;
                    }
                }
            }
            recv = socket.recv_from(&mut buf) => {
                let (len, source) = match recv {
                    Ok(received) => received,
                    Err(err) => {
                        // Fatal: flush what we have before surfacing.
                        flush_pipeline(pipeline, lap_tx, &mut stats);
                        stats.log_diagnostics();
                        return Err(ListenerError::Socket(err));
                    }
                };
                if source.ip() != config.ps_ip {
                    debug!(%source, "dropping datagram from unexpected source");
                    continue;
                }
                stats.packets_received += 1;
                last_packet = Some(Instant::now());
                stale_warned = false;

                let payload = match decrypt_packet(&buf[..len]) {
                    Ok(payload) => payload,
                    Err(err) => {
                        stats.decrypt_failures += 1;
                        debug!(%err, len, "dropping undecryptable datagram");
                        continue;
                    }
                };
                let sample = match decode_sample(&payload) {
                    Ok(sample) => sample,
                    Err(err) => {
                        stats.decode_failures += 1;
                        debug!(%err, "dropping undecodable payload");
                        continue;
                    }
                };
                if sample.is_paused {
                    stats.paused_skipped += 1;
                    continue;
                }

                if let Some(record) = pipeline.push(sample) {
                    forward_record(record, lap_tx, &mut stats);
                }
            }
        }
    }

    flush_pipeline(pipeline, lap_tx, &mut stats);
    stats.log_diagnostics();
    info!("session listener stopped");
    Ok(stats)
}

fn flush_pipeline(
    pipeline: &mut SamplePipeline,
    lap_tx: &mpsc::UnboundedSender<LapRecord>,
    stats: &mut SessionStats,
) {
    if let Some(record) = pipeline.finish() {
        forward_record(record, lap_tx, stats);
    }
}

fn forward_record(
    record: LapRecord,
    lap_tx: &mpsc::UnboundedSender<LapRecord>,
    stats: &mut SessionStats,
) {
    stats.laps_emitted += 1;
    if let LapRecord::Telemetry(lap) = &record {
        info!(
            lap_number = lap.lap_number,
            sample_count = lap.sample_count,
            duration_ms = lap.duration_ms,
            partial = lap.partial,
            suspect = lap.suspect,
            "lap completed"
        );
    }
    if lap_tx.send(record).is_err() {
        warn!("lap writer closed; dropping completed record");
    }
}
