// Console keep-alive heartbeat.
// Runs on its own task and socket so receive-loop stalls can never starve
// the cadence; the console stops streaming without it.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use tokio::net::UdpSocket;
use tokio::sync::watch;
use tokio::time;
use tracing::{debug, info, warn};

use crate::config::AgentConfig;
use crate::constants::HEARTBEAT_BYTE;

/// Sends the single-byte heartbeat to the console on a fixed interval until
/// the stop signal flips. Send failures are logged and retried on the next
/// tick; only stop terminates the task.
pub async fn run(config: AgentConfig, mut stop_rx: watch::Receiver<bool>) -> std::io::Result<()> {
    let socket = UdpSocket::bind(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0)).await?;
    let target = SocketAddr::new(config.ps_ip, config.heartbeat_port);
    info!(local_addr = %socket.local_addr()?, %target, "heartbeat task started");

    let mut tick = time::interval(config.heartbeat_interval);
    loop {
        tokio::select! {
            _ = tick.tick() => {
                match socket.send_to(&[HEARTBEAT_BYTE], target).await {
                    Ok(_) => debug!(%target, "heartbeat sent"),
                    Err(err) => warn!(?err, %target, "heartbeat send failed"),
                }
            }
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
            }
        }
    }

    info!("heartbeat task stopped");
    Ok(())
}
