// CLI surface and resolved agent configuration.

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use clap::Parser;
use gt7_telemetry_core::{OutlineConfig, SegmenterConfig};

use crate::constants::{
    DEFAULT_BACKEND_URL, DIAGNOSTICS_INTERVAL_SECS, GT7_HEARTBEAT_PORT, GT7_UDP_PORT,
    HEARTBEAT_INTERVAL_MS, STALE_GRACE_SECS,
};

#[derive(Debug, Parser)]
#[command(name = "gt7-lap-agent", about = "GT7 telemetry lap saver")]
pub struct Cli {
    /// PlayStation IPv4 address streaming telemetry.
    #[arg(long)]
    pub ps_ip: Ipv4Addr,

    /// Store laps locally instead of uploading to the backend.
    #[arg(long)]
    pub local: bool,

    /// Record positional data only, to map the track layout.
    #[arg(long)]
    pub track: bool,

    /// Enable debug logging.
    #[arg(long, short)]
    pub verbose: bool,

    /// Backend API base URL for remote lap storage.
    #[arg(long, default_value = DEFAULT_BACKEND_URL)]
    pub backend_url: String,

    /// Bearer token for the backend; falls back to GT_TELEMETRY_TOKEN.
    #[arg(long)]
    pub token: Option<String>,

    /// Completed laps with fewer samples are flagged suspect.
    #[arg(long, default_value_t = 10)]
    pub suspect_min_samples: usize,

    /// Lap-counter forward jumps beyond this close the lap as partial.
    #[arg(long, default_value_t = i16::MAX)]
    pub forward_jump_limit: i16,
}

/// Resolved runtime configuration, passed by value to each task instead of
/// living in globals.
#[derive(Clone, Debug)]
pub struct AgentConfig {
    pub ps_ip: IpAddr,
    pub udp_port: u16,
    pub heartbeat_port: u16,
    pub heartbeat_interval: Duration,
    pub diagnostics_interval: Duration,
    pub stale_grace: Duration,
    pub track_mode: bool,
    pub segmenter: SegmenterConfig,
    pub outline: OutlineConfig,
}

impl AgentConfig {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            ps_ip: IpAddr::V4(cli.ps_ip),
            udp_port: GT7_UDP_PORT,
            heartbeat_port: GT7_HEARTBEAT_PORT,
            heartbeat_interval: Duration::from_millis(HEARTBEAT_INTERVAL_MS),
            diagnostics_interval: Duration::from_secs(DIAGNOSTICS_INTERVAL_SECS),
            stale_grace: Duration::from_secs(STALE_GRACE_SECS),
            track_mode: cli.track,
            segmenter: SegmenterConfig {
                suspect_min_samples: cli.suspect_min_samples,
                forward_jump_limit: cli.forward_jump_limit,
            },
            outline: OutlineConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults_resolve() {
        let cli = Cli::parse_from(["gt7-lap-agent", "--ps-ip", "192.168.1.30"]);
        let config = AgentConfig::from_cli(&cli);
        assert_eq!(config.ps_ip, IpAddr::V4(Ipv4Addr::new(192, 168, 1, 30)));
        assert_eq!(config.udp_port, GT7_UDP_PORT);
        assert!(!config.track_mode);
        assert_eq!(config.segmenter.suspect_min_samples, 10);
    }

    #[test]
    fn rejects_non_ipv4_address() {
        assert!(Cli::try_parse_from(["gt7-lap-agent", "--ps-ip", "not-an-ip"]).is_err());
    }
}
