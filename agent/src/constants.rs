// Shared constants for console protocol ports and agent timing.

/// Local port the console streams telemetry datagrams to.
pub const GT7_UDP_PORT: u16 = 33740;
/// Console port the keep-alive heartbeat is sent to.
pub const GT7_HEARTBEAT_PORT: u16 = 33739;
/// Heartbeat payload: a single 'A'.
pub const HEARTBEAT_BYTE: u8 = 0x41;
pub const HEARTBEAT_INTERVAL_MS: u64 = 1_500;

pub const RECV_BUFFER_LEN: usize = 4096;
pub const DIAGNOSTICS_INTERVAL_SECS: u64 = 5;
/// Quiet time before the listener warns about a stale stream. Covers the
/// console sitting in a menu or pause screen; never terminates the session.
pub const STALE_GRACE_SECS: u64 = 10;

pub const DEFAULT_BACKEND_URL: &str = "https://api.gt-telemetry.com";
pub const BACKEND_SESSION_HEARTBEAT_SECS: u64 = 60;
pub const LOCAL_LAPS_DIR: &str = "laps";
