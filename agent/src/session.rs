// Per-run session counters.
// Per-packet failures are expected under UDP loss; they are counted here and
// surfaced through the periodic diagnostics log, never escalated.

use tracing::info;

/// Explicit context value for one listener run. Created on start, reported
/// and dropped on stop.
#[derive(Clone, Copy, Debug, Default)]
pub struct SessionStats {
    pub packets_received: u64,
    pub decrypt_failures: u64,
    pub decode_failures: u64,
    pub paused_skipped: u64,
    pub laps_emitted: u64,
}

impl SessionStats {
    pub fn log_diagnostics(&self) {
        info!(
            packets_received = self.packets_received,
            decrypt_failures = self.decrypt_failures,
            decode_failures = self.decode_failures,
            paused_skipped = self.paused_skipped,
            laps_emitted = self.laps_emitted,
            "session diagnostics"
        );
    }
}
