// One decoded packet's worth of vehicle state. Immutable once decoded.

use serde::{Deserialize, Serialize};

/// Decoded snapshot of vehicle state from a single telemetry datagram.
///
/// Values are passed through as reported by the console; no physical range
/// validation is applied (negative RPM or speed survives decoding).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    /// Monotonic packet sequence number assigned by the console.
    pub packet_id: i32,
    /// Simulation time on track, milliseconds.
    pub time_on_track_ms: i32,

    pub pos_x: f32,
    pub pos_y: f32,
    pub pos_z: f32,
    pub vel_x: f32,
    pub vel_y: f32,
    pub vel_z: f32,

    pub speed_kph: f32,
    pub rpm: f32,
    /// Current gear; 0 on the wire means reverse/neutral and is mapped to -1.
    pub gear: i8,
    pub suggested_gear: u8,

    // Driver inputs, normalized to 0.0..=1.0. The wire format carries no
    // steering channel.
    pub throttle: f32,
    pub brake: f32,
    pub clutch: f32,

    pub current_lap: i16,
    pub total_laps: i16,
    pub best_lap_ms: i32,
    pub last_lap_ms: i32,

    pub in_race: bool,
    pub is_paused: bool,
    /// Raw status flags byte the booleans above are unpacked from.
    pub flags: u8,
}
