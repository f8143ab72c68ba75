// Completed lap and track-outline records handed to the output sink.

use serde::{Deserialize, Serialize};

use super::TelemetrySample;

/// Ordered run of samples sharing one lap number, bounded by a detected
/// lap transition.
///
/// Invariants: `samples` is never empty and is in non-decreasing `packet_id`
/// order. A lap is emitted exactly once.
#[derive(Clone, Debug, Serialize)]
pub struct Lap {
    pub lap_number: i16,
    pub start_packet_id: i32,
    pub end_packet_id: i32,
    pub sample_count: usize,
    /// Console-reported lap time for cleanly closed laps, time-on-track
    /// delta for partial ones. `None` when neither is available.
    pub duration_ms: Option<i32>,
    /// Set when the lap was cut short by a stop signal or a lap-number
    /// regression instead of a clean boundary.
    pub partial: bool,
    /// Set when a cleanly closed lap carried fewer samples than the
    /// configured minimum; filtering is the sink's policy decision.
    pub suspect: bool,
    pub samples: Vec<TelemetrySample>,
}

/// Positional-only point used in track-layout mode.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub packet_id: i32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl TrackPoint {
    pub fn from_sample(sample: &TelemetrySample) -> Self {
        Self {
            packet_id: sample.packet_id,
            x: sample.pos_x,
            y: sample.pos_y,
            z: sample.pos_z,
        }
    }
}

/// One recorded loop of the track in positional-only mode. `closed` is false
/// when recording stopped before the car returned to the start point.
#[derive(Clone, Debug, Serialize)]
pub struct TrackOutline {
    pub points: Vec<TrackPoint>,
    pub closed: bool,
    /// Planar path length travelled while recording, meters.
    pub path_length_m: f32,
}
