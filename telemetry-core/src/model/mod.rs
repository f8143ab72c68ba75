// Core data models for decoded samples and completed laps.

mod lap;
mod sample;

pub use lap::{Lap, TrackOutline, TrackPoint};
pub use sample::TelemetrySample;
