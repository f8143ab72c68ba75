// Track-outline recorder for positional-only mode.
// Laps are not segmented by lap counter here; an outline closes when the car
// returns near its recorded start point after covering a minimum distance.

use crate::model::{TelemetrySample, TrackOutline, TrackPoint};

#[derive(Clone, Copy, Debug)]
pub struct OutlineConfig {
    /// Planar distance to the start point that counts as a return, meters.
    pub close_radius_m: f32,
    /// Minimum travelled path before a return can close the outline; stops
    /// the recorder from closing on the first few samples at the start line.
    pub min_path_m: f32,
}

impl Default for OutlineConfig {
    fn default() -> Self {
        Self {
            close_radius_m: 15.0,
            min_path_m: 500.0,
        }
    }
}

/// Accumulates `{packet_id, position}` points and emits one outline per
/// completed loop of the track. Distances are planar (x/z); the vertical
/// axis does not contribute.
#[derive(Debug)]
pub struct TrackRecorder {
    config: OutlineConfig,
    points: Vec<TrackPoint>,
    start_xz: Option<(f32, f32)>,
    last_xz: Option<(f32, f32)>,
    path_m: f32,
}

impl TrackRecorder {
    pub fn new(config: OutlineConfig) -> Self {
        Self {
            config,
            points: Vec::new(),
            start_xz: None,
            last_xz: None,
            path_m: 0.0,
        }
    }

    /// Records one sample's position. Returns a closed outline when the car
    /// has returned to the start point.
    pub fn push(&mut self, sample: &TelemetrySample) -> Option<TrackOutline> {
        let point = TrackPoint::from_sample(sample);
        let xz = (point.x, point.z);

        if let Some(last) = self.last_xz {
            self.path_m += planar_distance(last, xz);
        }
        self.last_xz = Some(xz);
        let start = *self.start_xz.get_or_insert(xz);
        self.points.push(point);

        if self.path_m >= self.config.min_path_m
            && planar_distance(start, xz) <= self.config.close_radius_m
        {
            return Some(self.take_outline(true));
        }
        None
    }

    /// Stop signal: drains any buffered points as an unclosed outline.
    pub fn finish(&mut self) -> Option<TrackOutline> {
        if self.points.is_empty() {
            return None;
        }
        Some(self.take_outline(false))
    }

    fn take_outline(&mut self, closed: bool) -> TrackOutline {
        let outline = TrackOutline {
            points: std::mem::take(&mut self.points),
            closed,
            path_length_m: self.path_m,
        };
        self.start_xz = None;
        self.last_xz = None;
        self.path_m = 0.0;
        outline
    }
}

fn planar_distance(a: (f32, f32), b: (f32, f32)) -> f32 {
    let dx = a.0 - b.0;
    let dz = a.1 - b.1;
    (dx * dx + dz * dz).sqrt()
}
