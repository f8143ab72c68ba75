// Lap-boundary state machine.
// Invariants: every completed lap is emitted exactly once and never empty;
// a forward jump in lap number still closes the prior lap, because the lap
// counter is the only reliable boundary signal in a lossy UDP feed.

use crate::model::{Lap, TelemetrySample};
use crate::store::SampleStore;

/// Tuning knobs for the boundary policy. Both were left open by the
/// protocol description, so they are configuration rather than constants.
#[derive(Clone, Copy, Debug)]
pub struct SegmenterConfig {
    /// Cleanly closed laps with fewer samples than this are flagged
    /// `suspect` (near-instant lap-counter flicker).
    pub suspect_min_samples: usize,
    /// Forward jumps larger than this are treated like a session restart:
    /// the buffered lap is emitted partial instead of cleanly closed.
    pub forward_jump_limit: i16,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            suspect_min_samples: 10,
            forward_jump_limit: i16::MAX,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SegmenterState {
    AwaitingFirstSample,
    InLap(i16),
    Stopped,
}

/// Consumes the decoded sample stream and yields completed laps on
/// lap-number transitions. At most one lap is produced per pushed sample.
#[derive(Debug)]
pub struct LapSegmenter {
    config: SegmenterConfig,
    state: SegmenterState,
    store: SampleStore,
}

impl LapSegmenter {
    pub fn new(config: SegmenterConfig) -> Self {
        Self {
            config,
            state: SegmenterState::AwaitingFirstSample,
            store: SampleStore::new(),
        }
    }

    /// Feeds one sample through the state machine. Returns the completed
    /// lap when this sample crossed a boundary.
    pub fn push(&mut self, sample: TelemetrySample) -> Option<Lap> {
        match self.state {
            SegmenterState::Stopped => None,
            SegmenterState::AwaitingFirstSample => {
                self.state = SegmenterState::InLap(sample.current_lap);
                self.store.append(sample);
                None
            }
            SegmenterState::InLap(current) => {
                let lap = sample.current_lap;
                if lap == current {
                    self.store.append(sample);
                    return None;
                }

                let emitted = if lap > current {
                    let jump = lap.saturating_sub(current);
                    if jump > self.config.forward_jump_limit {
                        // Counter leapt implausibly far; close best-effort.
                        self.close_partial(current)
                    } else {
                        self.close_clean(current, &sample)
                    }
                } else {
                    // Regression: console reset or a new session started
                    // mid-stream. Flush what we have and start over.
                    self.close_partial(current)
                };

                self.state = SegmenterState::InLap(lap);
                self.store.append(sample);
                emitted
            }
        }
    }

    /// Stop signal: emits any buffered samples as a partial lap and refuses
    /// further input.
    pub fn finish(&mut self) -> Option<Lap> {
        let lap = match self.state {
            SegmenterState::InLap(current) => self.close_partial(current),
            _ => None,
        };
        self.state = SegmenterState::Stopped;
        lap
    }

    fn close_clean(&mut self, lap_number: i16, boundary: &TelemetrySample) -> Option<Lap> {
        let samples = self.store.drain();
        if samples.is_empty() {
            return None;
        }
        // The first sample of the next lap carries the completed lap's time.
        let duration_ms = if boundary.last_lap_ms > 0 {
            Some(boundary.last_lap_ms)
        } else {
            elapsed_ms(&samples)
        };
        let suspect = samples.len() < self.config.suspect_min_samples;
        Some(build_lap(lap_number, samples, duration_ms, false, suspect))
    }

    fn close_partial(&mut self, lap_number: i16) -> Option<Lap> {
        let samples = self.store.drain();
        if samples.is_empty() {
            return None;
        }
        let duration_ms = elapsed_ms(&samples);
        Some(build_lap(lap_number, samples, duration_ms, true, false))
    }
}

fn elapsed_ms(samples: &[TelemetrySample]) -> Option<i32> {
    let first = samples.first()?;
    let last = samples.last()?;
    let delta = last.time_on_track_ms.saturating_sub(first.time_on_track_ms);
    (delta >= 0).then_some(delta)
}

fn build_lap(
    lap_number: i16,
    samples: Vec<TelemetrySample>,
    duration_ms: Option<i32>,
    partial: bool,
    suspect: bool,
) -> Lap {
    // Store invariant: samples ordered by packet_id, never empty here.
    let start_packet_id = samples.first().map(|s| s.packet_id).unwrap_or_default();
    let end_packet_id = samples.last().map(|s| s.packet_id).unwrap_or_default();
    Lap {
        lap_number,
        start_packet_id,
        end_packet_id,
        sample_count: samples.len(),
        duration_ms,
        partial,
        suspect,
        samples,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(current_lap: i16, packet_id: i32) -> TelemetrySample {
        TelemetrySample {
            packet_id,
            current_lap,
            time_on_track_ms: packet_id * 16,
            last_lap_ms: 90_000,
            ..Default::default()
        }
    }

    fn segmenter() -> LapSegmenter {
        LapSegmenter::new(SegmenterConfig {
            suspect_min_samples: 0,
            forward_jump_limit: i16::MAX,
        })
    }

    #[test]
    fn emits_one_lap_per_boundary_then_partial_on_stop() {
        let mut seg = segmenter();
        let mut laps = Vec::new();
        for (idx, lap_number) in [1, 1, 1, 2, 2, 3].into_iter().enumerate() {
            if let Some(lap) = seg.push(sample(lap_number, idx as i32 + 1)) {
                laps.push(lap);
            }
        }

        assert_eq!(laps.len(), 2);
        assert_eq!(laps[0].lap_number, 1);
        assert_eq!(laps[0].sample_count, 3);
        assert!(!laps[0].partial);
        assert_eq!(laps[0].duration_ms, Some(90_000));
        assert_eq!(laps[1].lap_number, 2);
        assert_eq!(laps[1].sample_count, 2);

        let tail = seg.finish().expect("partial lap on stop");
        assert_eq!(tail.lap_number, 3);
        assert_eq!(tail.sample_count, 1);
        assert!(tail.partial);
    }

    #[test]
    fn forward_gap_closes_prior_lap_without_fabricating_the_missing_one() {
        let mut seg = segmenter();
        let mut laps = Vec::new();
        for (idx, lap_number) in [1, 1, 3, 3].into_iter().enumerate() {
            if let Some(lap) = seg.push(sample(lap_number, idx as i32 + 1)) {
                laps.push(lap);
            }
        }
        if let Some(lap) = seg.finish() {
            laps.push(lap);
        }

        assert_eq!(laps.len(), 2);
        assert_eq!(laps[0].lap_number, 1);
        assert_eq!(laps[0].sample_count, 2);
        assert!(!laps[0].partial);
        assert_eq!(laps[1].lap_number, 3);
        assert!(laps[1].partial);
        assert!(laps.iter().all(|lap| lap.lap_number != 2));
    }

    #[test]
    fn regression_flushes_partial_and_restarts() {
        let mut seg = segmenter();
        assert!(seg.push(sample(5, 1)).is_none());
        assert!(seg.push(sample(5, 2)).is_none());

        let flushed = seg.push(sample(1, 3)).expect("partial on regression");
        assert_eq!(flushed.lap_number, 5);
        assert_eq!(flushed.sample_count, 2);
        assert!(flushed.partial);

        assert!(seg.push(sample(1, 4)).is_none());
        let tail = seg.finish().expect("lap 1 buffered");
        assert_eq!(tail.lap_number, 1);
        assert_eq!(tail.sample_count, 2);
    }

    #[test]
    fn stop_mid_lap_emits_exactly_one_partial() {
        let mut seg = segmenter();
        seg.push(sample(1, 1));
        assert!(seg.finish().is_some());
        assert!(seg.finish().is_none());
        assert!(seg.push(sample(1, 2)).is_none());
    }

    #[test]
    fn stop_with_empty_buffer_emits_nothing() {
        let mut seg = segmenter();
        assert!(seg.finish().is_none());
    }

    #[test]
    fn short_clean_lap_is_flagged_suspect() {
        let mut seg = LapSegmenter::new(SegmenterConfig {
            suspect_min_samples: 10,
            forward_jump_limit: i16::MAX,
        });
        seg.push(sample(1, 1));
        seg.push(sample(1, 2));
        let lap = seg.push(sample(2, 3)).expect("clean close");
        assert!(!lap.partial);
        assert!(lap.suspect);
    }

    #[test]
    fn forward_jump_beyond_limit_is_a_restart() {
        let mut seg = LapSegmenter::new(SegmenterConfig {
            suspect_min_samples: 0,
            forward_jump_limit: 1,
        });
        seg.push(sample(1, 1));
        seg.push(sample(1, 2));
        let lap = seg.push(sample(5, 3)).expect("partial close");
        assert!(lap.partial);
        assert_eq!(lap.lap_number, 1);

        let tail = seg.finish().expect("lap 5 buffered");
        assert_eq!(tail.lap_number, 5);
    }

    #[test]
    fn clean_duration_falls_back_to_elapsed_when_unreported() {
        let mut seg = segmenter();
        let mut first = sample(1, 10);
        first.time_on_track_ms = 1_000;
        let mut second = sample(1, 20);
        second.time_on_track_ms = 61_000;
        let mut boundary = sample(2, 30);
        boundary.last_lap_ms = 0;
        boundary.time_on_track_ms = 61_016;

        seg.push(first);
        seg.push(second);
        let lap = seg.push(boundary).expect("clean close");
        assert_eq!(lap.duration_ms, Some(60_000));
    }
}
