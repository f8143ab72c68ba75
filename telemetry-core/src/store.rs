// Sample accumulator for the lap in progress.
// Invariants: drained output is always in non-decreasing packet_id order,
// even when UDP delivered samples out of order.

use crate::model::TelemetrySample;

/// Buffer for the lap currently being driven. Bounded by lap duration in
/// practice; memory policy beyond that is the output sink's concern.
#[derive(Debug, Default)]
pub struct SampleStore {
    samples: Vec<TelemetrySample>,
}

impl SampleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a sample, inserting by `packet_id` when the datagram arrived
    /// out of order.
    pub fn append(&mut self, sample: TelemetrySample) {
        match self.samples.last() {
            Some(last) if sample.packet_id < last.packet_id => {
                let idx = self
                    .samples
                    .partition_point(|s| s.packet_id <= sample.packet_id);
                self.samples.insert(idx, sample);
            }
            _ => self.samples.push(sample),
        }
    }

    /// Takes the ordered samples out and leaves the store empty.
    pub fn drain(&mut self) -> Vec<TelemetrySample> {
        std::mem::take(&mut self.samples)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
