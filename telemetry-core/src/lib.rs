// Shared GT7 telemetry decryption, decoding, and lap segmentation logic.

pub mod crypto;
pub mod layout;
pub mod model;
pub mod parser;
pub mod segmenter;
pub mod store;
pub mod track;

pub use crypto::{decrypt_packet, DecryptError};
pub use model::{Lap, TelemetrySample, TrackOutline, TrackPoint};
pub use parser::{decode_sample, DecodeError};
pub use segmenter::{LapSegmenter, SegmenterConfig};
pub use store::SampleStore;
pub use track::{OutlineConfig, TrackRecorder};
