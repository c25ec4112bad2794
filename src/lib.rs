pub mod config;
pub mod error;
pub mod frame; // 64x64 intensity grids handed over by the image side
pub mod pipeline; // Frame -> chords -> playback
pub mod playback; // Device contract, buffer lifecycle, mixers
pub mod synth; // Note table and chord synthesis

pub use config::{Backpressure, ChordPolicy, ColumnErrorPolicy, SonifyConfig};
pub use error::{ConfigError, DeviceError, FrameError, PlaybackError, SonifyError};
pub use frame::Frame;
pub use pipeline::{ChordEvent, FrameReport, Sonifier};
pub use synth::{ChordSynth, FrequencyTable, SampleBuffer};

/// Rows and columns of every frame, and entries in the note table.
pub const FRAME_SIZE: usize = 64;
/// Interleaved output channels of every chord buffer (stereo).
pub const OUTPUT_CHANNELS: usize = 2;
