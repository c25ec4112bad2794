//! Note table and chord synthesis.
//!
//! Pure, allocation-at-construction code: nothing here touches the audio
//! device or can fail once inputs have been validated.

/// Interleaved stereo chord storage.
pub mod buffer;
/// Column to chord conversion.
pub mod chord;
/// Equal-tempered note table.
pub mod frequency;

pub use buffer::SampleBuffer;
pub use chord::ChordSynth;
pub use frequency::FrequencyTable;
