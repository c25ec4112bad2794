//! Error types for every layer of the sonifier.
//!
//! Synthesis itself is total and has no error path. Everything that can fail
//! does so at a boundary: configuration, frame intake, or the audio device.

use std::time::Duration;

use crate::playback::SampleFormat;

/// Rejected [`SonifyConfig`](crate::SonifyConfig) values.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("sample rate must be non-zero")]
    ZeroSampleRate,

    #[error("samples per chord must be non-zero")]
    ZeroChordLength,

    #[error("anchor index {index} is outside the {size}-entry note table")]
    AnchorOutOfRange { index: usize, size: usize },

    #[error("anchor frequency {0} Hz must be positive and finite")]
    InvalidAnchorFrequency(f64),

    #[error("the mixer needs at least one playback channel")]
    NoMixerChannels,

    #[error("poll interval must be non-zero")]
    ZeroPollInterval,

    #[error("silence timeout must be non-zero")]
    ZeroSilenceTimeout,
}

/// Frames that cannot be handed to the synthesizer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FrameError {
    #[error("expected {expected} samples, got {actual}")]
    WrongSize { expected: usize, actual: usize },

    #[error("sample at row {row}, column {col} is not finite")]
    NonFinite { row: usize, col: usize },
}

/// Failures reported by an [`AudioDevice`](crate::playback::AudioDevice).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DeviceError {
    /// Every mixer channel is busy. Transient: channels free up as chords end.
    #[error("no free playback channel")]
    NoFreeChannel,

    #[error("device is not open")]
    NotOpen,

    #[error("no audio output device available")]
    NoOutputDevice,

    #[error("audio device unavailable: {0}")]
    Unavailable(String),

    #[error("audio stream failure: {0}")]
    Stream(String),
}

/// Failures surfaced by the [`PlaybackManager`](crate::playback::PlaybackManager).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlaybackError {
    #[error("could not open audio device")]
    Open(#[source] DeviceError),

    #[error("device negotiated {negotiated:?} x{channels}, expected {expected:?} stereo")]
    FormatMismatch {
        expected: SampleFormat,
        negotiated: SampleFormat,
        channels: u16,
    },

    /// Retryable: the caller may wait for silence and submit again.
    #[error("all playback channels stayed busy for {waited:?}")]
    ChannelsExhausted { waited: Duration },

    #[error("audio device rejected playback")]
    Device(#[source] DeviceError),

    /// The device kept reporting busy channels; it has likely stalled.
    #[error("device still playing after {waited:?}")]
    StillPlaying { waited: Duration },
}

impl PlaybackError {
    /// Whether the same submission may succeed later without intervention.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PlaybackError::ChannelsExhausted { .. })
    }
}

/// Top-level error of the [`Sonifier`](crate::Sonifier).
///
/// Frames are checked when they are built, so a bad frame surfaces as a
/// [`FrameError`] from the constructor and never reaches the pipeline.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SonifyError {
    #[error("invalid configuration")]
    Config(#[from] ConfigError),

    #[error("playback failed")]
    Playback(#[from] PlaybackError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_exhaustion_is_retryable() {
        let exhausted = PlaybackError::ChannelsExhausted {
            waited: Duration::from_millis(20),
        };
        assert!(exhausted.is_retryable());
        assert!(!PlaybackError::Open(DeviceError::NoOutputDevice).is_retryable());
        assert!(!PlaybackError::Device(DeviceError::NoFreeChannel).is_retryable());
        let stalled = PlaybackError::StillPlaying {
            waited: Duration::from_secs(2),
        };
        assert!(!stalled.is_retryable());
    }

    #[test]
    fn format_mismatch_names_both_formats() {
        let err = PlaybackError::FormatMismatch {
            expected: SampleFormat::F32,
            negotiated: SampleFormat::I16,
            channels: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("I16"), "{msg}");
        assert!(msg.contains("F32"), "{msg}");
    }
}
