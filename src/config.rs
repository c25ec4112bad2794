//! Sonifier configuration.
//!
//! Defaults reproduce the classic setup: 8 kHz output, 500-sample chords,
//! concert A at table position 32, eight mixer channels and a 10 ms poll.

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{error::ConfigError, FRAME_SIZE};

/// How consecutive chords of a frame relate in time.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChordPolicy {
    /// Wait for silence after every chord, so chords never overlap.
    #[default]
    Sequential,
    /// Submit chords back to back and let the mixer overlap them.
    /// The pipeline still waits for silence once at the end of a frame.
    Overlapping,
}

/// What `play` does when every mixer channel is busy.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backpressure {
    /// Poll, reclaim and retry until a channel frees or `timeout` passes.
    Block { timeout: Duration },
    /// Return `ChannelsExhausted` immediately.
    Fail,
}

impl Default for Backpressure {
    fn default() -> Self {
        Backpressure::Block {
            timeout: Duration::from_secs(2),
        }
    }
}

/// What the pipeline does when one column cannot be played.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnErrorPolicy {
    #[default]
    Abort,
    /// Skip retryable failures and carry on with the next column.
    SkipColumn,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SonifyConfig {
    /// Output sample rate in Hz
    pub sample_rate: u32,
    /// Samples per channel in one chord
    pub samples_per_chord: usize,
    /// Frequency pinned at `anchor_index` (Hz)
    pub anchor_frequency: f64,
    /// Note table position holding `anchor_frequency`
    pub anchor_index: usize,
    /// Frames per device callback
    pub device_frame_size: u32,
    /// Concurrent playback channels in the mixer
    pub mixer_channels: usize,
    /// Sleep between device polls while waiting
    pub poll_interval: Duration,
    pub chord_policy: ChordPolicy,
    pub backpressure: Backpressure,
    pub on_column_error: ColumnErrorPolicy,
    /// Longest wait for silence before giving up; `None` waits forever
    pub silence_timeout: Option<Duration>,
}

impl Default for SonifyConfig {
    fn default() -> Self {
        Self {
            sample_rate: 8_000,
            samples_per_chord: 500,
            anchor_frequency: 440.0,
            anchor_index: 32,
            device_frame_size: 1024,
            mixer_channels: 8,
            poll_interval: Duration::from_millis(10),
            chord_policy: ChordPolicy::default(),
            backpressure: Backpressure::default(),
            on_column_error: ColumnErrorPolicy::default(),
            silence_timeout: None,
        }
    }
}

impl SonifyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_samples_per_chord(mut self, samples: usize) -> Self {
        self.samples_per_chord = samples;
        self
    }

    /// Pin `frequency` at table position `index`.
    pub fn with_anchor(mut self, frequency: f64, index: usize) -> Self {
        self.anchor_frequency = frequency;
        self.anchor_index = index;
        self
    }

    pub fn with_device_frame_size(mut self, frames: u32) -> Self {
        self.device_frame_size = frames;
        self
    }

    pub fn with_mixer_channels(mut self, channels: usize) -> Self {
        self.mixer_channels = channels;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_chord_policy(mut self, policy: ChordPolicy) -> Self {
        self.chord_policy = policy;
        self
    }

    pub fn with_backpressure(mut self, backpressure: Backpressure) -> Self {
        self.backpressure = backpressure;
        self
    }

    pub fn with_column_error_policy(mut self, policy: ColumnErrorPolicy) -> Self {
        self.on_column_error = policy;
        self
    }

    /// Give up waiting for silence after `timeout`.
    pub fn with_silence_timeout(mut self, timeout: Duration) -> Self {
        self.silence_timeout = Some(timeout);
        self
    }

    /// Length of one chord in seconds.
    pub fn chord_duration(&self) -> Duration {
        Duration::from_secs_f64(self.samples_per_chord as f64 / self.sample_rate.max(1) as f64)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 {
            return Err(ConfigError::ZeroSampleRate);
        }
        if self.samples_per_chord == 0 {
            return Err(ConfigError::ZeroChordLength);
        }
        if self.anchor_index >= FRAME_SIZE {
            return Err(ConfigError::AnchorOutOfRange {
                index: self.anchor_index,
                size: FRAME_SIZE,
            });
        }
        if !self.anchor_frequency.is_finite() || self.anchor_frequency <= 0.0 {
            return Err(ConfigError::InvalidAnchorFrequency(self.anchor_frequency));
        }
        if self.mixer_channels == 0 {
            return Err(ConfigError::NoMixerChannels);
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }
        if self.silence_timeout.is_some_and(|t| t.is_zero()) {
            return Err(ConfigError::ZeroSilenceTimeout);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SonifyConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.sample_rate, 8_000);
        assert_eq!(config.anchor_index, 32);
    }

    #[test]
    fn chord_duration_follows_rate() {
        let config = SonifyConfig::new().with_sample_rate(8_000);
        assert_eq!(config.chord_duration(), Duration::from_millis(62) + Duration::from_micros(500));
    }

    #[test]
    fn rejects_anchor_past_table() {
        let config = SonifyConfig::new().with_anchor(440.0, 64);
        assert_eq!(
            config.validate(),
            Err(ConfigError::AnchorOutOfRange { index: 64, size: 64 })
        );
    }

    #[test]
    fn rejects_degenerate_values() {
        assert_eq!(
            SonifyConfig::new().with_sample_rate(0).validate(),
            Err(ConfigError::ZeroSampleRate)
        );
        assert_eq!(
            SonifyConfig::new().with_samples_per_chord(0).validate(),
            Err(ConfigError::ZeroChordLength)
        );
        assert_eq!(
            SonifyConfig::new().with_mixer_channels(0).validate(),
            Err(ConfigError::NoMixerChannels)
        );
        assert_eq!(
            SonifyConfig::new().with_poll_interval(Duration::ZERO).validate(),
            Err(ConfigError::ZeroPollInterval)
        );
        assert_eq!(
            SonifyConfig::new().with_silence_timeout(Duration::ZERO).validate(),
            Err(ConfigError::ZeroSilenceTimeout)
        );
        assert!(matches!(
            SonifyConfig::new().with_anchor(f64::NAN, 32).validate(),
            Err(ConfigError::InvalidAnchorFrequency(_))
        ));
    }
}
