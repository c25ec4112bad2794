use std::{sync::Arc, time::Duration};

use crate::OUTPUT_CHANNELS;

/// One chord worth of interleaved stereo samples.
///
/// Storage is shared (`Arc<[f32]>`) so a mixer can read it while the
/// playback manager keeps ownership; clones are cheap.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    samples: Arc<[f32]>,
    sample_rate: u32,
}

impl SampleBuffer {
    /// Interleave a mono signal into both stereo channels.
    pub fn from_mono(mono: &[f32], sample_rate: u32) -> Self {
        let samples: Vec<f32> = mono
            .iter()
            .flat_map(|&s| std::iter::repeat(s).take(OUTPUT_CHANNELS))
            .collect();
        Self {
            samples: samples.into(),
            sample_rate,
        }
    }

    /// Wrap already-interleaved stereo samples.
    ///
    /// # Panics
    /// If `samples.len()` is not a whole number of stereo frames.
    pub fn from_interleaved(samples: Vec<f32>, sample_rate: u32) -> Self {
        assert_eq!(
            samples.len() % OUTPUT_CHANNELS,
            0,
            "interleaved buffer must hold whole frames"
        );
        Self {
            samples: samples.into(),
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Shared handle to the storage.
    pub fn storage(&self) -> &Arc<[f32]> {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        OUTPUT_CHANNELS
    }

    /// Samples per channel.
    pub fn frames(&self) -> usize {
        self.samples.len() / OUTPUT_CHANNELS
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frames() as f64 / self.sample_rate.max(1) as f64)
    }

    /// Left channel only.
    pub fn left(&self) -> impl Iterator<Item = f32> + '_ {
        self.samples.iter().step_by(OUTPUT_CHANNELS).copied()
    }

    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()))
    }

    pub fn is_silent(&self) -> bool {
        self.samples.iter().all(|&s| s == 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mono_is_duplicated() {
        let buffer = SampleBuffer::from_mono(&[0.25, -0.5], 8_000);
        assert_eq!(buffer.samples(), &[0.25, 0.25, -0.5, -0.5]);
        assert_eq!(buffer.frames(), 2);
        assert_eq!(buffer.left().collect::<Vec<_>>(), vec![0.25, -0.5]);
        assert_eq!(buffer.peak(), 0.5);
    }

    #[test]
    fn duration_of_default_chord() {
        let buffer = SampleBuffer::from_mono(&[0.0; 500], 8_000);
        assert_eq!(buffer.duration(), Duration::from_micros(62_500));
        assert!(buffer.is_silent());
    }

    #[test]
    fn clones_share_storage() {
        let buffer = SampleBuffer::from_interleaved(vec![0.1; 8], 44_100);
        let clone = buffer.clone();
        assert!(Arc::ptr_eq(buffer.storage(), clone.storage()));
    }
}
