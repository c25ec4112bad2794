use crate::{error::DeviceError, playback::arena::BufferId, synth::SampleBuffer, OUTPUT_CHANNELS};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Sample encodings a device may negotiate.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    F32,
    I16,
    U16,
    Other,
}

/// Index of a mixer playback channel (not a stereo channel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelIndex(pub usize);

/// What the manager asks the device for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputSpec {
    pub sample_rate: u32,
    pub format: SampleFormat,
    pub channels: u16,
    /// Frames per device callback
    pub frame_size: u32,
    /// Concurrent playback channels to mix
    pub mixer_channels: usize,
}

impl OutputSpec {
    /// Float stereo at `sample_rate`.
    pub fn float_stereo(sample_rate: u32, frame_size: u32, mixer_channels: usize) -> Self {
        Self {
            sample_rate,
            format: SampleFormat::F32,
            channels: OUTPUT_CHANNELS as u16,
            frame_size,
            mixer_channels,
        }
    }
}

/// What the device actually opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NegotiatedSpec {
    pub sample_rate: u32,
    pub format: SampleFormat,
    pub channels: u16,
}

/// A pooled-channel audio output.
///
/// The device owns a fixed set of playback channels mixed on its own
/// thread. Callers submit whole buffers and later ask which buffer, if any,
/// each channel is still playing. Completion is never pushed back; it is
/// observed by polling.
pub trait AudioDevice {
    /// Open the output. The returned spec may differ from `spec`; the caller
    /// decides whether it is acceptable.
    fn open(&mut self, spec: &OutputSpec) -> Result<NegotiatedSpec, DeviceError>;

    /// Stop playback and release the output. Idempotent.
    fn close(&mut self);

    /// Start `buffer` on any idle channel.
    ///
    /// Returns [`DeviceError::NoFreeChannel`] when every channel is busy.
    fn allocate_channel_and_play(
        &mut self,
        id: BufferId,
        buffer: &SampleBuffer,
    ) -> Result<ChannelIndex, DeviceError>;

    /// The buffer `channel` is playing right now, if any.
    fn channel_buffer(&self, channel: ChannelIndex) -> Option<BufferId>;

    fn any_channel_playing(&self) -> bool;
}

impl<D: AudioDevice + ?Sized> AudioDevice for Box<D> {
    fn open(&mut self, spec: &OutputSpec) -> Result<NegotiatedSpec, DeviceError> {
        (**self).open(spec)
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn allocate_channel_and_play(
        &mut self,
        id: BufferId,
        buffer: &SampleBuffer,
    ) -> Result<ChannelIndex, DeviceError> {
        (**self).allocate_channel_and_play(id, buffer)
    }

    fn channel_buffer(&self, channel: ChannelIndex) -> Option<BufferId> {
        (**self).channel_buffer(channel)
    }

    fn any_channel_playing(&self) -> bool {
        (**self).any_channel_playing()
    }
}
