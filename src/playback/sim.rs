//! Deterministic in-memory device for tests and benches.
//!
//! Channels advance only when told to (or on every poll, if configured), so
//! a test controls exactly when each buffer finishes. The device keeps weak
//! references to buffer storage: if storage disappears while a channel is
//! still reading it, the read is recorded as a [`Violation`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::{
    error::DeviceError,
    playback::{
        arena::BufferId,
        device::{AudioDevice, ChannelIndex, NegotiatedSpec, OutputSpec, SampleFormat},
    },
    synth::SampleBuffer,
    OUTPUT_CHANNELS,
};

/// How simulated time moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Only through [`SimulatedDevice::advance`].
    Manual,
    /// By this many frames on every silence poll and every refused start.
    PerPoll(usize),
}

/// A buffer read after its storage was released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Violation {
    pub id: BufferId,
    pub channel: ChannelIndex,
}

struct Voice {
    id: BufferId,
    storage: Weak<[f32]>,
    position: usize,
    frames: usize,
}

struct SimState {
    channels: Vec<Option<Voice>>,
    channel_override: Option<usize>,
    rate_override: Option<u32>,
    format: SampleFormat,
    stereo_channels: u16,
    open_error: Option<DeviceError>,
    advance: Advance,
    open: bool,
    opened_with: Option<OutputSpec>,
    submissions: usize,
    closes: usize,
    violations: Vec<Violation>,
}

impl SimState {
    fn step(&mut self, frames: usize) {
        for (index, slot) in self.channels.iter_mut().enumerate() {
            let Some(voice) = slot else { continue };
            if voice.storage.upgrade().is_none() {
                self.violations.push(Violation {
                    id: voice.id,
                    channel: ChannelIndex(index),
                });
            }
            voice.position += frames;
            if voice.position >= voice.frames {
                *slot = None;
            }
        }
    }

    fn auto_step(&mut self) {
        if let Advance::PerPoll(frames) = self.advance {
            self.step(frames);
        }
    }
}

/// Shared-state simulated device. Clones observe the same device.
#[derive(Clone)]
pub struct SimulatedDevice {
    state: Arc<Mutex<SimState>>,
}

impl Default for SimulatedDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedDevice {
    /// Float stereo device with as many channels as the caller asks for.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                channels: Vec::new(),
                channel_override: None,
                rate_override: None,
                format: SampleFormat::F32,
                stereo_channels: OUTPUT_CHANNELS as u16,
                open_error: None,
                advance: Advance::Manual,
                open: false,
                opened_with: None,
                submissions: 0,
                closes: 0,
                violations: Vec::new(),
            })),
        }
    }

    /// Expose exactly `count` channels regardless of the requested spec.
    pub fn with_channels(self, count: usize) -> Self {
        self.state().channel_override = Some(count);
        self
    }

    /// Open at `sample_rate` whatever rate is requested.
    pub fn with_sample_rate(self, sample_rate: u32) -> Self {
        self.state().rate_override = Some(sample_rate);
        self
    }

    /// Negotiate `format` instead of float.
    pub fn with_format(self, format: SampleFormat) -> Self {
        self.state().format = format;
        self
    }

    pub fn with_output_channels(self, channels: u16) -> Self {
        self.state().stereo_channels = channels;
        self
    }

    /// Fail every `open` with `error`.
    pub fn failing_open(self, error: DeviceError) -> Self {
        self.state().open_error = Some(error);
        self
    }

    pub fn with_advance(self, advance: Advance) -> Self {
        self.state().advance = advance;
        self
    }

    /// Play `frames` frames on every busy channel.
    pub fn advance(&self, frames: usize) {
        self.state().step(frames);
    }

    /// Run every busy channel to its end.
    pub fn finish_all(&self) {
        self.advance(usize::MAX / 2);
    }

    pub fn is_open(&self) -> bool {
        self.state().open
    }

    pub fn opened_with(&self) -> Option<OutputSpec> {
        self.state().opened_with
    }

    /// Buffers accepted so far.
    pub fn submissions(&self) -> usize {
        self.state().submissions
    }

    pub fn closes(&self) -> usize {
        self.state().closes
    }

    pub fn active_channels(&self) -> usize {
        self.state().channels.iter().filter(|c| c.is_some()).count()
    }

    pub fn violations(&self) -> Vec<Violation> {
        self.state().violations.clone()
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AudioDevice for SimulatedDevice {
    fn open(&mut self, spec: &OutputSpec) -> Result<NegotiatedSpec, DeviceError> {
        let mut state = self.state();
        if let Some(err) = state.open_error.clone() {
            return Err(err);
        }
        let count = state.channel_override.unwrap_or(spec.mixer_channels);
        state.channels = (0..count).map(|_| None).collect();
        state.open = true;
        state.opened_with = Some(*spec);
        Ok(NegotiatedSpec {
            sample_rate: state.rate_override.unwrap_or(spec.sample_rate),
            format: state.format,
            channels: state.stereo_channels,
        })
    }

    fn close(&mut self) {
        let mut state = self.state();
        if state.open {
            state.closes += 1;
        }
        state.open = false;
        state.channels.iter_mut().for_each(|c| *c = None);
    }

    fn allocate_channel_and_play(
        &mut self,
        id: BufferId,
        buffer: &SampleBuffer,
    ) -> Result<ChannelIndex, DeviceError> {
        let mut state = self.state();
        if !state.open {
            return Err(DeviceError::NotOpen);
        }
        let Some(index) = state.channels.iter().position(|c| c.is_none()) else {
            state.auto_step();
            return Err(DeviceError::NoFreeChannel);
        };
        state.channels[index] = Some(Voice {
            id,
            storage: Arc::downgrade(buffer.storage()),
            position: 0,
            frames: buffer.frames(),
        });
        state.submissions += 1;
        Ok(ChannelIndex(index))
    }

    fn channel_buffer(&self, channel: ChannelIndex) -> Option<BufferId> {
        self.state()
            .channels
            .get(channel.0)
            .and_then(|c| c.as_ref())
            .map(|voice| voice.id)
    }

    fn any_channel_playing(&self) -> bool {
        let mut state = self.state();
        let playing = state.channels.iter().any(|c| c.is_some());
        if playing {
            state.auto_step();
        }
        playing
    }
}
