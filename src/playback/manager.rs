//! Buffer lifecycle on top of an [`AudioDevice`].
//!
//! Every submitted buffer lives in the manager's arena until the device
//! stops reporting it on the channel it was started on. Reclamation is lazy:
//! it happens at the next submission or silence wait, on the caller's
//! thread, so buffer storage is never released from the audio callback.
//!
//! Per buffer: `Submitted -> Playing -> Finished (reclaimed)`.

use std::{
    thread,
    time::{Duration, Instant},
};

use tracing::{debug, info, warn};

use crate::{
    config::{Backpressure, SonifyConfig},
    error::{DeviceError, PlaybackError},
    playback::{
        arena::{BufferArena, BufferId},
        device::{AudioDevice, ChannelIndex, NegotiatedSpec, OutputSpec},
    },
    synth::SampleBuffer,
};

/// A buffer the device may still be reading, and where it was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackHandle {
    id: BufferId,
    channel: ChannelIndex,
}

impl PlaybackHandle {
    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn channel(&self) -> ChannelIndex {
        self.channel
    }
}

pub struct PlaybackManager<D: AudioDevice> {
    device: D,
    arena: BufferArena,
    handles: Vec<PlaybackHandle>,
    negotiated: NegotiatedSpec,
    poll_interval: Duration,
    backpressure: Backpressure,
    open: bool,
}

impl<D: AudioDevice> PlaybackManager<D> {
    /// Open `device` for float stereo output as described by `config`.
    ///
    /// Fails if the device cannot be opened or negotiates anything other
    /// than float stereo; in the latter case the device is closed again.
    pub fn open(mut device: D, config: &SonifyConfig) -> Result<Self, PlaybackError> {
        let spec = OutputSpec::float_stereo(
            config.sample_rate,
            config.device_frame_size,
            config.mixer_channels,
        );
        let negotiated = device.open(&spec).map_err(PlaybackError::Open)?;

        if negotiated.format != spec.format || negotiated.channels != spec.channels {
            device.close();
            return Err(PlaybackError::FormatMismatch {
                expected: spec.format,
                negotiated: negotiated.format,
                channels: negotiated.channels,
            });
        }
        if negotiated.sample_rate != spec.sample_rate {
            warn!(
                "device opened at {} Hz instead of {} Hz",
                negotiated.sample_rate, spec.sample_rate
            );
        }

        info!(
            "audio device open: {} Hz, {:?} x{}, {} mixer channels",
            negotiated.sample_rate, negotiated.format, negotiated.channels, spec.mixer_channels
        );

        Ok(Self {
            device,
            arena: BufferArena::new(),
            handles: Vec::new(),
            negotiated,
            poll_interval: config.poll_interval,
            backpressure: config.backpressure,
            open: true,
        })
    }

    /// Take ownership of `buffer` and start it on a free channel.
    ///
    /// Finished buffers are reclaimed first. When every channel is busy the
    /// configured [`Backpressure`] decides between waiting for a channel and
    /// failing with the retryable [`PlaybackError::ChannelsExhausted`].
    pub fn play(&mut self, buffer: SampleBuffer) -> Result<BufferId, PlaybackError> {
        self.reclaim_finished();

        let id = self.arena.insert(buffer.clone());
        let started = Instant::now();
        let mut warned = false;

        loop {
            match self.device.allocate_channel_and_play(id, &buffer) {
                Ok(channel) => {
                    self.handles.push(PlaybackHandle { id, channel });
                    debug!(
                        "buffer {}:{} playing on channel {} ({} tracked)",
                        id.index(),
                        id.generation(),
                        channel.0,
                        self.handles.len()
                    );
                    return Ok(id);
                }
                Err(DeviceError::NoFreeChannel) => {
                    let waited = started.elapsed();
                    match self.backpressure {
                        Backpressure::Block { timeout } if waited < timeout => {
                            if !warned {
                                warn!("all playback channels busy, waiting for one to free");
                                warned = true;
                            }
                            thread::sleep(self.poll_interval);
                            self.reclaim_finished();
                        }
                        _ => {
                            // Never started, so nothing else can be reading it
                            self.arena.remove(id);
                            return Err(PlaybackError::ChannelsExhausted { waited });
                        }
                    }
                }
                Err(err) => {
                    self.arena.remove(id);
                    return Err(PlaybackError::Device(err));
                }
            }
        }
    }

    /// Release every buffer whose channel no longer reports it.
    ///
    /// A channel reporting a different buffer was reassigned after ours
    /// ended, which counts as finished too. Returns how many were released.
    pub fn reclaim_finished(&mut self) -> usize {
        let before = self.handles.len();
        let device = &self.device;
        let arena = &mut self.arena;

        self.handles.retain(|handle| {
            if device.channel_buffer(handle.channel) == Some(handle.id) {
                return true;
            }
            arena.remove(handle.id);
            false
        });

        let reclaimed = before - self.handles.len();
        if reclaimed > 0 {
            debug!(
                "reclaimed {} finished buffers ({} still tracked)",
                reclaimed,
                self.handles.len()
            );
        }
        reclaimed
    }

    /// Block until no channel is playing, then reclaim.
    pub fn wait_for_silence(&mut self) {
        while self.device.any_channel_playing() {
            thread::sleep(self.poll_interval);
        }
        self.reclaim_finished();
    }

    /// Like [`wait_for_silence`](Self::wait_for_silence), but gives up after
    /// `timeout` with [`PlaybackError::StillPlaying`]. Finished buffers are
    /// reclaimed either way; buffers still reported playing stay tracked.
    pub fn wait_for_silence_within(&mut self, timeout: Duration) -> Result<(), PlaybackError> {
        let started = Instant::now();
        while self.device.any_channel_playing() {
            let waited = started.elapsed();
            if waited >= timeout {
                self.reclaim_finished();
                warn!(
                    "device still playing after {:?} ({} buffers tracked)",
                    waited,
                    self.handles.len()
                );
                return Err(PlaybackError::StillPlaying { waited });
            }
            thread::sleep(self.poll_interval);
        }
        self.reclaim_finished();
        Ok(())
    }

    /// Number of buffers still held for the device.
    pub fn tracked(&self) -> usize {
        self.handles.len()
    }

    pub fn is_tracked(&self, id: BufferId) -> bool {
        self.handles.iter().any(|h| h.id == id)
    }

    pub fn handles(&self) -> &[PlaybackHandle] {
        &self.handles
    }

    pub fn negotiated(&self) -> NegotiatedSpec {
        self.negotiated
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// Stop the device, then release every remaining buffer.
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;

        // The device must stop reading before storage goes away
        self.device.close();

        if !self.handles.is_empty() {
            warn!(
                "closing with {} buffers still tracked; releasing them",
                self.handles.len()
            );
        }
        self.handles.clear();
        self.arena.clear();
        info!("audio device closed");
    }
}

impl<D: AudioDevice> Drop for PlaybackManager<D> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
