//! Pooled-channel mixer on a cpal output stream.
//!
//! The control side claims a channel by publishing the buffer's id in that
//! channel's slot, then hands the samples to the audio callback over an rtrb
//! ring. The callback mixes every busy channel and, when a buffer runs out,
//! drops its reference to the samples before clearing the slot. The playback
//! manager still holds the buffer at that point, so the final release always
//! happens on the caller's thread.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rtrb::{Consumer, Producer, RingBuffer};
use tracing::{debug, error, info};

use crate::{
    error::DeviceError,
    playback::{
        arena::BufferId,
        device::{AudioDevice, ChannelIndex, NegotiatedSpec, OutputSpec, SampleFormat},
    },
    synth::SampleBuffer,
};

/// 0 = idle, otherwise `BufferId::to_bits` of the buffer playing.
#[derive(Default)]
struct ChannelSlot {
    active: AtomicU64,
}

enum MixerCommand {
    Start {
        channel: usize,
        id_bits: u64,
        samples: Arc<[f32]>,
    },
}

struct MixerVoice {
    id_bits: u64,
    samples: Arc<[f32]>,
    position: usize,
}

/// Audio-thread half: owns the voices, never allocates.
struct Mixer {
    commands: Consumer<MixerCommand>,
    voices: Vec<Option<MixerVoice>>,
    slots: Arc<[ChannelSlot]>,
}

impl Mixer {
    fn new(commands: Consumer<MixerCommand>, slots: Arc<[ChannelSlot]>) -> Self {
        Self {
            commands,
            voices: (0..slots.len()).map(|_| None).collect(),
            slots,
        }
    }

    fn render(&mut self, out: &mut [f32]) {
        while let Ok(MixerCommand::Start {
            channel,
            id_bits,
            samples,
        }) = self.commands.pop()
        {
            if let Some(voice) = self.voices.get_mut(channel) {
                *voice = Some(MixerVoice {
                    id_bits,
                    samples,
                    position: 0,
                });
            }
        }

        out.fill(0.0);

        for (index, slot) in self.voices.iter_mut().enumerate() {
            let Some(voice) = slot else { continue };

            let remaining = &voice.samples[voice.position..];
            let n = remaining.len().min(out.len());
            for (o, &s) in out[..n].iter_mut().zip(remaining) {
                *o += s;
            }
            voice.position += n;

            if voice.position >= voice.samples.len() {
                let id_bits = voice.id_bits;
                // Release our reference before the slot reads as idle
                *slot = None;
                let _ = self.slots[index].active.compare_exchange(
                    id_bits,
                    0,
                    Ordering::AcqRel,
                    Ordering::Relaxed,
                );
            }
        }

        for sample in out.iter_mut() {
            *sample = sample.clamp(-1.0, 1.0);
        }
    }
}

/// Default cpal output device driven as a channel-pooled mixer.
pub struct CpalDevice {
    stream: Option<cpal::Stream>,
    commands: Option<Producer<MixerCommand>>,
    slots: Arc<[ChannelSlot]>,
}

impl Default for CpalDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl CpalDevice {
    pub fn new() -> Self {
        Self {
            stream: None,
            commands: None,
            slots: Arc::from(Vec::new()),
        }
    }
}

fn sample_format(format: cpal::SampleFormat) -> SampleFormat {
    match format {
        cpal::SampleFormat::F32 => SampleFormat::F32,
        cpal::SampleFormat::I16 => SampleFormat::I16,
        cpal::SampleFormat::U16 => SampleFormat::U16,
        _ => SampleFormat::Other,
    }
}

impl AudioDevice for CpalDevice {
    fn open(&mut self, spec: &OutputSpec) -> Result<NegotiatedSpec, DeviceError> {
        self.close();

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(DeviceError::NoOutputDevice)?;

        let ranges: Vec<_> = device
            .supported_output_configs()
            .map_err(|e| DeviceError::Unavailable(e.to_string()))?
            .collect();

        let float_stereo = |range: &&cpal::SupportedStreamConfigRange| {
            range.sample_format() == cpal::SampleFormat::F32 && range.channels() == spec.channels
        };
        let chosen = ranges
            .iter()
            .filter(float_stereo)
            .find(|range| {
                range.min_sample_rate().0 <= spec.sample_rate
                    && spec.sample_rate <= range.max_sample_rate().0
            })
            .or_else(|| ranges.iter().find(float_stereo));

        let Some(range) = chosen else {
            // Report what the device would give us and let the caller refuse it
            let fallback = device
                .default_output_config()
                .map_err(|e| DeviceError::Unavailable(e.to_string()))?;
            return Ok(NegotiatedSpec {
                sample_rate: fallback.sample_rate().0,
                format: sample_format(fallback.sample_format()),
                channels: fallback.channels(),
            });
        };

        let rate = spec
            .sample_rate
            .clamp(range.min_sample_rate().0, range.max_sample_rate().0);
        let supported = range.clone().with_sample_rate(cpal::SampleRate(rate));
        let mut config = supported.config();
        config.buffer_size = match supported.buffer_size() {
            cpal::SupportedBufferSize::Range { min, max } => {
                cpal::BufferSize::Fixed(spec.frame_size.clamp(*min, *max))
            }
            cpal::SupportedBufferSize::Unknown => cpal::BufferSize::Default,
        };

        let slots: Arc<[ChannelSlot]> = (0..spec.mixer_channels)
            .map(|_| ChannelSlot::default())
            .collect();
        let (producer, consumer) = RingBuffer::new(spec.mixer_channels.max(1));
        let mut mixer = Mixer::new(consumer, Arc::clone(&slots));

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| mixer.render(data),
                |err| error!("audio stream error: {}", err),
                None,
            )
            .map_err(|e| DeviceError::Stream(e.to_string()))?;
        stream
            .play()
            .map_err(|e| DeviceError::Stream(e.to_string()))?;

        info!(
            "cpal stream on {:?}: {} Hz, buffer {:?}",
            device.name().unwrap_or_default(),
            rate,
            config.buffer_size
        );

        self.stream = Some(stream);
        self.commands = Some(producer);
        self.slots = slots;

        Ok(NegotiatedSpec {
            sample_rate: rate,
            format: SampleFormat::F32,
            channels: config.channels,
        })
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            // Pausing is best effort; dropping the stream stops it regardless
            let _ = stream.pause();
            drop(stream);
            debug!("cpal stream stopped");
        }
        self.commands = None;
        for slot in self.slots.iter() {
            slot.active.store(0, Ordering::Release);
        }
    }

    fn allocate_channel_and_play(
        &mut self,
        id: BufferId,
        buffer: &SampleBuffer,
    ) -> Result<ChannelIndex, DeviceError> {
        let commands = self.commands.as_mut().ok_or(DeviceError::NotOpen)?;
        let id_bits = id.to_bits();

        let mut claimed = None;
        for (index, slot) in self.slots.iter().enumerate() {
            if slot
                .active
                .compare_exchange(0, id_bits, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                claimed = Some(index);
                break;
            }
        }
        let channel = claimed.ok_or(DeviceError::NoFreeChannel)?;

        let command = MixerCommand::Start {
            channel,
            id_bits,
            samples: Arc::clone(buffer.storage()),
        };
        if commands.push(command).is_err() {
            self.slots[channel].active.store(0, Ordering::Release);
            return Err(DeviceError::Stream("mixer command queue full".into()));
        }

        Ok(ChannelIndex(channel))
    }

    fn channel_buffer(&self, channel: ChannelIndex) -> Option<BufferId> {
        let bits = self.slots.get(channel.0)?.active.load(Ordering::Acquire);
        BufferId::from_bits(bits)
    }

    fn any_channel_playing(&self) -> bool {
        self.slots
            .iter()
            .any(|slot| slot.active.load(Ordering::Acquire) != 0)
    }
}

impl Drop for CpalDevice {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mixer(channels: usize) -> (Producer<MixerCommand>, Mixer, Arc<[ChannelSlot]>) {
        let slots: Arc<[ChannelSlot]> = (0..channels).map(|_| ChannelSlot::default()).collect();
        let (producer, consumer) = RingBuffer::new(channels);
        (producer, Mixer::new(consumer, Arc::clone(&slots)), slots)
    }

    fn start(
        producer: &mut Producer<MixerCommand>,
        slots: &[ChannelSlot],
        channel: usize,
        id_bits: u64,
        samples: &Arc<[f32]>,
    ) {
        slots[channel].active.store(id_bits, Ordering::Release);
        assert!(producer
            .push(MixerCommand::Start {
                channel,
                id_bits,
                samples: Arc::clone(samples),
            })
            .is_ok());
    }

    #[test]
    fn mixes_and_clears_finished_channels() {
        let (mut producer, mut mixer, slots) = mixer(2);
        let a: Arc<[f32]> = Arc::from(vec![0.25; 4]);
        let b: Arc<[f32]> = Arc::from(vec![0.5; 8]);
        start(&mut producer, &slots, 0, 1, &a);
        start(&mut producer, &slots, 1, 2, &b);

        let mut out = [0.0; 4];
        mixer.render(&mut out);
        assert_eq!(out, [0.75; 4]);
        assert_eq!(slots[0].active.load(Ordering::Acquire), 0);
        assert_eq!(slots[1].active.load(Ordering::Acquire), 2);
        // The mixer let go of `a` before the slot went idle
        assert_eq!(Arc::strong_count(&a), 1);

        mixer.render(&mut out);
        assert_eq!(out, [0.5; 4]);
        assert_eq!(slots[1].active.load(Ordering::Acquire), 0);

        mixer.render(&mut out);
        assert_eq!(out, [0.0; 4]);
    }

    #[test]
    fn output_is_clamped() {
        let (mut producer, mut mixer, slots) = mixer(2);
        let loud: Arc<[f32]> = Arc::from(vec![0.8; 2]);
        start(&mut producer, &slots, 0, 1, &loud);
        start(&mut producer, &slots, 1, 2, &loud);

        let mut out = [0.0; 2];
        mixer.render(&mut out);
        assert_eq!(out, [1.0, 1.0]);
    }

    #[test]
    fn closed_device_reports_idle() {
        let device = CpalDevice::new();
        assert!(!device.any_channel_playing());
        assert_eq!(device.channel_buffer(ChannelIndex(0)), None);
    }
}
