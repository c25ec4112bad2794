//! Playback: the device contract and the buffer lifecycle built on it.
//!
//! [`PlaybackManager`] owns every submitted [`SampleBuffer`](crate::SampleBuffer)
//! until the device confirms it is no longer playing. Two devices implement
//! [`AudioDevice`]: [`CpalDevice`] for real output and [`SimulatedDevice`]
//! for tests and benches.

pub mod arena;
pub mod cpal_device;
pub mod device;
pub mod manager;
pub mod sim;

pub use arena::BufferId;
pub use cpal_device::CpalDevice;
pub use device::{AudioDevice, ChannelIndex, NegotiatedSpec, OutputSpec, SampleFormat};
pub use manager::{PlaybackHandle, PlaybackManager};
pub use sim::SimulatedDevice;
