//! SonifyApp - builder and runner for the terminal sonifier

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
};

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use rtrb::{Producer, RingBuffer};
use tracing::{error, info};

use saavy_sonify::{playback::CpalDevice, Frame, SonifyConfig, SonifyError, Sonifier};

use super::source::demo_frames;
use super::ui::{UiApp, UiMessage, UiStateInit};

/// Ring capacity for chord samples headed to the oscilloscope
const AUDIO_RING_SIZE: usize = 16_384;
/// Ring capacity for progress messages
const MESSAGE_RING_SIZE: usize = 256;

pub struct SonifyApp {
    config: SonifyConfig,
    frame_count: usize,
}

impl SonifyApp {
    pub fn new(config: SonifyConfig) -> Self {
        Self {
            config,
            frame_count: 4,
        }
    }

    /// Number of demo frames to play
    pub fn frames(mut self, count: usize) -> Self {
        self.frame_count = count;
        self
    }

    /// Run the sonifier on a worker thread and the UI on this one
    pub fn run(self) -> EyreResult<()> {
        self.config.validate().wrap_err("invalid sonifier config")?;
        let frames = demo_frames(self.frame_count).wrap_err("failed to build demo frames")?;

        let init = UiStateInit {
            sample_rate: self.config.sample_rate as f32,
            samples_per_chord: self.config.samples_per_chord,
            chord_policy: self.config.chord_policy,
            mixer_channels: self.config.mixer_channels,
            frames: frames.clone(),
        };

        let (audio_tx, audio_rx) = RingBuffer::<f32>::new(AUDIO_RING_SIZE);
        let (chord_tx, chord_rx) = RingBuffer::<UiMessage>::new(MESSAGE_RING_SIZE);
        let (mut status_tx, status_rx) = RingBuffer::<UiMessage>::new(MESSAGE_RING_SIZE);
        let stop = Arc::new(AtomicBool::new(false));

        let worker = {
            let stop = Arc::clone(&stop);
            let config = self.config.clone();
            thread::Builder::new()
                .name("sonifier".into())
                .spawn(move || {
                    let result =
                        sonify(config, &frames, audio_tx, chord_tx, &mut status_tx, &stop);
                    let status = match &result {
                        Ok(()) => UiMessage::Finished,
                        Err(err) => {
                            error!("sonifier stopped: {}", err);
                            UiMessage::Failed
                        }
                    };
                    let _ = status_tx.push(status);
                    result
                })
                .wrap_err("failed to spawn sonifier thread")?
        };

        let mut terminal = ratatui::init();
        let ui_result = UiApp::new(audio_rx, chord_rx, status_rx, init).run(&mut terminal);
        ratatui::restore();

        stop.store(true, Ordering::Relaxed);
        let worker_result = worker
            .join()
            .map_err(|_| eyre!("sonifier thread panicked"))?;

        ui_result?;
        worker_result.wrap_err("sonification failed")
    }
}

/// Worker body: owns the device for its whole lifetime.
fn sonify(
    config: SonifyConfig,
    frames: &[Frame],
    mut audio_tx: Producer<f32>,
    mut chord_tx: Producer<UiMessage>,
    status_tx: &mut Producer<UiMessage>,
    stop: &AtomicBool,
) -> Result<(), SonifyError> {
    // cpal streams are not Send, so the device is created on this thread
    let mut sonifier = Sonifier::open(CpalDevice::new(), config)?.with_observer(move |event| {
        for sample in event.buffer.left() {
            if audio_tx.push(sample).is_err() {
                break;
            }
        }
        let _ = chord_tx.push(UiMessage::Chord {
            frame: event.frame,
            column: event.column,
            peak: event.buffer.peak(),
        });
    });
    info!("sonifying {} frames", frames.len());

    for frame in frames {
        if stop.load(Ordering::Relaxed) {
            info!("stopped after {} frames", sonifier.frames_done());
            break;
        }
        let report = sonifier.sonify_frame(frame)?;
        let _ = status_tx.push(UiMessage::FrameDone {
            frame: report.frame,
            played: report.played,
            skipped: report.skipped,
        });
    }

    sonifier.close();
    Ok(())
}
