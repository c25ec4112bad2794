//! Frame -> chords -> playback.
//!
//! The [`Sonifier`] builds the note table once, then turns each frame's
//! columns into chords left to right and hands them to the playback
//! manager. Whether chords overlap is an explicit [`ChordPolicy`].

use tracing::{debug, info, warn};

use crate::{
    config::{ChordPolicy, ColumnErrorPolicy, SonifyConfig},
    error::{PlaybackError, SonifyError},
    frame::Frame,
    playback::{AudioDevice, PlaybackManager},
    synth::{ChordSynth, FrequencyTable, SampleBuffer},
    FRAME_SIZE,
};

/// A chord about to be submitted.
#[derive(Debug)]
pub struct ChordEvent<'a> {
    /// Frames sonified before this one
    pub frame: usize,
    /// Column of the frame, left to right
    pub column: usize,
    pub buffer: &'a SampleBuffer,
}

/// Outcome of one [`Sonifier::sonify_frame`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    pub frame: usize,
    pub played: usize,
    /// Columns dropped under [`ColumnErrorPolicy::SkipColumn`]
    pub skipped: usize,
}

type Observer = Box<dyn FnMut(&ChordEvent<'_>)>;

pub struct Sonifier<D: AudioDevice> {
    config: SonifyConfig,
    table: FrequencyTable,
    synth: ChordSynth,
    manager: PlaybackManager<D>,
    frames_done: usize,
    observer: Option<Observer>,
}

impl<D: AudioDevice> Sonifier<D> {
    /// Validate `config` and open `device`.
    ///
    /// Nothing is synthesized unless the device opened with float stereo.
    /// Chords are rendered at the rate the device actually runs at, with
    /// their length rescaled so each still lasts `config.chord_duration()`.
    pub fn open(device: D, config: SonifyConfig) -> Result<Self, SonifyError> {
        config.validate()?;
        let manager = PlaybackManager::open(device, &config)?;

        let sample_rate = manager.negotiated().sample_rate;
        let samples_per_chord = chord_length_at(&config, sample_rate);
        if sample_rate != config.sample_rate {
            info!(
                "rendering chords at {} Hz ({} samples) instead of {} Hz ({} samples)",
                sample_rate, samples_per_chord, config.sample_rate, config.samples_per_chord
            );
        }

        let table = FrequencyTable::build(config.anchor_frequency, config.anchor_index, FRAME_SIZE);
        let synth = ChordSynth::new(&table, samples_per_chord, sample_rate);

        Ok(Self {
            config,
            table,
            synth,
            manager,
            frames_done: 0,
            observer: None,
        })
    }

    /// Call `observer` with every chord just before it is submitted.
    pub fn with_observer(mut self, observer: impl FnMut(&ChordEvent<'_>) + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Play one frame, column by column.
    pub fn sonify_frame(&mut self, frame: &Frame) -> Result<FrameReport, SonifyError> {
        let mut report = FrameReport {
            frame: self.frames_done,
            played: 0,
            skipped: 0,
        };

        for (column_index, column) in frame.columns().enumerate() {
            let buffer = self.synth.synthesize(&column);

            if let Some(observer) = self.observer.as_mut() {
                observer(&ChordEvent {
                    frame: report.frame,
                    column: column_index,
                    buffer: &buffer,
                });
            }

            match self.manager.play(buffer) {
                Ok(_) => report.played += 1,
                Err(err)
                    if err.is_retryable()
                        && self.config.on_column_error == ColumnErrorPolicy::SkipColumn =>
                {
                    warn!(
                        "frame {} column {} skipped: {}",
                        report.frame, column_index, err
                    );
                    report.skipped += 1;
                }
                Err(err) => return Err(err.into()),
            }

            if self.config.chord_policy == ChordPolicy::Sequential {
                self.settle()?;
            }
        }

        if self.config.chord_policy == ChordPolicy::Overlapping {
            self.settle()?;
        }

        debug!(
            "frame {} done: {} chords played, {} skipped",
            report.frame, report.played, report.skipped
        );
        self.frames_done += 1;
        Ok(report)
    }

    /// Wait for silence, bounded by `silence_timeout` when one is set.
    fn settle(&mut self) -> Result<(), PlaybackError> {
        match self.config.silence_timeout {
            Some(timeout) => self.manager.wait_for_silence_within(timeout),
            None => {
                self.manager.wait_for_silence();
                Ok(())
            }
        }
    }

    /// Play frames in order, stopping at the first error.
    pub fn sonify_frames<I>(&mut self, frames: I) -> Result<Vec<FrameReport>, SonifyError>
    where
        I: IntoIterator,
        I::Item: std::borrow::Borrow<Frame>,
    {
        use std::borrow::Borrow;

        frames
            .into_iter()
            .map(|frame| self.sonify_frame(frame.borrow()))
            .collect()
    }

    /// The chords `frame` would produce, without playing them.
    pub fn render_frame(&self, frame: &Frame) -> Vec<SampleBuffer> {
        frame
            .columns()
            .map(|column| self.synth.synthesize(&column))
            .collect()
    }

    pub fn frequency_table(&self) -> &FrequencyTable {
        &self.table
    }

    pub fn synth(&self) -> &ChordSynth {
        &self.synth
    }

    pub fn config(&self) -> &SonifyConfig {
        &self.config
    }

    pub fn manager(&self) -> &PlaybackManager<D> {
        &self.manager
    }

    pub fn frames_done(&self) -> usize {
        self.frames_done
    }

    /// Stop the device and release every buffer.
    pub fn close(self) {
        self.manager.close();
    }
}

/// Samples per chord at `sample_rate`, keeping `config`'s chord duration.
fn chord_length_at(config: &SonifyConfig, sample_rate: u32) -> usize {
    if sample_rate == config.sample_rate {
        return config.samples_per_chord;
    }
    let seconds = config.chord_duration().as_secs_f64();
    ((seconds * sample_rate as f64).round() as usize).max(1)
}

/// Render `frame` offline with `config`'s note table and chord length.
pub fn render_frame(config: &SonifyConfig, frame: &Frame) -> Result<Vec<SampleBuffer>, SonifyError> {
    config.validate()?;
    let table = FrequencyTable::build(config.anchor_frequency, config.anchor_index, FRAME_SIZE);
    let synth = ChordSynth::new(&table, config.samples_per_chord, config.sample_rate);
    Ok(frame
        .columns()
        .map(|column| synth.synthesize(&column))
        .collect())
}
