use std::f64::consts::TAU;

use crate::{
    frame::Column,
    synth::{buffer::SampleBuffer, frequency::FrequencyTable},
    FRAME_SIZE,
};

/*
Chord Synthesis
===============

A column of 64 intensities becomes one chord: every row contributes a sine
at its note, scaled by the row's intensity, and the sum is divided by the
row count.

  signal[i] = (1/64) * sum over rows r of  v[r] * sin(2π · f[m(r)] · t[i])
  t[i]      = (i + 1) / sample_rate

Dividing by the constant row count (not by the sum of intensities) keeps
the output inside [-1, 1] for intensities in [-1, 1], and an all-zero
column is plain silence with nothing to divide by.

The mono signal is then duplicated into both channels of an interleaved
stereo buffer.
*/

/// Turns frame columns into chord buffers.
///
/// Holds its own copy of the note table and a precomputed time vector, so
/// every chord of a run uses identical mappings.
#[derive(Debug, Clone)]
pub struct ChordSynth {
    /// Note frequency for each row, top row first
    row_frequencies: [f64; FRAME_SIZE],
    /// t[i] = (i + 1) / sample_rate
    times: Vec<f64>,
    sample_rate: u32,
}

impl ChordSynth {
    /// # Panics
    /// If `table` does not hold exactly 64 notes or `sample_rate` is zero.
    pub fn new(table: &FrequencyTable, samples_per_chord: usize, sample_rate: u32) -> Self {
        assert!(sample_rate > 0, "sample rate must be non-zero");
        assert!(
            table.len() == FRAME_SIZE,
            "note table has {} entries, need {FRAME_SIZE}",
            table.len()
        );

        let notes = table.as_slice();
        let row_frequencies = std::array::from_fn(|row| notes[FRAME_SIZE - 1 - row]);
        let times = (0..samples_per_chord)
            .map(|i| (i + 1) as f64 / sample_rate as f64)
            .collect();

        Self {
            row_frequencies,
            times,
            sample_rate,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn samples_per_chord(&self) -> usize {
        self.times.len()
    }

    /// Frequency voicing `row`.
    pub fn row_frequency(&self, row: usize) -> Option<f64> {
        self.row_frequencies.get(row).copied()
    }

    /// Mono chord for `column`.
    pub fn synthesize_mono(&self, column: &Column) -> Vec<f32> {
        let mut signal = vec![0.0f64; self.times.len()];

        for (&value, &freq) in column.iter().zip(&self.row_frequencies) {
            // Silent rows add nothing; skip the sines
            if value == 0.0 {
                continue;
            }
            let value = value as f64;
            let omega = TAU * freq;
            for (s, &t) in signal.iter_mut().zip(&self.times) {
                *s += value * (omega * t).sin();
            }
        }

        let gain = 1.0 / FRAME_SIZE as f64;
        signal.into_iter().map(|s| (s * gain) as f32).collect()
    }

    /// Interleaved stereo chord for `column`.
    pub fn synthesize(&self, column: &Column) -> SampleBuffer {
        SampleBuffer::from_mono(&self.synthesize_mono(column), self.sample_rate)
    }
}
