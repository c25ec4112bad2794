use crate::FRAME_SIZE;

/*
Note Table
==========

Each row of a frame is voiced by one equal-tempered note. The table pins a
reference pitch (concert A, 440 Hz) at an anchor position and walks outward
one semitone per entry:

  table[anchor]     = 440.0
  table[anchor + k] = table[anchor + k - 1] * 2^(1/12)    (ascending)
  table[anchor - k] = table[anchor - k + 1] * 2^(-1/12)   (descending)

With 64 entries and the anchor at 32 the table spans a little over five
octaves, from ~69 Hz up to ~2637 Hz.

Row mapping:
  Rows are numbered top to bottom from 0. Row r is voiced by entry
  size - 1 - r, so the top of the image sounds highest and row 31 is A440.
*/

/// Ratio between adjacent semitones.
pub const SEMITONE: f64 = 1.059_463_094_359_295_3; // 2^(1/12)

/// Equal-tempered note table shared by every chord of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyTable {
    notes: Vec<f64>,
    anchor_index: usize,
}

impl FrequencyTable {
    /// Build `size` notes with `anchor_frequency` pinned at `anchor_index`.
    ///
    /// # Panics
    /// If `anchor_index >= size`.
    pub fn build(anchor_frequency: f64, anchor_index: usize, size: usize) -> Self {
        assert!(
            anchor_index < size,
            "anchor index {anchor_index} outside table of {size}"
        );

        let up = 2.0_f64.powf(1.0 / 12.0);
        let down = 2.0_f64.powf(-1.0 / 12.0);

        let mut notes = vec![0.0; size];
        notes[anchor_index] = anchor_frequency;
        for i in anchor_index + 1..size {
            notes[i] = notes[i - 1] * up;
        }
        for i in (0..anchor_index).rev() {
            notes[i] = notes[i + 1] * down;
        }

        Self {
            notes,
            anchor_index,
        }
    }

    /// 64 notes with A440 at position 32.
    pub fn standard() -> Self {
        Self::build(440.0, 32, FRAME_SIZE)
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.notes.get(index).copied()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn anchor_index(&self) -> usize {
        self.anchor_index
    }

    /// Table index voicing frame row `row` (top row = highest note).
    pub fn note_for_row(&self, row: usize) -> Option<usize> {
        (row < self.notes.len()).then(|| self.notes.len() - 1 - row)
    }

    /// Frequency voicing frame row `row`.
    pub fn frequency_for_row(&self, row: usize) -> Option<f64> {
        self.note_for_row(row).map(|m| self.notes[m])
    }
}
