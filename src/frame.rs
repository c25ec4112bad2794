//! Frames: the 64x64 intensity grids produced by the image side.
//!
//! Rows run top to bottom, columns left to right. Each column becomes one
//! chord; each row one tone within it.

use crate::{error::FrameError, FRAME_SIZE};

/// One column of a frame, top row first.
pub type Column = [f32; FRAME_SIZE];

/// Row-major 64x64 grid of normalized intensities.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    samples: Vec<f32>,
}

impl Frame {
    pub const SIZE: usize = FRAME_SIZE;
    pub const LEN: usize = FRAME_SIZE * FRAME_SIZE;

    /// Build a frame from row-major samples.
    pub fn from_rows(samples: Vec<f32>) -> Result<Self, FrameError> {
        if samples.len() != Self::LEN {
            return Err(FrameError::WrongSize {
                expected: Self::LEN,
                actual: samples.len(),
            });
        }
        if let Some(i) = samples.iter().position(|s| !s.is_finite()) {
            return Err(FrameError::NonFinite {
                row: i / FRAME_SIZE,
                col: i % FRAME_SIZE,
            });
        }
        Ok(Self { samples })
    }

    /// Build a frame by evaluating `f(row, col)` for every cell.
    pub fn from_fn(mut f: impl FnMut(usize, usize) -> f32) -> Result<Self, FrameError> {
        let samples = (0..Self::LEN)
            .map(|i| f(i / FRAME_SIZE, i % FRAME_SIZE))
            .collect();
        Self::from_rows(samples)
    }

    /// Every cell set to `value`.
    pub fn filled(value: f32) -> Result<Self, FrameError> {
        Self::from_rows(vec![value; Self::LEN])
    }

    /// Normalize 8-bit gray pixels into [0, 1].
    pub fn from_luma(pixels: &[u8]) -> Result<Self, FrameError> {
        Self::from_rows(pixels.iter().map(|&p| p as f32 / 255.0).collect())
    }

    /// Snap every sample to the nearest multiple of `1 / steps`.
    ///
    /// `steps == 0` leaves the frame untouched.
    pub fn quantized(&self, steps: u32) -> Self {
        if steps == 0 {
            return self.clone();
        }
        let steps = steps as f32;
        Self {
            samples: self
                .samples
                .iter()
                .map(|s| (s * steps).round() / steps)
                .collect(),
        }
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row >= FRAME_SIZE || col >= FRAME_SIZE {
            return None;
        }
        Some(self.samples[row * FRAME_SIZE + col])
    }

    /// Column `col`, top row first.
    ///
    /// # Panics
    /// If `col >= 64`.
    pub fn column(&self, col: usize) -> Column {
        assert!(col < FRAME_SIZE, "column {col} out of range");
        std::array::from_fn(|row| self.samples[row * FRAME_SIZE + col])
    }

    /// All columns, left to right.
    pub fn columns(&self) -> impl Iterator<Item = Column> + '_ {
        (0..FRAME_SIZE).map(move |col| self.column(col))
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_size() {
        let err = Frame::from_rows(vec![0.0; 10]).unwrap_err();
        assert_eq!(
            err,
            FrameError::WrongSize {
                expected: 4096,
                actual: 10
            }
        );
    }

    #[test]
    fn rejects_nan_with_position() {
        let mut samples = vec![0.0; Frame::LEN];
        samples[2 * 64 + 5] = f32::NAN;
        assert_eq!(
            Frame::from_rows(samples).unwrap_err(),
            FrameError::NonFinite { row: 2, col: 5 }
        );
    }

    #[test]
    fn column_reads_top_to_bottom() {
        let frame = Frame::from_fn(|row, col| (row * 100 + col) as f32).unwrap();
        let column = frame.column(3);
        assert_eq!(column[0], 3.0);
        assert_eq!(column[1], 103.0);
        assert_eq!(column[63], 6303.0);
        assert_eq!(frame.columns().count(), 64);
    }

    #[test]
    fn luma_is_normalized() {
        let mut pixels = vec![0u8; Frame::LEN];
        pixels[0] = 255;
        pixels[1] = 51;
        let frame = Frame::from_luma(&pixels).unwrap();
        assert_eq!(frame.get(0, 0), Some(1.0));
        assert_eq!(frame.get(0, 1), Some(0.2));
        assert_eq!(frame.get(64, 0), None);
    }

    #[test]
    fn quantizes_to_sixteenths() {
        let frame = Frame::filled(0.51).unwrap().quantized(16);
        assert!(frame.as_slice().iter().all(|&s| s == 0.5));
        assert_eq!(Frame::filled(0.51).unwrap().quantized(0).get(0, 0), Some(0.51));
    }
}
