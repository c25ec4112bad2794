//! Synthetic frame source standing in for decoded video frames.

use saavy_sonify::{Frame, FrameError};

/// A bright diagonal band sweeping across a dim radial gradient.
///
/// Values are already normalized to [0, 1] and quantized to 1/16 steps,
/// like frames coming out of the image side.
pub fn demo_frames(count: usize) -> Result<Vec<Frame>, FrameError> {
    (0..count)
        .map(|n| {
            let shift = n * 8;
            Frame::from_fn(|row, col| {
                let band = (row + col + shift) % 64;
                let dx = col as f32 - 32.0;
                let dy = row as f32 - 32.0;
                let glow = 0.3 * (1.0 - (dx * dx + dy * dy).sqrt() / 45.0).max(0.0);
                if band < 6 {
                    1.0
                } else {
                    glow
                }
            })
            .map(|frame| frame.quantized(16))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_are_normalized() {
        let frames = demo_frames(3).unwrap();
        assert_eq!(frames.len(), 3);
        for frame in &frames {
            assert!(frame.as_slice().iter().all(|&v| (0.0..=1.0).contains(&v)));
        }
        assert_ne!(frames[0], frames[1]);
    }
}
