//! Shared state types for UI communication
//!
//! Static data is handed over once at startup; progress arrives as small
//! `Copy` messages over rtrb rings.

use saavy_sonify::{ChordPolicy, Frame};

/// Static state sent once at initialization (can allocate)
pub struct UiStateInit {
    /// Output sample rate in Hz
    pub sample_rate: f32,
    /// Samples per channel in one chord
    pub samples_per_chord: usize,
    pub chord_policy: ChordPolicy,
    /// Concurrent playback channels in the mixer
    pub mixer_channels: usize,
    /// The frames being played, in order
    pub frames: Vec<Frame>,
}

/// Progress messages from the sonifier thread
#[derive(Clone, Copy, Debug)]
pub enum UiMessage {
    /// A chord was just submitted
    Chord { frame: usize, column: usize, peak: f32 },
    FrameDone {
        frame: usize,
        played: usize,
        skipped: usize,
    },
    Finished,
    Failed,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RunStatus {
    #[default]
    Playing,
    Finished,
    Failed,
}

/// Dynamic state folded from messages
#[derive(Clone, Copy, Debug, Default)]
pub struct UiStateUpdate {
    pub frame: usize,
    pub column: usize,
    pub chords_played: usize,
    pub chords_skipped: usize,
    /// Peak of the latest chord
    pub peak: f32,
    pub status: RunStatus,
}

impl UiStateUpdate {
    pub fn apply(&mut self, message: UiMessage) {
        match message {
            UiMessage::Chord {
                frame,
                column,
                peak,
            } => {
                self.frame = frame;
                self.column = column;
                self.peak = peak;
            }
            UiMessage::FrameDone {
                played, skipped, ..
            } => {
                self.chords_played += played;
                self.chords_skipped += skipped;
            }
            UiMessage::Finished => self.status = RunStatus::Finished,
            UiMessage::Failed => self.status = RunStatus::Failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_messages() {
        let mut state = UiStateUpdate::default();
        state.apply(UiMessage::Chord {
            frame: 1,
            column: 10,
            peak: 0.4,
        });
        state.apply(UiMessage::FrameDone {
            frame: 1,
            played: 62,
            skipped: 2,
        });
        state.apply(UiMessage::Finished);

        assert_eq!(state.frame, 1);
        assert_eq!(state.column, 10);
        assert_eq!(state.chords_played, 62);
        assert_eq!(state.chords_skipped, 2);
        assert_eq!(state.status, RunStatus::Finished);
    }
}
