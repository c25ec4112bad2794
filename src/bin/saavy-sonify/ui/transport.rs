//! Transport bar widget - run status, position, and audio stats

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::{RunStatus, UiStateInit, UiStateUpdate};

/// Audio statistics for display
pub struct AudioStats {
    pub peak: f32,
    pub rms: f32,
}

impl AudioStats {
    pub fn from_buffer(buffer: &[f32]) -> Self {
        if buffer.is_empty() {
            return Self { peak: 0.0, rms: 0.0 };
        }
        let peak = buffer.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
        let rms = (buffer.iter().map(|&x| x * x).sum::<f32>() / buffer.len() as f32).sqrt();
        Self { peak, rms }
    }
}

pub fn render_transport(
    frame: &mut Frame,
    area: Rect,
    static_state: &UiStateInit,
    dynamic_state: &UiStateUpdate,
    audio_stats: &AudioStats,
) {
    let block = Block::default()
        .title(" saavy-sonify ")
        .borders(Borders::ALL);

    let (status, color) = match dynamic_state.status {
        RunStatus::Playing => ("▶ Playing", Color::Green),
        RunStatus::Finished => ("■ Finished", Color::Yellow),
        RunStatus::Failed => ("✖ Failed (see log)", Color::Red),
    };

    let chord_ms = static_state.samples_per_chord as f32 / static_state.sample_rate * 1000.0;

    let line = Line::from(vec![
        Span::styled(format!(" {}  ", status), Style::default().fg(color)),
        Span::styled(
            format!(
                "Frame {}/{} | Column {}  ",
                dynamic_state.frame + 1,
                static_state.frames.len(),
                dynamic_state.column + 1
            ),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!(
                "{} played, {} skipped  ",
                dynamic_state.chords_played, dynamic_state.chords_skipped
            ),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!(
                "{:.1}kHz {:.0}ms {:?} x{}  ",
                static_state.sample_rate / 1000.0,
                chord_ms,
                static_state.chord_policy,
                static_state.mixer_channels
            ),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!("Peak: {:.3}  RMS: {:.3}", audio_stats.peak, audio_stats.rms),
            Style::default().fg(Color::Magenta),
        ),
    ]);

    let paragraph = Paragraph::new(line).block(block);
    frame.render_widget(paragraph, area);
}
