//! Frame widget - the current image in shade blocks with a column playhead

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use saavy_sonify::FRAME_SIZE;

const SHADES: [char; 5] = [' ', '░', '▒', '▓', '█'];

fn shade(value: f32) -> char {
    let level = (value.abs().clamp(0.0, 1.0) * (SHADES.len() - 1) as f32).round() as usize;
    SHADES[level]
}

pub fn render_frame_view(
    frame: &mut Frame,
    area: Rect,
    image: Option<&saavy_sonify::Frame>,
    playhead: usize,
) {
    let block = Block::default()
        .title(" Frame ")
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(image) = image else { return };
    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let width = inner.width as usize;
    let height = inner.height as usize;

    let lines: Vec<Line> = (0..height)
        .map(|y| {
            let row = y * FRAME_SIZE / height;
            let spans: Vec<Span> = (0..width)
                .map(|x| {
                    let col = x * FRAME_SIZE / width;
                    let cell = shade(image.get(row, col).unwrap_or(0.0)).to_string();
                    let color = if col == playhead {
                        Color::Yellow
                    } else {
                        Color::Gray
                    };
                    Span::styled(cell, Style::default().fg(color))
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shades_cover_range() {
        assert_eq!(shade(0.0), ' ');
        assert_eq!(shade(1.0), '█');
        assert_eq!(shade(-1.0), '█');
        assert_eq!(shade(0.5), '▒');
    }
}
