use std::{cell::Cell, f64::consts::TAU, rc::Rc, time::Duration};

use saavy_sonify::{
    pipeline::render_frame,
    playback::{sim::Advance, SampleFormat, SimulatedDevice},
    ChordPolicy, Frame, FrequencyTable, PlaybackError, SonifyConfig, SonifyError, Sonifier,
};

fn config() -> SonifyConfig {
    SonifyConfig::default().with_poll_interval(Duration::from_millis(1))
}

#[test]
fn mid_gray_frame_is_64_identical_chords() {
    let frame = Frame::filled(0.5).unwrap();
    let chords = render_frame(&config(), &frame).unwrap();
    assert_eq!(chords.len(), 64);

    let first = chords[0].samples();
    assert!(chords.iter().all(|c| c.samples() == first));

    // Every row contributes 0.5/64 of its tone
    let table = FrequencyTable::standard();
    for (i, sample) in chords[0].left().enumerate() {
        let t = (i + 1) as f64 / 8_000.0;
        let expected: f64 = table
            .as_slice()
            .iter()
            .map(|f| 0.5 / 64.0 * (TAU * f * t).sin())
            .sum();
        assert!(
            (sample as f64 - expected).abs() < 1e-5,
            "sample {i}: expected {expected}, got {sample}"
        );
    }
}

#[test]
fn unsupported_format_fails_before_synthesis() {
    let device = SimulatedDevice::new().with_format(SampleFormat::I16);
    let result = Sonifier::open(device.clone(), config());

    assert!(matches!(
        result.err(),
        Some(SonifyError::Playback(PlaybackError::FormatMismatch { .. }))
    ));
    assert_eq!(device.submissions(), 0);
    assert!(!device.is_open());
}

#[test]
fn sonifies_a_frame_sequence_without_leaks() {
    let device = SimulatedDevice::new().with_advance(Advance::PerPoll(250));
    let chords = Rc::new(Cell::new(0usize));
    let counter = Rc::clone(&chords);

    let mut sonifier = Sonifier::open(device.clone(), config())
        .unwrap()
        .with_observer(move |event| {
            assert_eq!(event.buffer.frames(), 500);
            counter.set(counter.get() + 1);
        });

    let frames: Vec<Frame> = (0..3)
        .map(|n| Frame::from_fn(|row, col| if (row + n) % 8 == col % 8 { 1.0 } else { 0.0 }).unwrap())
        .collect();
    let reports = sonifier.sonify_frames(&frames).unwrap();

    assert_eq!(reports.len(), 3);
    assert!(reports.iter().all(|r| r.played == 64 && r.skipped == 0));
    assert_eq!(reports[2].frame, 2);
    assert_eq!(chords.get(), 192);
    assert_eq!(device.submissions(), 192);
    assert_eq!(sonifier.manager().tracked(), 0);
    assert!(device.violations().is_empty());

    sonifier.close();
    assert!(!device.is_open());
}

#[test]
fn overlapping_frame_waits_for_every_chord() {
    let device = SimulatedDevice::new();
    let config = config()
        .with_chord_policy(ChordPolicy::Overlapping)
        .with_mixer_channels(64);
    let mut sonifier = Sonifier::open(device.clone(), config).unwrap();

    // Let the frame-end wait finish immediately
    let probe = device.clone();
    let frame = Frame::filled(0.25).unwrap();
    std::thread::scope(|s| {
        s.spawn(|| {
            while probe.submissions() < 64 {
                std::thread::sleep(Duration::from_millis(1));
            }
            probe.finish_all();
        });
        sonifier.sonify_frame(&frame).unwrap();
    });

    assert_eq!(sonifier.manager().tracked(), 0);
    assert!(device.violations().is_empty());
}

#[test]
fn close_while_chords_play_stops_device_first() {
    // Nothing ever finishes, so the frame-end wait times out with chords live
    let device = SimulatedDevice::new();
    let config = config()
        .with_chord_policy(ChordPolicy::Overlapping)
        .with_mixer_channels(64)
        .with_silence_timeout(Duration::from_millis(20));
    let mut sonifier = Sonifier::open(device.clone(), config).unwrap();

    let result = sonifier.sonify_frame(&Frame::filled(0.25).unwrap());
    assert!(matches!(
        result,
        Err(SonifyError::Playback(PlaybackError::StillPlaying { .. }))
    ));
    assert_eq!(sonifier.manager().tracked(), 64);
    assert_eq!(device.active_channels(), 64);

    sonifier.close();

    assert!(!device.is_open());
    assert_eq!(device.closes(), 1);
    assert_eq!(device.active_channels(), 0);
    // Storage went away only after the device stopped reading it
    device.advance(1);
    assert!(device.violations().is_empty());
}

#[test]
fn chord_amplitude_is_bounded_for_any_frame() {
    let frame = Frame::from_fn(|row, col| if (row * 7 + col * 3) % 2 == 0 { 1.0 } else { -1.0 }).unwrap();
    for chord in render_frame(&config(), &frame).unwrap() {
        assert!(chord.peak() <= 1.0);
    }
}
