//! Benchmarks for the playback manager's submit/reclaim cycle.

use std::{hint::black_box, time::Duration};

use criterion::{BenchmarkId, Criterion};
use saavy_sonify::{
    playback::{sim::Advance, PlaybackManager, SimulatedDevice},
    Backpressure, SampleBuffer, SonifyConfig,
};

pub fn bench_manager(c: &mut Criterion) {
    let mut group = c.benchmark_group("playback/manager");
    let config = SonifyConfig::default()
        .with_poll_interval(Duration::from_nanos(1))
        .with_backpressure(Backpressure::Fail);
    let chord = SampleBuffer::from_mono(&vec![0.1; 500], 8_000);

    for &channels in &[1usize, 8, 64] {
        // Each submit frees whatever the previous one started
        let device = SimulatedDevice::new().with_channels(channels);
        let probe = device.clone();
        let mut manager = PlaybackManager::open(device, &config.clone().with_mixer_channels(channels))
            .unwrap();

        group.bench_with_input(BenchmarkId::new("play", channels), &channels, |b, _| {
            b.iter(|| {
                probe.advance(500);
                manager.play(black_box(chord.clone())).unwrap()
            })
        });
    }

    // Sequential policy: submit, then poll until the chord drains
    let device = SimulatedDevice::new().with_advance(Advance::PerPoll(100));
    let mut manager = PlaybackManager::open(device, &config).unwrap();
    group.bench_function("play_and_wait", |b| {
        b.iter(|| {
            manager.play(black_box(chord.clone())).unwrap();
            manager.wait_for_silence();
        })
    });

    group.finish();
}
