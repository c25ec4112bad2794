//! Benchmarks for the note table and chord synthesis.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_sonify::{pipeline, ChordSynth, Frame, FrequencyTable, SonifyConfig, FRAME_SIZE};

use crate::CHORD_LENGTHS;

pub fn bench_frequency_table(c: &mut Criterion) {
    c.bench_function("synth/frequency_table", |b| {
        b.iter(|| FrequencyTable::build(black_box(440.0), black_box(32), FRAME_SIZE))
    });
}

pub fn bench_chord(c: &mut Criterion) {
    let mut group = c.benchmark_group("synth/chord");
    let table = FrequencyTable::standard();

    // Sparse columns skip silent rows, dense ones pay for all 64 sines
    let sparse = Frame::from_fn(|row, _| if row % 8 == 0 { 1.0 } else { 0.0 })
        .unwrap()
        .column(0);
    let dense = Frame::filled(0.5).unwrap().column(0);

    for &(rate, samples) in CHORD_LENGTHS {
        let synth = ChordSynth::new(&table, samples, rate);
        let label = format!("{rate}Hz");

        group.bench_with_input(BenchmarkId::new("sparse", &label), &samples, |b, _| {
            b.iter(|| synth.synthesize(black_box(&sparse)))
        });
        group.bench_with_input(BenchmarkId::new("dense", &label), &samples, |b, _| {
            b.iter(|| synth.synthesize(black_box(&dense)))
        });
    }

    group.finish();
}

pub fn bench_render_frame(c: &mut Criterion) {
    let config = SonifyConfig::default();
    let frame = Frame::from_fn(|row, col| ((row * col) % 256) as f32 / 255.0).unwrap();

    c.bench_function("synth/render_frame", |b| {
        b.iter(|| pipeline::render_frame(black_box(&config), black_box(&frame)).unwrap())
    });
}
