//! Benchmarks for chord synthesis and the playback lifecycle.
//!
//! Run with: cargo bench
//!
//! A frame is 64 chords. At the default 8 kHz and 500 samples per chord a
//! chord lasts 62.5ms, so synthesizing the next chord has to finish well
//! inside that window for playback to stay gapless.
//!
//! Benchmark groups:
//!   - synth/*     Note table construction and chord synthesis
//!   - playback/*  Manager submit/reclaim cycles against the simulated device

use criterion::{criterion_group, criterion_main};

mod playback;
mod synth;

/// Chord lengths worth comparing: the default, and 50ms at 44.1 kHz.
pub const CHORD_LENGTHS: &[(u32, usize)] = &[(8_000, 500), (44_100, 2_205)];

criterion_group!(
    benches,
    synth::bench_frequency_table,
    synth::bench_chord,
    synth::bench_render_frame,
    playback::bench_manager,
);
criterion_main!(benches);
