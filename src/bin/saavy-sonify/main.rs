//! saavy-sonify - play a frame sequence as chords in the terminal
//!
//! Run with: cargo run --bin saavy-sonify
//! Logs go to saavy-sonify.log (filter with RUST_LOG).

mod app;
mod source;
mod ui;

use std::{fs::File, sync::Mutex, time::Duration};

use app::SonifyApp;
use color_eyre::eyre::{Result as EyreResult, WrapErr};
use saavy_sonify::{ChordPolicy, SonifyConfig};

fn main() -> EyreResult<()> {
    color_eyre::install()?;

    let log = File::create("saavy-sonify.log").wrap_err("failed to create log file")?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_ansi(false)
        .with_writer(Mutex::new(log))
        .init();

    let config = SonifyConfig::default()
        .with_sample_rate(44_100)
        .with_samples_per_chord(2_205)
        .with_chord_policy(ChordPolicy::Sequential)
        // A dead stream never reports silence; don't let the worker hang on it
        .with_silence_timeout(Duration::from_secs(2));

    SonifyApp::new(config).frames(8).run()
}
