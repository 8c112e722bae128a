//! # Hands-Free Tuner CLI
//!
//! Terminal frontend for the tuner engine. Captures the microphone,
//! feeds frames to the engine and renders each tick's snapshot as a
//! status line while announcements are spoken through an external
//! text-to-speech program.
//!
//! ## Architecture
//! - **Capture**: CPAL delivers samples on its own callback thread; full
//!   frames arrive here over a crossbeam channel
//! - **Main Thread**: receives frames, drives the engine tick by tick
//! - **Speech**: one subprocess per utterance, watched in the background

mod speech;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tuner_core::config::TunerConfig;
use tuner_core::engine::{ActivityState, TunerEngine};
use tuner_core::{audio, Snapshot};

use speech::CommandSpeech;

#[cfg(target_os = "macos")]
const DEFAULT_VOICE_PROGRAM: &str = "say";
#[cfg(not(target_os = "macos"))]
const DEFAULT_VOICE_PROGRAM: &str = "espeak";

/// Hands-free instrument tuner: listens, detects the note, says how far
/// off it is. No buttons involved.
#[derive(Parser, Debug)]
#[command(name = "tuner-cli", version)]
struct Args {
    /// Path to a JSON tuner configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Disable spoken announcements (display only)
    #[arg(long)]
    quiet: bool,

    /// Text-to-speech program invoked with the announcement text
    #[arg(long, default_value = DEFAULT_VOICE_PROGRAM)]
    voice: String,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = load_config(args.config.as_deref())?;
    config
        .validate()
        .context("refusing to start with an inconsistent configuration")?;

    let mut engine = TunerEngine::new(config, Box::new(CommandSpeech::new(args.voice.as_str())));
    if args.quiet {
        engine.set_speech_enabled(false);
    }

    let (frame_tx, frame_rx) = crossbeam_channel::unbounded();
    let (_stream, sample_rate) =
        audio::start_capture(frame_tx).context("failed to start audio capture")?;

    log::info!("tuner running, play a note to hear it announced");

    // The capture callback owns the sending side; when the stream dies
    // the channel closes and the loop ends.
    for frame in frame_rx.iter() {
        let snapshot = engine.tick(&frame, sample_rate, Instant::now());
        render(&snapshot);
    }

    engine.stop();
    println!();
    Ok(())
}

/// Loads the tuner configuration, falling back to defaults when no file
/// is given.
fn load_config(path: Option<&Path>) -> Result<TunerConfig> {
    match path {
        Some(path) => {
            let data = fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            let config = serde_json::from_str(&data)
                .with_context(|| format!("failed to parse config file {}", path.display()))?;
            Ok(config)
        }
        None => Ok(TunerConfig::default()),
    }
}

/// Renders one snapshot as an in-place status line.
fn render(snapshot: &Snapshot) {
    let line = match (snapshot.state, &snapshot.note) {
        (ActivityState::Waiting, _) => {
            format!("waiting for audio | rms {:.3}", snapshot.rms)
        }
        (ActivityState::Listening, _) => {
            format!("recording audio | rms {:.3}", snapshot.rms)
        }
        (ActivityState::Announcing, Some(note)) => format!(
            "{} {} | {:.2} Hz | {:+.1} cents | rms {:.3}",
            note.name,
            note.octave,
            snapshot.frequency_hz.unwrap_or(-1.0),
            note.cents,
            snapshot.rms
        ),
        (ActivityState::Announcing, None) => {
            format!("no pitch detected | rms {:.3}", snapshot.rms)
        }
    };
    print!("\r{line:<64}");
    let _ = io::stdout().flush();
}
