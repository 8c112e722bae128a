// tuner-core/src/lib.rs

//! The core logic for the hands-free tuner.
//! This crate is responsible for audio capture, pitch detection,
//! activity detection and announcement scheduling. It is completely
//! headless and contains no terminal or GUI code.

pub mod audio;
pub mod config;
pub mod engine;
pub mod error;
pub mod fft;
pub mod pitch;
pub mod speech;
pub mod tuning;

use engine::ActivityState;
use tuning::NoteInfo;

/// Per-tick observability record emitted by the engine.
///
/// One snapshot is produced for every processed audio frame, whether or
/// not anything is being announced. Frontends render these; nothing in
/// the core ever reads one back.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Current activity state.
    pub state: ActivityState,
    /// The note resolved from the cached analysis, if the engine is
    /// announcing and a pitch was found.
    pub note: Option<NoteInfo>,
    /// Detected fundamental frequency in Hz, if any.
    pub frequency_hz: Option<f32>,
    /// Loudness of the current frame while waiting or listening, or of
    /// the analyzed window while announcing.
    pub rms: f32,
}
