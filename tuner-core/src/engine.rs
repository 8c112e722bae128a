//! # Tuner Engine Module
//!
//! This module owns the activity state machine that turns a stream of
//! audio frames into note announcements. Frames arrive through
//! [`TunerEngine::tick`]; the engine decides when a sustained note is
//! being played, records it, analyzes the recording exactly once and
//! hands the result to the announcement scheduler.
//!
//! ## State cycle
//! - **Waiting**: idle until a frame is loud enough.
//! - **Listening**: frames are buffered until the loudness fades.
//! - **Announcing**: the buffered tail is analyzed once; the engine
//!   stays here until the spoken announcement finishes, then returns to
//!   Waiting.
//!
//! Transitions are debounced so transient loudness spikes cannot make
//! the machine chatter, and the start/fade thresholds form a hysteresis
//! band so a level hovering at one boundary cannot flap.

use std::time::Instant;

use crate::config::TunerConfig;
use crate::pitch::{self, PitchEstimate};
use crate::speech::{AnnouncementScheduler, SpeechSink};
use crate::tuning::{self, TuningStatus};
use crate::Snapshot;

/// Peak amplitude the analyzed window is normalized to.
const NORMALIZE_TARGET: f32 = 0.8;

/// Peaks below this are left alone; normalizing them would only amplify
/// noise.
const MIN_NORMALIZE_PEAK: f32 = 0.001;

/// Activity state of the engine. Exactly one value at any instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityState {
    /// Idle, watching frame loudness.
    Waiting,
    /// Recording frames into the window.
    Listening,
    /// Analysis done or in progress; possibly speaking.
    Announcing,
}

/// The hands-free tuner engine.
///
/// Owns all mutable state of the pipeline: the activity state, the
/// recorded window, the cached analysis and the announcement scheduler.
/// All of it is mutated only through `tick` and `stop`, so a single
/// logical thread of control needs no locking. Callers pass `now` in,
/// which keeps the debounce and cooldown clocks deterministic in tests.
pub struct TunerEngine {
    config: TunerConfig,
    state: ActivityState,
    window: Vec<Vec<f32>>,
    last_transition: Option<Instant>,
    analysis: Option<PitchEstimate>,
    scheduler: AnnouncementScheduler,
}

impl TunerEngine {
    pub fn new(config: TunerConfig, sink: Box<dyn SpeechSink>) -> Self {
        let scheduler = AnnouncementScheduler::new(sink, config.speak_cooldown);
        Self {
            config,
            state: ActivityState::Waiting,
            window: Vec::new(),
            last_transition: None,
            analysis: None,
            scheduler,
        }
    }

    /// Processes one audio frame.
    ///
    /// State transitions are evaluated before any buffering or analysis,
    /// so a frame is attributed to exactly one state. Returns the
    /// per-tick snapshot for the observability channel; one snapshot is
    /// emitted per frame no matter what.
    pub fn tick(&mut self, frame: &[f32], sample_rate: u32, now: Instant) -> Snapshot {
        let frame_rms = pitch::rms(frame);
        self.update_state(frame_rms, now);

        match self.state {
            ActivityState::Waiting => Snapshot {
                state: ActivityState::Waiting,
                note: None,
                frequency_hz: None,
                rms: frame_rms,
            },
            ActivityState::Listening => {
                // Buffering continues even while debounce suppresses
                // transitions.
                self.window.push(frame.to_vec());
                Snapshot {
                    state: ActivityState::Listening,
                    note: None,
                    frequency_hz: None,
                    rms: frame_rms,
                }
            }
            ActivityState::Announcing => {
                let estimate = match self.analysis {
                    Some(estimate) => estimate,
                    None => {
                        // Exactly once per cycle: analyze, then request
                        // the announcement while the result is fresh.
                        let estimate = self.analyze_window(sample_rate);
                        if estimate.has_pitch() {
                            let note = tuning::note_for_frequency(estimate.hz, self.config.a4_hz);
                            let status = TuningStatus::from_cents(note.cents);
                            let text = format!("{} {}", note.spoken(), status);
                            self.scheduler.announce(&text, now);
                        }
                        self.analysis = Some(estimate);
                        estimate
                    }
                };

                self.scheduler.poll(now);

                let snapshot = if estimate.has_pitch() {
                    let note = tuning::note_for_frequency(estimate.hz, self.config.a4_hz);
                    Snapshot {
                        state: ActivityState::Announcing,
                        note: Some(note),
                        frequency_hz: Some(estimate.hz),
                        rms: estimate.rms,
                    }
                } else {
                    Snapshot {
                        state: ActivityState::Announcing,
                        note: None,
                        frequency_hz: None,
                        rms: estimate.rms,
                    }
                };

                // Back to waiting once nothing is speaking; not gated by
                // loudness and not debounced.
                if !self.scheduler.is_speaking() {
                    self.analysis = None;
                    self.set_state(ActivityState::Waiting);
                }

                snapshot
            }
        }
    }

    /// Stops the engine: interrupts speech, discards buffered audio and
    /// forces the state machine back to Waiting. Safe to call from any
    /// state, idempotently.
    pub fn stop(&mut self) {
        self.scheduler.cancel();
        self.window.clear();
        self.analysis = None;
        self.last_transition = None;
        self.set_state(ActivityState::Waiting);
    }

    pub fn state(&self) -> ActivityState {
        self.state
    }

    pub fn is_speaking(&self) -> bool {
        self.scheduler.is_speaking()
    }

    /// Turns the audible channel on or off; the observability channel
    /// keeps flowing either way.
    pub fn set_speech_enabled(&mut self, enabled: bool) {
        self.scheduler.set_enabled(enabled);
    }

    pub fn speech_enabled(&self) -> bool {
        self.scheduler.enabled()
    }

    pub fn config(&self) -> &TunerConfig {
        &self.config
    }

    /// Evaluates the loudness-driven transitions.
    ///
    /// Skipped wholesale while the debounce interval since the last
    /// accepted transition has not elapsed. Leaving Announcing is not
    /// handled here; that exit is owned by the speaking flag.
    fn update_state(&mut self, frame_rms: f32, now: Instant) {
        if let Some(last) = self.last_transition {
            if now.duration_since(last) < self.config.debounce {
                return;
            }
        }

        match self.state {
            ActivityState::Waiting => {
                if frame_rms >= self.config.activity_threshold {
                    // A new recording starts with an empty window.
                    self.window.clear();
                    self.analysis = None;
                    self.set_state(ActivityState::Listening);
                    self.last_transition = Some(now);
                }
            }
            ActivityState::Listening => {
                if frame_rms < self.config.activity_fade_threshold {
                    self.set_state(ActivityState::Announcing);
                    self.last_transition = Some(now);
                }
            }
            ActivityState::Announcing => {}
        }
    }

    fn set_state(&mut self, next: ActivityState) {
        if next != self.state {
            log::debug!("state transition: {:?} -> {:?}", self.state, next);
        }
        self.state = next;
    }

    /// Analyzes the tail of the recorded window.
    ///
    /// Walks the window backward until roughly `analysis_window` worth
    /// of samples is collected, concatenates those frames in their
    /// original order, peak-normalizes the result and runs the pitch
    /// estimator on it. An empty window is an estimation failure, not an
    /// error.
    fn analyze_window(&mut self, sample_rate: u32) -> PitchEstimate {
        if self.window.is_empty() {
            log::debug!("no recorded audio to analyze");
            return PitchEstimate::no_pitch(0.0);
        }

        let target_samples =
            (sample_rate as f32 * self.config.analysis_window.as_secs_f32()) as usize;
        let mut frames_to_use = 0;
        let mut total_samples = 0;
        for frame in self.window.iter().rev() {
            frames_to_use += 1;
            total_samples += frame.len();
            if total_samples >= target_samples {
                break;
            }
        }

        let mut combined = Vec::with_capacity(total_samples);
        for frame in &self.window[self.window.len() - frames_to_use..] {
            combined.extend_from_slice(frame);
        }

        let peak = combined.iter().fold(0.0f32, |max, &s| max.max(s.abs()));
        if peak > MIN_NORMALIZE_PEAK {
            let gain = NORMALIZE_TARGET / peak;
            for sample in combined.iter_mut() {
                *sample *= gain;
            }
        }

        log::debug!(
            "analyzing {} frames, {} samples (~{:.2}s)",
            frames_to_use,
            combined.len(),
            combined.len() as f32 / sample_rate as f32
        );
        let estimate = pitch::detect_pitch(&combined, sample_rate, &self.config);
        log::debug!(
            "pitch detection result: hz={:.2} rms={:.4}",
            estimate.hz,
            estimate.rms
        );
        estimate
    }
}
