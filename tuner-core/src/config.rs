//! # Configuration Module
//!
//! All tunable parameters of the engine live in [`TunerConfig`]. The
//! defaults reproduce the behavior the detection thresholds were tuned
//! for; frontends may load a saved configuration from JSON instead.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{TunerError, TunerResult};

/// Tunable parameters for pitch detection, activity detection and
/// announcement scheduling.
///
/// The activity thresholds form a hysteresis band: `activity_threshold`
/// (start) must stay strictly above `activity_fade_threshold` (fade) or
/// the state machine would flap at a single boundary value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TunerConfig {
    /// Reference pitch for A4 in Hz.
    pub a4_hz: f32,
    /// Lowest frequency reported by the estimators; ignores sub-bass noise.
    pub hz_min: f32,
    /// Highest frequency reported; cap for typical vocal/instrument range.
    pub hz_max: f32,
    /// Minimal frame loudness (RMS) the estimators will trust.
    pub min_confidence_rms: f32,
    /// Frame RMS at or above which recording starts.
    pub activity_threshold: f32,
    /// Frame RMS below which recording stops and analysis begins.
    pub activity_fade_threshold: f32,
    /// Minimum time between accepted activity state transitions.
    pub debounce: Duration,
    /// How much of the tail of the recorded audio is analyzed.
    pub analysis_window: Duration,
    /// Minimum time between the end of one announcement and the start
    /// of the next.
    pub speak_cooldown: Duration,
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            a4_hz: 440.0,
            hz_min: 50.0,
            hz_max: 2000.0,
            min_confidence_rms: 0.003,
            activity_threshold: 0.005,
            activity_fade_threshold: 0.002,
            debounce: Duration::from_millis(500),
            analysis_window: Duration::from_millis(500),
            speak_cooldown: Duration::from_millis(3000),
        }
    }
}

impl TunerConfig {
    /// Rejects configurations the engine cannot operate under.
    ///
    /// # Returns
    /// * `Ok(())` - All parameters are consistent
    /// * `Err(TunerError::InvalidConfig)` - Description of the first problem found
    pub fn validate(&self) -> TunerResult<()> {
        if !(self.a4_hz > 0.0) {
            return Err(TunerError::InvalidConfig(format!(
                "reference pitch must be positive, got {}",
                self.a4_hz
            )));
        }
        if !(self.hz_min > 0.0 && self.hz_min < self.hz_max) {
            return Err(TunerError::InvalidConfig(format!(
                "frequency range must satisfy 0 < hz_min < hz_max, got {} - {}",
                self.hz_min, self.hz_max
            )));
        }
        if self.min_confidence_rms < 0.0 {
            return Err(TunerError::InvalidConfig(format!(
                "minimum confidence RMS must not be negative, got {}",
                self.min_confidence_rms
            )));
        }
        if self.activity_fade_threshold >= self.activity_threshold {
            return Err(TunerError::InvalidConfig(format!(
                "fade threshold {} must stay below start threshold {}",
                self.activity_fade_threshold, self.activity_threshold
            )));
        }
        Ok(())
    }
}
