//! # Pitch Detection Module
//!
//! This module implements the dual-algorithm fundamental frequency
//! estimator. The primary estimator is a time-domain period search over a
//! normalized difference function; when it fails, a frequency-domain peak
//! search over the magnitude spectrum takes over.
//!
//! ## Features
//! - RMS loudness gate to reject silence and background noise
//! - Time-domain period search with parabolic interpolation
//! - Spectral peak fallback restricted to the configured frequency range
//! - Deterministic and side-effect free

use crate::config::TunerConfig;
use crate::fft;

/// First normalized-difference value accepted as a period candidate.
const PERIOD_MATCH_THRESHOLD: f32 = 0.1;

/// Smallest spectral peak magnitude the fallback estimator will trust.
const MIN_PEAK_MAGNITUDE: f32 = 0.01;

/// Result of a single pitch estimation.
///
/// `hz <= 0.0` means no reliable pitch was found; the loudness is still
/// reported so callers can drive activity detection from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchEstimate {
    /// Detected fundamental frequency in Hz, or a non-positive value.
    pub hz: f32,
    /// Root-mean-square amplitude of the analyzed input.
    pub rms: f32,
}

impl PitchEstimate {
    /// An estimate carrying only a loudness measurement.
    pub fn no_pitch(rms: f32) -> Self {
        Self { hz: -1.0, rms }
    }

    /// Whether a reliable fundamental frequency was found.
    pub fn has_pitch(&self) -> bool {
        self.hz > 0.0
    }
}

/// Computes the root-mean-square amplitude of a sample window.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let energy: f32 = samples.iter().map(|&s| s * s).sum();
    (energy / samples.len() as f32).sqrt()
}

/// Estimates the fundamental frequency of a sample window.
///
/// Runs the full estimation pipeline:
/// 1. Loudness gate: input quieter than `config.min_confidence_rms` is
///    rejected immediately, with the true RMS still reported.
/// 2. Time-domain period search ([`period_pitch`]).
/// 3. Spectral peak fallback ([`spectrum_pitch`]) when the period search
///    finds nothing.
///
/// # Arguments
/// * `samples` - Input audio window, amplitudes in [-1.0, 1.0]
/// * `sample_rate` - Sample rate in Hz
/// * `config` - Frequency bounds and loudness gate
///
/// # Returns
/// * `PitchEstimate` - Frequency within `[hz_min, hz_max]`, or no pitch
pub fn detect_pitch(samples: &[f32], sample_rate: u32, config: &TunerConfig) -> PitchEstimate {
    let rms = rms(samples);
    if rms < config.min_confidence_rms {
        return PitchEstimate::no_pitch(rms);
    }

    if let Some(hz) = period_pitch(samples, sample_rate, config) {
        return PitchEstimate { hz, rms };
    }
    if let Some(hz) = spectrum_pitch(samples, sample_rate, config) {
        return PitchEstimate { hz, rms };
    }

    PitchEstimate::no_pitch(rms)
}

/// Time-domain period search (primary estimator).
///
/// Applies a Hann window, builds the difference function
/// `d(tau) = sum_j (x[j] - x[j + tau])^2` and its cumulative mean
/// normalized form, then scans lags in ascending order starting at
/// `rate / hz_max`. The first lag whose normalized difference drops below
/// [`PERIOD_MATCH_THRESHOLD`] is walked forward to the local minimum and
/// refined with parabolic interpolation over its three neighbors.
///
/// # Returns
/// * `Some(frequency)` - Refined frequency within `[hz_min, hz_max]`
/// * `None` - No lag qualified, the interpolation was degenerate, or the
///   refined frequency fell out of range
pub fn period_pitch(samples: &[f32], sample_rate: u32, config: &TunerConfig) -> Option<f32> {
    let len = samples.len();
    let max_tau = ((sample_rate as f32 / config.hz_min) as usize).min(len);
    let min_tau = ((sample_rate as f32 / config.hz_max) as usize).max(1);
    if min_tau + 2 >= max_tau {
        return None;
    }

    let mut windowed = samples.to_vec();
    fft::apply_hann_window(&mut windowed);

    // Difference function over candidate lags.
    let mut diff = vec![0.0f32; max_tau];
    for (tau, value) in diff.iter_mut().enumerate() {
        let mut sum = 0.0;
        for j in 0..(len - tau) {
            let delta = windowed[j] - windowed[j + tau];
            sum += delta * delta;
        }
        *value = sum;
    }

    // Cumulative mean normalized difference function.
    let mut cmndf = vec![0.0f32; max_tau];
    cmndf[0] = 1.0;
    let mut running_sum = 0.0;
    for tau in 1..max_tau {
        running_sum += diff[tau];
        cmndf[tau] = if running_sum > 0.0 {
            diff[tau] * tau as f32 / running_sum
        } else {
            1.0
        };
    }

    // First lag below threshold, walked forward to its local minimum.
    let mut tau = min_tau;
    while tau + 1 < max_tau {
        if cmndf[tau] < PERIOD_MATCH_THRESHOLD {
            while tau + 2 < max_tau && cmndf[tau + 1] < cmndf[tau] {
                tau += 1;
            }

            // Parabolic interpolation for sub-sample lag accuracy.
            let y0 = cmndf[tau - 1];
            let y1 = cmndf[tau];
            let y2 = cmndf[tau + 1];
            let denom = 2.0 * (y0 - 2.0 * y1 + y2);
            if denom.abs() < 1e-10 {
                return None;
            }
            let refined = tau as f32 + (y0 - y2) / denom;

            let frequency = sample_rate as f32 / refined;
            if frequency >= config.hz_min && frequency <= config.hz_max {
                return Some(frequency);
            }
            return None;
        }
        tau += 1;
    }

    None
}

/// Spectral peak search (fallback estimator).
///
/// Applies a Hamming window, computes the magnitude spectrum and picks
/// the strongest bin among those covering `[hz_min, hz_max]`. The peak
/// must exceed [`MIN_PEAK_MAGNITUDE`] to be trusted.
///
/// # Returns
/// * `Some(frequency)` - Bin-center frequency of the strongest peak
/// * `None` - Spectrum empty, range covers no bins, or peak too weak
pub fn spectrum_pitch(samples: &[f32], sample_rate: u32, config: &TunerConfig) -> Option<f32> {
    let n = samples.len();
    if n < 2 {
        return None;
    }

    let mut windowed = samples.to_vec();
    fft::apply_hamming_window(&mut windowed);
    let magnitudes = fft::magnitude_spectrum(&windowed);
    if magnitudes.is_empty() {
        return None;
    }

    let min_bin = (config.hz_min * n as f32 / sample_rate as f32) as usize;
    let max_bin =
        ((config.hz_max * n as f32 / sample_rate as f32) as usize).min(magnitudes.len() - 1);

    let mut peak_bin = None;
    let mut peak_magnitude = 0.0f32;
    for bin in min_bin..=max_bin {
        if magnitudes[bin] > peak_magnitude {
            peak_magnitude = magnitudes[bin];
            peak_bin = Some(bin);
        }
    }

    let peak_bin = peak_bin?;
    if peak_magnitude < MIN_PEAK_MAGNITUDE {
        return None;
    }

    Some(peak_bin as f32 * sample_rate as f32 / n as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SAMPLE_RATE: u32 = 48_000;

    fn sine(freq: f32, sample_rate: u32, num_samples: usize, amplitude: f32) -> Vec<f32> {
        (0..num_samples)
            .map(|i| {
                amplitude
                    * (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin()
            })
            .collect()
    }

    // Deterministic pseudo-noise, xorshift32.
    fn noise(num_samples: usize, amplitude: f32) -> Vec<f32> {
        let mut state = 0x2545_f491u32;
        (0..num_samples)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                amplitude * (state as f32 / u32::MAX as f32 * 2.0 - 1.0)
            })
            .collect()
    }

    #[test]
    fn rms_of_full_scale_sine_is_inverse_sqrt_two() {
        let samples = sine(440.0, SAMPLE_RATE, 48_000, 1.0);
        assert_relative_eq!(rms(&samples), std::f32::consts::FRAC_1_SQRT_2, epsilon = 1e-3);
    }

    #[test]
    fn rms_of_empty_input_is_zero() {
        assert_eq!(rms(&[]), 0.0);
    }

    #[test]
    fn pure_tones_detected_within_one_percent() {
        let config = TunerConfig::default();
        for freq in [55.0f32, 110.0, 220.0, 330.0, 440.0, 659.25, 880.0, 1760.0] {
            let samples = sine(freq, SAMPLE_RATE, 16_384, 0.1);
            let estimate = detect_pitch(&samples, SAMPLE_RATE, &config);
            assert!(estimate.has_pitch(), "no pitch found for {freq} Hz");
            let relative_error = (estimate.hz - freq).abs() / freq;
            assert!(
                relative_error <= 0.01,
                "{freq} Hz detected as {} Hz ({:.2}% off)",
                estimate.hz,
                relative_error * 100.0
            );
        }
    }

    #[test]
    fn silence_reports_no_pitch() {
        let config = TunerConfig::default();
        let estimate = detect_pitch(&vec![0.0; 8192], SAMPLE_RATE, &config);
        assert!(!estimate.has_pitch());
        assert_eq!(estimate.rms, 0.0);
    }

    #[test]
    fn quiet_noise_reports_no_pitch_with_true_rms() {
        let config = TunerConfig::default();
        let samples = noise(8192, 0.003);
        let estimate = detect_pitch(&samples, SAMPLE_RATE, &config);
        assert!(!estimate.has_pitch());
        // Gate fired, but the measured loudness still comes through.
        assert!(estimate.rms > 0.0 && estimate.rms < config.min_confidence_rms);
        assert_relative_eq!(estimate.rms, rms(&samples), epsilon = 1e-6);
    }

    #[test]
    fn quiet_tone_is_gated() {
        let config = TunerConfig::default();
        let samples = sine(440.0, SAMPLE_RATE, 8192, 0.003);
        let estimate = detect_pitch(&samples, SAMPLE_RATE, &config);
        assert!(!estimate.has_pitch());
        assert_relative_eq!(estimate.rms, 0.003 * std::f32::consts::FRAC_1_SQRT_2, epsilon = 1e-4);
    }

    #[test]
    fn out_of_range_tone_is_rejected_by_period_search() {
        let config = TunerConfig::default();
        let samples = sine(30.0, SAMPLE_RATE, 8192, 0.1);
        assert!(period_pitch(&samples, SAMPLE_RATE, &config).is_none());
    }

    #[test]
    fn spectrum_fallback_reports_bin_center_frequency() {
        let config = TunerConfig::default();
        let samples = sine(440.0, SAMPLE_RATE, 4096, 0.1);
        let hz = spectrum_pitch(&samples, SAMPLE_RATE, &config).unwrap();
        // Bin-center semantics: accurate to one bin width.
        let bin_width = SAMPLE_RATE as f32 / 4096.0;
        assert!((hz - 440.0).abs() <= bin_width, "got {hz} Hz");
    }

    #[test]
    fn spectrum_fallback_rejects_silence() {
        let config = TunerConfig::default();
        assert!(spectrum_pitch(&vec![0.0; 4096], SAMPLE_RATE, &config).is_none());
    }

    #[test]
    fn short_input_does_not_panic() {
        let config = TunerConfig::default();
        for len in [0usize, 1, 2, 64] {
            let samples = sine(440.0, SAMPLE_RATE, len, 0.1);
            let _ = detect_pitch(&samples, SAMPLE_RATE, &config);
        }
    }
}
