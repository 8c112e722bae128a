//! # Spectrum Module
//!
//! This module provides the windowing functions and the magnitude spectrum
//! used by the frequency-domain pitch estimator. The transform itself is
//! delegated to RustFFT.
//!
//! ## Features
//! - Hann windowing for the time-domain period search
//! - Hamming windowing for the spectral fallback
//! - Magnitude spectrum up to the Nyquist frequency

use rustfft::{num_complex::Complex, FftPlanner};

/// Applies a Hann window to the input buffer to reduce spectral leakage.
///
/// The Hann window tapers the signal to zero at the edges, which keeps
/// edge discontinuities from leaking into the difference function of the
/// period search.
///
/// # Arguments
/// * `buffer` - Audio buffer to window (modified in-place)
pub fn apply_hann_window(buffer: &mut [f32]) {
    let n = buffer.len();
    if n < 2 {
        return;
    }
    let n_minus_1 = (n - 1) as f32;
    for (i, sample) in buffer.iter_mut().enumerate() {
        let multiplier = 0.5 - 0.5 * (2.0 * std::f32::consts::PI * i as f32 / n_minus_1).cos();
        *sample *= multiplier;
    }
}

/// Applies a Hamming window to the input buffer.
///
/// Used by the spectral fallback estimator; the Hamming window trades a
/// slightly wider main lobe for lower near sidelobes than a bare
/// rectangular window.
///
/// # Arguments
/// * `buffer` - Audio buffer to window (modified in-place)
pub fn apply_hamming_window(buffer: &mut [f32]) {
    let n = buffer.len();
    if n < 2 {
        return;
    }
    let n_minus_1 = (n - 1) as f32;
    for (i, sample) in buffer.iter_mut().enumerate() {
        let multiplier = 0.54 - 0.46 * (2.0 * std::f32::consts::PI * i as f32 / n_minus_1).cos();
        *sample *= multiplier;
    }
}

/// Computes the magnitude spectrum of a (pre-windowed) signal.
///
/// Performs a forward FFT and returns the magnitudes of the first half of
/// the spectrum. Due to the Nyquist theorem only bins up to half the
/// sampling rate carry information for a real signal. Magnitudes are
/// unnormalized, matching a direct frequency-by-frequency correlation.
///
/// # Arguments
/// * `signal` - Input audio signal of arbitrary length
///
/// # Returns
/// * `Vec<f32>` - Magnitudes for bins `0..len/2`
pub fn magnitude_spectrum(signal: &[f32]) -> Vec<f32> {
    let n = signal.len();
    if n < 2 {
        return Vec::new();
    }

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n);

    let mut buffer: Vec<Complex<f32>> = signal
        .iter()
        .map(|&sample| Complex { re: sample, im: 0.0 })
        .collect();

    fft.process(&mut buffer);

    buffer
        .iter()
        .take(n / 2)
        .map(|c| c.norm()) // .norm() is sqrt(re^2 + im^2)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn hann_window_is_zero_at_edges_and_unity_at_center() {
        let mut buffer = vec![1.0f32; 1025];
        apply_hann_window(&mut buffer);
        assert_relative_eq!(buffer[0], 0.0, epsilon = 1e-6);
        assert_relative_eq!(buffer[1024], 0.0, epsilon = 1e-6);
        assert_relative_eq!(buffer[512], 1.0, epsilon = 1e-4);
    }

    #[test]
    fn hamming_window_keeps_edges_nonzero() {
        let mut buffer = vec![1.0f32; 1025];
        apply_hamming_window(&mut buffer);
        assert_relative_eq!(buffer[0], 0.08, epsilon = 1e-3);
        assert_relative_eq!(buffer[512], 1.0, epsilon = 1e-4);
    }

    #[test]
    fn spectrum_peak_lands_on_the_tone_bin() {
        // 1024-sample window, tone centered exactly on bin 16.
        let n = 1024usize;
        let rate = 1024.0f32;
        let freq = 16.0f32;
        let signal: Vec<f32> = (0..n)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / rate).sin())
            .collect();
        let magnitudes = magnitude_spectrum(&signal);
        assert_eq!(magnitudes.len(), n / 2);
        let peak = magnitudes
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 16);
    }

    #[test]
    fn degenerate_input_yields_empty_spectrum() {
        assert!(magnitude_spectrum(&[]).is_empty());
        assert!(magnitude_spectrum(&[0.5]).is_empty());
    }
}
