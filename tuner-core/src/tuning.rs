//! # Musical Tuning Module
//!
//! This module maps detected frequencies onto the equal-tempered 12-tone
//! scale and classifies how far off a note is. Note names use their
//! spoken form ("A sharp" rather than "A#") because they are fed
//! directly to the announcement channel.
//!
//! ## Features
//! - Frequency to nearest-note conversion referenced to a configurable A4
//! - Cent deviation relative to the nearest note's reference frequency
//! - Qualitative tuning classification in seven symmetric bands

use std::fmt;

/// Spoken chromatic note names, C first.
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C sharp", "D", "D sharp", "E", "F", "F sharp", "G", "G sharp", "A", "A sharp", "B",
];

/// A detected frequency resolved to its nearest equal-tempered note.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteInfo {
    /// Spoken note name, one of [`NOTE_NAMES`].
    pub name: &'static str,
    /// Octave in scientific pitch notation (A4 = octave 4).
    pub octave: i32,
    /// Deviation from the note's reference frequency in cents.
    pub cents: f32,
    /// MIDI note number (A4 = 69).
    pub midi: i32,
}

impl NoteInfo {
    /// The note as it is spoken, e.g. "A sharp 4".
    pub fn spoken(&self) -> String {
        format!("{} {}", self.name, self.octave)
    }
}

/// Resolves a frequency to the nearest equal-tempered note.
///
/// The MIDI number is `round(12 * log2(f / a4) + 69)`; rounding to the
/// nearest number guarantees the resulting cent deviation stays within
/// half a semitone of zero.
///
/// # Arguments
/// * `hz` - Input frequency in Hz, must be positive
/// * `a4_hz` - Reference frequency for A4, typically 440 Hz
pub fn note_for_frequency(hz: f32, a4_hz: f32) -> NoteInfo {
    let midi = (12.0 * (hz / a4_hz).log2() + 69.0).round() as i32;
    let name = NOTE_NAMES[midi.rem_euclid(12) as usize];
    let octave = midi.div_euclid(12) - 1;
    let ref_hz = reference_frequency(midi, a4_hz);
    let cents = 1200.0 * (hz / ref_hz).log2();
    NoteInfo {
        name,
        octave,
        cents,
        midi,
    }
}

/// Reference frequency of a MIDI note number under equal temperament.
pub fn reference_frequency(midi: i32, a4_hz: f32) -> f32 {
    a4_hz * 2.0_f32.powf((midi - 69) as f32 / 12.0)
}

/// Qualitative tuning judgment for a cent deviation.
///
/// Seven ordered bands, symmetric around zero. Classification depends
/// only on the current value; there is no hysteresis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TuningStatus {
    WayFlat,
    Flat,
    SlightlyFlat,
    InTune,
    SlightlySharp,
    Sharp,
    WaySharp,
}

impl TuningStatus {
    /// Classifies a cent deviation.
    ///
    /// `|cents| < 5` is in tune; beyond that, `|cents| <= 10` is slight,
    /// `10 < |cents| <= 25` is plain sharp/flat, and `|cents| > 25` is
    /// way off.
    pub fn from_cents(cents: f32) -> Self {
        let magnitude = cents.abs();
        if magnitude < 5.0 {
            TuningStatus::InTune
        } else if cents > 0.0 {
            if magnitude > 25.0 {
                TuningStatus::WaySharp
            } else if magnitude > 10.0 {
                TuningStatus::Sharp
            } else {
                TuningStatus::SlightlySharp
            }
        } else if magnitude > 25.0 {
            TuningStatus::WayFlat
        } else if magnitude > 10.0 {
            TuningStatus::Flat
        } else {
            TuningStatus::SlightlyFlat
        }
    }

    /// The spoken phrase for this judgment.
    pub fn phrase(&self) -> &'static str {
        match self {
            TuningStatus::InTune => "is right on the money",
            TuningStatus::SlightlySharp => "is slightly sharp",
            TuningStatus::Sharp => "is sharp",
            TuningStatus::WaySharp => "is way sharp",
            TuningStatus::SlightlyFlat => "is slightly flat",
            TuningStatus::Flat => "is flat",
            TuningStatus::WayFlat => "is way flat",
        }
    }
}

impl fmt::Display for TuningStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.phrase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const A4: f32 = 440.0;

    #[test]
    fn a4_maps_to_a_with_zero_cents() {
        let note = note_for_frequency(440.0, A4);
        assert_eq!(note.name, "A");
        assert_eq!(note.octave, 4);
        assert_eq!(note.midi, 69);
        assert_relative_eq!(note.cents, 0.0, epsilon = 1e-3);
    }

    #[test]
    fn a_sharp_4_maps_to_its_spoken_name() {
        let note = note_for_frequency(466.16, A4);
        assert_eq!(note.name, "A sharp");
        assert_eq!(note.octave, 4);
        assert_eq!(note.midi, 70);
        assert!(note.cents.abs() < 1.0);
        assert_eq!(note.spoken(), "A sharp 4");
    }

    #[test]
    fn reference_frequencies_round_trip_with_zero_cents() {
        for midi in [21, 36, 48, 57, 60, 69, 81, 96, 108] {
            let hz = reference_frequency(midi, A4);
            let note = note_for_frequency(hz, A4);
            assert_eq!(note.midi, midi, "midi mismatch at {hz} Hz");
            assert_relative_eq!(note.cents, 0.0, epsilon = 1e-2);
        }
    }

    #[test]
    fn exact_semitone_steps_land_on_adjacent_notes() {
        // One semitone up from A4 is A sharp 4 at zero cents, never A4 at +100.
        let up = note_for_frequency(440.0 * 2.0_f32.powf(1.0 / 12.0), A4);
        assert_eq!(up.name, "A sharp");
        assert_eq!(up.octave, 4);
        assert_relative_eq!(up.cents, 0.0, epsilon = 1e-2);

        let down = note_for_frequency(440.0 * 2.0_f32.powf(-1.0 / 12.0), A4);
        assert_eq!(down.name, "G sharp");
        assert_eq!(down.octave, 4);
        assert_relative_eq!(down.cents, 0.0, epsilon = 1e-2);
    }

    #[test]
    fn rounding_keeps_deviation_under_half_a_semitone() {
        for hz in [51.3f32, 97.0, 123.4, 432.0, 440.0, 987.6, 1999.0] {
            let note = note_for_frequency(hz, A4);
            assert!(
                note.cents.abs() <= 50.01,
                "{hz} Hz resolved {:.1} cents away",
                note.cents
            );
        }
    }

    #[test]
    fn octave_boundary_sits_between_b_and_c() {
        let b3 = note_for_frequency(reference_frequency(59, A4), A4);
        assert_eq!(b3.name, "B");
        assert_eq!(b3.octave, 3);

        let c4 = note_for_frequency(reference_frequency(60, A4), A4);
        assert_eq!(c4.name, "C");
        assert_eq!(c4.octave, 4);
    }

    #[test]
    fn custom_reference_pitch_shifts_the_mapping() {
        // At A4 = 466.16 Hz, a 466.16 Hz tone IS the reference A.
        let note = note_for_frequency(466.16, 466.16);
        assert_eq!(note.name, "A");
        assert_eq!(note.octave, 4);
        assert_relative_eq!(note.cents, 0.0, epsilon = 1e-3);
    }

    #[test]
    fn classification_bands_match_their_boundaries() {
        assert_eq!(TuningStatus::from_cents(0.0), TuningStatus::InTune);
        assert_eq!(TuningStatus::from_cents(4.99), TuningStatus::InTune);
        assert_eq!(TuningStatus::from_cents(-4.99), TuningStatus::InTune);
        assert_eq!(TuningStatus::from_cents(5.0), TuningStatus::SlightlySharp);
        assert_eq!(TuningStatus::from_cents(10.0), TuningStatus::SlightlySharp);
        assert_eq!(TuningStatus::from_cents(10.1), TuningStatus::Sharp);
        assert_eq!(TuningStatus::from_cents(25.0), TuningStatus::Sharp);
        assert_eq!(TuningStatus::from_cents(25.1), TuningStatus::WaySharp);
        assert_eq!(TuningStatus::from_cents(-5.0), TuningStatus::SlightlyFlat);
        assert_eq!(TuningStatus::from_cents(-10.0), TuningStatus::SlightlyFlat);
        assert_eq!(TuningStatus::from_cents(-10.1), TuningStatus::Flat);
        assert_eq!(TuningStatus::from_cents(-25.0), TuningStatus::Flat);
        assert_eq!(TuningStatus::from_cents(-25.1), TuningStatus::WayFlat);
    }

    #[test]
    fn classification_is_symmetric() {
        let mirror = |status: TuningStatus| match status {
            TuningStatus::WaySharp => TuningStatus::WayFlat,
            TuningStatus::Sharp => TuningStatus::Flat,
            TuningStatus::SlightlySharp => TuningStatus::SlightlyFlat,
            TuningStatus::InTune => TuningStatus::InTune,
            other => other,
        };
        for magnitude in [0.0f32, 2.5, 5.0, 7.5, 10.0, 17.0, 25.0, 30.0, 49.9] {
            let sharp = TuningStatus::from_cents(magnitude);
            let flat = TuningStatus::from_cents(-magnitude);
            assert_eq!(mirror(sharp), flat, "asymmetry at {magnitude} cents");
        }
    }

    #[test]
    fn phrases_match_the_announcement_wording() {
        assert_eq!(TuningStatus::InTune.to_string(), "is right on the money");
        assert_eq!(TuningStatus::WaySharp.to_string(), "is way sharp");
        assert_eq!(TuningStatus::SlightlyFlat.to_string(), "is slightly flat");
    }
}
