//! Note model and equal-tempered pitch conversions

use serde::{Deserialize, Serialize};

/// Semitone names within an octave, C first
pub const SEMITONE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Keyboard color per semitone, C first
pub const WHITE_KEYS: [bool; 12] = [
    true, false, true, false, true, true, false, true, false, true, false, true,
];

/// Frequency in Hz of a MIDI pitch (A4 = 69 = 440 Hz)
pub fn pitch_to_freq(pitch: i32) -> f32 {
    440.0 * 2.0f32.powf((pitch as f32 - 69.0) / 12.0)
}

/// Nearest MIDI pitch for a frequency, or 0 when out of the usable range.
///
/// Pitch 0 is reserved as the "no pitch" sentinel, so the usable range is
/// the open interval (0, 128).
pub fn freq_to_pitch(freq: f32) -> i32 {
    if freq <= 0.0 {
        return 0;
    }
    let pitch = (69.0 + 12.0 * (freq / 440.0).log2()).round() as i32;
    if pitch <= 0 || pitch >= 128 {
        0
    } else {
        pitch
    }
}

/// MIDI velocity for a detected peak amplitude above the threshold
pub fn velocity_for(amplitude: f32, threshold: f32) -> u8 {
    let velocity = ((amplitude - threshold) / (255.0 + threshold) * 128.0).round();
    velocity.clamp(0.0, 127.0) as u8
}

/// A detected musical note, emitted once per analysis frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Detected frequency in Hz, possibly refined by interpolation
    pub frequency: f32,
    /// Peak magnitude the note was detected at
    pub amplitude: f32,
    /// MIDI pitch 1..=127
    pub pitch: u8,
    /// Octave 0..=7
    pub octave: u8,
    /// Semitone within the octave, C = 0
    pub semitone: u8,
    /// MIDI channel from the octave routing table
    pub channel: u8,
    /// MIDI velocity 0..=127
    pub velocity: u8,
}

impl Note {
    /// Build a note from a surviving spectral peak.
    ///
    /// Returns `None` when the frequency rounds outside the usable pitch
    /// range or outside the eight analyzable octaves.
    pub fn from_peak(
        frequency: f32,
        amplitude: f32,
        threshold: f32,
        octave_channel: &[u8; 8],
    ) -> Option<Note> {
        let pitch = freq_to_pitch(frequency);
        if pitch == 0 {
            return None;
        }
        let octave = pitch / 12 - 1;
        if !(0..8).contains(&octave) {
            return None;
        }
        Some(Note {
            frequency,
            amplitude,
            pitch: pitch as u8,
            octave: octave as u8,
            semitone: (pitch % 12) as u8,
            channel: octave_channel[octave as usize],
            velocity: velocity_for(amplitude, threshold),
        })
    }

    /// Pitch class 0..=11, C = 0
    pub fn pitch_class(&self) -> u8 {
        self.pitch % 12
    }

    /// Human-readable label, e.g. "A4"
    pub fn label(&self) -> String {
        format!("{}{}", SEMITONE_NAMES[self.semitone as usize], self.octave)
    }

    /// Whether the note falls on a white key
    pub fn is_white_key(&self) -> bool {
        WHITE_KEYS[self.semitone as usize]
    }
}
