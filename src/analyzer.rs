//! Per-frame spectral analysis: weighting, PCP, peak picking, note emission

use crate::config::{AnalysisConfig, BinWeight};
use crate::error::{PolyError, Result};
use crate::note::{freq_to_pitch, pitch_to_freq, Note};
use crate::spectral::{OctaveBands, RealFft, WindowFunction, OCTAVES};

/// Results of analyzing one frame
#[derive(Debug, Clone)]
pub struct FrameResult {
    /// Weighted (and optionally PCP-reinforced) half spectrum
    pub spectrum: Vec<f32>,
    /// Pitch-class profile normalized so the maximum element is 1
    pub pcp: [f32; 12],
    /// Detected notes, ordered by ascending detection bin
    pub notes: Vec<Note>,
}

/// Frame analyzer holding the per-session tables and scratch buffers.
///
/// One analyzer serves one stream of frames; parallel hosts create one
/// analyzer per worker since the padded buffer is reused across frames.
pub struct FrameAnalyzer {
    config: AnalysisConfig,
    window: WindowFunction,
    fft: RealFft,
    bands: OctaveBands,
    /// Nearest equal-tempered pitch per FFT bin, 0 when out of range
    bin_pitch: Vec<i32>,
    padded: Vec<f32>,
}

impl FrameAnalyzer {
    pub fn new(config: &AnalysisConfig, sample_rate: u32) -> Result<Self> {
        if config.window_len < 2 || !config.window_len.is_power_of_two() {
            return Err(PolyError::InvalidConfig(format!(
                "window length must be a power of two >= 2, got {}",
                config.window_len
            )));
        }
        if !matches!(config.zero_pad, 1 | 2 | 4 | 8) {
            return Err(PolyError::InvalidConfig(format!(
                "zero-pad factor must be one of 1, 2, 4, 8, got {}",
                config.zero_pad
            )));
        }

        let padded_len = config.padded_len();
        let bands = OctaveBands::new(sample_rate as f32, padded_len);

        // The bin -> semitone snap is fixed by (fs, N); compute it once.
        let half_len = padded_len / 2;
        let bin_pitch = (0..half_len)
            .map(|k| freq_to_pitch(bands.bin_frequency(k)))
            .collect();

        Ok(Self {
            config: config.clone(),
            window: WindowFunction::new(config.window, config.window_len),
            fft: RealFft::new(padded_len),
            bands,
            bin_pitch,
            padded: vec![0.0; padded_len],
        })
    }

    pub fn octave_bands(&self) -> &OctaveBands {
        &self.bands
    }

    pub fn window(&self) -> &WindowFunction {
        &self.window
    }

    /// Analyze one frame of up to `window_len` samples.
    ///
    /// A short final frame is zero-padded to the window length; the padded
    /// region past the window is always exact zeros.
    pub fn analyze(&mut self, samples: &[f32]) -> FrameResult {
        let window_len = self.config.window_len;
        let copied = samples.len().min(window_len);

        self.padded[..copied].copy_from_slice(&samples[..copied]);
        self.padded[copied..].fill(0.0);
        self.window.apply_in_place(&mut self.padded[..window_len]);

        let magnitude = self.fft.forward(&self.padded);

        let (spectrum, pcp) = self.weight_spectrum(&magnitude);
        let notes = self.pick_notes(&spectrum);

        FrameResult {
            spectrum,
            pcp,
            notes,
        }
    }

    /// Whether a bin snaps to a semitone in an active octave
    fn bin_active(&self, bin: usize) -> bool {
        let pitch = self.bin_pitch[bin];
        if pitch == 0 {
            return false;
        }
        let octave = pitch / 12 - 1;
        (0..OCTAVES as i32).contains(&octave) && self.config.octave_active[octave as usize]
    }

    /// Semitone-distance weighting and PCP accumulation over the in-range bins
    fn weight_spectrum(&self, magnitude: &[f32]) -> (Vec<f32>, [f32; 12]) {
        let mut spectrum = vec![0.0f32; magnitude.len()];
        let mut pcp = [0.0f32; 12];

        let (lo, hi) = self.bands.full_range();
        let hi = hi.min(magnitude.len());

        for bin in lo..hi {
            if !self.bin_active(bin) {
                continue;
            }
            let pitch = self.bin_pitch[bin];
            let f_bin = self.bands.bin_frequency(bin);
            let closest = pitch_to_freq(pitch);

            // Distance to the nearest semitone, in semitone units, doubled
            let distance = 2.0 * (12.0 * (f_bin / closest).log2()).abs();
            let weight = bin_weight(self.config.bin_weight, distance);

            let mut value = magnitude[bin] * weight;
            if self.config.linear_eq_active {
                value *= self.config.linear_eq_intercept + bin as f32 * self.config.linear_eq_slope;
            }
            spectrum[bin] = value;

            pcp[(pitch % 12) as usize] += magnitude[bin] * magnitude[bin] * weight;
        }

        let max = pcp.iter().cloned().fold(0.0f32, f32::max);
        if max > 0.0 {
            for class in pcp.iter_mut() {
                *class /= max;
            }
        }

        if self.config.pcp_active {
            for bin in lo..hi {
                if self.bin_active(bin) {
                    spectrum[bin] *= pcp[(self.bin_pitch[bin] % 12) as usize];
                }
            }
        }

        (spectrum, pcp)
    }

    /// Local-maximum peak picking with parabolic refinement and harmonic
    /// suppression, scanning bins in ascending order
    fn pick_notes(&self, spectrum: &[f32]) -> Vec<Note> {
        let mut notes = Vec::new();
        let (lo, hi) = self.bands.full_range();
        let lo = lo.max(1);
        let hi = hi.min(spectrum.len().saturating_sub(1));

        for bin in lo..hi {
            if !self.bin_active(bin) {
                continue;
            }
            let y0 = spectrum[bin];
            let y_prev = spectrum[bin - 1];
            let y_next = spectrum[bin + 1];
            if !(y0 > y_prev && y0 > y_next && y0 > self.config.peak_threshold) {
                continue;
            }

            let mut frequency = self.bands.bin_frequency(bin);
            let mut amplitude = y0;

            // Quadratic fit over the three adjacent magnitudes; adopt the
            // refined estimate only when it changes the rounded pitch
            let denom = 2.0 * (2.0 * y0 - y_next - y_prev);
            if denom != 0.0 {
                let offset = (y_next - y_prev) / denom;
                let refined_amp = y0 - 0.25 * (y_prev - y_next) * offset;
                let refined_freq = (bin as f32 + offset) * self.bands.sample_rate()
                    / self.bands.padded_len() as f32;
                if freq_to_pitch(refined_freq) != freq_to_pitch(frequency) {
                    frequency = refined_freq;
                    amplitude = refined_amp;
                }
            }

            let pitch = freq_to_pitch(frequency);
            if pitch == 0 {
                continue;
            }
            let pitch_class = (pitch % 12) as u8;

            // A quieter repeat of an already-emitted pitch class is a harmonic
            if self.config.harmonics_active
                && notes
                    .iter()
                    .any(|prior: &Note| prior.pitch_class() == pitch_class && amplitude < prior.amplitude)
            {
                continue;
            }

            if notes
                .iter()
                .any(|prior: &Note| prior.pitch as i32 == pitch && prior.amplitude == amplitude)
            {
                continue;
            }

            if let Some(note) = Note::from_peak(
                frequency,
                amplitude,
                self.config.peak_threshold,
                &self.config.octave_channel,
            ) {
                notes.push(note);
            }
        }

        notes
    }
}

/// Weight for a bin at semitone distance `d`
pub fn bin_weight(kind: BinWeight, distance: f32) -> f32 {
    match kind {
        BinWeight::Uniform => 1.0,
        BinWeight::Discrete => {
            if distance <= 0.2 {
                1.0
            } else {
                0.0
            }
        }
        BinWeight::Linear => 1.0 - distance,
        BinWeight::Quadratic => 1.0 - distance * distance,
        BinWeight::Exponential => (-distance).exp(),
    }
}
