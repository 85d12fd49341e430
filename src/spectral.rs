//! Spectral processing utilities (windowing, FFT adapter, octave bands)

use crate::config::WindowType;
use crate::note::pitch_to_freq;
use rustfft::{num_complex::Complex32, Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

/// Number of octaves covered by the analyzer (C0..B7)
pub const OCTAVES: usize = 8;

/// Precomputed window coefficient table
#[derive(Debug, Clone)]
pub struct WindowFunction {
    kind: WindowType,
    coeffs: Vec<f32>,
}

impl WindowFunction {
    pub fn new(kind: WindowType, len: usize) -> Self {
        let coeffs = (0..len).map(|i| coefficient(kind, i, len)).collect();
        Self { kind, coeffs }
    }

    pub fn kind(&self) -> WindowType {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.coeffs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coeffs.is_empty()
    }

    /// Multiply the window into `samples` sample-wise.
    ///
    /// Only the overlapping prefix is touched, so a short final frame keeps
    /// its zero padding intact.
    pub fn apply_in_place(&self, samples: &mut [f32]) {
        for (sample, &w) in samples.iter_mut().zip(&self.coeffs) {
            *sample *= w;
        }
    }

    /// Windowed copy of `input` into a pre-sized `output` buffer
    pub fn apply(&self, input: &[f32], output: &mut [f32]) {
        for ((out, &x), &w) in output.iter_mut().zip(input).zip(&self.coeffs) {
            *out = x * w;
        }
    }

    /// Coefficients normalized to [0, 1] for visualization
    pub fn draw_curve(&self) -> Vec<f32> {
        let max = self.coeffs.iter().cloned().fold(0.0f32, f32::max);
        if max <= 0.0 {
            return self.coeffs.clone();
        }
        self.coeffs.iter().map(|&w| w / max).collect()
    }
}

fn coefficient(kind: WindowType, i: usize, len: usize) -> f32 {
    if len < 2 {
        return 1.0;
    }
    let x = 2.0 * PI * i as f32 / (len - 1) as f32;
    match kind {
        WindowType::Rectangular => 1.0,
        WindowType::Hann => 0.5 * (1.0 - x.cos()),
        WindowType::Hamming => 0.54 - 0.46 * x.cos(),
        WindowType::Blackman => 0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos(),
        WindowType::BlackmanHarris => {
            0.35875 - 0.48829 * x.cos() + 0.14128 * (2.0 * x).cos() - 0.01168 * (3.0 * x).cos()
        }
    }
}

/// Adapter over the external FFT kernel.
///
/// Consumes a real buffer of the padded length and produces the magnitudes
/// of the non-redundant half spectrum, DC first.
pub struct RealFft {
    len: usize,
    fft: Arc<dyn Fft<f32>>,
    buffer: Vec<Complex32>,
}

impl RealFft {
    pub fn new(len: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(len);
        Self {
            len,
            fft,
            buffer: vec![Complex32::new(0.0, 0.0); len],
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Forward transform of `input` (length `len`), returning `len / 2`
    /// magnitudes `sqrt(re^2 + im^2)`.
    pub fn forward(&mut self, input: &[f32]) -> Vec<f32> {
        for (slot, &x) in self.buffer.iter_mut().zip(input) {
            *slot = Complex32::new(x, 0.0);
        }
        self.fft.process(&mut self.buffer);
        self.buffer[..self.len / 2].iter().map(|c| c.norm()).collect()
    }
}

impl std::fmt::Debug for RealFft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealFft").field("len", &self.len).finish()
    }
}

/// FFT bin ranges for each analyzable octave, computed once per session
#[derive(Debug, Clone)]
pub struct OctaveBands {
    ranges: [(usize, usize); OCTAVES],
    sample_rate: f32,
    padded_len: usize,
}

impl OctaveBands {
    pub fn new(sample_rate: f32, padded_len: usize) -> Self {
        let half_len = padded_len / 2;
        let mut ranges = [(0usize, 0usize); OCTAVES];
        for (octave, range) in ranges.iter_mut().enumerate() {
            let f_low = pitch_to_freq(12 + 12 * octave as i32);
            let f_high = pitch_to_freq(23 + 12 * octave as i32);
            // Smallest bin at or above C_o, one past the last bin at or below B_o
            let start = (f_low * padded_len as f32 / sample_rate).ceil() as usize;
            let end = (f_high * padded_len as f32 / sample_rate).floor() as usize + 1;
            let start = start.min(half_len);
            let end = end.clamp(start, half_len);
            *range = (start, end);
        }
        Self {
            ranges,
            sample_rate,
            padded_len,
        }
    }

    /// Bin range [start, end) for an octave 0..=7
    pub fn range(&self, octave: usize) -> (usize, usize) {
        self.ranges[octave]
    }

    /// Bin range spanning all eight octaves
    pub fn full_range(&self) -> (usize, usize) {
        (self.ranges[0].0, self.ranges[OCTAVES - 1].1)
    }

    /// Center frequency of an FFT bin in Hz
    pub fn bin_frequency(&self, bin: usize) -> f32 {
        bin as f32 * self.sample_rate / self.padded_len as f32
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn padded_len(&self) -> usize {
        self.padded_len
    }
}
